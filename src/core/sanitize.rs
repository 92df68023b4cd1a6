// src/core/sanitize.rs

/// Replace accented Latin letters with their plain ASCII letter. Other chars pass through.
pub fn fold_accents(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

fn fold_char(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Comparison key for headers and markers: accents folded, lowercase, single spaces.
pub fn fold_key(s: &str) -> String {
    normalize_ws(&fold_accents(s)).to_lowercase()
}

/// Responsible-party display name: trimmed, whitespace collapsed, uppercase.
pub fn party_name(raw: &str) -> Option<String> {
    let name = normalize_ws(raw).to_uppercase();
    (!name.is_empty()).then_some(name)
}

/// Fold, uppercase, collapse every non-alphanumeric run into one `sep`, trim `sep`.
fn collapse(name: &str, sep: char) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = true; // suppresses a leading separator
    for ch in fold_accents(name).chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
            last_sep = false;
        } else if !last_sep {
            out.push(sep);
            last_sep = true;
        }
    }
    out.trim_end_matches(sep).to_string()
}

/// Filesystem-safe provider key, e.g. "Auto Peças São João" → "auto_pecas_sao_joao".
/// Idempotent; distinct spellings of one name collapse onto the same slug.
pub fn slugify(name: &str) -> String {
    collapse(name, '_').to_ascii_lowercase()
}

/// Manager archive stem, e.g. "Ana Paula" → "ANA_PAULA".
pub fn manager_stem(name: &str) -> String {
    collapse(name, '_')
}
