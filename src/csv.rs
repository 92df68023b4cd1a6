// src/csv.rs
use std::mem::take;
use std::path::Path;

use crate::core::sanitize::fold_key;
use crate::error::{PipelineError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delim {
    Csv,
    Tsv,
    /// pt-BR spreadsheet exports use ';' because ',' is the decimal mark.
    Semicolon,
}

impl Delim {
    pub fn sep(self) -> char {
        match self {
            Delim::Csv => ',',
            Delim::Tsv => '\t',
            Delim::Semicolon => ';',
        }
    }

    /// Pick the separator that occurs most on the first line. Ties go to ','.
    pub fn sniff(text: &str) -> Self {
        let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        let count = |c: char| first.chars().filter(|&x| x == c).count();
        let (tabs, semis, commas) = (count('\t'), count(';'), count(','));
        if tabs > commas && tabs >= semis {
            Delim::Tsv
        } else if semis > commas {
            Delim::Semicolon
        } else {
            Delim::Csv
        }
    }
}

/* ---------------- Parsing ---------------- */

/// Minimal CSV/TSV parser (quotes, doubled quotes, CRLF, quoted newlines).
/// Blank lines are dropped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].trim().is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush any trailing field/row even if quotes were unterminated.
    row.push(field);
    if !(row.len() == 1 && row[0].trim().is_empty()) {
        rows.push(row);
    }

    rows
}

/* ---------------- Table model ---------------- */

/// A raw exported table: one header row plus data rows, cells as text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Split parsed rows at `header_row` (count of non-blank rows above the header).
    pub fn from_rows(mut rows: Vec<Vec<String>>, header_row: usize) -> Result<Self> {
        if rows.len() <= header_row {
            return Err(PipelineError::Schema { missing: vec![format!("header row {header_row}")] });
        }
        let mut data = rows.split_off(header_row);
        let headers = data.remove(0).into_iter().map(|h| h.trim().to_string()).collect();
        Ok(Self { headers, rows: data })
    }

    pub fn parse(text: &str, delim: Option<Delim>, header_row: usize) -> Result<Self> {
        // Banner rows are counted like `from_rows` counts them: blank lines don't count.
        let delim = delim.unwrap_or_else(|| {
            let header = text.lines().filter(|l| !l.trim().is_empty()).nth(header_row).unwrap_or("");
            Delim::sniff(header)
        });
        Self::from_rows(parse_rows(text, delim.sep()), header_row)
    }

    pub fn load(path: &Path, delim: Option<Delim>, header_row: usize) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        let text = String::from_utf8(bytes)
            .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| b as char).collect());
        Self::parse(&text, delim, header_row)
    }

    /// Index of a header, ignoring case, accents and surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        let want = fold_key(name);
        self.headers.iter().position(|h| fold_key(h) == want)
    }

    /// Cell text, or "" when the row is shorter than the header.
    pub fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }
}
