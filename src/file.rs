// src/file.rs

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};

use tempfile::NamedTempFile;

use crate::config::consts::INPUT_EXTENSIONS;
use crate::error::{PipelineError, Result};

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(PipelineError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        ));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    Ok(())
}

/// Write `bytes` to `path` without ever exposing a partial file: the content goes
/// to a temp file in the same directory, then replaces `path` by rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_directory(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| PipelineError::io(&dir, e))?;
    tmp.write_all(bytes).map_err(|e| PipelineError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| PipelineError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Regular files in `dir` with one of `exts`, sorted by name.
pub fn list_files(dir: &Path, exts: &[&str]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_file() && has_extension(&path, exts) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Most recently modified export in `dir`. Name breaks ties.
pub fn latest_export(dir: &Path) -> Result<PathBuf> {
    let mut best: Option<(SystemTime, PathBuf)> = None;
    for path in list_files(dir, INPUT_EXTENSIONS)? {
        let mtime = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| PipelineError::io(&path, e))?;
        let newer = match &best {
            None => true,
            Some((t, p)) => mtime > *t || (mtime == *t && path > *p),
        };
        if newer {
            best = Some((mtime, path));
        }
    }
    best.map(|(_, p)| p).ok_or_else(|| {
        PipelineError::io(dir, std::io::Error::new(std::io::ErrorKind::NotFound, "no export file found"))
    })
}

/// `dir/<stem of input>.<ext>`
pub fn sibling_output(input: &Path, out_dir: &Path, ext: &str) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| s!("saida"));
    out_dir.join(join!(&stem, ".", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_whole_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a.json");
        write_atomic(&path, b"first version, longer").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn latest_export_ignores_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.pdf"), b"x").unwrap();
        fs::write(dir.path().join("export.csv"), b"x").unwrap();
        assert_eq!(latest_export(dir.path()).unwrap(), dir.path().join("export.csv"));
    }

    #[test]
    fn latest_export_on_empty_dir_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(latest_export(dir.path()), Err(PipelineError::Io { .. })));
    }

    #[test]
    fn sibling_output_swaps_extension() {
        let p = sibling_output(Path::new("in/oficina_a.json"), Path::new("out"), "pdf");
        assert_eq!(p, Path::new("out").join("oficina_a.pdf"));
    }
}
