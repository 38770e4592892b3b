use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AnalysisError, Result};

pub const SEGMENTED_SUFFIX: &str = "_seg.txt";
pub const RAW_EXTENSION: &str = ".txt";

/// One token-sequence file loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedDocument {
    pub name: String,
    pub tokens: Vec<String>,
}

impl SegmentedDocument {
    /// Filename without the `_seg.txt` suffix, used for plot annotations.
    pub fn label(&self) -> &str {
        self.name.strip_suffix(SEGMENTED_SUFFIX).unwrap_or(&self.name)
    }

    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Files in `dir` whose name ends with `suffix`, sorted by filename.
pub fn list_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(AnalysisError::io(dir))? {
        let entry = entry.map_err(AnalysisError::io(dir))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.ends_with(suffix));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads a whole file, rejecting content that is not UTF-8.
pub fn read_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(AnalysisError::io(path))?;
    String::from_utf8(bytes).map_err(|source| AnalysisError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(AnalysisError::io(path))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(AnalysisError::io(dir))
}

/// One term per line; lines are trimmed and blank lines dropped.
pub fn parse_word_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_word_list(path: &Path) -> Result<HashSet<String>> {
    let words = parse_word_list(&read_utf8(path)?);
    debug!("Loaded {} terms from {}", words.len(), path.display());
    Ok(words)
}

pub fn load_segmented_documents(dir: &Path) -> Result<Vec<SegmentedDocument>> {
    list_files(dir, SEGMENTED_SUFFIX)?
        .into_iter()
        .map(|path| {
            let content = read_utf8(&path)?;
            Ok(SegmentedDocument {
                name: file_name(&path),
                tokens: content.split_whitespace().map(str::to_string).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word_list_skips_blank_lines() {
        let words = parse_word_list("好\n\n  优秀  \n\t\n差\n");
        assert_eq!(words.len(), 3);
        assert!(words.contains("优秀"));
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_seg.txt", "a_seg.txt", "notes.md", "c.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let names: Vec<String> = list_files(dir.path(), SEGMENTED_SUFFIX)
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["a_seg.txt", "b_seg.txt"]);
    }

    #[test]
    fn test_read_utf8_rejects_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(read_utf8(&path), Err(AnalysisError::Decode { .. })));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(list_files(&missing, ".txt"), Err(AnalysisError::Io { .. })));
    }

    #[test]
    fn test_segmented_document_label() {
        let doc = SegmentedDocument {
            name: "001_seg.txt".to_string(),
            tokens: vec!["天气".to_string(), "晴朗".to_string()],
        };
        assert_eq!(doc.label(), "001");
        assert_eq!(doc.text(), "天气 晴朗");
    }
}
