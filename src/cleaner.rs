use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::corpus::{self, RAW_EXTENSION};
use crate::error::Result;

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // CJK unified ideographs U+4E00..U+9FA5, ASCII letters and digits, a few
    // punctuation marks, whitespace.
    RE.get_or_init(|| Regex::new(r"[^\x{4e00}-\x{9fa5}a-zA-Z0-9。！？,.，、\s]").unwrap())
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

pub fn clean_text(text: &str) -> String {
    let filtered = disallowed_chars().replace_all(text, "");
    whitespace_run()
        .replace_all(&filtered, " ")
        .trim()
        .to_string()
}

/// Cleans every `*.txt` in `raw_dir` into a file of the same name in
/// `cleaned_dir`. The first undecodable file aborts the run.
pub fn clean_directory(raw_dir: &Path, cleaned_dir: &Path) -> Result<usize> {
    corpus::ensure_dir(cleaned_dir)?;
    let files = corpus::list_files(raw_dir, RAW_EXTENSION)?;

    for path in &files {
        let raw_text = corpus::read_utf8(path)?;
        let cleaned = clean_text(&raw_text);
        debug!(
            "Cleaned {}: {} -> {} chars",
            path.display(),
            raw_text.chars().count(),
            cleaned.chars().count()
        );
        corpus::write_text(&cleaned_dir.join(corpus::file_name(path)), &cleaned)?;
    }

    info!("Cleaned {} documents into {}", files.len(), cleaned_dir.display());
    Ok(files.len())
}
