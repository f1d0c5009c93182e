//! Small text and filesystem helpers used across the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::info;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace (including newlines) to single spaces and
/// trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Title-case a phrase: first letter of each word upper, the rest lower.
///
/// Interior whitespace runs collapse to single spaces along the way, which
/// is what entity normalization wants anyway.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(title_case("mario rossi"), "Mario Rossi");
/// assert_eq!(title_case("ROMA"), "Roma");
/// ```
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

/// True when the string is non-empty and consists only of numeric characters.
pub fn is_purely_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_numeric)
}

/// Truncate a string for logging, respecting character boundaries.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable by probing a throwaway file.
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = Path::new(path).join(".write_probe");
    fs::write(&probe, b"").await?;
    fs::remove_file(&probe).await?;
    info!(%path, "Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  una \n\n riga\tsola  "), "una riga sola");
        assert_eq!(collapse_whitespace("\n \t "), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("mario rossi"), "Mario Rossi");
        assert_eq!(title_case("ROMA"), "Roma");
        assert_eq!(title_case("  banca  d'italia "), "Banca D'italia");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_is_purely_numeric() {
        assert!(is_purely_numeric("2026"));
        assert!(!is_purely_numeric("caffè"));
        assert!(!is_purely_numeric("10 anni"));
        assert!(!is_purely_numeric(""));
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("breve", 100), "breve");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        // "è" is two bytes; cutting at 1 must back up, not panic
        let result = truncate_for_log("èèè", 1);
        assert!(result.starts_with("…") || result.contains("bytes"));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dirs() {
        let dir = std::env::temp_dir().join(format!("notiziario-utils-{}", std::process::id()));
        let path = dir.join("nested").to_string_lossy().into_owned();
        assert!(ensure_writable_dir(&path).await.is_ok());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
