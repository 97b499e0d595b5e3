//! Search Paths
//!
//! Resolves bare texture names against a list of directories.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Returns the regular expression separating search path entries: `:` or
/// `;`, except a `:` that follows a lone drive letter at the start of an
/// entry.
fn regex_separator() -> &'static Regex {
    static DATA: OnceLock<Regex> = OnceLock::new();
    DATA.get_or_init(|| Regex::new(r"[;:]").unwrap())
}

/// Returns the regular expression matching a Windows drive letter entry.
fn regex_drive_letter() -> &'static Regex {
    static DATA: OnceLock<Regex> = OnceLock::new();
    DATA.get_or_init(|| Regex::new(r"^[A-Za-z]$").unwrap())
}

/// Splits a search path into directories. Entries are separated by `:` or
/// `;`; Windows drive letters (`C:\textures`) are kept intact and empty
/// entries are dropped.
///
/// * `search_path` - The search path.
pub fn split_search_path(search_path: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut last = 0;
    let mut pending_drive: Option<String> = None;

    for m in regex_separator().find_iter(search_path) {
        let piece = &search_path[last..m.start()];
        last = m.end();

        if let Some(drive) = pending_drive.take() {
            entries.push(format!("{drive}:{piece}"));
            continue;
        }
        if m.as_str() == ":" && regex_drive_letter().is_match(piece) {
            let rest = &search_path[last..];
            if rest.starts_with('\\') || rest.starts_with('/') {
                pending_drive = Some(piece.to_string());
                continue;
            }
        }
        entries.push(piece.to_string());
    }

    let tail = &search_path[last..];
    match pending_drive {
        Some(drive) => entries.push(format!("{drive}:{tail}")),
        None => entries.push(tail.to_string()),
    }

    entries.retain(|e| !e.is_empty());
    entries
}

/// Resolves a texture name. Absolute names and names that exist relative to
/// the working directory are returned unchanged; otherwise the first search
/// path directory containing the name wins. If nothing matches the name is
/// returned as-is so the opener can report the failure.
///
/// * `name`        - Texture name.
/// * `search_path` - The search path.
/// * `exists`      - Returns true if a candidate path exists.
pub fn resolve<F>(name: &str, search_path: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    if Path::new(name).is_absolute() || exists(name) {
        return name.to_string();
    }

    for dir in split_search_path(search_path) {
        let candidate: PathBuf = [dir.as_str(), name].iter().collect();
        let candidate = candidate.to_string_lossy();
        if exists(&candidate) {
            trace!("Resolved {name} to {candidate}");
            return candidate.into_owned();
        }
    }

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_both_separators() {
        assert_eq!(
            split_search_path("/a/b:/c;d::"),
            vec!["/a/b".to_string(), "/c".to_string(), "d".to_string()]
        );
        assert!(split_search_path("").is_empty());
    }

    #[test]
    fn keeps_drive_letters() {
        assert_eq!(
            split_search_path(r"C:\tex;D:/maps:rel"),
            vec![r"C:\tex".to_string(), "D:/maps".to_string(), "rel".to_string()]
        );
        assert_eq!(split_search_path("x:y"), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn resolves_first_match() {
        let exists = |p: &str| p == "/two/t.tex" || p == "/three/t.tex";
        assert_eq!(resolve("t.tex", "/one:/two:/three", exists), "/two/t.tex");
        assert_eq!(resolve("u.tex", "/one:/two", exists), "u.tex");
        assert_eq!(resolve("/abs/t.tex", "/two", exists), "/abs/t.tex");
    }
}
