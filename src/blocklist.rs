//! Static list of blocked domain substrings.
//!
//! The file format is one substring per line. Surrounding whitespace is
//! trimmed and blank lines are skipped. The list is read once at startup and
//! shared read-only (`Arc<BlockList>`) by every tab's filter.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

/// Immutable, ordered set of substrings that mark a URL as an ad/tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    entries: Vec<String>,
}

impl BlockList {
    /// An empty list: blocks nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the text content of a block-list file.
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Self { entries }
    }

    /// Builds a list from already-split entries (used by tests and callers
    /// that assemble lists in memory). Entries are not trimmed.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads the list from `path`.
    ///
    /// A missing or unreadable file is not an error: a warning is logged and
    /// an empty list is returned, so the browser runs without filtering.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => {
                let list = Self::parse(&content);
                info!(path = %path.display(), entries = list.len(), "Block-list loaded");
                list
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    %error,
                    "Block-list not found, no ad domains will be blocked"
                );
                Self::empty()
            }
        }
    }

    /// Returns the first entry contained in `url`, if any.
    ///
    /// Empty entries never match.
    pub fn matching_entry(&self, url: &str) -> Option<&str> {
        self.entries
            .iter()
            .map(String::as_str)
            .find(|entry| !entry.is_empty() && url.contains(entry))
    }

    /// `true` if `url` contains at least one entry.
    pub fn matches(&self, url: &str) -> bool {
        self.matching_entry(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_trims_and_skips_blank_lines() {
        let list = BlockList::parse("  doubleclick.net  \n\n\tadserver.example\n   \n");
        let entries: Vec<&str> = list.iter().collect();
        assert_eq!(entries, vec!["doubleclick.net", "adserver.example"]);
    }

    #[test]
    fn test_parse_handles_crlf() {
        let list = BlockList::parse("a.example\r\nb.example\r\n");
        assert_eq!(list.len(), 2);
        assert!(list.matches("https://b.example/x"));
    }

    #[test]
    fn test_matching_entry_returns_first_match() {
        let list = BlockList::from_entries(["ads.", "doubleclick.net"]);
        assert_eq!(
            list.matching_entry("https://ads.doubleclick.net/x"),
            Some("ads.")
        );
    }

    #[test]
    fn test_empty_entry_never_matches() {
        let list = BlockList::from_entries([""]);
        assert!(!list.matches("https://example.com/"));
        assert!(!list.matches(""));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let list = BlockList::empty();
        assert!(list.is_empty());
        assert!(!list.matches("https://ads.doubleclick.net/x"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "doubleclick.net").unwrap();
        writeln!(file, "adserver.example").unwrap();

        let list = BlockList::load(file.path());
        assert_eq!(list.len(), 2);
        assert!(list.matches("https://ads.doubleclick.net/x"));
        assert!(!list.matches("https://example.com/img.png"));
    }

    #[test]
    fn test_load_missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = BlockList::load(&dir.path().join("adservers.txt"));
        assert!(list.is_empty());
    }
}
