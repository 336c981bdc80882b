//! Suffix to WHOIS server mapping.
//!
//! The table is read from a line oriented text file. Everything up to a
//! `[Domain]` header line is ignored; after it each non-comment line holds a
//! suffix and a server spec separated by tabs:
//!
//! ```text
//! [Domain]
//! com	whois.verisign-grs.com
//! co.jp	whois.jprs.jp	# comment
//! ```

use crate::errors::WhoisError;
use std::{collections::HashMap, path::Path};
use tracing::debug;

const DOMAIN_SECTION: &str = "[Domain]";
const FALLBACK_SUFFIX: &str = ".whois-servers.net";

/// Table shipped with the binary, also written out by `--create`.
pub const DEFAULT_TABLE: &str = include_str!("../conf/whois-chase.conf");

#[derive(Debug, Clone, Default)]
pub struct ServerTable {
    servers: HashMap<String, String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Global,
    Domain,
}

impl ServerTable {
    pub fn parse(text: &str) -> Result<Self, WhoisError> {
        let mut servers = HashMap::new();
        let mut section = Section::Global;

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;

            if raw.is_empty() {
                continue;
            }
            if raw == DOMAIN_SECTION {
                section = Section::Domain;
                continue;
            }
            if section == Section::Global {
                continue;
            }

            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split('\t').filter(|field| !field.is_empty());
            let (suffix, server) = match (fields.next(), fields.next()) {
                (Some(suffix), Some(server)) => (suffix, server),
                _ => {
                    return Err(WhoisError::MalformedTableLine {
                        line: line_number,
                        content: raw.to_string(),
                    })
                }
            };

            if servers.contains_key(suffix) {
                return Err(WhoisError::DuplicateSuffix {
                    line: line_number,
                    suffix: suffix.to_string(),
                });
            }
            servers.insert(suffix.to_string(), server.to_string());
        }

        debug!("Server table loaded with {} suffixes", servers.len());
        Ok(Self { servers })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WhoisError> {
        let path = path.as_ref();
        debug!("Loading server table from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn builtin() -> Result<Self, WhoisError> {
        Self::parse(DEFAULT_TABLE)
    }

    /// Writes the built-in table to `path`, replacing any existing file.
    pub fn write_default(path: impl AsRef<Path>) -> Result<(), WhoisError> {
        std::fs::write(path, DEFAULT_TABLE)?;
        Ok(())
    }

    /// Server spec for `domain`, found by stripping labels from the left
    /// until a suffix matches. With no match the last remaining label gets
    /// `.whois-servers.net` appended, so this always yields some server.
    pub fn resolve(&self, domain: &str) -> String {
        let mut candidate = domain;
        loop {
            if let Some(server) = self.servers.get(candidate) {
                return server.clone();
            }
            match candidate.split_once('.') {
                Some((_, rest)) => candidate = rest,
                None => break,
            }
        }
        format!("{}{}", candidate, FALLBACK_SUFFIX)
    }

    pub fn get(&self, suffix: &str) -> Option<&str> {
        self.servers.get(suffix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_strips_labels_until_match() {
        let table = ServerTable::parse("[Domain]\nco.jp\tX\n").unwrap();
        assert_eq!(table.resolve("example.co.jp"), "X");
        assert_eq!(table.resolve("www.example.co.jp"), "X");
        assert_eq!(table.resolve("co.jp"), "X");
    }

    #[test]
    fn test_resolve_fallback() {
        let table = ServerTable::parse("[Domain]\nco.jp\tX\n").unwrap();
        assert_eq!(table.resolve("example.com"), "com.whois-servers.net");
        assert_eq!(table.resolve("localhost"), "localhost.whois-servers.net");
        assert_eq!(table.resolve("example.jp"), "jp.whois-servers.net");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let table = ServerTable::builtin().unwrap();
        let first = table.resolve("example.co.uk");
        assert_eq!(first, table.resolve("example.co.uk"));
        assert_eq!(first, "whois.nic.uk");
    }

    #[test]
    fn test_lines_before_domain_section_are_ignored() {
        let text = "timeout\t30\nnot even\n[Domain]\ncom\twhois.verisign-grs.com\n";
        let table = ServerTable::parse(text).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("com"), Some("whois.verisign-grs.com"));
        assert_eq!(table.get("timeout"), None);
    }

    #[test]
    fn test_comments_blanks_and_repeated_tabs() {
        let text = "[Domain]\n\n# full comment\n   \t  \nnet\t\t\twhois.verisign-grs.com\t# trailing\njp\twhois.jprs.jp\textra\n";
        let table = ServerTable::parse(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("net"), Some("whois.verisign-grs.com"));
        assert_eq!(table.get("jp"), Some("whois.jprs.jp"));
    }

    #[test]
    fn test_duplicate_suffix_fails_load() {
        let text = "[Domain]\ncom\ta.example\ncom\tb.example\n";
        match ServerTable::parse(text) {
            Err(WhoisError::DuplicateSuffix { line, suffix }) => {
                assert_eq!(line, 3);
                assert_eq!(suffix, "com");
            }
            other => panic!("expected duplicate suffix error, got {:?}", other),
        }
    }

    #[test]
    fn test_single_field_line_fails_load() {
        let text = "[Domain]\ncom whois.verisign-grs.com\n";
        assert!(matches!(
            ServerTable::parse(text),
            Err(WhoisError::MalformedTableLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_builtin_table_parses() {
        let table = ServerTable::builtin().unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.get("com"), Some("whois.verisign-grs.com"));
        assert_eq!(table.get("co.jp"), Some("whois.jprs.jp"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[Domain]").unwrap();
        writeln!(file, "example\t[2001:db8::1]:4343").unwrap();
        let table = ServerTable::load(file.path()).unwrap();
        assert_eq!(table.resolve("foo.example"), "[2001:db8::1]:4343");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ServerTable::load(dir.path().join("absent.conf"));
        assert!(matches!(result, Err(WhoisError::IoError(_))));
    }

    #[test]
    fn test_write_default_round_trips_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whois-chase.conf");
        ServerTable::write_default(&path).unwrap();
        let written = ServerTable::load(&path).unwrap();
        assert_eq!(written.len(), ServerTable::builtin().unwrap().len());
    }
}
