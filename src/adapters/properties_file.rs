// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property file support.
//!
//! This module provides the parser for flat `key=value` property files and the
//! directory adapter that locates one file per domain.

use crate::domain::{DomainName, ModuleError, Result};
use crate::ports::PropertyParser;
#[cfg(feature = "files")]
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum allowed size of a single property file (10MB)
const MAX_PROPERTY_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SOURCE_NAME: &str = "properties-file";

/// Parser for flat property files.
///
/// - one `key=value` or `key: value` record per line; the first `=` or `:`
///   separates key from value
/// - lines starting with `#` or `!` are comments, blank lines are ignored
/// - a trailing `\` continues the record on the next line
/// - keys and values are trimmed
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::PropertiesParser;
/// use modwire::ports::PropertyParser;
///
/// let parser = PropertiesParser::new();
/// let content = "# server\nport=8080\nhost: localhost\n";
/// let result = parser.parse(content).unwrap();
/// assert_eq!(result.get("port"), Some(&"8080".to_string()));
/// assert_eq!(result.get("host"), Some(&"localhost".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertiesParser;

impl PropertiesParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        PropertiesParser
    }

    fn split_record(record: &str) -> Option<(&str, &str)> {
        let at = record.find(|c: char| c == '=' || c == ':')?;
        Some((record[..at].trim(), record[at + 1..].trim()))
    }
}

impl PropertyParser for PropertiesParser {
    fn parse(&self, content: &str) -> Result<HashMap<String, String>> {
        let mut result = HashMap::new();
        let mut pending = String::new();
        let mut start_line = 0;

        for (index, line) in content.lines().enumerate() {
            let line = if pending.is_empty() {
                let trimmed = line.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                start_line = index + 1;
                trimmed
            } else {
                line.trim_start()
            };

            if let Some(continued) = line.strip_suffix('\\') {
                pending.push_str(continued);
                continue;
            }
            pending.push_str(line);

            let (key, value) =
                Self::split_record(&pending).ok_or_else(|| ModuleError::ParseError {
                    message: format!("line {}: expected 'key=value' or 'key: value'", start_line),
                    source: None,
                })?;
            if key.is_empty() {
                return Err(ModuleError::ParseError {
                    message: format!("line {}: empty key", start_line),
                    source: None,
                });
            }
            result.insert(key.to_string(), value.to_string());
            pending.clear();
        }

        if !pending.is_empty() {
            return Err(ModuleError::ParseError {
                message: format!("line {}: continuation at end of input", start_line),
                source: None,
            });
        }
        Ok(result)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["properties", "config"]
    }
}

/// A directory holding one property file per domain.
///
/// The file for domain `d` is the first of `d`, `d.properties` and `d.config`
/// that exists in the directory.
///
/// # Examples
///
/// ```rust,no_run
/// use modwire::adapters::PropertiesDirectory;
///
/// let dir = PropertiesDirectory::new("/etc/myapp");
/// let props = dir.load(&"app".into()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PropertiesDirectory {
    root: PathBuf,
    parser: PropertiesParser,
}

impl PropertiesDirectory {
    /// Uses `root` as the property directory. The directory does not need to
    /// exist yet.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            parser: PropertiesParser::new(),
        }
    }

    /// Uses the OS-appropriate configuration directory of an application.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    #[cfg(feature = "files")]
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| ModuleError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;
        Ok(Self::new(proj_dirs.config_dir()))
    }

    /// The directory searched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate file paths for `domain`, in resolution order.
    pub fn candidates(&self, domain: &DomainName) -> Vec<PathBuf> {
        let mut paths = vec![self.root.join(domain.as_str())];
        paths.extend(
            self.parser
                .supported_extensions()
                .iter()
                .map(|ext| self.root.join(format!("{}.{}", domain, ext))),
        );
        paths
    }

    /// The file holding `domain`, if any candidate exists.
    pub fn find(&self, domain: &DomainName) -> Option<PathBuf> {
        self.candidates(domain).into_iter().find(|p| p.is_file())
    }

    /// Reads and parses the file holding `domain`.
    ///
    /// Returns `Ok(None)` if no candidate file exists.
    pub fn load(&self, domain: &DomainName) -> Result<Option<HashMap<String, String>>> {
        let Some(path) = self.find(domain) else {
            return Ok(None);
        };
        debug!("Loading domain '{}' from {}", domain, path.display());
        self.read(&path).map(Some)
    }

    fn read(&self, path: &Path) -> Result<HashMap<String, String>> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unknown>")
            .to_string();

        let metadata = fs::metadata(path).map_err(|e| ModuleError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to read file metadata: {}", file_name),
            source: Some(Box::new(e)),
        })?;

        if metadata.len() > MAX_PROPERTY_FILE_SIZE {
            return Err(ModuleError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "Property file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_PROPERTY_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ModuleError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to read property file: {}", file_name),
            source: Some(Box::new(e)),
        })?;

        self.parser.parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parser_simple() {
        let parser = PropertiesParser::new();
        let result = parser.parse("key=value").unwrap();
        assert_eq!(result.get("key"), Some(&"value".to_string()));
    }

    #[test]
    fn test_parser_colon_and_whitespace() {
        let parser = PropertiesParser::new();
        let result = parser.parse("  host :  localhost  \nport=  5432").unwrap();
        assert_eq!(result.get("host"), Some(&"localhost".to_string()));
        assert_eq!(result.get("port"), Some(&"5432".to_string()));
    }

    #[test]
    fn test_parser_first_separator_wins() {
        let parser = PropertiesParser::new();
        let result = parser.parse("url=http://localhost:8080").unwrap();
        assert_eq!(result.get("url"), Some(&"http://localhost:8080".to_string()));
    }

    #[test]
    fn test_parser_comments_and_blank_lines() {
        let parser = PropertiesParser::new();
        let content = "# comment\n! also a comment\n\n   \nkey=value\n";
        let result = parser.parse(content).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_parser_continuation() {
        let parser = PropertiesParser::new();
        let content = "list=a,\\\n    b,\\\n    c\nnext=1";
        let result = parser.parse(content).unwrap();
        assert_eq!(result.get("list"), Some(&"a,b,c".to_string()));
        assert_eq!(result.get("next"), Some(&"1".to_string()));
    }

    #[test]
    fn test_parser_empty_value() {
        let parser = PropertiesParser::new();
        let result = parser.parse("key=").unwrap();
        assert_eq!(result.get("key"), Some(&String::new()));
    }

    #[test]
    fn test_parser_invalid_record() {
        let parser = PropertiesParser::new();
        let err = parser.parse("just some words").unwrap_err();
        assert!(matches!(err, ModuleError::ParseError { .. }));
        assert!(parser.parse("=value").is_err());
        assert!(parser.parse("dangling=\\").is_err());
    }

    #[test]
    fn test_parser_supported_extensions() {
        let parser = PropertiesParser::default();
        assert_eq!(parser.supported_extensions(), &["properties", "config"]);
    }

    #[test]
    fn test_directory_candidates_order() {
        let dir = PropertiesDirectory::new("/cfg");
        let candidates = dir.candidates(&"app".into());
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/cfg/app"),
                PathBuf::from("/cfg/app.properties"),
                PathBuf::from("/cfg/app.config"),
            ]
        );
    }

    #[test]
    fn test_directory_prefers_bare_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app"), "port=1\n").unwrap();
        fs::write(temp.path().join("app.properties"), "port=2\n").unwrap();
        fs::write(temp.path().join("app.config"), "port=3\n").unwrap();

        let dir = PropertiesDirectory::new(temp.path());
        let props = dir.load(&"app".into()).unwrap().unwrap();
        assert_eq!(props.get("port"), Some(&"1".to_string()));
    }

    #[test]
    fn test_directory_falls_back_to_config_extension() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.config"), "port=3\n").unwrap();

        let dir = PropertiesDirectory::new(temp.path());
        assert_eq!(dir.find(&"app".into()), Some(temp.path().join("app.config")));
        let props = dir.load(&"app".into()).unwrap().unwrap();
        assert_eq!(props.get("port"), Some(&"3".to_string()));
    }

    #[test]
    fn test_directory_missing_domain() {
        let temp = TempDir::new().unwrap();
        let dir = PropertiesDirectory::new(temp.path());
        assert!(dir.load(&"absent".into()).unwrap().is_none());
        assert_eq!(dir.root(), temp.path());
    }

    #[test]
    fn test_directory_parse_error_propagates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.properties"), "no separator here\n").unwrap();
        let dir = PropertiesDirectory::new(temp.path());
        assert!(dir.load(&"bad".into()).is_err());
    }
}
