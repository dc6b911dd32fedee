use crate::error::{LocatorError, Result};
use std::path::{Path, PathBuf};

/// Path under which code typed into the interactive session is reported
pub const DEFAULT_SESSION_PATH: &str = "(session)";

/// Supplies file contents line by line
pub trait FileProvider {
    /// Read all lines of `path`, without trailing newlines
    fn read_lines(&self, path: &Path) -> Result<Vec<String>>;
}

/// Reads from disk, answering the session path from the live input buffer
#[derive(Debug, Clone)]
pub struct FsFileProvider {
    session_path: PathBuf,
    session_lines: Vec<String>,
}

impl Default for FsFileProvider {
    fn default() -> Self {
        Self {
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            session_lines: Vec::new(),
        }
    }
}

impl FsFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: use a different synthetic path for the session
    #[must_use]
    pub fn session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }

    /// Append one line of session input
    pub fn record_input(&mut self, line: impl Into<String>) {
        self.session_lines.push(line.into());
    }

    /// Replace the session input buffer
    pub fn set_session_input<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session_lines = lines.into_iter().map(Into::into).collect();
    }

    /// Check whether `path` names the interactive session
    #[must_use]
    pub fn is_session_path(&self, path: &Path) -> bool {
        path == self.session_path
    }
}

impl FileProvider for FsFileProvider {
    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        if self.is_session_path(path) {
            return Ok(self.session_lines.clone());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|err| LocatorError::unreadable(path, err))?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_file_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "one\ntwo\r\nthree\n").unwrap();

        let provider = FsFileProvider::new();
        let lines = provider.read_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FsFileProvider::new();
        let err = provider.read_lines(&dir.path().join("nope.rb")).unwrap_err();
        assert!(matches!(err, LocatorError::Unreadable { .. }));
    }

    #[test]
    fn test_session_path_served_from_memory() {
        let mut provider = FsFileProvider::new().session_path("(pry)");
        provider.record_input("class Foo");
        provider.record_input("end");

        let lines = provider.read_lines(Path::new("(pry)")).unwrap();
        assert_eq!(lines, vec!["class Foo", "end"]);
        assert!(!provider.is_session_path(Path::new(DEFAULT_SESSION_PATH)));
    }
}
