use serde::{Deserialize, Serialize};

/// One line of a code buffer together with the number it had in its source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineEntry {
    /// Line text without the trailing newline
    pub text: String,

    /// Line number assigned at creation (1-indexed)
    pub line_number: usize,
}

impl LineEntry {
    /// Create a new entry
    pub fn new(text: impl Into<String>, line_number: usize) -> Self {
        Self {
            text: text.into(),
            line_number,
        }
    }

    /// Check whether the line holds only whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        assert!(LineEntry::new("   \t", 3).is_blank());
        assert!(!LineEntry::new("  end", 3).is_blank());
    }
}
