use crate::error::{Result, WindowError};
use serde::{Deserialize, Serialize};

/// Display formatting carried by a code buffer
///
/// Formatting never touches the stored entries; it is applied line by line
/// when the buffer is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formatting {
    /// Prefix every line with its number
    pub line_numbers: bool,

    /// Line number that receives the `=>` marker
    pub marker: Option<usize>,

    /// Fixed number of spaces prepended to every rendered line
    pub indentation: Option<usize>,

    /// Pass raw text through the highlighter before any prefixing
    pub colorize: bool,

    /// Display numbers counted from this base instead of the original numbers
    #[serde(default)]
    pub number_base: Option<usize>,
}

impl Formatting {
    /// No decoration at all
    pub fn plain() -> Self {
        Self::default()
    }

    /// Line numbers only
    pub fn numbered() -> Self {
        Self {
            line_numbers: true,
            ..Default::default()
        }
    }

    /// Numbered listing with a marker on the current line
    pub fn listing(marker: usize) -> Self {
        Self {
            line_numbers: true,
            marker: Some(marker),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.number_base == Some(0) {
            return Err(WindowError::invalid_config(
                "number_base must be >= 1 (line numbers are 1-based)",
            ));
        }

        if self.marker == Some(0) {
            return Err(WindowError::invalid_config(
                "marker must reference a 1-based line number",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_valid() {
        assert!(Formatting::plain().validate().is_ok());
        assert!(Formatting::numbered().validate().is_ok());
        assert!(Formatting::listing(12).validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let formatting = Formatting {
            number_base: Some(0),
            ..Default::default()
        };
        assert!(formatting.validate().is_err());

        let formatting = Formatting {
            marker: Some(0),
            ..Default::default()
        };
        assert!(formatting.validate().is_err());
    }
}
