use crate::error::{LocatorError, Result};
use context_code_window::Language;
use serde::{Deserialize, Serialize};

/// Configuration for declaration lookup and doc extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Consider singleton (class-level) methods when collecting anchors
    pub include_singleton_methods: bool,

    /// Use tree-sitter declaration nodes before falling back to text patterns
    pub prefer_syntax_tree: bool,

    /// Language assumed for files whose extension says nothing (including the session)
    pub default_language: Language,

    /// Upper bound on lines collected when walking up a comment block
    pub max_doc_lines: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            include_singleton_methods: true,
            prefer_syntax_tree: true,
            default_language: Language::Ruby,
            max_doc_lines: 500,
        }
    }
}

impl LocatorConfig {
    /// Create config that only trusts text patterns (no tree-sitter parsing)
    pub fn text_only() -> Self {
        Self {
            prefer_syntax_tree: false,
            ..Default::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| LocatorError::invalid_config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_language == Language::Unknown {
            return Err(LocatorError::invalid_config(
                "default_language must name a concrete language",
            ));
        }

        if self.max_doc_lines == 0 {
            return Err(LocatorError::invalid_config("max_doc_lines must be > 0"));
        }

        Ok(())
    }

    /// Language for a file, falling back to the configured default
    pub fn language_for(&self, path: &std::path::Path) -> Language {
        match Language::from_path(path) {
            Language::Unknown => self.default_language,
            language => language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_config_valid() {
        assert!(LocatorConfig::default().validate().is_ok());
        assert!(LocatorConfig::text_only().validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = LocatorConfig::from_json_str(
            r#"{"prefer_syntax_tree": false, "default_language": "python"}"#,
        )
        .unwrap();
        assert!(!config.prefer_syntax_tree);
        assert!(config.include_singleton_methods);
        assert_eq!(config.default_language, Language::Python);
    }

    #[test]
    fn test_config_validation() {
        assert!(LocatorConfig::from_json_str(r#"{"default_language": "unknown"}"#).is_err());
        assert!(LocatorConfig::from_json_str(r#"{"max_doc_lines": 0}"#).is_err());
        assert!(LocatorConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_language_for_falls_back() {
        let config = LocatorConfig::default();
        assert_eq!(config.language_for(Path::new("(session)")), Language::Ruby);
        assert_eq!(config.language_for(Path::new("app.py")), Language::Python);
    }
}
