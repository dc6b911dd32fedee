use serde::{Deserialize, Serialize};
use std::path::Path;

/// Language of the text held by a code buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ruby,
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Swift,
    Kotlin,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rb" | "rake" | "gemspec" | "ru" => Language::Ruby,
            "rs" => Language::Rust,
            "py" | "pyw" => Language::Python,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Unknown => "unknown",
        }
    }

    /// Check if a tree-sitter grammar is available for this language
    pub fn supports_syntax_tree(self) -> bool {
        matches!(
            self,
            Language::Rust | Language::Python | Language::JavaScript | Language::TypeScript
        )
    }

    /// Line comment leaders, longest first so stripping removes the whole token
    pub fn comment_prefixes(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["///", "//!", "//", "/**", "/*", "*"],
            Language::JavaScript
            | Language::TypeScript
            | Language::Go
            | Language::Java
            | Language::C
            | Language::Cpp
            | Language::CSharp
            | Language::Swift
            | Language::Kotlin => &["///", "//", "/**", "/*", "*"],
            Language::Ruby | Language::Python => &["#"],
            Language::Unknown => &["#", "//"],
        }
    }

    /// Check whether a (trimmed) line starts with one of the comment leaders
    pub fn is_comment_line(self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.comment_prefixes()
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
    }

    /// Remove the comment leader (and any repetition of it) from a line
    pub fn strip_comment_leader(self, line: &str) -> String {
        let trimmed = line.trim_start();
        for prefix in self.comment_prefixes() {
            if let Some(rest) = trimmed.strip_prefix(prefix) {
                let rest = if *prefix == "#" {
                    rest.trim_start_matches('#')
                } else {
                    rest
                };
                return rest.trim_end_matches("*/").trim_end().to_string();
            }
        }
        trimmed.trim_end().to_string()
    }
}
