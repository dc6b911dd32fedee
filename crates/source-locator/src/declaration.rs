//! Text patterns for declaration lines.
//!
//! Matching is structural but not grammatical: a nested type whose last
//! name segment collides with the target can be picked up instead of the
//! real declaration. Callers prefer syntax-tree lookups where a grammar
//! exists and use these patterns as the fallback.

use crate::error::{LocatorError, Result};
use crate::types::{ModuleKind, ModuleRef};
use context_code_window::Language;
use regex::Regex;

/// Recognises lines that declare (or reopen) one particular module
#[derive(Debug, Clone)]
pub struct DeclarationMatcher {
    patterns: Vec<Regex>,
}

impl DeclarationMatcher {
    /// Build the patterns for `module` as written in `language`
    pub fn new(language: Language, module: &ModuleRef) -> Result<Self> {
        if module.is_singleton() {
            return Err(LocatorError::invalid_argument(format!(
                "singleton class {module} has no declaration line of its own"
            )));
        }

        let name = regex::escape(module.simple_name());
        let sources = pattern_sources(language, module.kind(), &name);
        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source).map_err(|err| {
                    LocatorError::invalid_argument(format!(
                        "cannot build declaration pattern for {module}: {err}"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Check if a line declares the module
    pub fn is_match(&self, line: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(line))
    }

    /// Closest declaration line above `anchor_line` (1-indexed, exclusive)
    pub fn find_before(&self, lines: &[String], anchor_line: usize) -> Option<usize> {
        let end = anchor_line.saturating_sub(1).min(lines.len());
        lines[..end]
            .iter()
            .rposition(|line| self.is_match(line))
            .map(|idx| idx + 1)
    }
}

fn pattern_sources(language: Language, kind: ModuleKind, name: &str) -> Vec<String> {
    match language {
        Language::Ruby => {
            let keyword = kind.as_str();
            let constructor = match kind {
                ModuleKind::Class => "(?:Class|Struct)",
                ModuleKind::Module => "Module",
            };
            vec![
                format!(r"(?:^|=)\s*{keyword}\s+(?:\w*::)*{name}(?:\s|<|;|$)"),
                format!(r"^\s*(?:::)?(?:\w+::)*{name}\s*=\s*(?:::)?{constructor}\.new\b"),
                format!(r"^\s*(?:::)?(?:\w+::)*{name}\.(?:class|module|instance)_eval\b"),
            ]
        }
        Language::Python => vec![format!(r"^\s*class\s+{name}\s*(?:[(:\[]|$)")],
        Language::Rust => match kind {
            ModuleKind::Class => vec![
                format!(
                    r"^\s*(?:pub(?:\s*\([^)]*\))?\s+)?(?:unsafe\s+)?(?:struct|enum|union|trait)\s+{name}\b"
                ),
                format!(r"^\s*(?:unsafe\s+)?impl\b(?:\s*<.*?>)?\s+(?:.*\s+for\s+)?&?(?:\w+::)*{name}\b"),
            ],
            ModuleKind::Module => {
                vec![format!(r"^\s*(?:pub(?:\s*\([^)]*\))?\s+)?mod\s+{name}\b")]
            }
        },
        Language::JavaScript | Language::TypeScript => match kind {
            ModuleKind::Class => vec![
                format!(
                    r"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:class|interface)\s+{name}\b"
                ),
                format!(r"^\s*(?:export\s+)?(?:const|let|var)\s+{name}\s*=\s*class\b"),
            ],
            ModuleKind::Module => vec![format!(
                r"^\s*(?:export\s+)?(?:declare\s+)?(?:namespace|module)\s+{name}\b"
            )],
        },
        _ => match kind {
            ModuleKind::Class => vec![format!(
                r"\b(?:class|struct|interface|enum|record|object|type)\s+{name}\b"
            )],
            ModuleKind::Module => vec![format!(r"\b(?:namespace|module|package)\s+{name}\b")],
        },
    }
}
