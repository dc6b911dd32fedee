use crate::error::{LocatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of a piece of source inside a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Source file path
    pub file: PathBuf,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive) when known
    pub end_line: Option<usize>,
}

impl SourceSpan {
    /// Span that only knows where it starts
    pub fn new(file: impl Into<PathBuf>, start_line: usize) -> Self {
        Self {
            file: file.into(),
            start_line,
            end_line: None,
        }
    }

    /// Span with a known last line
    pub fn with_end(file: impl Into<PathBuf>, start_line: usize, end_line: usize) -> Self {
        Self {
            file: file.into(),
            start_line,
            end_line: Some(end_line),
        }
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Check if span contains a specific line
    #[must_use]
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && self.end_line.map_or(line == self.start_line, |end| line <= end)
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end_line {
            Some(end) if end != self.start_line => {
                write!(f, "{}:{}-{}", self.file.display(), self.start_line, end)
            }
            _ => write!(f, "{}:{}", self.file.display(), self.start_line),
        }
    }
}

/// Where a method's body lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodLocation {
    /// Defined in source text
    Source(SourceSpan),
    /// Built in; no source is discoverable
    Native,
}

/// A method as reported by the introspection collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Qualified name of the module that declares the method
    pub owner: String,

    /// Method name
    pub name: String,

    pub location: MethodLocation,

    /// The method is an alias of another definition
    #[serde(default)]
    pub is_alias: bool,
}

impl MethodRef {
    /// Method defined in source
    pub fn new(owner: impl Into<String>, name: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            location: MethodLocation::Source(span),
            is_alias: false,
        }
    }

    /// Built-in method without source
    pub fn native(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            location: MethodLocation::Native,
            is_alias: false,
        }
    }

    /// Builder: mark as alias
    #[must_use]
    pub fn alias(mut self) -> Self {
        self.is_alias = true;
        self
    }

    /// Source span, unless native
    #[must_use]
    pub fn span(&self) -> Option<&SourceSpan> {
        match &self.location {
            MethodLocation::Source(span) => Some(span),
            MethodLocation::Native => None,
        }
    }

    /// Check if method can seed a declaration search (located and not an alias)
    #[must_use]
    pub fn is_anchor_candidate(&self) -> bool {
        !self.is_alias && self.span().is_some()
    }
}

/// Kind of a module-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Instantiable type (class, struct, enum, trait)
    Class,
    /// Namespace or mixin (module, mod, namespace)
    Module,
}

impl ModuleKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Module => "module",
        }
    }
}

/// Handle on an introspected module or class
///
/// Exposes exactly what resolution needs: the name, the kind and whether it
/// is a singleton class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    qualified_name: String,
    kind: ModuleKind,
    singleton: bool,
}

impl ModuleRef {
    /// Create a handle, rejecting names that are not constant paths
    pub fn new(qualified_name: impl Into<String>, kind: ModuleKind) -> Result<Self> {
        let qualified_name = qualified_name.into();
        validate_constant_path(&qualified_name)?;
        Ok(Self {
            qualified_name,
            kind,
            singleton: false,
        })
    }

    /// Handle on a class
    pub fn class(qualified_name: impl Into<String>) -> Result<Self> {
        Self::new(qualified_name, ModuleKind::Class)
    }

    /// Handle on a module
    pub fn module(qualified_name: impl Into<String>) -> Result<Self> {
        Self::new(qualified_name, ModuleKind::Module)
    }

    /// The singleton class attached to `attached`
    #[must_use]
    pub fn singleton_of(attached: &ModuleRef) -> Self {
        Self {
            qualified_name: format!("#<Class:{}>", attached.qualified_name),
            kind: ModuleKind::Class,
            singleton: true,
        }
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Last segment of the qualified name (`Pry::Code` -> `Code`)
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit(|c| c == ':' || c == '.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// Enclosing namespace path, if the name is qualified
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        let simple = self.simple_name();
        let prefix = &self.qualified_name[..self.qualified_name.len() - simple.len()];
        let prefix = prefix.trim_end_matches([':', '.']).trim_start_matches("::");
        (!prefix.is_empty()).then_some(prefix)
    }

    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        self.kind
    }

    #[must_use]
    pub const fn is_singleton(&self) -> bool {
        self.singleton
    }
}

impl std::fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

fn validate_constant_path(name: &str) -> Result<()> {
    let path = name.strip_prefix("::").unwrap_or(name);
    if path.is_empty() {
        return Err(LocatorError::invalid_argument(format!(
            "`{name}` is not a module or class name"
        )));
    }

    for segment in path.split("::").flat_map(|part| part.split('.')) {
        let mut chars = segment.chars();
        let valid_head = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_');
        if !valid_head || !chars.all(|c| c.is_alphanumeric() || c == '_') {
            return Err(LocatorError::invalid_argument(format!(
                "`{name}` is not a module or class name"
            )));
        }
    }

    Ok(())
}
