use crate::config::LocatorConfig;
use crate::declaration::DeclarationMatcher;
use crate::doc::DocExtractor;
use crate::error::{LocatorError, Result};
use crate::expression::{Expression, ExpressionBoundaryResolver, ExpressionResolver};
use crate::files::FileProvider;
use crate::introspect::MethodIntrospector;
use crate::record::ModuleRecord;
use crate::syntax::SyntaxTree;
use crate::types::{MethodRef, ModuleRef, SourceSpan};
use context_code_window::CodeBuffer;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file holding part of a module's body, with the method that anchors the search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSite {
    pub file: PathBuf,

    /// First located, non-alias method of the module in this file
    pub anchor: MethodRef,
}

impl CandidateSite {
    /// Line of the anchor method (1-indexed)
    #[must_use]
    pub fn anchor_line(&self) -> usize {
        self.anchor.span().map_or(1, |span| span.start_line)
    }
}

/// A candidate site whose declaration line was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Position in first-discovery order across files
    pub rank: usize,
    pub file: PathBuf,
    pub anchor_line: usize,
    pub declaration: SourceSpan,
}

/// Infers where a module is declared from where its methods live
pub struct SourceLocator {
    introspector: Box<dyn MethodIntrospector>,
    files: Box<dyn FileProvider>,
    config: LocatorConfig,
}

impl SourceLocator {
    /// Create locator with validated configuration
    pub fn new(
        introspector: impl MethodIntrospector + 'static,
        files: impl FileProvider + 'static,
        config: LocatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            introspector: Box::new(introspector),
            files: Box::new(files),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &LocatorConfig {
        &self.config
    }

    #[must_use]
    pub fn files(&self) -> &dyn FileProvider {
        self.files.as_ref()
    }

    /// Doc extractor sharing this locator's file provider and config
    #[must_use]
    pub fn doc_extractor(&self) -> DocExtractor<'_> {
        DocExtractor::new(self.files.as_ref(), &self.config)
    }

    /// Files holding located methods of `module`, in first-seen order
    pub fn candidate_sites(&self, module: &ModuleRef) -> Vec<CandidateSite> {
        let methods = self
            .introspector
            .declared_methods(module, self.config.include_singleton_methods);

        let mut sites: Vec<CandidateSite> = Vec::new();
        for method in methods {
            if !method.is_anchor_candidate() {
                continue;
            }
            let file = match method.span() {
                Some(span) => span.file.clone(),
                None => continue,
            };
            if sites.iter().any(|site| site.file == file) {
                continue;
            }
            sites.push(CandidateSite {
                file,
                anchor: method,
            });
        }
        sites
    }

    /// Declaration site of a record; rank 0 is cached on the record
    pub fn resolve(&self, record: &ModuleRecord, rank: usize) -> Result<SourceSpan> {
        if rank == 0 {
            return record.resolved_span(self).cloned();
        }
        self.resolve_module(record.target(), rank)
    }

    /// Declaration site of `module` in its `rank`-th candidate file, uncached
    pub fn resolve_module(&self, module: &ModuleRef, rank: usize) -> Result<SourceSpan> {
        if module.is_singleton() {
            return Err(LocatorError::invalid_argument(format!(
                "{module} is a singleton class; resolve it through a ModuleRecord for its attached class"
            )));
        }

        let sites = self.candidate_sites(module);
        if sites.is_empty() {
            return Err(LocatorError::not_found(format!(
                "{module} has no methods with discoverable source"
            )));
        }

        let site = sites
            .get(rank)
            .ok_or(LocatorError::AmbiguousCandidateIndex {
                requested: rank,
                available: sites.len(),
            })?;
        self.locate_declaration(module, site)
    }

    /// Resolve every candidate site, keeping the ones that yield a declaration
    pub fn candidates(&self, module: &ModuleRef) -> Vec<Candidate> {
        if module.is_singleton() {
            log::debug!("No candidates for singleton class {module}");
            return Vec::new();
        }

        self.candidate_sites(module)
            .iter()
            .enumerate()
            .filter_map(|(rank, site)| match self.locate_declaration(module, site) {
                Ok(declaration) => Some(Candidate {
                    rank,
                    file: site.file.clone(),
                    anchor_line: site.anchor_line(),
                    declaration,
                }),
                Err(e) => {
                    log::debug!("Skipping {} for {module}: {e}", site.file.display());
                    None
                }
            })
            .collect()
    }

    /// Find the declaration enclosing the site's anchor method
    fn locate_declaration(&self, module: &ModuleRef, site: &CandidateSite) -> Result<SourceSpan> {
        let lines = self.files.read_lines(&site.file)?;
        let language = self.config.language_for(&site.file);
        let anchor_line = site.anchor_line();
        log::debug!(
            "Locating {module} in {} from anchor {}:{anchor_line}",
            site.file.display(),
            site.anchor.name
        );

        if self.config.prefer_syntax_tree && language.supports_syntax_tree() {
            match SyntaxTree::parse(language, &lines) {
                Ok(tree) => {
                    let found = tree.enclosing_declaration(
                        language,
                        module.kind(),
                        module.simple_name(),
                        anchor_line.saturating_sub(1),
                    );
                    if let Some(line) = found {
                        log::debug!("Syntax tree puts {module} at line {line}");
                        return Ok(SourceSpan::new(site.file.clone(), line));
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Parsing {} failed, falling back to text patterns: {e}",
                        site.file.display()
                    );
                }
            }
        }

        DeclarationMatcher::new(language, module)?
            .find_before(&lines, anchor_line)
            .map(|line| SourceSpan::new(site.file.clone(), line))
            .ok_or_else(|| {
                LocatorError::not_found(format!(
                    "no declaration of {module} above line {anchor_line} of {}",
                    site.file.display()
                ))
            })
    }

    /// Source of the module's declaration, numbered from its first line
    pub fn module_source(&self, record: &ModuleRecord, rank: usize) -> Result<CodeBuffer> {
        let span = self.resolve(record, rank)?;
        self.source_at(&span)
    }

    /// Comment block above the module's declaration
    pub fn module_doc(&self, record: &ModuleRecord, rank: usize) -> Result<Option<String>> {
        let span = self.resolve(record, rank)?;
        self.doc_extractor().extract_doc(&span)
    }

    pub fn method_source(&self, method: &MethodRef) -> Result<CodeBuffer> {
        self.source_at(method_span(method)?)
    }

    pub fn method_doc(&self, method: &MethodRef) -> Result<Option<String>> {
        self.doc_extractor().extract_doc(method_span(method)?)
    }

    /// Expression opening at `line` of `path`
    pub fn expression_at(&self, path: &Path, line: usize) -> Result<Expression> {
        let lines = self.files.read_lines(path)?;
        self.expression_resolver(path)?.find_expression(&lines, line)
    }

    /// Code covered by `span`, or the expression it opens when the end is unknown
    pub fn source_at(&self, span: &SourceSpan) -> Result<CodeBuffer> {
        let lines = self.files.read_lines(span.file())?;
        let language = self.config.language_for(span.file());

        match span.end_line {
            Some(end) => {
                if span.start_line == 0 || span.start_line > end || end > lines.len() {
                    return Err(LocatorError::not_found(format!(
                        "{span} is outside a {}-line file",
                        lines.len()
                    )));
                }
                Ok(CodeBuffer::from_lines(
                    &lines[span.start_line - 1..end],
                    span.start_line,
                    language,
                ))
            }
            None => Ok(self
                .expression_resolver(span.file())?
                .find_expression(&lines, span.start_line)?
                .into_buffer(language)),
        }
    }

    fn expression_resolver(&self, path: &Path) -> Result<ExpressionResolver> {
        ExpressionResolver::for_language(
            self.config.language_for(path),
            self.config.prefer_syntax_tree,
        )
    }
}

fn method_span(method: &MethodRef) -> Result<&SourceSpan> {
    method.span().ok_or_else(|| {
        LocatorError::not_found(format!(
            "{}#{} is native and has no source",
            method.owner, method.name
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::MethodTable;
    use std::collections::HashMap;

    /// In-memory files keyed by path
    #[derive(Default)]
    struct MemoryFiles(HashMap<PathBuf, Vec<String>>);

    impl MemoryFiles {
        fn with(mut self, path: &str, code: &str) -> Self {
            self.0
                .insert(PathBuf::from(path), code.lines().map(str::to_string).collect());
            self
        }
    }

    impl FileProvider for MemoryFiles {
        fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
            self.0.get(path).cloned().ok_or_else(|| {
                LocatorError::unreadable(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                )
            })
        }
    }

    fn foo() -> ModuleRef {
        ModuleRef::class("Foo").unwrap()
    }

    #[test]
    fn test_candidate_sites_group_by_file() {
        let foo = foo();
        let table = MethodTable::new()
            .with_instance_method(&foo, MethodRef::native("Foo", "hash"))
            .with_instance_method(
                &foo,
                MethodRef::new("Foo", "a", SourceSpan::new("b.rb", 7)).alias(),
            )
            .with_instance_method(&foo, MethodRef::new("Foo", "b", SourceSpan::new("a.rb", 3)))
            .with_instance_method(&foo, MethodRef::new("Foo", "c", SourceSpan::new("b.rb", 9)))
            .with_instance_method(&foo, MethodRef::new("Foo", "d", SourceSpan::new("a.rb", 5)));
        let locator =
            SourceLocator::new(table, MemoryFiles::default(), LocatorConfig::default()).unwrap();

        let sites = locator.candidate_sites(&foo);
        let summary: Vec<_> = sites
            .iter()
            .map(|site| {
                (
                    site.file.to_str().unwrap(),
                    site.anchor.name.as_str(),
                    site.anchor_line(),
                )
            })
            .collect();
        assert_eq!(summary, vec![("a.rb", "b", 3), ("b.rb", "c", 9)]);
    }

    #[test]
    fn test_singleton_methods_follow_config() {
        let foo = foo();
        let table = MethodTable::new().with_singleton_method(
            &foo,
            MethodRef::new("Foo", "build", SourceSpan::new("f.rb", 2)),
        );
        let files = MemoryFiles::default().with("f.rb", "class Foo\n  def self.build; end\nend\n");

        let config = LocatorConfig {
            include_singleton_methods: false,
            ..Default::default()
        };
        let locator = SourceLocator::new(table.clone(), MemoryFiles::default(), config).unwrap();
        assert!(locator.candidate_sites(&foo).is_empty());

        let locator = SourceLocator::new(table, files, LocatorConfig::default()).unwrap();
        assert_eq!(locator.resolve_module(&foo, 0).unwrap(), SourceSpan::new("f.rb", 1));
    }

    #[test]
    fn test_rank_errors() {
        let foo = foo();
        let table = MethodTable::new()
            .with_instance_method(&foo, MethodRef::new("Foo", "a", SourceSpan::new("f.rb", 2)));
        let files = MemoryFiles::default().with("f.rb", "class Foo\n  def a; end\nend\n");
        let locator = SourceLocator::new(table, files, LocatorConfig::default()).unwrap();

        let err = locator.resolve_module(&foo, 1).unwrap_err();
        assert!(matches!(
            err,
            LocatorError::AmbiguousCandidateIndex {
                requested: 1,
                available: 1
            }
        ));

        let bar = ModuleRef::class("Bar").unwrap();
        assert!(matches!(
            locator.resolve_module(&bar, 3),
            Err(LocatorError::NotFound(_))
        ));
        assert!(matches!(
            locator.resolve_module(&ModuleRef::singleton_of(&foo), 0),
            Err(LocatorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unreadable_candidate_is_skipped_in_candidates() {
        let foo = foo();
        let table = MethodTable::new()
            .with_instance_method(&foo, MethodRef::new("Foo", "a", SourceSpan::new("gone.rb", 2)))
            .with_instance_method(&foo, MethodRef::new("Foo", "b", SourceSpan::new("f.rb", 3)));
        let files = MemoryFiles::default().with("f.rb", "# Foo\nclass Foo\n  def b; end\nend\n");
        let locator = SourceLocator::new(table, files, LocatorConfig::default()).unwrap();

        let candidates = locator.candidates(&foo);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].rank, 1);
        assert_eq!(candidates[0].declaration, SourceSpan::new("f.rb", 2));
        assert!(matches!(
            locator.resolve_module(&foo, 0),
            Err(LocatorError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_method_source_and_doc() {
        let foo = foo();
        let code = "class Foo\n  # Adds one.\n  def inc(x)\n    x + 1\n  end\nend\n";
        let files = MemoryFiles::default().with("f.rb", code);
        let locator =
            SourceLocator::new(MethodTable::new(), files, LocatorConfig::default()).unwrap();
        let inc = MethodRef::new(foo.qualified_name(), "inc", SourceSpan::new("f.rb", 3));

        let source = locator.method_source(&inc).unwrap();
        assert_eq!(source.raw_text(), "  def inc(x)\n    x + 1\n  end\n");
        assert_eq!(source.first_line_number(), Some(3));
        assert_eq!(locator.method_doc(&inc).unwrap().as_deref(), Some("Adds one.\n"));

        let native = MethodRef::native("Foo", "hash");
        assert!(matches!(
            locator.method_source(&native),
            Err(LocatorError::NotFound(_))
        ));
    }

    #[test]
    fn test_source_at_known_end_slices_lines() {
        let files = MemoryFiles::default().with("f.rb", "a\nb\nc\nd\n");
        let locator =
            SourceLocator::new(MethodTable::new(), files, LocatorConfig::default()).unwrap();
        let buffer = locator.source_at(&SourceSpan::with_end("f.rb", 2, 3)).unwrap();
        assert_eq!(buffer.raw_text(), "b\nc\n");
        assert!(locator.source_at(&SourceSpan::with_end("f.rb", 3, 9)).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LocatorConfig {
            max_doc_lines: 0,
            ..Default::default()
        };
        assert!(matches!(
            SourceLocator::new(MethodTable::new(), MemoryFiles::default(), config),
            Err(LocatorError::InvalidConfig(_))
        ));
    }
}
