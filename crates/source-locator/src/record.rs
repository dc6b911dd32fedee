use crate::error::{LocatorError, Result};
use crate::locator::SourceLocator;
use crate::types::{ModuleRef, SourceSpan};
use context_code_window::CodeBuffer;
use once_cell::unsync::OnceCell;

/// A module under inspection, with its lookups memoized
///
/// Caches live as long as the record. Call [`ModuleRecord::refresh`] after
/// the underlying source changes.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    module: ModuleRef,
    attached: Option<ModuleRef>,
    resolved_span: OnceCell<SourceSpan>,
    doc: OnceCell<Option<String>>,
    source: OnceCell<CodeBuffer>,
}

impl ModuleRecord {
    /// Record for an ordinary class or module
    pub fn new(module: ModuleRef) -> Result<Self> {
        if module.is_singleton() {
            return Err(LocatorError::invalid_argument(format!(
                "{module} is a singleton class; use ModuleRecord::for_singleton"
            )));
        }
        Ok(Self::with_parts(module, None))
    }

    /// Record for the singleton class of `attached`
    pub fn for_singleton(attached: ModuleRef) -> Result<Self> {
        if attached.is_singleton() {
            return Err(LocatorError::invalid_argument(format!(
                "{attached} is itself a singleton class"
            )));
        }
        Ok(Self::with_parts(ModuleRef::singleton_of(&attached), Some(attached)))
    }

    fn with_parts(module: ModuleRef, attached: Option<ModuleRef>) -> Self {
        Self {
            module,
            attached,
            resolved_span: OnceCell::new(),
            doc: OnceCell::new(),
            source: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn module(&self) -> &ModuleRef {
        &self.module
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        self.module.qualified_name()
    }

    #[must_use]
    pub const fn is_singleton(&self) -> bool {
        self.module.is_singleton()
    }

    #[must_use]
    pub const fn attached(&self) -> Option<&ModuleRef> {
        self.attached.as_ref()
    }

    /// Module whose declaration stands for this record
    #[must_use]
    pub fn target(&self) -> &ModuleRef {
        self.attached.as_ref().unwrap_or(&self.module)
    }

    /// Declaration site in the first candidate file
    pub fn resolved_span(&self, locator: &SourceLocator) -> Result<&SourceSpan> {
        self.resolved_span
            .get_or_try_init(|| locator.resolve_module(self.target(), 0))
    }

    /// Comment block above the declaration
    pub fn doc(&self, locator: &SourceLocator) -> Result<Option<&str>> {
        self.doc
            .get_or_try_init(|| {
                let span = self.resolved_span(locator)?;
                locator.doc_extractor().extract_doc(span)
            })
            .map(Option::as_deref)
    }

    /// Declaration source, numbered from the declaration line
    pub fn source(&self, locator: &SourceLocator) -> Result<&CodeBuffer> {
        self.source.get_or_try_init(|| {
            let span = self.resolved_span(locator)?;
            locator.source_at(span)
        })
    }

    /// Check if the declaration site has been looked up
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved_span.get().is_some()
    }

    /// Drop every cached lookup
    pub fn refresh(&mut self) {
        self.resolved_span.take();
        self.doc.take();
        self.source.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_record_targets_attached_class() {
        let foo = ModuleRef::class("Foo").unwrap();
        let record = ModuleRecord::for_singleton(foo.clone()).unwrap();
        assert!(record.is_singleton());
        assert_eq!(record.qualified_name(), "#<Class:Foo>");
        assert_eq!(record.target(), &foo);
        assert_eq!(record.attached(), Some(&foo));
    }

    #[test]
    fn test_record_construction_checks_singleton_flag() {
        let foo = ModuleRef::class("Foo").unwrap();
        let singleton = ModuleRef::singleton_of(&foo);
        assert!(ModuleRecord::new(singleton.clone()).is_err());
        assert!(ModuleRecord::for_singleton(singleton).is_err());

        let record = ModuleRecord::new(foo.clone()).unwrap();
        assert_eq!(record.target(), &foo);
        assert!(!record.is_resolved());
    }
}
