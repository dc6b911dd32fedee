//! # Context Source Locator
//!
//! Finds where a class or module is declared when the runtime only knows where
//! its methods are defined, then pulls the documentation and source around it.
//!
//! ## Architecture
//!
//! ```text
//! ModuleRef
//!     │
//!     ├──> MethodIntrospector → declared methods (span | native, alias flag)
//!     │
//!     ├──> Candidate sites: one per file, first-seen order
//!     │
//!     ├──> Declaration lookup (per site)
//!     │    ├─> Tree-sitter: closest enclosing declaration node
//!     │    └─> Fallback: backward text scan from the anchor method
//!     │
//!     └──> ModuleRecord caches
//!          ├─> resolved span
//!          ├─> doc (DocExtractor)
//!          └─> source (ExpressionBoundaryResolver → CodeBuffer)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_source_locator::{
//!     FsFileProvider, LocatorConfig, MethodRef, MethodTable, ModuleRecord, ModuleRef,
//!     SourceLocator, SourceSpan, DEFAULT_SESSION_PATH,
//! };
//!
//! let greeter = ModuleRef::class("Greeter").unwrap();
//! let table = MethodTable::new().with_instance_method(
//!     &greeter,
//!     MethodRef::new("Greeter", "hello", SourceSpan::new(DEFAULT_SESSION_PATH, 3)),
//! );
//!
//! let mut files = FsFileProvider::new();
//! files.set_session_input([
//!     "# Says hello.",
//!     "class Greeter",
//!     "  def hello",
//!     "    :hi",
//!     "  end",
//!     "end",
//! ]);
//!
//! let locator = SourceLocator::new(table, files, LocatorConfig::default()).unwrap();
//! let record = ModuleRecord::new(greeter).unwrap();
//!
//! assert_eq!(locator.resolve(&record, 0).unwrap().start_line, 2);
//! assert_eq!(record.doc(&locator).unwrap(), Some("Says hello.\n"));
//! ```

mod config;
mod declaration;
mod doc;
mod error;
mod expression;
mod files;
mod introspect;
mod locator;
mod record;
mod syntax;
mod types;

pub use config::LocatorConfig;
pub use declaration::DeclarationMatcher;
pub use doc::{comment_above, DocExtractor};
pub use error::{LocatorError, Result};
pub use expression::{
    BlockScanResolver, BlockStyle, Expression, ExpressionBoundaryResolver, ExpressionResolver,
    SyntaxTreeResolver,
};
pub use files::{FileProvider, FsFileProvider, DEFAULT_SESSION_PATH};
pub use introspect::{MethodIntrospector, MethodTable};
pub use locator::{Candidate, CandidateSite, SourceLocator};
pub use record::ModuleRecord;
pub use types::{MethodLocation, MethodRef, ModuleKind, ModuleRef, SourceSpan};

pub use context_code_window::{CodeBuffer, Language};
