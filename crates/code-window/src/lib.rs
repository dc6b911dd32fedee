//! # Context Code Window
//!
//! Line-number-preserving code buffers for displaying slices of source files.
//!
//! ## Model
//!
//! A [`CodeBuffer`] is an ordered list of [`LineEntry`] values. Each entry keeps
//! the line number it had when the buffer was created, so any window cut from
//! a file still reports the file's own numbering:
//!
//! ```text
//! file lines ──> CodeBuffer ──> between / around / grep / take_lines
//!                                   │
//!                                   └──> with_line_numbers / with_marker /
//!                                        with_indentation / colorize ──> render()
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_code_window::{CodeBuffer, Language};
//!
//! let code = CodeBuffer::from_text("def foo\n  1\nend\n", 10, Language::Ruby);
//! let body = code.between(11, 11);
//! assert_eq!(body.raw_text(), "  1\n");
//!
//! let listing = code.with_line_numbers(true).with_marker(11);
//! print!("{listing}");
//! ```

mod buffer;
mod config;
mod error;
mod highlight;
mod language;
mod types;

pub use buffer::CodeBuffer;
pub use config::Formatting;
pub use error::{Result, WindowError};
pub use highlight::{Highlighter, PlainHighlighter};
pub use language::Language;
pub use types::LineEntry;
