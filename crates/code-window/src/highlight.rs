use crate::language::Language;

/// Syntax colouring collaborator used when a buffer renders with `colorize`
///
/// The buffer hands over one raw line at a time, before any line number,
/// marker or indentation prefix is added.
pub trait Highlighter {
    fn highlight(&self, text: &str, language: Language) -> String;
}

/// Highlighter that returns text unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, text: &str, _language: Language) -> String {
        text.to_string()
    }
}

impl<F> Highlighter for F
where
    F: Fn(&str, Language) -> String,
{
    fn highlight(&self, text: &str, language: Language) -> String {
        self(text, language)
    }
}
