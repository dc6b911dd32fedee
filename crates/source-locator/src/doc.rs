use crate::config::LocatorConfig;
use crate::error::{LocatorError, Result};
use crate::files::FileProvider;
use crate::types::SourceSpan;
use context_code_window::Language;

/// Pulls the comment block that sits directly above a declaration
pub struct DocExtractor<'a> {
    files: &'a dyn FileProvider,
    config: &'a LocatorConfig,
}

impl<'a> DocExtractor<'a> {
    pub fn new(files: &'a dyn FileProvider, config: &'a LocatorConfig) -> Self {
        Self { files, config }
    }

    /// Documentation for the declaration at `span`
    ///
    /// `Ok(None)` means the declaration simply has no comment above it.
    pub fn extract_doc(&self, span: &SourceSpan) -> Result<Option<String>> {
        let lines = self.files.read_lines(span.file())?;
        let language = self.config.language_for(span.file());
        comment_above(&lines, span.start_line, language, self.config.max_doc_lines).map_err(
            |err| match err {
                LocatorError::NotFound(_) => LocatorError::not_found(format!(
                    "no line {} in {}",
                    span.start_line,
                    span.file.display()
                )),
                other => other,
            },
        )
    }
}

/// Comment block ending right above `line` (1-indexed), leaders and shared indentation removed
pub fn comment_above(
    lines: &[String],
    line: usize,
    language: Language,
    max_lines: usize,
) -> Result<Option<String>> {
    if line == 0 || line > lines.len() {
        return Err(LocatorError::not_found(format!(
            "line {line} is outside a {}-line file",
            lines.len()
        )));
    }

    let mut run: Vec<&str> = Vec::new();
    for text in lines[..line - 1].iter().rev() {
        if run.len() >= max_lines {
            break;
        }
        // Attributes sit between a Rust item and its doc comment.
        if language == Language::Rust && text.trim_start().starts_with("#[") {
            continue;
        }
        if text.trim().is_empty() || language.is_comment_line(text) {
            run.push(text);
        } else {
            break;
        }
    }

    if !run.iter().any(|text| language.is_comment_line(text)) {
        return Ok(None);
    }
    run.reverse();

    let stripped: Vec<String> = run
        .iter()
        .map(|text| {
            if text.trim().is_empty() {
                String::new()
            } else {
                language.strip_comment_leader(text)
            }
        })
        .collect();

    let indent = stripped
        .iter()
        .filter(|text| !text.trim().is_empty())
        .map(|text| leading_blanks(text))
        .min()
        .unwrap_or(0);

    let body: Vec<&str> = stripped
        .iter()
        .map(|text| &text[indent.min(leading_blanks(text))..])
        .collect();

    let first = body.iter().position(|text| !text.trim().is_empty());
    let last = body.iter().rposition(|text| !text.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Ok(None);
    };

    let mut doc = body[first..=last].join("\n");
    doc.push('\n');
    Ok(Some(doc))
}

fn leading_blanks(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t']).len()
}
