use crate::error::{LocatorError, Result};
use crate::syntax::SyntaxTree;
use crate::types::SourceSpan;
use context_code_window::{CodeBuffer, Language};
use regex::Regex;
use std::path::Path;

/// Smallest complete unit of code starting at a given line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub text: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,
}

impl Expression {
    fn from_lines(lines: &[String], start_line: usize, end_line: usize) -> Self {
        Self {
            text: lines[start_line - 1..end_line].join("\n"),
            start_line,
            end_line,
        }
    }

    /// Wrap the text in a buffer numbered from the expression's first line
    pub fn into_buffer(self, kind: Language) -> CodeBuffer {
        CodeBuffer::from_text(&self.text, self.start_line, kind)
    }

    /// Span covering the expression in `file`
    pub fn span(&self, file: impl AsRef<Path>) -> SourceSpan {
        SourceSpan::with_end(file.as_ref(), self.start_line, self.end_line)
    }

    /// Get the number of lines in this expression
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Finds where the unit of code opened on a line ends
pub trait ExpressionBoundaryResolver {
    /// The expression starting at `start_line` (1-indexed) of `lines`
    fn find_expression(&self, lines: &[String], start_line: usize) -> Result<Expression>;
}

/// Resolver backed by a tree-sitter grammar
#[derive(Debug, Clone, Copy)]
pub struct SyntaxTreeResolver {
    language: Language,
}

impl SyntaxTreeResolver {
    pub fn new(language: Language) -> Result<Self> {
        if !language.supports_syntax_tree() {
            return Err(LocatorError::tree_sitter(format!(
                "no grammar for {}",
                language.as_str()
            )));
        }
        Ok(Self { language })
    }
}

impl ExpressionBoundaryResolver for SyntaxTreeResolver {
    fn find_expression(&self, lines: &[String], start_line: usize) -> Result<Expression> {
        let opening = opening_line(lines, start_line, self.language)?;
        let tree = SyntaxTree::parse(self.language, lines)?;

        let row = start_line - 1;
        let column = opening.len() - opening.trim_start().len();
        let node = tree
            .unit_starting_at(row, column)
            .filter(|node| !node.kind().contains("comment") && !node.has_error())
            .ok_or_else(|| {
                LocatorError::not_found(format!(
                    "line {start_line} does not open a complete {} expression",
                    self.language.as_str()
                ))
            })?;

        let end = node.end_position();
        // A node ending at column 0 stops at the previous line's newline.
        let end_row = if end.column == 0 && end.row > row {
            end.row - 1
        } else {
            end.row
        };

        Ok(Expression::from_lines(lines, start_line, (end_row + 1).min(lines.len())))
    }
}

/// How a block scanner recognises nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// `class`/`def`/`do` ... `end` keywords plus brackets (Ruby)
    Keywords,
    /// Curly braces, brackets and parentheses (C-like languages)
    Braces,
}

/// Textual resolver that balances block keywords and brackets line by line
#[derive(Debug, Clone)]
pub struct BlockScanResolver {
    style: BlockStyle,
    language: Language,
    keywords: Regex,
    endless_def: Regex,
}

impl BlockScanResolver {
    pub fn new(language: Language) -> Result<Self> {
        let style = if language == Language::Ruby {
            BlockStyle::Keywords
        } else {
            BlockStyle::Braces
        };

        let keywords = Regex::new(
            r"\b(?:class|module|def|if|unless|while|until|case|begin|for|do|end)\b|[{}()\[\]]",
        )
        .map_err(|err| LocatorError::invalid_argument(err.to_string()))?;
        let endless_def = Regex::new(r"^\s*def\s+[\w.]+[?!]?\s*(?:\([^)]*\))?\s*=[^=~>]")
            .map_err(|err| LocatorError::invalid_argument(err.to_string()))?;

        Ok(Self {
            style,
            language,
            keywords,
            endless_def,
        })
    }

    #[must_use]
    pub const fn style(&self) -> BlockStyle {
        self.style
    }

    /// Net nesting change of one line: (keyword blocks, brackets, saw an opening brace)
    fn line_delta(&self, line: &str) -> (i64, i64, bool) {
        let code = match self.style {
            BlockStyle::Keywords => strip_ruby_noise(line),
            BlockStyle::Braces => strip_c_noise(line),
        };

        let mut blocks = 0i64;
        let mut brackets = 0i64;
        let mut opened_brace = false;
        let mut loop_on_line = false;

        for found in self.keywords.find_iter(&code) {
            let token = found.as_str();
            match token {
                "{" | "(" | "[" => {
                    brackets += 1;
                    opened_brace |= token == "{";
                }
                "}" | ")" | "]" => brackets -= 1,
                _ if self.style == BlockStyle::Braces => {}
                _ => {
                    let before = &code[..found.start()];
                    let after = &code[found.end()..];
                    // Method calls (`x.end`), symbols (`:class`) and hash keys (`if:`).
                    if before.ends_with('.')
                        || (before.ends_with(':') && !before.ends_with("::"))
                        || (after.starts_with(':') && !after.starts_with("::"))
                    {
                        continue;
                    }

                    match token {
                        "end" => blocks -= 1,
                        "do" => {
                            if !loop_on_line {
                                blocks += 1;
                            }
                        }
                        "def" => {
                            if !self.endless_def.is_match(&code[found.start()..]) {
                                blocks += 1;
                            }
                        }
                        "if" | "unless" | "while" | "until" | "for" => {
                            if starts_statement(before) {
                                blocks += 1;
                                loop_on_line |= matches!(token, "while" | "until" | "for");
                            }
                        }
                        _ => blocks += 1,
                    }
                }
            }
        }

        (blocks, brackets, opened_brace)
    }
}

impl ExpressionBoundaryResolver for BlockScanResolver {
    fn find_expression(&self, lines: &[String], start_line: usize) -> Result<Expression> {
        opening_line(lines, start_line, self.language)?;

        let mut blocks = 0i64;
        let mut brackets = 0i64;
        let mut seen_brace = false;

        for (idx, line) in lines.iter().enumerate().skip(start_line - 1) {
            let (block_delta, bracket_delta, opened_brace) = self.line_delta(line);
            blocks += block_delta;
            brackets += bracket_delta;
            seen_brace |= opened_brace;

            if blocks < 0 || brackets < 0 {
                break;
            }
            if blocks > 0 || brackets > 0 {
                continue;
            }

            // A C-like signature is not complete until its body or terminator shows up.
            if self.style == BlockStyle::Braces && !seen_brace {
                let code = strip_c_noise(line);
                let trimmed = code.trim_end();
                if !(trimmed.ends_with(';') || trimmed.ends_with('}')) && idx + 1 < lines.len() {
                    continue;
                }
            }

            return Ok(Expression::from_lines(lines, start_line, idx + 1));
        }

        Err(LocatorError::not_found(format!(
            "no complete expression starts at line {start_line}"
        )))
    }
}

/// Picks the syntax-aware resolver when a grammar exists, the block scanner otherwise
#[derive(Debug, Clone)]
pub enum ExpressionResolver {
    SyntaxTree(SyntaxTreeResolver),
    BlockScan(BlockScanResolver),
}

impl ExpressionResolver {
    pub fn for_language(language: Language, prefer_syntax_tree: bool) -> Result<Self> {
        if prefer_syntax_tree && language.supports_syntax_tree() {
            return Ok(Self::SyntaxTree(SyntaxTreeResolver::new(language)?));
        }
        Ok(Self::BlockScan(BlockScanResolver::new(language)?))
    }
}

impl ExpressionBoundaryResolver for ExpressionResolver {
    fn find_expression(&self, lines: &[String], start_line: usize) -> Result<Expression> {
        match self {
            Self::SyntaxTree(resolver) => resolver.find_expression(lines, start_line),
            Self::BlockScan(resolver) => resolver.find_expression(lines, start_line),
        }
    }
}

fn opening_line<'l>(lines: &'l [String], start_line: usize, language: Language) -> Result<&'l str> {
    if start_line == 0 || start_line > lines.len() {
        return Err(LocatorError::not_found(format!(
            "line {start_line} is outside a {}-line file",
            lines.len()
        )));
    }

    let line = lines[start_line - 1].as_str();
    if line.trim().is_empty() || language.is_comment_line(line) {
        return Err(LocatorError::not_found(format!(
            "line {start_line} is blank or a comment"
        )));
    }
    Ok(line)
}

fn starts_statement(before: &str) -> bool {
    let before = before.trim_end();
    if before.is_empty() || before.ends_with(['=', '(', ',', ';', '|', '&', '[', '{']) {
        return true;
    }

    // `!` and `?` only lead a statement as standalone operators, not as `save!` or `valid?`.
    let mut tail = before.chars().rev();
    if let Some('!' | '?') = tail.next() {
        return tail.next().map_or(true, char::is_whitespace);
    }

    matches!(
        before.rsplit(|c: char| c.is_whitespace() || c == ';').next(),
        Some("then" | "else" | "do")
    )
}

/// Drop string literals and the trailing `#` comment of a Ruby line
fn strip_ruby_noise(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in line.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                    out.push(c);
                }
            }
            None => match c {
                '"' | '\'' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                '#' => break,
                _ => out.push(c),
            },
        }
    }
    out
}

/// Drop double-quoted strings and comments from a C-like line
fn strip_c_noise(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                out.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            _ => out.push(c),
        }
    }
    out
}
