//! Word list parser.
//!
//! # Format
//! ```markdown
//! T: ephemeral
//! D: lasting for a very short time
//! C: Fame on social media is often ephemeral.
//!
//! T: laconic
//! D: using very few words
//! ```
//!
//! `C:` is optional. Field text may continue over consecutive lines; a blank
//! line ends it. Any other line outside a field (headings, notes) is ignored.

use crate::error::{ParseError, Result};
use crate::types::RawTerm;

/// Parse a word list into raw terms.
pub fn parse(content: &str) -> Result<Vec<RawTerm>> {
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut parser = Parser::new();
    for (idx, line) in content.lines().enumerate() {
        parser.feed(line, idx + 1)?;
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Term,
    Definition,
    Context,
}

struct TermBuilder {
    content: Option<String>,
    definition: Option<String>,
    context: Option<String>,
    start_line: usize,
}

impl TermBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            content: None,
            definition: None,
            context: None,
            start_line,
        }
    }

    fn build(self) -> Result<RawTerm> {
        let content = non_empty(self.content).ok_or(ParseError::MissingTerm {
            line: self.start_line,
        })?;
        let definition = non_empty(self.definition).ok_or(ParseError::MissingDefinition {
            line: self.start_line,
        })?;

        Ok(RawTerm {
            content,
            definition,
            context: non_empty(self.context),
            line_number: self.start_line,
        })
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

struct Parser {
    terms: Vec<RawTerm>,
    current: Option<TermBuilder>,
    open_field: Option<Field>,
    pending: Vec<String>,
}

impl Parser {
    fn new() -> Self {
        Self {
            terms: Vec::new(),
            current: None,
            open_field: None,
            pending: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str, line_num: usize) -> Result<()> {
        match Self::classify(line) {
            Line::Field(Field::Term, text) => {
                self.finish_current()?;
                self.current = Some(TermBuilder::new(line_num));
                self.start_field(Field::Term, text);
            }
            Line::Field(field, text) => {
                if self.current.is_none() {
                    return Err(ParseError::MissingTerm { line: line_num });
                }
                self.start_field(field, text);
            }
            Line::Text(text) => {
                if self.open_field.is_some() {
                    self.pending.push(text.to_string());
                }
            }
            // A blank line closes the open field; text after it belongs to no term.
            Line::Empty => {
                self.commit_field();
                self.open_field = None;
            }
        }
        Ok(())
    }

    fn classify(line: &str) -> Line<'_> {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("T:") {
            Line::Field(Field::Term, rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("D:") {
            Line::Field(Field::Definition, rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("C:") {
            Line::Field(Field::Context, rest.trim())
        } else if trimmed.is_empty() {
            Line::Empty
        } else {
            Line::Text(line)
        }
    }

    fn start_field(&mut self, field: Field, text: &str) {
        self.commit_field();
        self.open_field = Some(field);
        self.pending.push(text.to_string());
    }

    fn commit_field(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let text = self.pending.join("\n");
        self.pending.clear();

        if let Some(term) = self.current.as_mut() {
            match self.open_field {
                Some(Field::Term) => term.content = Some(text),
                Some(Field::Definition) => term.definition = Some(text),
                Some(Field::Context) => term.context = Some(text),
                None => {}
            }
        }
    }

    fn finish_current(&mut self) -> Result<()> {
        self.commit_field();
        self.open_field = None;
        if let Some(term) = self.current.take() {
            self.terms.push(term.build()?);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<RawTerm>> {
        self.finish_current()?;
        Ok(self.terms)
    }
}

enum Line<'a> {
    Field(Field, &'a str),
    Text(&'a str),
    Empty,
}
