//! Template compilation and rendering.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};
use std::sync::Arc;

use thiserror::Error;

use crate::event::LogEvent;
use crate::layout::renderer::{RawOption, Renderer};

/// Layout used by targets that do not configure one.
pub const DEFAULT_LAYOUT: &str = "${longdate}|${level:uppercase=true}|${logger}|${message}";

/// Errors raised while compiling a template string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateSyntaxError {
    #[error("unterminated placeholder starting at offset {position}")]
    Unterminated { position: usize },

    #[error("placeholder at offset {position} has no renderer name")]
    EmptyName { position: usize },

    #[error("nested placeholder at offset {position} is not supported")]
    Nested { position: usize },

    #[error("invalid value '{value}' for option '{option}' of renderer '{renderer}' at offset {position}")]
    InvalidOption {
        renderer: String,
        option: String,
        value: String,
        position: usize,
    },
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Placeholder(Renderer),
}

/// A compiled output template.
///
/// Cloning is cheap and shares the compiled segments.
#[derive(Debug, Clone)]
pub struct Template {
    source: Arc<str>,
    segments: Arc<[Segment]>,
}

impl Template {
    /// Compile a format string.
    pub fn compile(source: &str) -> Result<Self, TemplateSyntaxError> {
        let segments = parse(source)?;
        Ok(Self {
            source: Arc::from(source),
            segments: segments.into(),
        })
    }

    /// Render the event into a new string.
    pub fn render(&self, event: &LogEvent) -> String {
        let mut out = String::with_capacity(self.source.len() + event.message.len());
        self.render_into(event, &mut out);
        out
    }

    /// Append the rendered event to `out`.
    pub fn render_into(&self, event: &LogEvent, out: &mut String) {
        for segment in self.segments.iter() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(renderer) => renderer.render(event, out),
            }
        }
    }

    /// The format string this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::compile(DEFAULT_LAYOUT).unwrap_or_else(|_| Self {
            source: Arc::from(""),
            segments: Arc::from(Vec::new()),
        })
    }
}

impl FromStr for Template {
    type Err = TemplateSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse(source: &str) -> Result<Vec<Segment>, TemplateSyntaxError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c == '$' && matches!(chars.peek(), Some((_, '{'))) {
            chars.next();
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let renderer = parse_placeholder(&mut chars, position)?;
            segments.push(Segment::Placeholder(renderer));
        } else {
            literal.push(c);
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Parse the body of a placeholder; `chars` is positioned just after `${`.
fn parse_placeholder(
    chars: &mut Peekable<CharIndices<'_>>,
    start: usize,
) -> Result<Renderer, TemplateSyntaxError> {
    let mut name: Option<String> = None;
    let mut options = Vec::new();
    let mut current = String::new();
    let mut key: Option<String> = None;

    loop {
        let Some((position, c)) = chars.next() else {
            return Err(TemplateSyntaxError::Unterminated { position: start });
        };

        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => current.push(escaped),
                None => return Err(TemplateSyntaxError::Unterminated { position: start }),
            },
            '$' if matches!(chars.peek(), Some((_, '{'))) => {
                return Err(TemplateSyntaxError::Nested { position });
            }
            '}' | ':' | ',' => {
                if name.is_none() {
                    let trimmed = current.trim();
                    if trimmed.is_empty() {
                        return Err(TemplateSyntaxError::EmptyName { position: start });
                    }
                    name = Some(trimmed.to_string());
                } else if let Some(k) = key.take() {
                    options.push(RawOption {
                        key: k.trim().to_string(),
                        value: Some(current.clone()),
                    });
                } else if !current.trim().is_empty() {
                    options.push(RawOption {
                        key: current.trim().to_string(),
                        value: None,
                    });
                }
                current.clear();

                if c == '}' {
                    break;
                }
            }
            '=' if name.is_some() && key.is_none() => {
                key = Some(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    // The loop only exits through '}', which always sets the name first.
    let name = name.unwrap_or_default();
    Renderer::build(&name, options, start)
}
