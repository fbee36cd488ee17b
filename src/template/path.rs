//! Template compilation and rendering.
//!
//! Placeholders use the text-template form `{{.Name}}`. The leading dot and
//! surrounding whitespace are optional. Recognized names are
//! `ClientServiceName`, `ServerServiceName` and `Category`.

use std::fmt;

use thiserror::Error;

use crate::policy::Category;

/// Error produced while compiling or rendering a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },

    #[error("unexpected '}}}}' at byte {offset}")]
    StrayClose { offset: usize },

    #[error("unknown placeholder '{0}'")]
    UnknownPlaceholder(String),

    #[error("placeholder {0} has no value")]
    EmptyValue(Field),
}

/// A substitutable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ClientServiceName,
    ServerServiceName,
    Category,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::ClientServiceName => "ClientServiceName",
            Field::ServerServiceName => "ServerServiceName",
            Field::Category => "Category",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ClientServiceName" => Some(Field::ClientServiceName),
            "ServerServiceName" => Some(Field::ServerServiceName),
            "Category" => Some(Field::Category),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct PathValues<'a> {
    pub client_service_name: &'a str,
    pub server_service_name: &'a str,
    pub category: Category,
}

impl PathValues<'_> {
    fn lookup(&self, field: Field) -> &str {
        match field {
            Field::ClientServiceName => self.client_service_name,
            Field::ServerServiceName => self.server_service_name,
            Field::Category => self.category.as_str(),
        }
    }
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template string.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            push_literal(&mut segments, &rest[..open], offset)?;

            let body = &rest[open + 2..];
            let close = body
                .find("}}")
                .ok_or(TemplateError::Unterminated { offset: offset + open })?;
            let inner = body[..close].trim();
            let name = inner.strip_prefix('.').unwrap_or(inner);
            let field = Field::from_name(name)
                .ok_or_else(|| TemplateError::UnknownPlaceholder(inner.to_string()))?;
            segments.push(Segment::Field(field));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        push_literal(&mut segments, rest, offset)?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Template text as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the template references `field`.
    pub fn uses(&self, field: Field) -> bool {
        self.segments.iter().any(|s| *s == Segment::Field(field))
    }

    /// Substitute `values` into the template.
    pub fn render(&self, values: &PathValues<'_>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    let value = values.lookup(*field);
                    if value.is_empty() {
                        return Err(TemplateError::EmptyValue(*field));
                    }
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str, offset: usize) -> Result<(), TemplateError> {
    if let Some(pos) = text.find("}}") {
        return Err(TemplateError::StrayClose { offset: offset + pos });
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

/// Compile `template` and render it with the names carried by `values`.
pub fn render(template: &str, values: &PathValues<'_>) -> Result<String, TemplateError> {
    PathTemplate::parse(template)?.render(values)
}
