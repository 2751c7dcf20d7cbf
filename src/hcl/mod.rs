//! Declarative configuration text.
//!
//! Only the fixed block grammar the acceptance steps use is modelled:
//!
//! ```text
//! resource "<type>" "<local_name>" {
//!   <key> = "<literal>"
//!   <key> = <type>.<local_name>.<attribute>
//! }
//! ```
//!
//! [`Document`] renders deterministically, so rendering the same inputs twice
//! yields byte-identical text. [`Document::parse`] reads the same grammar back
//! for test doubles that reconcile a configuration without a real engine.

pub mod generator;
mod lexer;
mod parser;

pub use generator::{
    INTEGRATION_RESOURCE, NAME_PREFIX, ORGANIZATION_RESOURCE, TEST_GITLAB_URL, integration_config,
    integration_document, rand_string, random_name,
};

use std::fmt;

/// Errors raised while parsing configuration text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HclError {
    #[error("Invalid character at offset {offset}")]
    InvalidCharacter { offset: usize },

    #[error("Expected {expected} at offset {offset}, found {found}")]
    UnexpectedToken {
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Unsupported block type '{kind}' at offset {offset}")]
    UnsupportedBlock { offset: usize, kind: String },

    #[error("Duplicate attribute '{key}' in {address}")]
    DuplicateAttribute { address: String, key: String },

    #[error("Duplicate resource {address}")]
    DuplicateResource { address: String },
}

/// Right-hand side of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A quoted string literal, stored unescaped
    Literal(String),
    /// An attribute path such as `snyk_organization.test.id`
    Reference(Vec<String>),
}

impl Expression {
    pub fn literal(value: impl Into<String>) -> Self {
        Expression::Literal(value.into())
    }

    /// Build a reference from a dotted path.
    pub fn reference(path: &str) -> Self {
        Expression::Reference(path.split('.').map(str::to_string).collect())
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Expression::Literal(value) => Some(value),
            Expression::Reference(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&[String]> {
        match self {
            Expression::Reference(path) => Some(path),
            Expression::Literal(_) => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "\"{}\"", escape(value)),
            Expression::Reference(path) => f.write_str(&path.join(".")),
        }
    }
}

/// `key = value` inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: Expression,
}

/// A `resource` block.
///
/// Attributes are kept in groups; a group boundary renders as a blank line
/// and `=` signs align within a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBlock {
    pub resource_type: String,
    pub name: String,
    groups: Vec<Vec<Attribute>>,
}

impl ResourceBlock {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            groups: vec![Vec::new()],
        }
    }

    /// Append an attribute to the current group.
    pub fn attribute(mut self, key: impl Into<String>, value: Expression) -> Self {
        self.push(key.into(), value);
        self
    }

    /// Start a new attribute group.
    pub fn blank_line(mut self) -> Self {
        if self.groups.last().is_some_and(|g| !g.is_empty()) {
            self.groups.push(Vec::new());
        }
        self
    }

    fn push(&mut self, key: String, value: Expression) {
        match self.groups.last_mut() {
            Some(group) => group.push(Attribute { key, value }),
            None => self.groups.push(vec![Attribute { key, value }]),
        }
    }

    /// `<type>.<name>`, the address the resource has in state.
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    pub fn get(&self, key: &str) -> Option<&Expression> {
        self.attributes()
            .find(|attribute| attribute.key == key)
            .map(|attribute| &attribute.value)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.groups.iter().flatten()
    }
}

impl fmt::Display for ResourceBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "resource \"{}\" \"{}\" {{",
            escape(&self.resource_type),
            escape(&self.name)
        )?;

        let groups: Vec<&Vec<Attribute>> = self.groups.iter().filter(|g| !g.is_empty()).collect();
        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            let width = group.iter().map(|a| a.key.len()).max().unwrap_or(0);
            for attribute in group.iter() {
                writeln!(
                    f,
                    "  {:width$} = {}",
                    attribute.key,
                    attribute.value,
                    width = width
                )?;
            }
        }

        writeln!(f, "}}")
    }
}

/// An ordered list of resource blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<ResourceBlock>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, block: ResourceBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Parse configuration text in the fixed block grammar.
    pub fn parse(source: &str) -> Result<Self, HclError> {
        parser::parse(source)
    }

    /// Find a block by its `<type>.<name>` address.
    pub fn resource(&self, address: &str) -> Option<&ResourceBlock> {
        self.blocks.iter().find(|block| block.address() == address)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

/// Escape a literal for inclusion between double quotes.
///
/// Template sequences are doubled so the engine never interpolates them.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                escaped.push(c);
                escaped.push(c);
            }
            other => escaped.push(other),
        }
    }
    escaped
}
