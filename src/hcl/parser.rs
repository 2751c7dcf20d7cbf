//! Recursive-descent parser for the fixed block grammar.
//!
//! ```text
//! document   := block*
//! block      := "resource" STRING STRING "{" attribute* "}"
//! attribute  := IDENT "=" expression
//! expression := STRING | IDENT ("." IDENT)*
//! ```

use super::lexer::Token;
use super::{Document, Expression, HclError, ResourceBlock};
use logos::Logos;
use std::collections::HashSet;

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

pub(crate) fn parse(source: &str) -> Result<Document, HclError> {
    let mut tokens = Vec::new();
    for (token, span) in Token::lexer(source).spanned() {
        match token {
            Ok(token) => tokens.push((token, span.start)),
            Err(()) => return Err(HclError::InvalidCharacter { offset: span.start }),
        }
    }

    Parser {
        tokens,
        position: 0,
    }
    .document()
}

impl Parser {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.position)
    }

    fn next(&mut self, expected: &str) -> Result<(Token, usize), HclError> {
        let item = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| HclError::UnexpectedEof {
                expected: expected.to_string(),
            })?;
        self.position += 1;
        Ok(item)
    }

    fn expect(&mut self, want: Token, expected: &str) -> Result<usize, HclError> {
        let (token, offset) = self.next(expected)?;
        if token == want {
            Ok(offset)
        } else {
            Err(unexpected(offset, expected, &token))
        }
    }

    fn string(&mut self, expected: &str) -> Result<String, HclError> {
        match self.next(expected)? {
            (Token::Str(value), _) => Ok(value),
            (other, offset) => Err(unexpected(offset, expected, &other)),
        }
    }

    fn ident(&mut self, expected: &str) -> Result<(String, usize), HclError> {
        match self.next(expected)? {
            (Token::Ident(name), offset) => Ok((name, offset)),
            (other, offset) => Err(unexpected(offset, expected, &other)),
        }
    }

    fn document(mut self) -> Result<Document, HclError> {
        let mut document = Document::new();
        let mut addresses = HashSet::new();

        while self.peek().is_some() {
            let block = self.block()?;
            let address = block.address();
            if !addresses.insert(address.clone()) {
                return Err(HclError::DuplicateResource { address });
            }
            document.blocks.push(block);
        }

        Ok(document)
    }

    fn block(&mut self) -> Result<ResourceBlock, HclError> {
        let (kind, offset) = self.ident("block type")?;
        if kind != "resource" {
            return Err(HclError::UnsupportedBlock { offset, kind });
        }

        let resource_type = self.string("resource type")?;
        let name = self.string("resource name")?;
        self.expect(Token::LeftBrace, "'{'")?;

        let mut block = ResourceBlock::new(resource_type, name);
        loop {
            match self.peek() {
                Some((Token::RightBrace, _)) => {
                    self.position += 1;
                    return Ok(block);
                }
                Some(_) => {
                    let (key, _) = self.ident("attribute name or '}'")?;
                    self.expect(Token::Equals, "'='")?;
                    let value = self.expression()?;
                    if block.get(&key).is_some() {
                        return Err(HclError::DuplicateAttribute {
                            address: block.address(),
                            key,
                        });
                    }
                    block = block.attribute(key, value);
                }
                None => {
                    return Err(HclError::UnexpectedEof {
                        expected: "'}'".to_string(),
                    });
                }
            }
        }
    }

    fn expression(&mut self) -> Result<Expression, HclError> {
        match self.next("expression")? {
            (Token::Str(value), _) => Ok(Expression::Literal(value)),
            (Token::Ident(first), _) => {
                let mut path = vec![first];
                while let Some((Token::Dot, _)) = self.peek() {
                    self.position += 1;
                    let (segment, _) = self.ident("attribute path segment")?;
                    path.push(segment);
                }
                Ok(Expression::Reference(path))
            }
            (other, offset) => Err(unexpected(offset, "expression", &other)),
        }
    }
}

fn unexpected(offset: usize, expected: &str, found: &Token) -> HclError {
    HclError::UnexpectedToken {
        offset,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
