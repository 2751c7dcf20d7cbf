//! Tokenizer for the fixed block grammar using logos.

use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"//[^\n]*")]
pub(crate) enum Token {
    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token("=")]
    Equals,

    #[token(".")]
    Dot,

    /// Bare identifier: block kind, attribute key or reference segment
    #[regex(r"[A-Za-z_][A-Za-z0-9_-]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// Quoted string, unescaped
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftBrace => f.write_str("'{'"),
            Token::RightBrace => f.write_str("'}'"),
            Token::Equals => f.write_str("'='"),
            Token::Dot => f.write_str("'.'"),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Str(value) => write!(f, "string \"{}\"", value),
        }
    }
}

/// Strip the surrounding quotes and resolve escapes. Returns `None` for an
/// unknown escape, which logos reports as a lexing error.
///
/// `$${` and `%%{` decode to a literal `${` / `%{`; a doubled sign not
/// followed by `{` is kept as is.
fn unescape(quoted: &str) -> Option<String> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut rest = inner;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("$${") || rest.starts_with("%%{") {
            value.push(c);
            value.push('{');
            rest = &rest[3..];
            continue;
        }

        if c == '\\' {
            let escaped = match rest[1..].chars().next()? {
                '\\' => '\\',
                '"' => '"',
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                _ => return None,
            };
            value.push(escaped);
            rest = &rest[2..];
            continue;
        }

        value.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Some(value)
}
