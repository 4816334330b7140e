use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::coerce::Coercion;
use crate::lexer::{Lexer, Token, TokenKind, TokenStream};
use crate::types::{ConversionError, LexError, ParseError, SetExprError};

/// Receives the clauses of an expression as the parser recognizes them.
///
/// Each clause arrives as one `begin` with the root map key, then a `key` or
/// `index` call per further path segment, then exactly one `set`.
pub trait Target {
    fn begin(&mut self, key: String);
    fn key(&mut self, key: String);
    fn index(&mut self, index: usize);
    fn set(&mut self, value: Value);
}

/// Recursive-descent parser for
///
/// ```text
/// expr      := clause (',' clause)*
/// clause    := path '=' value
/// path      := MAPKEY ( '.' MAPKEY | '[' INDEX ']' )*
/// value     := /* empty */ | SCALAR | STRING | VERBATIM | '{' valuelist '}'
/// valuelist := [ value ] ( ',' [ value ] )*
/// ```
///
/// A parser is used for exactly one expression.
pub struct Parser<'a, S = Lexer<'a>> {
    input: &'a str,
    tokens: S,
    coercion: Coercion,
    lookahead: Option<Token>,
}

impl<'a> Parser<'a, Lexer<'a>> {
    pub fn new(input: &'a str, coercion: Coercion) -> Self {
        Parser::with_tokens(input, Lexer::new(input), coercion)
    }
}

impl<'a, S: TokenStream> Parser<'a, S> {
    /// Creates a parser over an arbitrary token stream. `input` is only used
    /// in error messages.
    pub fn with_tokens(input: &'a str, tokens: S, coercion: Coercion) -> Self {
        Parser {
            input,
            tokens,
            coercion,
            lookahead: None,
        }
    }

    /// Parses the whole expression, handing each clause to `target` as soon as
    /// it is complete.
    ///
    /// ## Returns
    ///
    /// Returns `Ok(())` once the end of the input is reached, or the first
    /// error. Clauses before the failing one have already reached `target`.
    pub fn parse_into<T: Target>(mut self, target: &mut T) -> Result<(), SetExprError> {
        match self.expression(target) {
            Ok(()) => Ok(()),
            Err(failure) => {
                self.tokens.cancel();
                debug!(target: "setexpr::parse", input = self.input, error = %failure, "expression rejected");
                Err(failure.into_error(self.input))
            }
        }
    }

    fn expression<T: Target>(&mut self, target: &mut T) -> Result<(), Failure> {
        loop {
            self.clause(target)?;
            let token = self.bump()?;
            match token.kind {
                TokenKind::End => return Ok(()),
                TokenKind::NextKey => continue,
                _ => return Err(unexpected(token)),
            }
        }
    }

    fn clause<T: Target>(&mut self, target: &mut T) -> Result<(), Failure> {
        let key = self.expect(TokenKind::MapKey)?;
        target.begin(key.text);
        loop {
            let token = self.bump()?;
            match token.kind {
                TokenKind::KeySeparator => {
                    let key = self.expect(TokenKind::MapKey)?;
                    target.key(key.text);
                }
                TokenKind::IndexStart => {
                    let index = self.index()?;
                    target.index(index);
                }
                TokenKind::Assignment => {
                    let value = self.value()?;
                    target.set(value);
                    return Ok(());
                }
                _ => return Err(unexpected(token)),
            }
        }
    }

    fn index(&mut self) -> Result<usize, Failure> {
        let token = self.expect(TokenKind::Index)?;
        let index = match token.text.parse::<usize>() {
            // The array must be able to hold `index + 1` elements.
            Ok(index) if index.checked_add(1).is_some() => index,
            Ok(_) => {
                return Err(ConversionError::TooLarge {
                    position: token.position,
                    literal: token.text,
                }
                .into())
            }
            Err(source) => {
                return Err(ConversionError::Parse {
                    position: token.position,
                    literal: token.text,
                    source,
                }
                .into())
            }
        };
        self.expect(TokenKind::IndexEnd)?;
        Ok(index)
    }

    fn value(&mut self) -> Result<Value, Failure> {
        let token = self.bump()?;
        match token.kind {
            // A missing value is an empty string; the separator belongs to the expression.
            TokenKind::End | TokenKind::NextKey => {
                self.lookahead = Some(token);
                Ok(Value::String(String::new()))
            }
            TokenKind::Scalar => Ok(self.coercion.apply(&token.text)),
            TokenKind::Quoted | TokenKind::Verbatim => Ok(Value::String(token.text)),
            TokenKind::ListStart => self.list(),
            _ => Err(unexpected(token)),
        }
    }

    /// Reads the elements of `{...}` after the opening brace. Empty elements
    /// become empty strings; `{}` is an empty array.
    fn list(&mut self) -> Result<Value, Failure> {
        let mut items = Vec::new();
        let mut filled = false;
        let mut separated = false;
        loop {
            let token = self.bump()?;
            match token.kind {
                TokenKind::Scalar => {
                    items.push(self.coercion.apply(&token.text));
                    filled = true;
                }
                TokenKind::Quoted => {
                    items.push(Value::String(token.text));
                    filled = true;
                }
                TokenKind::NextValue => {
                    if !filled {
                        items.push(Value::String(String::new()));
                    }
                    filled = false;
                    separated = true;
                }
                TokenKind::ListEnd => {
                    if separated && !filled {
                        items.push(Value::String(String::new()));
                    }
                    return Ok(Value::Array(items));
                }
                _ => return Err(unexpected(token)),
            }
        }
    }

    fn bump(&mut self) -> Result<Token, Failure> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => Ok(self.tokens.next_token()?),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Failure> {
        let token = self.bump()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(token))
        }
    }
}

fn unexpected(token: Token) -> Failure {
    Failure::Syntax(ParseError::UnexpectedToken {
        position: token.position,
        kind: token.kind,
        text: token.text,
    })
}

#[derive(Error, Debug)]
enum Failure {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl Failure {
    fn into_error(self, input: &str) -> SetExprError {
        let input = input.to_owned();
        match self {
            Failure::Lex(source) => SetExprError::Lex { input, source },
            Failure::Syntax(source) => SetExprError::Syntax { input, source },
            Failure::Conversion(source) => SetExprError::Conversion { input, source },
        }
    }
}
