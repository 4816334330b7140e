use std::fmt;

use nom::bytes::complete::is_not;
use nom::character::complete::digit1;
use nom::IResult;
use tracing::{debug, trace};

use crate::types::{Expected, LexError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    End,
    Error,
    MapKey,
    KeySeparator,
    IndexStart,
    IndexEnd,
    Index,
    Assignment,
    Scalar,
    Quoted,
    Verbatim,
    NextKey,
    ListStart,
    ListEnd,
    NextValue,
}

impl TokenKind {
    pub const ALL: [TokenKind; 15] = [
        TokenKind::End,
        TokenKind::Error,
        TokenKind::MapKey,
        TokenKind::KeySeparator,
        TokenKind::IndexStart,
        TokenKind::IndexEnd,
        TokenKind::Index,
        TokenKind::Assignment,
        TokenKind::Scalar,
        TokenKind::Quoted,
        TokenKind::Verbatim,
        TokenKind::NextKey,
        TokenKind::ListStart,
        TokenKind::ListEnd,
        TokenKind::NextValue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::End => "end",
            TokenKind::Error => "error",
            TokenKind::MapKey => "map key",
            TokenKind::KeySeparator => "key separator",
            TokenKind::IndexStart => "array index start",
            TokenKind::IndexEnd => "array index end",
            TokenKind::Index => "array index",
            TokenKind::Assignment => "assignment",
            TokenKind::Scalar => "value",
            TokenKind::Quoted => "string",
            TokenKind::Verbatim => "verbatim string",
            TokenKind::NextKey => "next key",
            TokenKind::ListStart => "array value start",
            TokenKind::ListEnd => "array value end",
            TokenKind::NextValue => "next array value",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexeme together with the byte offset it starts at.
///
/// `text` holds the unescaped content: quoted strings come without their
/// quotes and verbatim values without the leading `@`. Error tokens carry the
/// error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize, text: impl Into<String>) -> Self {
        Token {
            kind,
            position,
            text: text.into(),
        }
    }
}

/// A source of tokens for the parser.
pub trait TokenStream {
    /// Produces the next token. After the end token or an error the stream is
    /// exhausted and keeps returning end tokens.
    fn next_token(&mut self) -> Result<Token, LexError>;

    /// Stops the stream early; no further input is scanned.
    fn cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    MapKey,
    PathContinuation,
    Index,
    IndexEnd,
    Value,
    ValueEnd,
    ListElement,
    ListContinuation,
    Done,
}

/// Characters with a meaning of their own in one lexical mode, and the
/// characters a plain run stops at (the reserved ones plus the escape).
struct Alphabet {
    reserved: &'static str,
    stops: &'static str,
}

const KEY: Alphabet = Alphabet {
    reserved: ".[]=",
    stops: ".[]=\\",
};

const VALUE: Alphabet = Alphabet {
    reserved: ",{}'",
    stops: ",{}'\\",
};

const QUOTED: Alphabet = Alphabet {
    reserved: "'",
    stops: "'\\",
};

/// Pull-based scanner over one expression.
///
/// Starts in map-key mode; `=` switches to value mode and a clause separator
/// switches back.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    start: usize,
    state: State,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            start: 0,
            state: State::MapKey,
        }
    }

    /// Whether the end token or an error has been produced, or the lexer was cancelled.
    pub fn is_finished(&self) -> bool {
        self.state == State::Done
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn emit(&mut self, kind: TokenKind, text: String) -> Token {
        let token = Token::new(kind, self.start, text);
        self.start = self.position;
        trace!(target: "setexpr::lexer", kind = %token.kind, position = token.position, text = %token.text, "token");
        token
    }

    fn punct(&mut self, kind: TokenKind, c: char, next: State) -> Token {
        self.position += c.len_utf8();
        self.state = next;
        self.emit(kind, c.to_string())
    }

    fn end(&mut self) -> Token {
        self.state = State::Done;
        self.emit(TokenKind::End, String::new())
    }

    fn unexpected(&self, expected: Expected) -> LexError {
        LexError::Unexpected {
            position: self.start,
            found: self.peek().into(),
            expected,
        }
    }

    fn map_key(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            Some(c) if !KEY.reserved.contains(c) => {
                let text = self.scan(&KEY)?;
                self.state = State::PathContinuation;
                Ok(self.emit(TokenKind::MapKey, text))
            }
            _ => Err(self.unexpected(Expected::MapKey)),
        }
    }

    fn path_continuation(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            Some('.') => Ok(self.punct(TokenKind::KeySeparator, '.', State::MapKey)),
            Some('[') => Ok(self.punct(TokenKind::IndexStart, '[', State::Index)),
            Some('=') => Ok(self.punct(TokenKind::Assignment, '=', State::Value)),
            _ => Err(self.unexpected(Expected::PathContinuation)),
        }
    }

    fn index(&mut self) -> Result<Token, LexError> {
        let digits: IResult<&str, &str> = digit1(self.rest());
        match digits {
            Ok((_, digits)) => {
                self.position += digits.len();
                self.state = State::IndexEnd;
                Ok(self.emit(TokenKind::Index, digits.to_owned()))
            }
            Err(_) => Err(self.unexpected(Expected::ArrayIndex)),
        }
    }

    fn index_end(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            Some(']') => Ok(self.punct(TokenKind::IndexEnd, ']', State::PathContinuation)),
            _ => Err(self.unexpected(Expected::IndexEnd)),
        }
    }

    fn value(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            None => Ok(self.end()),
            Some(',') => Ok(self.punct(TokenKind::NextKey, ',', State::MapKey)),
            Some('{') => Ok(self.punct(TokenKind::ListStart, '{', State::ListElement)),
            Some('}') => Err(self.unexpected(Expected::Value)),
            Some('\'') => self.quoted(State::ValueEnd),
            Some('@') => {
                // Everything after the marker is the value, reserved characters included.
                let text = self.rest()[1..].to_owned();
                self.position = self.input.len();
                self.state = State::ValueEnd;
                Ok(self.emit(TokenKind::Verbatim, text))
            }
            Some(_) => self.scalar(State::ValueEnd),
        }
    }

    fn value_end(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            None => Ok(self.end()),
            Some(',') => Ok(self.punct(TokenKind::NextKey, ',', State::MapKey)),
            _ => Err(self.unexpected(Expected::ValueEnd)),
        }
    }

    fn list_element(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            Some('}') => Ok(self.punct(TokenKind::ListEnd, '}', State::ValueEnd)),
            Some(',') => Ok(self.punct(TokenKind::NextValue, ',', State::ListElement)),
            Some('\'') => self.quoted(State::ListContinuation),
            None | Some('{') => Err(self.unexpected(Expected::ListElement)),
            Some(_) => self.scalar(State::ListContinuation),
        }
    }

    fn list_continuation(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            Some(',') => Ok(self.punct(TokenKind::NextValue, ',', State::ListElement)),
            Some('}') => Ok(self.punct(TokenKind::ListEnd, '}', State::ValueEnd)),
            _ => Err(self.unexpected(Expected::ListContinuation)),
        }
    }

    fn scalar(&mut self, next: State) -> Result<Token, LexError> {
        let text = self.scan(&VALUE)?;
        self.state = next;
        Ok(self.emit(TokenKind::Scalar, text))
    }

    fn quoted(&mut self, next: State) -> Result<Token, LexError> {
        self.position += 1;
        let text = self.scan(&QUOTED)?;
        match self.peek() {
            Some('\'') => {
                self.position += 1;
                self.state = next;
                Ok(self.emit(TokenKind::Quoted, text))
            }
            _ => Err(LexError::UnterminatedString {
                position: self.start,
            }),
        }
    }

    /// Reads up to the next reserved character of `alphabet` or the end of the
    /// input, resolving escapes. Only reserved characters and the backslash
    /// itself may be escaped.
    fn scan(&mut self, alphabet: &Alphabet) -> Result<String, LexError> {
        let mut text = String::new();
        loop {
            let run: IResult<&str, &str> = is_not(alphabet.stops)(self.rest());
            if let Ok((_, run)) = run {
                text.push_str(run);
                self.position += run.len();
            }
            if self.peek() != Some('\\') {
                return Ok(text);
            }
            self.position += 1;
            match self.peek() {
                Some(c) if c == '\\' || alphabet.reserved.contains(c) => {
                    text.push(c);
                    self.position += c.len_utf8();
                }
                other => {
                    return Err(LexError::UnknownEscape {
                        position: self.start,
                        found: other.into(),
                    })
                }
            }
        }
    }
}

impl TokenStream for Lexer<'_> {
    fn next_token(&mut self) -> Result<Token, LexError> {
        let result = match self.state {
            State::MapKey => self.map_key(),
            State::PathContinuation => self.path_continuation(),
            State::Index => self.index(),
            State::IndexEnd => self.index_end(),
            State::Value => self.value(),
            State::ValueEnd => self.value_end(),
            State::ListElement => self.list_element(),
            State::ListContinuation => self.list_continuation(),
            State::Done => Ok(Token::new(TokenKind::End, self.position, "")),
        };
        if result.is_err() {
            self.state = State::Done;
        }
        result
    }

    fn cancel(&mut self) {
        if self.state != State::Done {
            debug!(target: "setexpr::lexer", position = self.position, "lexer cancelled");
            self.state = State::Done;
        }
    }
}

/// Yields every token up to and including the end or error token.
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.is_finished() {
            return None;
        }
        Some(match self.next_token() {
            Ok(token) => token,
            Err(err) => Token::new(TokenKind::Error, err.position(), err.to_string()),
        })
    }
}
