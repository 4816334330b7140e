use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::builder::Builder;
use crate::coerce::Coercion;
use crate::lexer::TokenKind;
use crate::parse::{Parser, Target};

/// A fully parsed expression, one [`Assignment`] per clause.
///
/// Unlike [`crate::merge_value`], which commits each clause as soon as it is read,
/// an `Expression` is only produced when the whole input is valid, so applying
/// it never leaves a destination half-updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expression {
    pub assignments: Vec<Assignment>,
}

impl FromStr for Expression {
    type Err = SetExprError;

    /// Parses an expression with [`Coercion::Typed`].
    ///
    /// ## Example
    ///
    /// ```rust
    /// use setexpr::Expression;
    ///
    /// let expression = "foo.bar[0]=hello,foo.baz=1".parse::<Expression>().unwrap();
    /// assert_eq!(expression.assignments().len(), 2);
    /// ```
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Expression::parse_with(input, Coercion::Typed)
    }
}

impl Expression {
    /// Parses an input string into an `Expression` using the given coercion policy.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use serde_json::json;
    /// use setexpr::{Coercion, Expression};
    ///
    /// let expression = Expression::parse_with("port=8080", Coercion::Strings).unwrap();
    /// assert_eq!(expression.assignments()[0].value, json!("8080"));
    /// ```
    pub fn parse_with(input: &str, coercion: Coercion) -> Result<Self, SetExprError> {
        let mut recorder = Recorder::default();
        Parser::new(input, coercion).parse_into(&mut recorder)?;
        Ok(Expression {
            assignments: recorder.assignments,
        })
    }

    /// Returns the parsed clauses in input order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Writes every clause into `dest`, in order.
    ///
    /// Existing containers along each path are reused when they have the kind the
    /// path expects and replaced otherwise; the value at the end of each path is
    /// always overwritten.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use serde_json::{json, Map, Value};
    /// use setexpr::Expression;
    ///
    /// let mut dest = Map::new();
    /// dest.insert("settings".to_string(), json!({"theme": {"color": "red", "size": 12}}));
    ///
    /// let expression: Expression = "settings.theme.color=blue".parse().unwrap();
    /// expression.apply_to(&mut dest);
    ///
    /// assert_eq!(
    ///     Value::Object(dest),
    ///     json!({"settings": {"theme": {"color": "blue", "size": 12}}})
    /// );
    /// ```
    pub fn apply_to(&self, dest: &mut Map<String, Value>) {
        let mut builder = Builder::new(dest);
        for assignment in &self.assignments {
            builder.assign(&assignment.path, assignment.value.clone());
        }
    }

    /// Converts the expression into a new JSON object.
    pub fn as_json(&self) -> Value {
        let mut dest = Map::new();
        self.apply_to(&mut dest);
        Value::Object(dest)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    // Where to write (the left-hand side of the clause)
    pub path: Path,
    // What to write, already coerced (the right-hand side of the clause)
    pub value: Value,
}

/// Collects clauses instead of writing them anywhere.
#[derive(Default)]
struct Recorder {
    path: Path,
    assignments: Vec<Assignment>,
}

impl Target for Recorder {
    fn begin(&mut self, key: String) {
        self.path = Path::new(key);
    }

    fn key(&mut self, key: String) {
        self.path.push(PathSegment::Key(key));
    }

    fn index(&mut self, index: usize) {
        self.path.push(PathSegment::Index(index));
    }

    fn set(&mut self, value: Value) {
        let path = std::mem::take(&mut self.path);
        self.assignments.push(Assignment { path, value });
    }
}

/// The left-hand side of a clause.
///
/// A path always starts with a key in the root map, followed by any number of
/// map-key or array-index segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Path {
    root: String,
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new(root: impl Into<String>) -> Self {
        Path {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    /// Appends a map-key segment.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.push(PathSegment::Key(key.into()));
        self
    }

    /// Appends an array-index segment.
    pub fn index(mut self, index: usize) -> Self {
        self.push(PathSegment::Index(index));
        self
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// The key addressed in the root map.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Every segment after the root key.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

/// Renders the path in expression syntax, escaping reserved key characters.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_key(f, &self.root)?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => {
                    f.write_str(".")?;
                    write_key(f, key)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    for c in key.chars() {
        if matches!(c, '.' | '[' | ']' | '=' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// The character the lexer stopped at, or the end of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    End,
    Char(char),
}

impl From<Option<char>> for Found {
    fn from(c: Option<char>) -> Self {
        c.map_or(Found::End, Found::Char)
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::End => f.write_str("end"),
            Found::Char(c) if !is_printable(*c) => write!(f, "character: U+{:04X}", *c as u32),
            Found::Char(c) => write!(f, "character: U+{:04X} '{c}'", *c as u32),
        }
    }
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space. Control,
/// format and separator characters other than `' '` print as a code point only.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !(c.is_control() || c.is_whitespace() || is_format(c))
}

/// Characters of the Unicode `Cf` (format) category.
fn is_format(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// A lexical decision point, naming what could have come next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Start of the expression, or after `.` or a clause separator.
    MapKey,
    /// After a map key or a closing `]`.
    PathContinuation,
    /// After `[`.
    ArrayIndex,
    /// After the index digits.
    IndexEnd,
    /// After `=`.
    Value,
    /// After a complete right-hand value.
    ValueEnd,
    /// After `{` or a `,` inside a value list.
    ListElement,
    /// After a value inside a value list.
    ListContinuation,
}

impl Expected {
    /// The continuations that were valid at this point.
    pub fn alternatives(self) -> &'static [&'static str] {
        match self {
            Expected::MapKey => &["a map key"],
            Expected::PathContinuation => &["'.'", "'='", "'['"],
            Expected::ArrayIndex => &["an array index"],
            Expected::IndexEnd => &["']'"],
            Expected::Value => &["'{'", "','", "a value", "the end"],
            Expected::ValueEnd => &["','", "the end"],
            Expected::ListElement => &["'}'", "','", "a value"],
            Expected::ListContinuation => &["','", "'}'"],
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alternatives = self.alternatives();
        let last = alternatives.len() - 1;
        for (i, alternative) in alternatives.iter().enumerate() {
            match i {
                0 => {}
                i if i == last => f.write_str(" or ")?,
                _ => f.write_str(", ")?,
            }
            f.write_str(alternative)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected {found}, expecting {expected}")]
    Unexpected {
        position: usize,
        found: Found,
        expected: Expected,
    },
    #[error("unterminated string, expected ''', got end")]
    UnterminatedString { position: usize },
    #[error("unknown escape sequence: {found}")]
    UnknownEscape { position: usize, found: Found },
}

impl LexError {
    /// Byte offset of the token the lexer was scanning.
    pub fn position(&self) -> usize {
        match self {
            LexError::Unexpected { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::UnknownEscape { position, .. } => *position,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected {kind} \"{text}\"")]
    UnexpectedToken {
        position: usize,
        kind: TokenKind,
        text: String,
    },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { position, .. } => *position,
        }
    }
}

/// An array index literal that cannot address an array element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The literal does not fit in `usize`.
    #[error("invalid array index \"{literal}\": {source}")]
    Parse {
        position: usize,
        literal: String,
        source: ParseIntError,
    },
    /// The literal fits in `usize`, but an array holding that index would not.
    #[error("invalid array index \"{literal}\": index too large for an array")]
    TooLarge { position: usize, literal: String },
}

impl ConversionError {
    pub fn position(&self) -> usize {
        match self {
            ConversionError::Parse { position, .. } | ConversionError::TooLarge { position, .. } => {
                *position
            }
        }
    }

    /// The index text as written in the expression.
    pub fn literal(&self) -> &str {
        match self {
            ConversionError::Parse { literal, .. } | ConversionError::TooLarge { literal, .. } => {
                literal
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetExprError {
    #[error("unable to parse \"{input}\", {source}")]
    Lex { input: String, source: LexError },
    #[error("unable to parse \"{input}\", {source}")]
    Syntax { input: String, source: ParseError },
    #[error("unable to parse \"{input}\", {source}")]
    Conversion {
        input: String,
        source: ConversionError,
    },
}

impl SetExprError {
    /// The expression that failed.
    pub fn input(&self) -> &str {
        match self {
            SetExprError::Lex { input, .. }
            | SetExprError::Syntax { input, .. }
            | SetExprError::Conversion { input, .. } => input,
        }
    }

    /// Byte offset in the input where the failing token starts.
    pub fn position(&self) -> usize {
        match self {
            SetExprError::Lex { source, .. } => source.position(),
            SetExprError::Syntax { source, .. } => source.position(),
            SetExprError::Conversion { source, .. } => source.position(),
        }
    }
}
