//! # setexpr
//!
//! A Rust library to parse compact, single-line assignment expressions and merge them into JSON trees.
//!
//! Command-line tools often need to let users override parts of a larger document without writing the
//! document out. This library reads expressions such as `image.tag=1.2.0,ports[0]=8080` and writes the
//! assignments into a caller-owned [`serde_json::Map`], creating, reusing, or replacing the nested maps and
//! arrays along the way.
//!
//! ## Syntax
//!
//! - **Clauses:** an expression is one or more `path=value` clauses separated by `,`.
//! - **Paths:** a key, followed by `.key` segments for nested maps and `[N]` segments for array indices
//!   (e.g. `foo[0].bar`). Keys may contain anything except `.`, `[`, `]` and `=`, which can be escaped
//!   with a backslash.
//! - **Values:** bare values run up to the next `,`, `{`, `}` or `'` (escapable with a backslash).
//!   `'single quoted'` values may contain any of those. A value starting with `@` takes the rest of the
//!   input literally. `{a,b,c}` assigns an array. A missing value is an empty string.
//! - **Type coercion:** bare values become booleans, integers, floats or null when they look like one
//!   (see [`coerce`]); quoted and verbatim values are always strings. [`merge_string`] turns coercion off.
//!
//! ## Examples
//!
//! ### Merging into a destination
//!
//! ```rust
//! use serde_json::{json, Map, Value};
//!
//! let mut dest = Map::new();
//! setexpr::merge_value(&mut dest, "foo.bar[1].baz=true").unwrap();
//! setexpr::merge_value(&mut dest, "foo.name='hello, world'").unwrap();
//!
//! assert_eq!(Value::Object(dest), json!({
//!     "foo": {
//!         "bar": [
//!             null,
//!             {
//!                 "baz": true
//!             }
//!         ],
//!         "name": "hello, world"
//!     }
//! }));
//! ```
//!
//! ### Keeping values as strings
//!
//! ```rust
//! use serde_json::{json, Map, Value};
//!
//! let mut dest = Map::new();
//! setexpr::merge_string(&mut dest, "version=1.10,tags={1,true,null}").unwrap();
//!
//! assert_eq!(Value::Object(dest), json!({
//!     "version": "1.10",
//!     "tags": ["1", "true", "null"]
//! }));
//! ```
//!
//! ### Errors
//!
//! The first error stops the expression. Clauses before it have already been merged.
//!
//! ```rust
//! use serde_json::{json, Map, Value};
//!
//! let mut dest = Map::new();
//! let err = setexpr::merge_value(&mut dest, "a=1,b").unwrap_err();
//!
//! assert_eq!(
//!     err.to_string(),
//!     "unable to parse \"a=1,b\", unexpected end, expecting '.', '=' or '['"
//! );
//! assert_eq!(Value::Object(dest), json!({"a": 1}));
//! ```
//!
//! Use [`Expression`] to validate the whole input before touching the destination.

mod builder;
mod coerce;
mod lexer;
mod parse;
mod types;

pub use builder::Builder;
pub use coerce::{coerce, Coercion};
pub use lexer::{Lexer, Token, TokenKind, TokenStream};
pub use parse::{Parser, Target};
pub use types::{
    Assignment, ConversionError, Expected, Expression, Found, LexError, ParseError, Path,
    PathSegment, SetExprError,
};

use serde_json::{Map, Value};

/// Parses `expr` and merges it into `dest`, coercing bare values.
///
/// ## Arguments
///
/// * `dest` - The destination tree; it accumulates results across calls.
/// * `expr` - The expression, e.g. `foo.bar[0]=true`.
///
/// ## Returns
///
/// Returns `Ok(())` if the whole expression was merged, or the first error found.
pub fn merge_value(dest: &mut Map<String, Value>, expr: &str) -> Result<(), SetExprError> {
    merge_with(dest, expr, Coercion::Typed)
}

/// Parses `expr` and merges it into `dest`, keeping every value as a string.
pub fn merge_string(dest: &mut Map<String, Value>, expr: &str) -> Result<(), SetExprError> {
    merge_with(dest, expr, Coercion::Strings)
}

/// Parses `expr` and merges it into `dest` with the given coercion policy.
///
/// Clauses are committed one by one as they are parsed.
pub fn merge_with(
    dest: &mut Map<String, Value>,
    expr: &str,
    coercion: Coercion,
) -> Result<(), SetExprError> {
    let mut builder = Builder::new(dest);
    Parser::new(expr, coercion).parse_into(&mut builder)
}

/// Parses `expr` into a new map, coercing bare values.
///
/// ```rust
/// use serde_json::json;
///
/// let map = setexpr::parse("key={val1,,val2}").unwrap();
/// assert_eq!(map["key"], json!(["val1", "", "val2"]));
/// ```
pub fn parse(expr: &str) -> Result<Map<String, Value>, SetExprError> {
    let mut dest = Map::new();
    merge_value(&mut dest, expr)?;
    Ok(dest)
}
