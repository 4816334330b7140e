use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// How unquoted right-hand values become JSON values.
///
/// Quoted and verbatim values are always strings, whatever the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coercion {
    /// Booleans, integers, floats and null are recognized; see [`coerce`].
    #[default]
    Typed,
    /// Every value is kept as the literal string.
    Strings,
}

impl Coercion {
    pub fn apply(self, raw: &str) -> Value {
        match self {
            Coercion::Typed => coerce(raw),
            Coercion::Strings => Value::String(raw.to_owned()),
        }
    }
}

/// Infers the type of a bare value.
///
/// Tried in order: `true`/`false`, a 64-bit signed integer, a finite 64-bit
/// float, `null`/`NULL`/`Null`. Anything else is returned as a string.
///
/// ```rust
/// use serde_json::json;
/// use setexpr::coerce;
///
/// assert_eq!(coerce("1000"), json!(1000));
/// assert_eq!(coerce("10.01"), json!(10.01));
/// assert_eq!(coerce("NULL"), json!(null));
/// assert_eq!(coerce("nil"), json!("nil"));
/// ```
pub fn coerce(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    // NaN and the infinities are not JSON numbers.
    if let Some(float) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(float);
    }
    match raw {
        "null" | "NULL" | "Null" => Value::Null,
        _ => Value::String(raw.to_owned()),
    }
}
