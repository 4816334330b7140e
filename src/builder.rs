use serde_json::{Map, Value};
use tracing::debug;

use crate::parse::Target;
use crate::types::{Path, PathSegment};

/// Writes clauses into a caller-owned destination map.
///
/// Each clause opens one cursor per path segment below the root key, then
/// commits the value back from the deepest cursor up to the root.
pub struct Builder<'a> {
    root: &'a mut Map<String, Value>,
    path: Path,
}

impl<'a> Builder<'a> {
    pub fn new(root: &'a mut Map<String, Value>) -> Self {
        Builder {
            root,
            path: Path::default(),
        }
    }

    /// Writes `value` at `path`.
    ///
    /// Along the way, an existing map is reused for a key segment and an
    /// existing array for an index segment; anything else in that slot is
    /// replaced by an empty container of the right kind. Arrays grow with
    /// `null` up to the index being written.
    ///
    /// ## Arguments
    ///
    /// * `path` - Where to write, starting at a key of the root map.
    /// * `value` - The value to store; whatever was there before is overwritten.
    pub fn assign(&mut self, path: &Path, value: Value) {
        debug!(target: "setexpr::builder", path = %path, "committing clause");

        let mut slot = self.root.remove(path.root()).unwrap_or(Value::Null);
        let mut chain = Vec::with_capacity(path.segments().len());
        for segment in path.segments() {
            let mut cursor = Cursor::open(slot, segment);
            slot = cursor.take();
            chain.push(cursor);
        }

        let value = chain
            .into_iter()
            .rev()
            .fold(value, |value, cursor| cursor.commit(value));
        self.root.insert(path.root().to_owned(), value);
    }
}

impl Target for Builder<'_> {
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
        self.assign(&path, value);
    }
}

/// One path segment's write target: the container it addresses, detached
/// from the tree until the clause commits.
enum Cursor<'p> {
    Map { map: Map<String, Value>, key: &'p str },
    Array { items: Vec<Value>, index: usize },
}

impl<'p> Cursor<'p> {
    fn open(existing: Value, segment: &'p PathSegment) -> Self {
        match segment {
            PathSegment::Key(key) => Cursor::Map {
                map: match existing {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
                key: key.as_str(),
            },
            PathSegment::Index(index) => Cursor::Array {
                items: match existing {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                },
                index: *index,
            },
        }
    }

    /// Detaches whatever currently occupies this cursor's slot.
    fn take(&mut self) -> Value {
        match self {
            Cursor::Map { map, key } => map.remove(*key).unwrap_or(Value::Null),
            Cursor::Array { items, index } => items
                .get_mut(*index)
                .map(Value::take)
                .unwrap_or(Value::Null),
        }
    }

    /// Stores `value` in the slot and returns the container for the parent slot.
    fn commit(self, value: Value) -> Value {
        match self {
            Cursor::Map { mut map, key } => {
                map.insert(key.to_owned(), value);
                Value::Object(map)
            }
            Cursor::Array { mut items, index } => {
                if items.len() <= index {
                    items.resize(index + 1, Value::Null);
                }
                items[index] = value;
                Value::Array(items)
            }
        }
    }
}
