//! Key ranges and the ordered-collection facade.
//!
//! A range selects rows of a B-tree by key prefix. At trace time a range
//! may be fully concrete (literal key parts), partially open (bounds), or
//! still symbolic (a reference the host resolves); normalization maps the
//! caller's state onto one of those shapes without ever inspecting a
//! symbolic value.

use crate::state::{Form, State};
use crate::uri::Uri;
use crate::value::Value;
use crate::vocab;

/// One component of a key-prefix range.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    /// Match this column exactly.
    Exact(Value),
    /// Match this column within a half-open interval. A missing side is
    /// unbounded.
    Bound {
        /// Inclusive lower bound.
        start: Option<Value>,
        /// Exclusive upper bound.
        end: Option<Value>,
    },
}

impl KeyPart {
    fn into_state(self) -> State {
        match self {
            KeyPart::Exact(value) => State::value(value),
            KeyPart::Bound { start, end } => {
                let side = |bound: Option<Value>| match bound {
                    Some(value) => State::value(value),
                    None => State::none(),
                };
                State::tuple(vec![side(start), side(end)])
            }
        }
    }
}

/// A selection over an ordered collection's keys.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeSpec {
    /// Select everything.
    All,
    /// A still-symbolic selection the host resolves.
    Symbolic(State),
    /// A concrete key-prefix selection.
    Keys(Vec<KeyPart>),
}

impl RangeSpec {
    /// Normalizes a caller-supplied key state into a range.
    ///
    /// A missing or nil state selects everything. A symbolic state passes
    /// through untouched. A concrete literal is an exact one-column prefix
    /// and a concrete tuple is a multi-column prefix whose elements are
    /// exact matches, except that a pair-shaped element becomes a bound
    /// with nil meaning unbounded on that side. Tuples with any symbolic
    /// element pass through untouched.
    #[must_use]
    pub fn normalize(key: Option<State>) -> RangeSpec {
        let Some(key) = key else {
            return RangeSpec::All;
        };
        let (class, form) = key.into_parts();
        match form {
            Form::Value(Value::Nil) => RangeSpec::All,
            Form::Value(value @ Value::Link(_)) => {
                RangeSpec::Symbolic(State::opaque(class, Form::Value(value)))
            }
            Form::Ref(r) => RangeSpec::Symbolic(State::opaque(class, Form::Ref(r))),
            Form::Value(value) => RangeSpec::Keys(vec![KeyPart::Exact(value)]),
            Form::Tuple(items) => {
                let parts: Option<Vec<KeyPart>> =
                    items.iter().map(Self::key_part).collect();
                match parts {
                    Some(parts) => RangeSpec::Keys(parts),
                    None => RangeSpec::Symbolic(State::opaque(class, Form::Tuple(items))),
                }
            }
            Form::Map(entries) => {
                RangeSpec::Symbolic(State::opaque(class, Form::Map(entries)))
            }
        }
    }

    /// Reads one key column, or `None` if the element is symbolic.
    fn key_part(item: &State) -> Option<KeyPart> {
        let side = |state: &State| match state.form() {
            Form::Value(Value::Link(_)) => None,
            Form::Value(Value::Nil) => Some(None),
            Form::Value(value) => Some(Some(value.clone())),
            _ => None,
        };
        match item.form() {
            Form::Value(Value::Link(_)) => None,
            Form::Value(value) => Some(KeyPart::Exact(value.clone())),
            Form::Tuple(sides) if sides.len() == 2 => {
                let start = side(&sides[0])?;
                let end = side(&sides[1])?;
                Some(KeyPart::Bound { start, end })
            }
            _ => None,
        }
    }

    /// The state to send as the op key for this range.
    #[must_use]
    pub fn into_state(self) -> State {
        match self {
            RangeSpec::All => State::none(),
            RangeSpec::Symbolic(state) => state,
            RangeSpec::Keys(parts) => {
                State::tuple(parts.into_iter().map(KeyPart::into_state).collect())
            }
        }
    }
}

/// A deferred handle on an ordered collection of keys.
///
/// Every method records an op against the underlying state; nothing here
/// touches data until the host evaluates the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct BTree {
    state: State,
}

impl BTree {
    /// Wraps a state already known to be a B-tree.
    #[must_use]
    pub fn new(state: State) -> Self {
        Self {
            state: state.with_class(Uri::new(vocab::COLLECTION_BTREE)),
        }
    }

    /// The underlying state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Consumes the handle, yielding the underlying state.
    #[must_use]
    pub fn into_state(self) -> State {
        self.state
    }

    /// The rows within `range`, as another B-tree.
    #[must_use]
    pub fn slice(&self, range: RangeSpec) -> BTree {
        let sliced = self.state.get(
            "",
            range.into_state(),
            Uri::new(vocab::COLLECTION_BTREE),
        );
        BTree { state: sliced }
    }

    /// The number of rows, as an unsigned count.
    #[must_use]
    pub fn count(&self) -> State {
        self.state
            .get("count", State::none(), Uri::new(vocab::NUMBER_UINT))
    }

    /// The first row, as a map.
    #[must_use]
    pub fn first(&self) -> State {
        self.state.get("first", State::none(), Uri::new(vocab::MAP))
    }

    /// Inserts one key. The returned state exists only for ordering.
    #[must_use]
    pub fn insert(&self, key: Vec<State>) -> State {
        self.state.put("", State::none(), State::tuple(key))
    }

    /// Deletes the rows within `range`. The returned state exists only
    /// for ordering.
    #[must_use]
    pub fn delete(&self, range: RangeSpec) -> State {
        self.state.delete("", range.into_state())
    }

    /// A stream over the keys within `range`.
    #[must_use]
    pub fn keys(&self, range: RangeSpec) -> State {
        self.state
            .get("keys", range.into_state(), Uri::new(vocab::STREAM))
    }

    /// The rows in reverse key order, as another B-tree.
    #[must_use]
    pub fn reverse(&self) -> BTree {
        let reversed = self.state.get(
            "reverse",
            State::none(),
            Uri::new(vocab::COLLECTION_BTREE),
        );
        BTree { state: reversed }
    }
}
