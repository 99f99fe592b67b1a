//! The `State` capability: any value, concrete or deferred, usable in a
//! graph.
//!
//! A [`State`] pairs a stable wire class tag with a [`Form`]: a literal
//! value, a deferred [`Ref`], or a composite of other states. States are
//! immutable value objects; every operation on one produces a new state
//! whose form is an op-ref, never a computed result. That interception is
//! the whole tracing mechanism: writing `a.add(&b)` on two placeholders
//! yields a graph node, not a number.

use std::ops::{Add, Div, Mul, Neg, Sub};

use indexmap::IndexMap;

use crate::error::{ErrorCode, HostError, TraceError};
use crate::reference::{OpRef, Ref, Subject};
use crate::uri::Uri;
use crate::value::Value;
use crate::vocab;

/// The form of a state: what it actually is, independent of its class tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// A concrete literal.
    Value(Value),
    /// A deferred operation.
    Ref(Box<Ref>),
    /// An ordered sequence of states.
    Tuple(Vec<State>),
    /// An insertion-ordered mapping of names to states.
    Map(IndexMap<String, State>),
}

/// Any value that can appear in a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    class: Uri,
    form: Form,
}

impl State {
    /// Wraps a literal value; the class tag is the value's canonical class.
    #[must_use]
    pub fn value(value: Value) -> Self {
        Self {
            class: value.class(),
            form: Form::Value(value),
        }
    }

    /// The absent value.
    #[must_use]
    pub fn none() -> Self {
        Self::value(Value::Nil)
    }

    /// An integer literal.
    #[must_use]
    pub fn int(i: i64) -> Self {
        Self::value(Value::Int(i))
    }

    /// A floating-point literal.
    #[must_use]
    pub fn float(f: f64) -> Self {
        Self::value(Value::Float(f))
    }

    /// A boolean literal.
    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::value(Value::Bool(b))
    }

    /// A string literal.
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::value(Value::Str(s.into()))
    }

    /// A link to a symbolic address.
    #[must_use]
    pub fn link(uri: Uri) -> Self {
        Self::value(Value::Link(uri))
    }

    /// An ordered sequence.
    #[must_use]
    pub fn tuple(items: Vec<State>) -> Self {
        Self {
            class: Uri::new(vocab::TUPLE),
            form: Form::Tuple(items),
        }
    }

    /// An insertion-ordered mapping.
    #[must_use]
    pub fn map(entries: IndexMap<String, State>) -> Self {
        Self {
            class: Uri::new(vocab::MAP),
            form: Form::Map(entries),
        }
    }

    /// A deferred state: a reference tagged with its expected result class.
    #[must_use]
    pub fn from_ref(reference: Ref, class: Uri) -> Self {
        Self {
            class,
            form: Form::Ref(Box::new(reference)),
        }
    }

    /// An opaque composite state: an arbitrary class tag over an arbitrary
    /// form. This is how domain state types (tensors, tables, ...) appear
    /// in a graph without the core knowing anything about them.
    #[must_use]
    pub fn opaque(class: Uri, form: Form) -> Self {
        Self { class, form }
    }

    /// An error literal, e.g. the else-branch of a validation conditional.
    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            class: code.uri(),
            form: Form::Value(Value::Str(message.into())),
        }
    }

    /// Returns the same state retagged with a different class.
    #[must_use]
    pub fn with_class(mut self, class: Uri) -> Self {
        self.class = class;
        self
    }

    /// The wire class tag, fixed at construction.
    #[must_use]
    pub fn class(&self) -> &Uri {
        &self.class
    }

    /// The form of this state. Pure: repeated calls yield an equal form.
    #[must_use]
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Splits this state into its class and form.
    #[must_use]
    pub fn into_parts(self) -> (Uri, Form) {
        (self.class, self.form)
    }

    /// Returns true if the class tag is the canonical class for the form,
    /// i.e. the wire encoding needs no explicit tag.
    #[must_use]
    pub fn has_canonical_class(&self) -> bool {
        match &self.form {
            Form::Value(v) => self.class == v.class(),
            Form::Tuple(_) => self.class.as_str() == vocab::TUPLE,
            Form::Map(_) => self.class.as_str() == vocab::MAP,
            // References never carry their result class on the wire.
            Form::Ref(_) => true,
        }
    }

    /// Returns true for states whose class supports arithmetic.
    #[must_use]
    pub fn is_number(&self) -> bool {
        self.class.path_starts_with(vocab::NUMBER)
    }

    /// Returns true if this state is still symbolic: its form is a
    /// reference or a link, resolvable only by the host.
    #[must_use]
    pub fn is_symbolic(&self) -> bool {
        matches!(&self.form, Form::Ref(_) | Form::Value(Value::Link(_)))
    }

    /// Decodes this state as a host error envelope, if it is one.
    #[must_use]
    pub fn as_host_error(&self) -> Option<HostError> {
        let code = ErrorCode::from_path(self.class.as_str())?;
        match &self.form {
            Form::Value(Value::Str(message)) => Some(HostError::new(code, message.clone())),
            _ => None,
        }
    }

    /// The subject to use when applying a method at `path` to this state.
    /// Named references become `$name/path` subjects; links become absolute
    /// subjects; anything else becomes a method subject, hoisted into the
    /// context at finalize time.
    #[must_use]
    pub fn subject(&self, path: &str) -> Subject {
        match &self.form {
            Form::Ref(r) => {
                if let Ref::Id(id) = r.as_ref() {
                    return Subject::Id {
                        name: id.name().to_owned(),
                        path: path.to_owned(),
                    };
                }
            }
            Form::Value(Value::Link(uri)) => return Subject::Link(uri.append(path)),
            _ => {}
        }
        Subject::Method {
            subject: Box::new(self.clone()),
            path: path.to_owned(),
        }
    }

    /// A deferred read of the method at `path`, producing `rtype`.
    #[must_use]
    pub fn get(&self, path: &str, key: State, rtype: Uri) -> State {
        State::from_ref(Ref::Op(OpRef::get(self.subject(path), key)), rtype)
    }

    /// A deferred write to the method at `path`. Writes produce no value;
    /// their result state exists only to order them with `After`.
    #[must_use]
    pub fn put(&self, path: &str, key: State, value: State) -> State {
        State::from_ref(
            Ref::Op(OpRef::put(self.subject(path), key, value)),
            Uri::new(vocab::VALUE_NONE),
        )
    }

    /// A deferred invocation of the method at `path` with named arguments.
    #[must_use]
    pub fn post(&self, path: &str, params: IndexMap<String, State>, rtype: Uri) -> State {
        State::from_ref(Ref::Op(OpRef::post(self.subject(path), params)), rtype)
    }

    /// A deferred deletion at the method at `path`.
    #[must_use]
    pub fn delete(&self, path: &str, key: State) -> State {
        State::from_ref(
            Ref::Op(OpRef::delete(self.subject(path), key)),
            Uri::new(vocab::VALUE_NONE),
        )
    }

    /// A deferred element lookup (`subject[key]`).
    #[must_use]
    pub fn index(&self, key: State, rtype: Uri) -> State {
        self.get("", key, rtype)
    }

    /// A deferred member access (`subject.name`).
    #[must_use]
    pub fn member(&self, name: &str, rtype: Uri) -> State {
        self.get(name, State::none(), rtype)
    }

    /// Deferred addition.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed.
    pub fn add(&self, other: &State) -> Result<State, TraceError> {
        self.math_op("add", other)
    }

    /// Deferred subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed.
    pub fn sub(&self, other: &State) -> Result<State, TraceError> {
        self.math_op("sub", other)
    }

    /// Deferred multiplication.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed.
    pub fn mul(&self, other: &State) -> Result<State, TraceError> {
        self.math_op("mul", other)
    }

    /// Deferred division.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed. Division by a zero that only exists at run time
    /// is not a trace-time error; it surfaces as a host error envelope.
    pub fn div(&self, other: &State) -> Result<State, TraceError> {
        self.math_op("div", other)
    }

    /// Deferred negation.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless the operand is
    /// number-classed.
    pub fn neg(&self) -> Result<State, TraceError> {
        if !self.is_number() {
            return Err(TraceError::UnsupportedOperation {
                op: "neg",
                operands: vec![self.class.clone()],
            });
        }
        Ok(self.get("neg", State::none(), self.class.clone()))
    }

    /// Deferred equality comparison. Defined for all classes.
    #[must_use]
    pub fn equals(&self, other: &State) -> State {
        self.get("eq", other.clone(), Uri::new(vocab::NUMBER_BOOL))
    }

    /// Deferred inequality comparison. Defined for all classes.
    #[must_use]
    pub fn not_equals(&self, other: &State) -> State {
        self.get("ne", other.clone(), Uri::new(vocab::NUMBER_BOOL))
    }

    /// Deferred `>` comparison.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed.
    pub fn gt(&self, other: &State) -> Result<State, TraceError> {
        self.cmp_op("gt", other)
    }

    /// Deferred `>=` comparison.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed.
    pub fn gte(&self, other: &State) -> Result<State, TraceError> {
        self.cmp_op("gte", other)
    }

    /// Deferred `<` comparison.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed.
    pub fn lt(&self, other: &State) -> Result<State, TraceError> {
        self.cmp_op("lt", other)
    }

    /// Deferred `<=` comparison.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] unless both operands
    /// are number-classed.
    pub fn lte(&self, other: &State) -> Result<State, TraceError> {
        self.cmp_op("lte", other)
    }

    fn math_op(&self, op: &'static str, other: &State) -> Result<State, TraceError> {
        if !self.is_number() || !other.is_number() {
            return Err(TraceError::unsupported(op, &self.class, &other.class));
        }
        Ok(self.number_binop(op, other))
    }

    fn cmp_op(&self, op: &'static str, other: &State) -> Result<State, TraceError> {
        if !self.is_number() || !other.is_number() {
            return Err(TraceError::unsupported(op, &self.class, &other.class));
        }
        Ok(self.get(op, other.clone(), Uri::new(vocab::NUMBER_BOOL)))
    }

    /// Arithmetic without the class check; callers must know both operands
    /// are numbers. The result class is the common operand class, or the
    /// general number class when they differ.
    pub(crate) fn number_binop(&self, op: &str, other: &State) -> State {
        let rtype = if self.class == *other.class() {
            self.class.clone()
        } else {
            Uri::new(vocab::NUMBER)
        };
        self.get(op, other.clone(), rtype)
    }
}

impl From<Value> for State {
    fn from(value: Value) -> Self {
        State::value(value)
    }
}

impl From<bool> for State {
    fn from(b: bool) -> Self {
        State::boolean(b)
    }
}

impl From<i64> for State {
    fn from(i: i64) -> Self {
        State::int(i)
    }
}

impl From<f64> for State {
    fn from(f: f64) -> Self {
        State::float(f)
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        State::string(s)
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        State::string(s)
    }
}

impl From<Uri> for State {
    fn from(uri: Uri) -> Self {
        State::link(uri)
    }
}

/// A state statically known to be number-classed, carrying the infallible
/// operator surface. Where the type system can prove an operation is
/// supported, the mismatch is a compile error instead of a runtime
/// [`TraceError`].
#[derive(Debug, Clone, PartialEq)]
pub struct Number(State);

impl Number {
    /// An integer literal.
    #[must_use]
    pub fn int(i: i64) -> Self {
        Self(State::int(i))
    }

    /// A floating-point literal.
    #[must_use]
    pub fn float(f: f64) -> Self {
        Self(State::float(f))
    }

    /// Borrows the underlying state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.0
    }

    /// Unwraps the underlying state.
    #[must_use]
    pub fn into_state(self) -> State {
        self.0
    }

    /// Deferred `>=` comparison.
    #[must_use]
    pub fn gte(&self, other: &Number) -> Number {
        Number(self.0.get(
            "gte",
            other.0.clone(),
            Uri::new(vocab::NUMBER_BOOL),
        ))
    }

    /// Deferred `<` comparison.
    #[must_use]
    pub fn lt(&self, other: &Number) -> Number {
        Number(self.0.get(
            "lt",
            other.0.clone(),
            Uri::new(vocab::NUMBER_BOOL),
        ))
    }
}

impl TryFrom<State> for Number {
    type Error = TraceError;

    fn try_from(state: State) -> Result<Self, Self::Error> {
        if state.is_number() {
            Ok(Self(state))
        } else {
            Err(TraceError::UnsupportedOperation {
                op: "number",
                operands: vec![state.class().clone()],
            })
        }
    }
}

impl From<Number> for State {
    fn from(n: Number) -> Self {
        n.0
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        Number(self.0.number_binop("add", &rhs.0))
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        Number(self.0.number_binop("sub", &rhs.0))
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        Number(self.0.number_binop("mul", &rhs.0))
    }
}

impl Div for Number {
    type Output = Number;

    fn div(self, rhs: Number) -> Number {
        Number(self.0.number_binop("div", &rhs.0))
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        let class = self.0.class().clone();
        Number(self.0.get("neg", State::none(), class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::IdRef;

    fn placeholder(name: &str, class: &str) -> State {
        State::from_ref(Ref::Id(IdRef::new(name)), Uri::new(class))
    }

    #[test]
    fn literal_states_have_canonical_classes() {
        assert!(State::int(1).has_canonical_class());
        assert!(State::none().has_canonical_class());
        assert!(State::tuple(vec![State::int(1)]).has_canonical_class());
        assert!(!State::error(ErrorCode::NotFound, "gone").has_canonical_class());
    }

    #[test]
    fn arithmetic_on_placeholders_defers() {
        let x = placeholder("x", vocab::NUMBER_INT);
        let doubled = x.mul(&State::int(2)).expect("int * int is supported");
        assert!(matches!(doubled.form(), Form::Ref(_)));
        assert_eq!(doubled.class().as_str(), vocab::NUMBER_INT);
    }

    #[test]
    fn mixed_number_classes_widen_to_number() {
        let x = placeholder("x", vocab::NUMBER_INT);
        let y = placeholder("y", vocab::NUMBER_FLOAT);
        let sum = x.add(&y).expect("numbers add");
        assert_eq!(sum.class().as_str(), vocab::NUMBER);
    }

    #[test]
    fn arithmetic_on_strings_is_unsupported() {
        let s = State::string("abc");
        let err = s.add(&State::int(1)).expect_err("string + int must fail");
        assert!(matches!(err, TraceError::UnsupportedOperation { op: "add", .. }));
    }

    #[test]
    fn comparisons_produce_bool_class() {
        let x = placeholder("x", vocab::NUMBER_INT);
        let cond = x.gte(&State::int(0)).expect("int >= int is supported");
        assert_eq!(cond.class().as_str(), vocab::NUMBER_BOOL);
    }

    #[test]
    fn named_ref_subject_uses_id() {
        let x = placeholder("x", vocab::NUMBER_INT);
        match x.subject("add") {
            Subject::Id { name, path } => {
                assert_eq!(name, "x");
                assert_eq!(path, "add");
            }
            other => panic!("expected an id subject, got {other:?}"),
        }
    }

    #[test]
    fn derived_state_subject_is_method() {
        let x = placeholder("x", vocab::NUMBER_INT);
        let doubled = x.mul(&State::int(2)).expect("int * int is supported");
        assert!(matches!(doubled.subject("add"), Subject::Method { .. }));
    }

    #[test]
    fn link_subject_is_absolute() {
        let table = State::link(Uri::new("/app/table"));
        match table.subject("count") {
            Subject::Link(uri) => assert_eq!(uri.as_str(), "/app/table/count"),
            other => panic!("expected a link subject, got {other:?}"),
        }
    }

    #[test]
    fn number_ops_compile_and_defer() {
        let x = Number::try_from(placeholder("x", vocab::NUMBER_INT)).expect("placeholder is a number");
        let y = x.clone() * Number::int(2) + Number::int(1);
        assert!(matches!(y.state().form(), Form::Ref(_)));
    }

    #[test]
    fn error_states_decode_back_to_host_errors() {
        let err = State::error(ErrorCode::BadRequest, "negative input");
        let host = err.as_host_error().expect("error state decodes");
        assert_eq!(host.code, ErrorCode::BadRequest);
        assert_eq!(host.message, "negative input");
    }
}
