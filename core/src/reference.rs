//! Deferred operation nodes.
//!
//! A [`Ref`] describes an operation to perform rather than a value already
//! computed. Every variant exposes a stable class URI for encoding and the
//! set of child states it directly depends on; none of them ever holds a
//! live function pointer. Once traced, a callable exists in the graph only
//! as structure: a name, an embedded graph, and captured arguments.

use indexmap::IndexMap;

use crate::error::TraceError;
use crate::op::OpDef;
use crate::state::{Form, State};
use crate::uri::Uri;
use crate::value::Value;
use crate::vocab;

/// A reference to a named assignment in the enclosing context: `$name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRef {
    name: String,
}

impl IdRef {
    /// Creates a reference to the given assignment name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The assignment name referred to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for IdRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name)
    }
}

/// The four operation kinds, named after their transport verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// A read: subject + key.
    Get,
    /// A write: subject + key + value.
    Put,
    /// An invocation: subject + named arguments.
    Post,
    /// A deletion: subject + key.
    Delete,
}

impl Method {
    /// Returns the lowercase verb.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
        }
    }

    /// The class URI of op-refs with this method.
    #[must_use]
    pub fn ref_uri(self) -> Uri {
        let path = match self {
            Method::Get => vocab::OP_REF_GET,
            Method::Put => vocab::OP_REF_PUT,
            Method::Post => vocab::OP_REF_POST,
            Method::Delete => vocab::OP_REF_DELETE,
        };
        Uri::new(path)
    }

    /// The class URI of traced op definitions with this method.
    #[must_use]
    pub fn def_uri(self) -> Uri {
        let path = match self {
            Method::Get => vocab::OP_DEF_GET,
            Method::Put => vocab::OP_DEF_PUT,
            Method::Post => vocab::OP_DEF_POST,
            Method::Delete => vocab::OP_DEF_DELETE,
        };
        Uri::new(path)
    }
}

/// The subject an op-ref applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// An absolute address, e.g. `/app/table/count`.
    Link(Uri),
    /// A method on a named assignment: `$name/path`.
    Id {
        /// The assignment name.
        name: String,
        /// The method path under the named state (may be empty).
        path: String,
    },
    /// A method on an unnamed intermediate state. Finalizing a context
    /// hoists the intermediate into an auto-named assignment, turning this
    /// into an [`Subject::Id`]; it never appears in a frozen graph.
    Method {
        /// The intermediate state the method applies to.
        subject: Box<State>,
        /// The method path under it (may be empty).
        path: String,
    },
}

impl Subject {
    /// The intermediate state this subject depends on, if any.
    #[must_use]
    pub fn dep(&self) -> Option<&State> {
        match self {
            Subject::Method { subject, .. } => Some(subject),
            _ => None,
        }
    }
}

/// The arguments of an op-ref; the variant fixes the method.
#[derive(Debug, Clone, PartialEq)]
pub enum OpArgs {
    /// `get(key)`
    Get(Box<State>),
    /// `put(key, value)`
    Put(Box<State>, Box<State>),
    /// `post(name -> arg)`
    Post(IndexMap<String, State>),
    /// `delete(key)`
    Delete(Box<State>),
}

/// Application of a named operation to a subject.
#[derive(Debug, Clone, PartialEq)]
pub struct OpRef {
    subject: Subject,
    args: OpArgs,
}

impl OpRef {
    /// A deferred read. Failures ("key not found") are not raised here;
    /// they surface as decoded error envelopes at host time.
    #[must_use]
    pub fn get(subject: Subject, key: State) -> Self {
        Self {
            subject,
            args: OpArgs::Get(Box::new(key)),
        }
    }

    /// A deferred write.
    #[must_use]
    pub fn put(subject: Subject, key: State, value: State) -> Self {
        Self {
            subject,
            args: OpArgs::Put(Box::new(key), Box::new(value)),
        }
    }

    /// A deferred invocation with named arguments.
    #[must_use]
    pub fn post(subject: Subject, params: IndexMap<String, State>) -> Self {
        Self {
            subject,
            args: OpArgs::Post(params),
        }
    }

    /// A deferred deletion.
    #[must_use]
    pub fn delete(subject: Subject, key: State) -> Self {
        Self {
            subject,
            args: OpArgs::Delete(Box::new(key)),
        }
    }

    /// Rebuilds this op-ref with a different subject.
    #[must_use]
    pub fn with_subject(self, subject: Subject) -> Self {
        Self { subject, ..self }
    }

    /// The subject this op applies to.
    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// The arguments of this op.
    #[must_use]
    pub fn args(&self) -> &OpArgs {
        &self.args
    }

    /// The method of this op.
    #[must_use]
    pub fn method(&self) -> Method {
        match &self.args {
            OpArgs::Get(_) => Method::Get,
            OpArgs::Put(_, _) => Method::Put,
            OpArgs::Post(_) => Method::Post,
            OpArgs::Delete(_) => Method::Delete,
        }
    }

    /// The child states this op directly depends on.
    #[must_use]
    pub fn deps(&self) -> Vec<&State> {
        let mut deps = Vec::new();
        if let Some(subject) = self.subject.dep() {
            deps.push(subject);
        }
        match &self.args {
            OpArgs::Get(key) | OpArgs::Delete(key) => deps.push(key),
            OpArgs::Put(key, value) => {
                deps.push(key);
                deps.push(value);
            }
            OpArgs::Post(params) => deps.extend(params.values()),
        }
        deps
    }

    pub(crate) fn into_parts(self) -> (Subject, OpArgs) {
        (self.subject, self.args)
    }

    pub(crate) fn from_parts(subject: Subject, args: OpArgs) -> Self {
        Self { subject, args }
    }
}

/// A three-part conditional. Both branches are traced eagerly; selecting
/// one is the host's job, never the tracer's.
#[derive(Debug, Clone, PartialEq)]
pub struct IfRef {
    cond: State,
    then: State,
    or_else: State,
}

impl IfRef {
    /// Builds a conditional over the given condition and branches.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnsupportedOperation`] if the condition is a
    /// concrete non-boolean literal; a still-symbolic condition, including
    /// a link to a remote boolean, is checked by the host instead.
    pub fn new(cond: State, then: State, or_else: State) -> Result<Self, TraceError> {
        let boolish = cond.is_number()
            || cond.class().as_str() == vocab::STATE
            || matches!(cond.form(), Form::Ref(_) | Form::Value(Value::Link(_)));
        if !boolish {
            return Err(TraceError::UnsupportedOperation {
                op: "if",
                operands: vec![cond.class().clone()],
            });
        }
        Ok(Self { cond, then, or_else })
    }

    /// The condition.
    #[must_use]
    pub fn cond(&self) -> &State {
        &self.cond
    }

    /// The then-branch.
    #[must_use]
    pub fn then(&self) -> &State {
        &self.then
    }

    /// The else-branch.
    #[must_use]
    pub fn or_else(&self) -> &State {
        &self.or_else
    }

    pub(crate) fn into_parts(self) -> (State, State, State) {
        (self.cond, self.then, self.or_else)
    }

    /// Rebuilds a conditional whose parts were already validated.
    pub(crate) fn from_parts(cond: State, then: State, or_else: State) -> Self {
        Self { cond, then, or_else }
    }
}

/// An iterate-until-false loop. The condition and step are traced ops over
/// the named loop state; termination is verified by the host at run time,
/// never at trace time.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileRef {
    cond: OpDef,
    step: OpDef,
    state: IndexMap<String, State>,
}

impl WhileRef {
    /// Builds a loop from already-traced condition and step ops and the
    /// initial named state.
    #[must_use]
    pub fn new(cond: OpDef, step: OpDef, state: IndexMap<String, State>) -> Self {
        Self { cond, step, state }
    }

    /// The traced loop condition.
    #[must_use]
    pub fn cond(&self) -> &OpDef {
        &self.cond
    }

    /// The traced loop step.
    #[must_use]
    pub fn step(&self) -> &OpDef {
        &self.step
    }

    /// The initial named loop state.
    #[must_use]
    pub fn state(&self) -> &IndexMap<String, State> {
        &self.state
    }

    pub(crate) fn into_parts(self) -> (OpDef, OpDef, IndexMap<String, State>) {
        (self.cond, self.step, self.state)
    }
}

/// Sequence-then-value: the host must treat `when` as prerequisites of
/// `then`. This establishes a partial order, nothing more.
#[derive(Debug, Clone, PartialEq)]
pub struct AfterRef {
    when: Vec<State>,
    then: Box<State>,
}

impl AfterRef {
    /// Builds an ordering edge from the prerequisites to the value.
    #[must_use]
    pub fn new(when: Vec<State>, then: State) -> Self {
        Self {
            when,
            then: Box::new(then),
        }
    }

    /// The prerequisite states, in order.
    #[must_use]
    pub fn when(&self) -> &[State] {
        &self.when
    }

    /// The value yielded once the prerequisites are done.
    #[must_use]
    pub fn then(&self) -> &State {
        &self.then
    }

    pub(crate) fn into_parts(self) -> (Vec<State>, State) {
        (self.when, *self.then)
    }
}

/// A traced callable bundled with the outer-scope states it references.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureRef {
    captures: IndexMap<String, State>,
    op: OpDef,
}

impl ClosureRef {
    /// Pairs a traced op with its captured environment.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Resolution`] if any free variable of the op
    /// is not provided by `captures`.
    pub fn new(captures: IndexMap<String, State>, op: OpDef) -> Result<Self, TraceError> {
        for free in op.free_variables() {
            if !captures.contains_key(&free) {
                return Err(TraceError::Resolution(format!(
                    "closure free variable ${free}"
                )));
            }
        }
        Ok(Self { captures, op })
    }

    /// The captured environment, in capture order.
    #[must_use]
    pub fn captures(&self) -> &IndexMap<String, State> {
        &self.captures
    }

    /// The traced op.
    #[must_use]
    pub fn op(&self) -> &OpDef {
        &self.op
    }

    pub(crate) fn into_parts(self) -> (IndexMap<String, State>, OpDef) {
        (self.captures, self.op)
    }

    /// Rebuilds a closure whose captures were already validated.
    pub(crate) fn from_parts(captures: IndexMap<String, State>, op: OpDef) -> Self {
        Self { captures, op }
    }
}

/// A deferred operation node.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref {
    /// A reference to a named assignment.
    Id(IdRef),
    /// Application of a named operation to a subject.
    Op(OpRef),
    /// A conditional.
    If(IfRef),
    /// A loop.
    While(WhileRef),
    /// An ordering edge.
    After(AfterRef),
    /// A traced callable with captures.
    Closure(ClosureRef),
}

impl Ref {
    /// The stable class URI of this node kind.
    #[must_use]
    pub fn class_uri(&self) -> Uri {
        match self {
            Ref::Id(_) => Uri::new(vocab::REF_ID),
            Ref::Op(op) => op.method().ref_uri(),
            Ref::If(_) => Uri::new(vocab::REF_IF),
            Ref::While(_) => Uri::new(vocab::REF_WHILE),
            Ref::After(_) => Uri::new(vocab::REF_AFTER),
            Ref::Closure(_) => Uri::new(vocab::REF_CLOSURE),
        }
    }

    /// The child states this node directly depends on. Embedded op graphs
    /// (loop bodies, closure bodies) are closed and do not contribute.
    #[must_use]
    pub fn deps(&self) -> Vec<&State> {
        match self {
            Ref::Id(_) => Vec::new(),
            Ref::Op(op) => op.deps(),
            Ref::If(cond) => vec![cond.cond(), cond.then(), cond.or_else()],
            Ref::While(wh) => wh.state().values().collect(),
            Ref::After(after) => {
                let mut deps: Vec<&State> = after.when().iter().collect();
                deps.push(after.then());
                deps
            }
            Ref::Closure(closure) => closure.captures().values().collect(),
        }
    }
}

/// Walks a state's dependency graph, adding every free `$name` reference
/// that is not in `bound` to `out`. Embedded op graphs contribute their own
/// free variables, computed against their own parameters and assignments.
pub(crate) fn collect_free(
    state: &State,
    bound: &std::collections::HashSet<String>,
    out: &mut std::collections::BTreeSet<String>,
) {
    match state.form() {
        Form::Value(Value::Link(uri)) => {
            if let Some(name) = uri.as_str().strip_prefix('$') {
                let name = name.split('/').next().unwrap_or_default();
                if !name.is_empty() && !bound.contains(name) {
                    out.insert(name.to_owned());
                }
            }
        }
        Form::Value(_) => {}
        Form::Tuple(items) => {
            for item in items {
                collect_free(item, bound, out);
            }
        }
        Form::Map(entries) => {
            for entry in entries.values() {
                collect_free(entry, bound, out);
            }
        }
        Form::Ref(r) => collect_free_ref(r, bound, out),
    }
}

fn collect_free_ref(
    r: &Ref,
    bound: &std::collections::HashSet<String>,
    out: &mut std::collections::BTreeSet<String>,
) {
    match r {
        Ref::Id(id) => {
            if !bound.contains(id.name()) {
                out.insert(id.name().to_owned());
            }
        }
        Ref::Op(op) => {
            if let Subject::Id { name, .. } = op.subject() {
                if !bound.contains(name) {
                    out.insert(name.clone());
                }
            }
            for dep in op.deps() {
                collect_free(dep, bound, out);
            }
        }
        Ref::While(wh) => {
            for dep in wh.state().values() {
                collect_free(dep, bound, out);
            }
            for free in wh.cond().free_variables() {
                if !bound.contains(&free) {
                    out.insert(free);
                }
            }
            for free in wh.step().free_variables() {
                if !bound.contains(&free) {
                    out.insert(free);
                }
            }
        }
        Ref::Closure(closure) => {
            // The closure's own captures satisfy its op; only the capture
            // values themselves can refer outward.
            for dep in closure.captures().values() {
                collect_free(dep, bound, out);
            }
        }
        other => {
            for dep in other.deps() {
                collect_free(dep, bound, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_uris_are_stable() {
        let id = Ref::Id(IdRef::new("x"));
        assert_eq!(id.class_uri().as_str(), vocab::REF_ID);

        let get = Ref::Op(OpRef::get(
            Subject::Link(Uri::new("/app/table/count")),
            State::none(),
        ));
        assert_eq!(get.class_uri().as_str(), vocab::OP_REF_GET);
    }

    #[test]
    fn if_rejects_concrete_non_boolean_condition() {
        let err = IfRef::new(State::string("yes"), State::int(1), State::int(2));
        assert!(err.is_err());

        let ok = IfRef::new(State::boolean(true), State::int(1), State::int(2));
        assert!(ok.is_ok());
    }

    #[test]
    fn if_accepts_a_link_condition() {
        let cond = State::link(Uri::new("/app/flags/enabled"));
        let ok = IfRef::new(cond, State::int(1), State::int(2));
        assert!(ok.is_ok());
    }

    #[test]
    fn op_ref_deps_cover_subject_and_args() {
        let subject = Subject::Method {
            subject: Box::new(State::int(1)),
            path: "add".to_owned(),
        };
        let op = OpRef::get(subject, State::int(2));
        assert_eq!(op.deps().len(), 2);
    }

    #[test]
    fn after_deps_order_prerequisites_first() {
        let after = AfterRef::new(vec![State::int(1), State::int(2)], State::int(3));
        let deps = after_deps(&Ref::After(after));
        assert_eq!(deps, vec![State::int(1), State::int(2), State::int(3)]);
    }

    fn after_deps(r: &Ref) -> Vec<State> {
        r.deps().into_iter().cloned().collect()
    }

    #[test]
    fn free_variables_see_id_subjects() {
        let op = Ref::Op(OpRef::get(
            Subject::Id {
                name: "k".to_owned(),
                path: "add".to_owned(),
            },
            State::int(1),
        ));
        let state = State::from_ref(op, Uri::new(vocab::NUMBER_INT));

        let bound = std::collections::HashSet::new();
        let mut free = std::collections::BTreeSet::new();
        collect_free(&state, &bound, &mut free);
        assert!(free.contains("k"));
    }
}
