//! The graph container.
//!
//! A [`Context`] is one traced program: an insertion-ordered mapping from
//! names to states plus a designated result. Assignment order is
//! semantically meaningful; it becomes evaluation order on the host.
//! The auto-name counter is owned by each instance, never shared, so
//! sibling traces are independent and a trace is reproducible bit for bit.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::TraceError;
use crate::reference::{IdRef, OpArgs, OpRef, Ref, Subject};
use crate::state::{Form, State};
use crate::vocab;

/// An insertion-ordered, named collection of assignments forming one
/// traced program plus its result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    entries: IndexMap<String, State>,
    counter: u64,
    frozen: bool,
}

impl Context {
    /// Creates an empty, unfrozen context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name` and returns a reference to the name.
    ///
    /// The returned state is a `$name` ref tagged with the value's class.
    /// Reading an assignment yields the reference, never the value.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::NameCollision`] if `name` is already assigned
    /// and [`TraceError::Frozen`] if the context was already finalized.
    pub fn assign(
        &mut self,
        name: impl Into<String>,
        value: impl Into<State>,
    ) -> Result<State, TraceError> {
        let name = name.into();
        if self.frozen {
            return Err(TraceError::Frozen);
        }
        if self.entries.contains_key(&name) {
            return Err(TraceError::NameCollision(name));
        }
        let value = value.into();
        let class = value.class().clone();
        self.entries.insert(name.clone(), value);
        Ok(State::from_ref(Ref::Id(IdRef::new(name)), class))
    }

    /// Stores `value` under the next auto-generated name.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Frozen`] if the context was already finalized.
    pub fn assign_auto(&mut self, value: impl Into<State>) -> Result<State, TraceError> {
        if self.frozen {
            return Err(TraceError::Frozen);
        }
        let name = loop {
            let candidate = format!("_{:02x}", self.counter);
            self.counter += 1;
            if !self.entries.contains_key(&candidate) {
                break candidate;
            }
        };
        self.assign(name, value)
    }

    /// Returns the state assigned under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&State> {
        self.entries.get(name)
    }

    /// Iterates the assignments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &State)> {
        self.entries.iter().map(|(name, state)| (name.as_str(), state))
    }

    /// The number of assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true once the context has been finalized.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The designated result: the `_return` assignment if present,
    /// otherwise the last assignment.
    #[must_use]
    pub fn result(&self) -> Option<&State> {
        self.entries
            .get(vocab::RETURN_NAME)
            .or_else(|| self.entries.last().map(|(_, state)| state))
    }

    /// Freezes this context, making it ready for encoding.
    ///
    /// Every method-subject op in the graph is hoisted: its unnamed
    /// intermediate state is assigned under an auto-generated name placed
    /// immediately before the entry that references it, so prerequisites
    /// always precede their dependents in the encoded form. If `result` is
    /// given it is stored under the reserved `_return` name; otherwise the
    /// last assignment (or an explicit `_return` assignment) is the result.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Frozen`] if already finalized,
    /// [`TraceError::NameCollision`] if `result` is given but `_return`
    /// was also assigned explicitly, and [`TraceError::EmptyContext`] if
    /// the finalized graph would contain no assignments at all.
    pub fn finalize(self, result: Option<State>) -> Result<Context, TraceError> {
        if self.frozen {
            return Err(TraceError::Frozen);
        }

        let mut reserved: HashSet<String> =
            self.entries.keys().cloned().collect();
        reserved.insert(vocab::RETURN_NAME.to_owned());

        let mut hoister = Hoister {
            out: IndexMap::with_capacity(self.entries.len() + 1),
            reserved,
            counter: self.counter,
        };

        for (name, state) in self.entries {
            let rewritten = hoister.hoist_state(state);
            hoister.out.insert(name, rewritten);
        }

        if let Some(result) = result {
            if hoister.out.contains_key(vocab::RETURN_NAME) {
                return Err(TraceError::NameCollision(vocab::RETURN_NAME.to_owned()));
            }
            let rewritten = hoister.hoist_state(result);
            hoister.out.insert(vocab::RETURN_NAME.to_owned(), rewritten);
        }

        if hoister.out.is_empty() {
            return Err(TraceError::EmptyContext);
        }

        Ok(Context {
            entries: hoister.out,
            counter: hoister.counter,
            frozen: true,
        })
    }

    /// Rebuilds a frozen context from decoded entries.
    pub(crate) fn from_frozen(entries: IndexMap<String, State>) -> Self {
        Self {
            entries,
            counter: 0,
            frozen: true,
        }
    }
}

/// Rewrites states front to back, emitting hoisted intermediates into the
/// output map just before the state that references them.
struct Hoister {
    out: IndexMap<String, State>,
    reserved: HashSet<String>,
    counter: u64,
}

impl Hoister {
    fn emit(&mut self, state: State) -> String {
        let name = loop {
            let candidate = format!("_{:02x}", self.counter);
            self.counter += 1;
            if !self.reserved.contains(&candidate) && !self.out.contains_key(&candidate) {
                break candidate;
            }
        };
        self.out.insert(name.clone(), state);
        name
    }

    fn hoist_state(&mut self, state: State) -> State {
        let (class, form) = state.into_parts();
        let form = match form {
            Form::Value(v) => Form::Value(v),
            Form::Tuple(items) => Form::Tuple(
                items.into_iter().map(|item| self.hoist_state(item)).collect(),
            ),
            Form::Map(entries) => Form::Map(
                entries
                    .into_iter()
                    .map(|(name, entry)| (name, self.hoist_state(entry)))
                    .collect(),
            ),
            Form::Ref(r) => Form::Ref(Box::new(self.hoist_ref(*r))),
        };
        State::opaque(class, form)
    }

    fn hoist_ref(&mut self, r: Ref) -> Ref {
        match r {
            Ref::Id(id) => Ref::Id(id),
            Ref::Op(op) => {
                let (subject, args) = op.into_parts();
                let subject = match subject {
                    Subject::Method { subject, path } => {
                        let hoisted = self.hoist_state(*subject);
                        let name = self.emit(hoisted);
                        Subject::Id { name, path }
                    }
                    other => other,
                };
                let args = match args {
                    OpArgs::Get(key) => OpArgs::Get(Box::new(self.hoist_state(*key))),
                    OpArgs::Put(key, value) => OpArgs::Put(
                        Box::new(self.hoist_state(*key)),
                        Box::new(self.hoist_state(*value)),
                    ),
                    OpArgs::Post(params) => OpArgs::Post(
                        params
                            .into_iter()
                            .map(|(name, arg)| (name, self.hoist_state(arg)))
                            .collect(),
                    ),
                    OpArgs::Delete(key) => OpArgs::Delete(Box::new(self.hoist_state(*key))),
                };
                Ref::Op(OpRef::from_parts(subject, args))
            }
            Ref::If(cond) => {
                let (cond, then, or_else) = cond.into_parts();
                let cond = self.hoist_state(cond);
                let then = self.hoist_state(then);
                let or_else = self.hoist_state(or_else);
                Ref::If(crate::reference::IfRef::from_parts(cond, then, or_else))
            }
            Ref::While(wh) => {
                let (cond, step, state) = wh.into_parts();
                let state = state
                    .into_iter()
                    .map(|(name, entry)| (name, self.hoist_state(entry)))
                    .collect();
                Ref::While(crate::reference::WhileRef::new(cond, step, state))
            }
            Ref::After(after) => {
                let (when, then) = after.into_parts();
                let when = when
                    .into_iter()
                    .map(|dep| self.hoist_state(dep))
                    .collect();
                let then = self.hoist_state(then);
                Ref::After(crate::reference::AfterRef::new(when, then))
            }
            Ref::Closure(closure) => {
                let (captures, op) = closure.into_parts();
                let captures = captures
                    .into_iter()
                    .map(|(name, capture)| (name, self.hoist_state(capture)))
                    .collect();
                Ref::Closure(crate::reference::ClosureRef::from_parts(captures, op))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::Uri;

    #[test]
    fn assignment_returns_a_reference() {
        let mut cxt = Context::new();
        let x = cxt.assign("x", State::int(1)).expect("fresh name");
        match x.form() {
            Form::Ref(r) => assert!(matches!(r.as_ref(), Ref::Id(id) if id.name() == "x")),
            other => panic!("expected a ref form, got {other:?}"),
        }
        assert_eq!(x.class().as_str(), crate::vocab::NUMBER_INT);
    }

    #[test]
    fn duplicate_names_collide() {
        let mut cxt = Context::new();
        cxt.assign("x", State::int(1)).expect("fresh name");
        let err = cxt.assign("x", State::int(2)).expect_err("duplicate");
        assert_eq!(err, TraceError::NameCollision("x".to_owned()));
    }

    #[test]
    fn frozen_contexts_reject_assignment() {
        let mut cxt = Context::new();
        cxt.assign("x", State::int(1)).expect("fresh name");
        let mut frozen = cxt.finalize(None).expect("non-empty");
        assert!(frozen.is_frozen());
        assert_eq!(frozen.assign("y", State::int(2)), Err(TraceError::Frozen));
    }

    #[test]
    fn empty_contexts_do_not_finalize() {
        let cxt = Context::new();
        assert_eq!(cxt.finalize(None), Err(TraceError::EmptyContext));
    }

    #[test]
    fn the_result_lands_under_return() {
        let cxt = Context::new();
        let frozen = cxt
            .finalize(Some(State::int(42)))
            .expect("result makes it non-empty");
        assert_eq!(frozen.result(), Some(&State::int(42)));
        assert!(frozen.get(vocab::RETURN_NAME).is_some());
    }

    #[test]
    fn explicit_return_assignment_is_the_result() {
        let mut cxt = Context::new();
        cxt.assign(vocab::RETURN_NAME, State::int(7)).expect("fresh name");
        let frozen = cxt.finalize(None).expect("non-empty");
        assert_eq!(frozen.result(), Some(&State::int(7)));
    }

    #[test]
    fn explicit_and_passed_results_collide() {
        let mut cxt = Context::new();
        cxt.assign(vocab::RETURN_NAME, State::int(7)).expect("fresh name");
        let err = cxt.finalize(Some(State::int(8))).expect_err("two results");
        assert_eq!(err, TraceError::NameCollision(vocab::RETURN_NAME.to_owned()));
    }

    #[test]
    fn method_subjects_are_hoisted_before_their_dependents() {
        // (1 + 2).mul(3) with no names anywhere: the literal receiver and
        // the inner sum must both become assignments the product can
        // reference, in dependency order.
        let one = State::int(1);
        let sum = one.get("add", State::int(2), Uri::new(crate::vocab::NUMBER_INT));
        let product = sum.get("mul", State::int(3), Uri::new(crate::vocab::NUMBER_INT));

        let cxt = Context::new();
        let frozen = cxt.finalize(Some(product)).expect("non-empty");

        let names: Vec<&str> = frozen.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["_00", "_01", vocab::RETURN_NAME]);
        assert_eq!(frozen.get("_00"), Some(&State::int(1)));

        let result = frozen.result().expect("result present");
        match result.form() {
            Form::Ref(r) => match r.as_ref() {
                Ref::Op(op) => match op.subject() {
                    Subject::Id { name, path } => {
                        assert_eq!(name, "_01");
                        assert_eq!(path, "mul");
                    }
                    other => panic!("expected an id subject, got {other:?}"),
                },
                other => panic!("expected an op ref, got {other:?}"),
            },
            other => panic!("expected a ref form, got {other:?}"),
        }
    }

    #[test]
    fn auto_assignment_picks_the_next_free_name() {
        let mut cxt = Context::new();
        cxt.assign("_00", State::int(1)).expect("fresh name");
        let auto = cxt.assign_auto(State::int(2)).expect("not frozen");
        match auto.form() {
            Form::Ref(r) => assert!(matches!(r.as_ref(), Ref::Id(id) if id.name() == "_01")),
            other => panic!("expected a ref form, got {other:?}"),
        }
        assert_eq!(cxt.get("_01"), Some(&State::int(2)));

        let mut frozen = cxt.finalize(None).expect("non-empty");
        assert_eq!(frozen.assign_auto(State::int(3)), Err(TraceError::Frozen));
    }

    #[test]
    fn auto_names_skip_user_names() {
        let mut cxt = Context::new();
        cxt.assign("_00", State::int(1)).expect("fresh name");
        let one = State::int(1);
        let sum = one.get("add", State::int(2), Uri::new(crate::vocab::NUMBER_INT));
        let frozen = cxt.finalize(Some(sum)).expect("non-empty");
        let names: Vec<&str> = frozen.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["_00", "_01", vocab::RETURN_NAME]);
    }
}
