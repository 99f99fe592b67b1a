//! Tracing callables into op definitions.
//!
//! A [`Tracer`] runs a host-language callable once against placeholder
//! states. Every operation the callable performs on a placeholder records
//! a deferred node instead of computing a result, so the callable's body
//! comes back as a frozen [`Context`]: a pure description the host can
//! evaluate later. Tracing is deterministic; running the same callable
//! twice yields byte-identical graphs.

use indexmap::IndexMap;

use crate::class::ClassRegistry;
use crate::context::Context;
use crate::error::TraceError;
use crate::op::{OpDef, KEY_NAME, VALUE_NAME};
use crate::reference::{AfterRef, ClosureRef, IdRef, IfRef, Ref, WhileRef};
use crate::state::State;
use crate::uri::Uri;
use crate::vocab;

/// One formal parameter of a traced operation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Param {
    /// The parameter name.
    pub name: String,
    /// The parameter's class URI.
    pub class: Uri,
}

/// The callable's recovered interface: name, parameters, return class.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Signature {
    /// The operation name.
    pub name: String,
    /// The formal parameters, in declaration order.
    pub params: Vec<Param>,
    /// The return class URI.
    pub rtype: Uri,
}

/// Traces callables against a class registry.
///
/// The registry maps host-language class names to class URIs so that
/// placeholder parameters and return types carry the right classes.
#[derive(Debug, Clone, Copy)]
pub struct Tracer<'r> {
    registry: &'r ClassRegistry,
}

impl<'r> Tracer<'r> {
    /// Creates a tracer over the given registry.
    #[must_use]
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self { registry }
    }

    /// Traces a read operation with a single `key` parameter.
    ///
    /// The body receives a fresh context and a placeholder for the key;
    /// its return value becomes the op's result. A `rtype` of `None`
    /// means the generic state class.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Resolution`] if a class name is unknown, or
    /// whatever error the body itself raises.
    pub fn get_op<F>(
        &self,
        name: &str,
        key_class: &str,
        rtype: Option<&str>,
        body: F,
    ) -> Result<(OpDef, Signature), TraceError>
    where
        F: FnOnce(&mut Context, State) -> Result<State, TraceError>,
    {
        let key_class = self.registry.resolve(key_class)?;
        let rtype = self.resolve_rtype(rtype)?;

        let mut cxt = Context::new();
        let key = placeholder(KEY_NAME, key_class.clone());
        let result = body(&mut cxt, key)?;
        let graph = cxt.finalize(Some(result))?;

        let op = OpDef::Get {
            key_name: KEY_NAME.to_owned(),
            graph,
        };
        let sig = Signature {
            name: name.to_owned(),
            params: vec![Param {
                name: KEY_NAME.to_owned(),
                class: key_class,
            }],
            rtype,
        };
        Ok((op, sig))
    }

    /// Traces a write operation with `key` and `value` parameters.
    ///
    /// A write yields no value unless the body returns one.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Resolution`] if a class name is unknown,
    /// [`TraceError::EmptyContext`] if the body neither assigns nor
    /// returns anything, or whatever error the body itself raises.
    pub fn put_op<F>(
        &self,
        name: &str,
        key_class: &str,
        value_class: &str,
        body: F,
    ) -> Result<(OpDef, Signature), TraceError>
    where
        F: FnOnce(&mut Context, State, State) -> Result<Option<State>, TraceError>,
    {
        let key_class = self.registry.resolve(key_class)?;
        let value_class = self.registry.resolve(value_class)?;

        let mut cxt = Context::new();
        let key = placeholder(KEY_NAME, key_class.clone());
        let value = placeholder(VALUE_NAME, value_class.clone());
        let result = body(&mut cxt, key, value)?;
        let graph = cxt.finalize(result)?;

        let op = OpDef::Put {
            key_name: KEY_NAME.to_owned(),
            value_name: VALUE_NAME.to_owned(),
            graph,
        };
        let sig = Signature {
            name: name.to_owned(),
            params: vec![
                Param {
                    name: KEY_NAME.to_owned(),
                    class: key_class,
                },
                Param {
                    name: VALUE_NAME.to_owned(),
                    class: value_class,
                },
            ],
            rtype: Uri::new(vocab::VALUE_NONE),
        };
        Ok((op, sig))
    }

    /// Traces an invocation with named parameters.
    ///
    /// `params` pairs each parameter name with a registered class name,
    /// in declaration order. The body receives the placeholders keyed by
    /// name, in the same order.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Resolution`] if a class name is unknown, or
    /// whatever error the body itself raises.
    pub fn post_op<F>(
        &self,
        name: &str,
        params: &[(&str, &str)],
        rtype: Option<&str>,
        body: F,
    ) -> Result<(OpDef, Signature), TraceError>
    where
        F: FnOnce(&mut Context, IndexMap<String, State>) -> Result<State, TraceError>,
    {
        let rtype = self.resolve_rtype(rtype)?;

        let mut formals = Vec::with_capacity(params.len());
        let mut placeholders = IndexMap::with_capacity(params.len());
        for (param, class_name) in params {
            let class = self.registry.resolve(class_name)?;
            formals.push(Param {
                name: (*param).to_owned(),
                class: class.clone(),
            });
            placeholders.insert((*param).to_owned(), placeholder(param, class));
        }

        let mut cxt = Context::new();
        let result = body(&mut cxt, placeholders)?;
        let graph = cxt.finalize(Some(result))?;

        let op = OpDef::Post {
            params: formals.iter().map(|p| p.name.clone()).collect(),
            graph,
        };
        let sig = Signature {
            name: name.to_owned(),
            params: formals,
            rtype,
        };
        Ok((op, sig))
    }

    /// Traces a deletion with a single `key` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Resolution`] if the class name is unknown,
    /// [`TraceError::EmptyContext`] if the body neither assigns nor
    /// returns anything, or whatever error the body itself raises.
    pub fn delete_op<F>(
        &self,
        name: &str,
        key_class: &str,
        body: F,
    ) -> Result<(OpDef, Signature), TraceError>
    where
        F: FnOnce(&mut Context, State) -> Result<Option<State>, TraceError>,
    {
        let key_class = self.registry.resolve(key_class)?;

        let mut cxt = Context::new();
        let key = placeholder(KEY_NAME, key_class.clone());
        let result = body(&mut cxt, key)?;
        let graph = cxt.finalize(result)?;

        let op = OpDef::Delete {
            key_name: KEY_NAME.to_owned(),
            graph,
        };
        let sig = Signature {
            name: name.to_owned(),
            params: vec![Param {
                name: KEY_NAME.to_owned(),
                class: key_class,
            }],
            rtype: Uri::new(vocab::VALUE_NONE),
        };
        Ok((op, sig))
    }

    fn resolve_rtype(&self, rtype: Option<&str>) -> Result<Uri, TraceError> {
        match rtype {
            Some(name) => self.registry.resolve(name),
            None => Ok(Uri::new(vocab::STATE)),
        }
    }
}

/// A named placeholder state: a `$name` ref tagged with the given class.
fn placeholder(name: &str, class: Uri) -> State {
    State::from_ref(Ref::Id(IdRef::new(name)), class)
}

/// Defers a conditional. Both branches are built eagerly; the host picks
/// one at run time.
///
/// The result carries the branches' class when they agree and the generic
/// state class otherwise.
///
/// # Errors
///
/// Returns [`TraceError::UnsupportedOperation`] if `cond` is a concrete
/// non-boolean literal.
pub fn if_then_else(cond: State, then: State, or_else: State) -> Result<State, TraceError> {
    let class = if then.class() == or_else.class() {
        then.class().clone()
    } else {
        Uri::new(vocab::STATE)
    };
    let node = IfRef::new(cond, then, or_else)?;
    Ok(State::from_ref(Ref::If(node), class))
}

/// Defers `then` until every state in `when` has resolved. The result
/// carries `then`'s class.
#[must_use]
pub fn after(when: Vec<State>, then: State) -> State {
    let class = then.class().clone();
    State::from_ref(Ref::After(AfterRef::new(when, then)), class)
}

/// Defers an iterate-until-false loop over the named initial `state`.
///
/// The condition and step bodies are traced as invocations whose
/// parameters are the state's keys; each receives placeholders for the
/// current iteration's state. The condition must yield a boolean on the
/// host, the step yields the next state.
///
/// # Errors
///
/// Returns whatever error either body raises, or
/// [`TraceError::EmptyContext`] if a body returns nothing assignable.
pub fn while_loop<C, S>(
    state: IndexMap<String, State>,
    cond: C,
    step: S,
) -> Result<State, TraceError>
where
    C: FnOnce(&mut Context, &IndexMap<String, State>) -> Result<State, TraceError>,
    S: FnOnce(&mut Context, &IndexMap<String, State>) -> Result<State, TraceError>,
{
    let cond = trace_loop_body(&state, cond)?;
    let step = trace_loop_body(&state, step)?;
    let node = WhileRef::new(cond, step, state);
    Ok(State::from_ref(Ref::While(node), Uri::new(vocab::STATE)))
}

fn trace_loop_body<F>(
    state: &IndexMap<String, State>,
    body: F,
) -> Result<OpDef, TraceError>
where
    F: FnOnce(&mut Context, &IndexMap<String, State>) -> Result<State, TraceError>,
{
    let placeholders: IndexMap<String, State> = state
        .iter()
        .map(|(name, value)| (name.clone(), placeholder(name, value.class().clone())))
        .collect();

    let mut cxt = Context::new();
    let result = body(&mut cxt, &placeholders)?;
    let graph = cxt.finalize(Some(result))?;

    Ok(OpDef::Post {
        params: state.keys().cloned().collect(),
        graph,
    })
}

/// Bundles a traced op with its captured environment.
///
/// # Errors
///
/// Returns [`TraceError::Resolution`] if the op refers to a name outside
/// its own parameters that `captures` does not provide.
pub fn closure(captures: IndexMap<String, State>, op: OpDef) -> Result<State, TraceError> {
    let node = ClosureRef::new(captures, op)?;
    Ok(State::from_ref(
        Ref::Closure(node),
        Uri::new(vocab::REF_CLOSURE),
    ))
}
