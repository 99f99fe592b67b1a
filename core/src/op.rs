//! Traced operation definitions.
//!
//! An [`OpDef`] is the structural remains of a callable after tracing: its
//! parameter names plus the frozen graph its body recorded. The four kinds
//! mirror the op-ref methods.

use std::collections::{BTreeSet, HashSet};

use crate::context::Context;
use crate::reference::{collect_free, Method};
use crate::uri::Uri;
use crate::vocab;

/// The conventional name of a GET/PUT/DELETE key parameter.
pub const KEY_NAME: &str = "key";

/// The conventional name of a PUT value parameter.
pub const VALUE_NAME: &str = "value";

/// A traced operation: parameter names plus the recorded graph.
#[derive(Debug, Clone, PartialEq)]
pub enum OpDef {
    /// A read: one key parameter.
    Get {
        /// The key parameter name.
        key_name: String,
        /// The traced body.
        graph: Context,
    },
    /// A write: key and value parameters.
    Put {
        /// The key parameter name.
        key_name: String,
        /// The value parameter name.
        value_name: String,
        /// The traced body.
        graph: Context,
    },
    /// An invocation: ordered named parameters.
    Post {
        /// The parameter names, in declaration order.
        params: Vec<String>,
        /// The traced body.
        graph: Context,
    },
    /// A deletion: one key parameter.
    Delete {
        /// The key parameter name.
        key_name: String,
        /// The traced body.
        graph: Context,
    },
}

impl OpDef {
    /// The method kind of this op.
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            OpDef::Get { .. } => Method::Get,
            OpDef::Put { .. } => Method::Put,
            OpDef::Post { .. } => Method::Post,
            OpDef::Delete { .. } => Method::Delete,
        }
    }

    /// The class URI this op encodes under.
    #[must_use]
    pub fn class_uri(&self) -> Uri {
        self.method().def_uri()
    }

    /// The traced body graph.
    #[must_use]
    pub fn graph(&self) -> &Context {
        match self {
            OpDef::Get { graph, .. }
            | OpDef::Put { graph, .. }
            | OpDef::Post { graph, .. }
            | OpDef::Delete { graph, .. } => graph,
        }
    }

    /// The parameter names, in order.
    #[must_use]
    pub fn params(&self) -> Vec<&str> {
        match self {
            OpDef::Get { key_name, .. } | OpDef::Delete { key_name, .. } => vec![key_name],
            OpDef::Put {
                key_name,
                value_name,
                ..
            } => vec![key_name, value_name],
            OpDef::Post { params, .. } => params.iter().map(String::as_str).collect(),
        }
    }

    /// The names this op references but does not bind: not a parameter,
    /// not a local assignment, not the method receiver. A closure must
    /// capture every one of these.
    #[must_use]
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut bound: HashSet<String> = self
            .params()
            .iter()
            .map(|name| (*name).to_owned())
            .collect();
        bound.insert(vocab::SELF_NAME.to_owned());

        let mut free = BTreeSet::new();
        for (name, state) in self.graph().iter() {
            collect_free(state, &bound, &mut free);
            bound.insert(name.to_owned());
        }
        free
    }
}
