//! Deferred computation graphs traced from ordinary host-language code.
//!
//! The `tracegraph` crate records the operations performed on placeholder
//! values into a typed graph of references, then serializes that graph
//! into a canonical JSON wire format for evaluation by a remote engine.
//! Writing `a + b` on two placeholders produces a graph node, never a
//! number; the engine that owns the data performs the arithmetic.
//!
//! # Entry point
//!
//! ```
//! use tracegraph::{ClassRegistry, Tracer};
//!
//! # fn main() -> Result<(), tracegraph::TraceError> {
//! let registry = ClassRegistry::new();
//! let tracer = Tracer::new(&registry);
//!
//! let (op, sig) = tracer.get_op("double", "Int", Some("Int"), |_cxt, x| x.mul(&x))?;
//! assert_eq!(sig.rtype.as_str(), "/state/scalar/value/number/int");
//!
//! let encoded = tracegraph::wire::encode_op(&op);
//! assert!(encoded.get("/state/scalar/op/get").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Control flow
//!
//! Conditionals, loops, and ordering are graph nodes too: see
//! [`if_then_else`], [`while_loop`], and [`after`]. A traced graph is
//! handed to an engine through the [`Host`] seam and the response decodes
//! back into a typed [`State`] via [`wire::decode_response`].

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod class;
pub mod context;
pub mod error;
pub mod host;
pub mod op;
pub mod range;
pub mod reference;
pub mod state;
pub mod trace;
pub mod uri;
pub mod value;
pub mod vocab;
pub mod wire;

pub use class::{ClassBuilder, ClassDef, ClassRegistry, MethodDef};
pub use context::Context;
pub use error::{DecodeError, ErrorCode, HostError, ResponseError, TraceError};
pub use host::{execute, Host};
pub use op::OpDef;
pub use range::{BTree, KeyPart, RangeSpec};
pub use reference::{
    AfterRef, ClosureRef, IdRef, IfRef, Method, OpArgs, OpRef, Ref, Subject, WhileRef,
};
pub use state::{Form, Number, State};
pub use trace::{after, closure, if_then_else, while_loop, Param, Signature, Tracer};
pub use uri::{ParseUriError, Uri};
pub use value::Value;
