//! Wire type-URI vocabulary.
//!
//! Every encodable form is keyed by one of these paths. The vocabulary is
//! closed: the decoder recognizes exactly these tags, plus arbitrary
//! `/state/...` paths for opaque composite states.

/// The generic state capability; the default class of untyped references.
pub const STATE: &str = "/state";

/// Insertion-ordered mapping of names to states.
pub const MAP: &str = "/state/map";

/// Ordered sequence of states.
pub const TUPLE: &str = "/state/tuple";

/// Root of the scalar value classes.
pub const VALUE: &str = "/state/scalar/value";

/// The absent value.
pub const VALUE_NONE: &str = "/state/scalar/value/none";

/// UTF-8 string value.
pub const VALUE_STRING: &str = "/state/scalar/value/string";

/// A link to a symbolic address.
pub const VALUE_LINK: &str = "/state/scalar/value/link";

/// Root of the numeric classes; arithmetic is defined for classes under
/// this prefix and nothing else.
pub const NUMBER: &str = "/state/scalar/value/number";

/// Boolean, the class comparison operations produce.
pub const NUMBER_BOOL: &str = "/state/scalar/value/number/bool";

/// Signed integer.
pub const NUMBER_INT: &str = "/state/scalar/value/number/int";

/// Unsigned integer (used as a result class only; the wire carries it as a
/// tagged integer).
pub const NUMBER_UINT: &str = "/state/scalar/value/number/uint";

/// Floating-point number.
pub const NUMBER_FLOAT: &str = "/state/scalar/value/number/float";

/// Reference to a named assignment (`$name`).
pub const REF_ID: &str = "/state/scalar/ref/id";

/// Conditional reference.
pub const REF_IF: &str = "/state/scalar/ref/if";

/// Iterate-until-false loop reference.
pub const REF_WHILE: &str = "/state/scalar/ref/while";

/// Sequence-then-value reference.
pub const REF_AFTER: &str = "/state/scalar/ref/after";

/// A traced callable bundled with its captured environment.
pub const REF_CLOSURE: &str = "/state/scalar/ref/closure";

/// Deferred read.
pub const OP_REF_GET: &str = "/state/scalar/ref/op/get";

/// Deferred write.
pub const OP_REF_PUT: &str = "/state/scalar/ref/op/put";

/// Deferred invocation with named arguments.
pub const OP_REF_POST: &str = "/state/scalar/ref/op/post";

/// Deferred deletion.
pub const OP_REF_DELETE: &str = "/state/scalar/ref/op/delete";

/// Traced GET operation definition.
pub const OP_DEF_GET: &str = "/state/scalar/op/get";

/// Traced PUT operation definition.
pub const OP_DEF_PUT: &str = "/state/scalar/op/put";

/// Traced POST operation definition.
pub const OP_DEF_POST: &str = "/state/scalar/op/post";

/// Traced DELETE operation definition.
pub const OP_DEF_DELETE: &str = "/state/scalar/op/delete";

/// A declared user class: its URI, parent URI, and method table.
pub const CLASS: &str = "/class";

/// Root of the error envelope codes.
pub const ERROR: &str = "/error";

/// B-tree collection class.
pub const COLLECTION_BTREE: &str = "/state/collection/btree";

/// A stream of values produced by the host.
pub const STREAM: &str = "/state/stream";

/// The reserved result name of a finalized graph.
pub const RETURN_NAME: &str = "_return";

/// The reserved name the receiver is bound to while tracing a method.
pub const SELF_NAME: &str = "self";
