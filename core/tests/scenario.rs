//! An end-to-end trace: conditional arithmetic on a symbolic input,
//! encoded, handed to a stub engine, and the response decoded back.

use serde_json::json;

use tracegraph::{
    execute, wire, ClassRegistry, Context, ErrorCode, Host, HostError, State, Tracer,
};

struct Canned(serde_json::Value);

impl Host for Canned {
    fn execute(&self, _graph: &serde_json::Value) -> Result<serde_json::Value, HostError> {
        Ok(self.0.clone())
    }
}

/// `f(x) = if x >= 0 { x * 2 } else { error }`, traced over a symbolic
/// integer.
fn trace_f() -> tracegraph::OpDef {
    let registry = ClassRegistry::new();
    let tracer = Tracer::new(&registry);
    let (op, _) = tracer
        .get_op("f", "Int", Some("Int"), |_cxt, x| {
            let nonneg = x.gte(&State::int(0))?;
            let doubled = x.mul(&State::int(2))?;
            tracegraph::if_then_else(
                nonneg,
                doubled,
                State::error(ErrorCode::BadRequest, "negative"),
            )
        })
        .expect("trace succeeds");
    op
}

#[test]
fn the_graph_has_the_expected_shape() {
    let encoded = wire::encode_op(&trace_f());
    let text = serde_json::to_string(&encoded).expect("serializes");

    // One conditional whose then-branch is arithmetic on the key and
    // whose else-branch is an error literal.
    assert_eq!(text.matches("/state/scalar/ref/if").count(), 1);
    assert!(text.contains("$key/gte"));
    assert!(text.contains("$key/mul"));
    assert!(text.contains("/error/bad_request"));
}

#[test]
fn the_graph_is_stable_under_decode() {
    let encoded = wire::encode_op(&trace_f());
    let decoded = wire::decode_op(&encoded).expect("own encoding decodes");
    assert_eq!(wire::encode_op(&decoded), encoded);
}

#[test]
fn a_host_response_decodes_to_a_typed_number() {
    let mut cxt = Context::new();
    cxt.assign("x", State::int(5)).expect("fresh name");
    let frozen = cxt.finalize(None).expect("non-empty");

    let host = Canned(json!({"/state/scalar/value/number/int": [10]}));
    let result = execute(&host, &frozen).expect("a numeric response");
    assert_eq!(result, State::int(10));
}

#[test]
fn a_negative_input_surfaces_as_a_typed_error() {
    let mut cxt = Context::new();
    cxt.assign("x", State::int(-5)).expect("fresh name");
    let frozen = cxt.finalize(None).expect("non-empty");

    let host = Canned(json!({"/error/bad_request": "negative"}));
    let err = execute(&host, &frozen).expect_err("an error envelope");
    match err {
        tracegraph::ResponseError::Host(host) => {
            assert_eq!(host.code, ErrorCode::BadRequest);
            assert_eq!(host.message, "negative");
        }
        other => panic!("expected a host error, got {other:?}"),
    }
}
