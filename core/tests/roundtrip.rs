//! Round-trip tests for the wire codec.
//!
//! Every encodable form must decode back to a structurally equal value.
//! Generated states are drawn from the round-trip-stable subset of the
//! grammar: reference states carry the generic class, since the wire
//! format never carries a result class on a reference.

use indexmap::IndexMap;
use proptest::prelude::*;

use tracegraph::{
    wire, AfterRef, ClassRegistry, Context, IdRef, IfRef, OpRef, Ref, State, Subject, Tracer, Uri,
};

fn generic() -> Uri {
    Uri::new("/state")
}

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn subject() -> impl Strategy<Value = Subject> {
    prop_oneof![
        "[a-z][a-z0-9/]{0,10}".prop_map(|path| Subject::Link(Uri::new(format!("/{path}")))),
        (name(), "[a-z0-9/]{0,8}").prop_map(|(name, path)| Subject::Id { name, path }),
    ]
}

fn leaf() -> impl Strategy<Value = State> {
    prop_oneof![
        Just(State::none()),
        any::<bool>().prop_map(State::boolean),
        any::<i64>().prop_map(State::int),
        (-1.0e9..1.0e9f64).prop_map(State::float),
        "[a-zA-Z0-9 _.-]{0,12}".prop_map(State::string),
        "[a-z][a-z0-9/]{0,10}".prop_map(|p| State::link(Uri::new(format!("/{p}")))),
        name().prop_map(|n| State::from_ref(Ref::Id(IdRef::new(n)), generic())),
    ]
}

fn state() -> impl Strategy<Value = State> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(State::tuple),
            prop::collection::vec((name(), inner.clone()), 0..4).prop_map(|entries| {
                State::map(entries.into_iter().collect::<IndexMap<String, State>>())
            }),
            (subject(), inner.clone()).prop_map(|(subject, key)| {
                State::from_ref(Ref::Op(OpRef::get(subject, key)), generic())
            }),
            (subject(), prop::collection::vec((name(), inner.clone()), 0..3)).prop_map(
                |(subject, params)| {
                    let params = params.into_iter().collect::<IndexMap<String, State>>();
                    State::from_ref(Ref::Op(OpRef::post(subject, params)), generic())
                }
            ),
            (any::<i64>(), inner.clone(), inner.clone()).prop_map(|(cond, then, or_else)| {
                let cond = IfRef::new(State::int(cond), then, or_else)
                    .expect("integers are valid conditions");
                State::from_ref(Ref::If(cond), generic())
            }),
            (prop::collection::vec(inner.clone(), 1..3), inner).prop_map(|(when, then)| {
                State::from_ref(Ref::After(AfterRef::new(when, then)), generic())
            }),
        ]
    })
}

proptest! {
    /// decode(encode(x)) = x for every round-trip-stable state.
    #[test]
    fn prop_state_round_trip(x in state()) {
        let encoded = wire::encode_state(&x);
        let decoded = wire::decode_state(&encoded).expect("own encoding decodes");
        prop_assert_eq!(decoded, x);
    }

    /// Encoding is a pure function of the state.
    #[test]
    fn prop_encoding_is_deterministic(x in state()) {
        prop_assert_eq!(wire::encode_state(&x), wire::encode_state(&x.clone()));
    }
}

#[test]
fn contexts_round_trip() {
    let mut cxt = Context::new();
    let x = cxt.assign("x", State::int(1)).expect("fresh name");
    let y = cxt.assign("y", x.add(&State::int(2)).expect("numbers")).expect("fresh name");
    let frozen = cxt
        .finalize(Some(y.mul(&State::int(3)).expect("numbers")))
        .expect("non-empty");

    let encoded = wire::encode_context(&frozen);
    let decoded = wire::decode_context(&encoded).expect("own encoding decodes");

    let names: Vec<&str> = decoded.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["x", "y", "_return"]);
    // Decoded references are class-generic; the shapes must survive.
    assert_eq!(wire::encode_context(&decoded), encoded);
}

#[test]
fn op_definitions_round_trip() {
    let registry = ClassRegistry::new();
    let tracer = Tracer::new(&registry);

    let (op, _) = tracer
        .post_op(
            "axpy",
            &[("a", "Float"), ("x", "Float"), ("y", "Float")],
            Some("Float"),
            |_cxt, args| {
                let ax = args["a"].mul(&args["x"])?;
                ax.add(&args["y"])
            },
        )
        .expect("trace succeeds");

    let encoded = wire::encode_op(&op);
    let decoded = wire::decode_op(&encoded).expect("own encoding decodes");
    assert_eq!(decoded.params(), op.params());
    assert_eq!(wire::encode_op(&decoded), encoded);
}

#[test]
fn loops_round_trip() {
    let mut state0 = IndexMap::new();
    state0.insert("i".to_owned(), State::int(0));

    let looped = tracegraph::while_loop(
        state0,
        |_cxt, args| args["i"].lt(&State::int(10)),
        |_cxt, args| args["i"].add(&State::int(1)),
    )
    .expect("trace succeeds");

    let encoded = wire::encode_state(&looped);
    let decoded = wire::decode_state(&encoded).expect("own encoding decodes");
    assert_eq!(wire::encode_state(&decoded), encoded);
}

#[test]
fn closures_round_trip() {
    let registry = ClassRegistry::new();
    let tracer = Tracer::new(&registry);

    let (op, _) = tracer
        .get_op("shift", "Int", Some("Int"), |_cxt, key| {
            let offset = State::from_ref(
                Ref::Id(IdRef::new("offset")),
                Uri::new("/state/scalar/value/number/int"),
            );
            key.add(&offset)
        })
        .expect("trace succeeds");

    let mut captures = IndexMap::new();
    captures.insert("offset".to_owned(), State::int(3));
    let closed = tracegraph::closure(captures, op).expect("captures cover free variables");

    let encoded = wire::encode_state(&closed);
    let decoded = wire::decode_state(&encoded).expect("own encoding decodes");
    assert_eq!(wire::encode_state(&decoded), encoded);
}

#[test]
fn classes_round_trip() {
    let registry = ClassRegistry::new();
    let class = registry
        .class(Uri::new("/app/units/meters"))
        .extends(Uri::new("/state/scalar/value/number/float"))
        .get_method("scaled", "Float", |_cxt, this, key| {
            this.member("value", Uri::new("/state/scalar/value/number/float"))
                .mul(&key)
        })
        .build()
        .expect("trace succeeds");

    let encoded = wire::encode_class(&class);
    let decoded = wire::decode_class(&encoded).expect("own encoding decodes");
    assert_eq!(decoded.uri(), class.uri());
    assert_eq!(decoded.parent(), class.parent());
    assert_eq!(wire::encode_class(&decoded), encoded);
}

#[test]
fn decoded_host_literals_are_typed() {
    let decoded = wire::decode_state(&serde_json::json!(10)).expect("a literal");
    assert_eq!(decoded, State::int(10));

    let decoded = wire::decode_state(&serde_json::json!({
        "/state/scalar/value/number/int": [10]
    }))
    .expect("a tagged literal");
    assert_eq!(decoded, State::int(10));
}
