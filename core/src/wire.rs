//! Canonical wire encoding and decoding.
//!
//! Every state, reference, op definition, and context has exactly one
//! encoded form: a literal for canonical scalars, an ordered array or
//! object for composites, and a `{"<type-uri>": payload}` envelope for
//! everything that needs a tag. Encoding is total and side-effect-free;
//! decoding is the inverse for every form a host can legally send back
//! and fails loudly on anything else.

use indexmap::IndexMap;
use serde_json::{json, Map, Number, Value as Json};

use crate::class::{ClassDef, MethodDef};
use crate::context::Context;
use crate::error::{DecodeError, ErrorCode, ResponseError};
use crate::op::OpDef;
use crate::reference::{
    AfterRef, ClosureRef, IdRef, IfRef, OpArgs, OpRef, Ref, Subject, WhileRef,
};
use crate::state::{Form, State};
use crate::uri::Uri;
use crate::value::Value;
use crate::vocab;

fn tagged(tag: &str, payload: Json) -> Json {
    let mut obj = Map::with_capacity(1);
    obj.insert(tag.to_owned(), payload);
    Json::Object(obj)
}

/// Encodes a state. Canonical scalars come out as bare literals; anything
/// whose class the payload alone cannot convey comes out tagged.
#[must_use]
pub fn encode_state(state: &State) -> Json {
    let payload = encode_form(state.form());
    if state.has_canonical_class() {
        payload
    } else {
        tagged(state.class().as_str(), payload)
    }
}

fn encode_form(form: &Form) -> Json {
    match form {
        Form::Value(value) => encode_value(value),
        Form::Tuple(items) => Json::Array(items.iter().map(encode_state).collect()),
        Form::Map(entries) => encode_entries(entries),
        Form::Ref(r) => encode_ref(r),
    }
}

fn encode_entries(entries: &IndexMap<String, State>) -> Json {
    let mut obj = Map::with_capacity(entries.len());
    for (name, state) in entries {
        obj.insert(name.clone(), encode_state(state));
    }
    Json::Object(obj)
}

fn encode_value(value: &Value) -> Json {
    match value {
        Value::Nil => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        // Non-finite floats have no JSON literal.
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Str(s) => Json::String(s.clone()),
        Value::Link(uri) => tagged(vocab::VALUE_LINK, Json::String(uri.to_string())),
    }
}

fn encode_ref(r: &Ref) -> Json {
    match r {
        Ref::Id(id) => Json::String(id.to_string()),
        Ref::Op(op) => encode_op_ref(op),
        Ref::If(cond) => tagged(
            vocab::REF_IF,
            json!([
                encode_state(cond.cond()),
                encode_state(cond.then()),
                encode_state(cond.or_else()),
            ]),
        ),
        Ref::While(wh) => tagged(
            vocab::REF_WHILE,
            json!([
                encode_op(wh.cond()),
                encode_op(wh.step()),
                encode_entries(wh.state()),
            ]),
        ),
        Ref::After(after) => {
            let when: Vec<Json> = after.when().iter().map(encode_state).collect();
            tagged(vocab::REF_AFTER, json!([when, encode_state(after.then())]))
        }
        Ref::Closure(closure) => tagged(
            vocab::REF_CLOSURE,
            json!([encode_entries(closure.captures()), encode_op(closure.op())]),
        ),
    }
}

fn encode_op_ref(op: &OpRef) -> Json {
    let mut payload = vec![encode_subject(op.subject())];
    match op.args() {
        OpArgs::Get(key) | OpArgs::Delete(key) => payload.push(encode_state(key)),
        OpArgs::Put(key, value) => {
            payload.push(encode_state(key));
            payload.push(encode_state(value));
        }
        OpArgs::Post(params) => payload.push(encode_entries(params)),
    }
    tagged(op.method().ref_uri().as_str(), Json::Array(payload))
}

fn encode_subject(subject: &Subject) -> Json {
    match subject {
        Subject::Link(uri) => Json::String(uri.to_string()),
        Subject::Id { name, path } => {
            if path.is_empty() {
                Json::String(format!("${name}"))
            } else {
                Json::String(format!("${name}/{path}"))
            }
        }
        Subject::Method { subject, path } => json!([encode_state(subject), path]),
    }
}

/// Encodes a frozen context as an ordered object of name to state.
#[must_use]
pub fn encode_context(cxt: &Context) -> Json {
    let mut obj = Map::with_capacity(cxt.len());
    for (name, state) in cxt.iter() {
        obj.insert(name.to_owned(), encode_state(state));
    }
    Json::Object(obj)
}

/// Encodes a traced op definition under its method's type URI.
#[must_use]
pub fn encode_op(op: &OpDef) -> Json {
    let payload = match op {
        OpDef::Get { key_name, graph } => json!([key_name, encode_context(graph)]),
        OpDef::Put {
            key_name,
            value_name,
            graph,
        } => json!([key_name, value_name, encode_context(graph)]),
        OpDef::Post { params, graph } => json!([params, encode_context(graph)]),
        OpDef::Delete { key_name, graph } => json!([key_name, encode_context(graph)]),
    };
    tagged(op.class_uri().as_str(), payload)
}

/// Encodes a class declaration: its URI, parent URI, and method table.
#[must_use]
pub fn encode_class(class: &ClassDef) -> Json {
    let mut methods = Map::with_capacity(class.methods().len());
    for method in class.methods() {
        methods.insert(method.name().to_owned(), encode_op(method.op()));
    }
    tagged(
        vocab::CLASS,
        json!([
            class.uri().to_string(),
            class.parent().to_string(),
            Json::Object(methods),
        ]),
    )
}

/// Decodes a state from a wire payload.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownTag`] for a type tag outside the
/// recognized vocabulary and [`DecodeError::Malformed`] when a recognized
/// tag carries a payload of the wrong shape.
pub fn decode_state(json: &Json) -> Result<State, DecodeError> {
    match json {
        Json::Null => Ok(State::none()),
        Json::Bool(b) => Ok(State::boolean(*b)),
        Json::Number(n) => Ok(decode_number(n)),
        Json::String(s) => Ok(decode_string(s)),
        Json::Array(items) => {
            let items = items.iter().map(decode_state).collect::<Result<_, _>>()?;
            Ok(State::tuple(items))
        }
        Json::Object(obj) => decode_object(obj),
    }
}

fn decode_number(n: &Number) -> State {
    if let Some(i) = n.as_i64() {
        State::int(i)
    } else if let Some(f) = n.as_f64() {
        State::float(f)
    } else {
        State::none()
    }
}

fn decode_string(s: &str) -> State {
    let generic = Uri::new(vocab::STATE);
    if let Some(name) = s.strip_prefix('$') {
        return match name.split_once('/') {
            None => State::from_ref(Ref::Id(IdRef::new(name)), generic),
            // A `$name/path` in value position is a member read.
            Some((name, path)) => {
                let subject = Subject::Id {
                    name: name.to_owned(),
                    path: path.to_owned(),
                };
                State::from_ref(Ref::Op(OpRef::get(subject, State::none())), generic)
            }
        };
    }
    State::string(s)
}

fn decode_object(obj: &Map<String, Json>) -> Result<State, DecodeError> {
    if obj.len() == 1 {
        if let Some((tag, payload)) = obj.iter().next() {
            if tag.starts_with('/') {
                return decode_tagged(tag, payload);
            }
        }
    }
    let mut entries = IndexMap::with_capacity(obj.len());
    for (name, value) in obj {
        entries.insert(name.clone(), decode_state(value)?);
    }
    Ok(State::map(entries))
}

/// Some hosts wrap a scalar payload in a one-element array.
fn unwrap_scalar(payload: &Json) -> &Json {
    match payload {
        Json::Array(items) if items.len() == 1 => &items[0],
        other => other,
    }
}

fn decode_tagged(tag: &str, payload: &Json) -> Result<State, DecodeError> {
    let generic = Uri::new(vocab::STATE);
    match tag {
        vocab::VALUE_NONE => Ok(State::none()),
        vocab::NUMBER_BOOL => match unwrap_scalar(payload) {
            Json::Bool(b) => Ok(State::boolean(*b)),
            other => Err(DecodeError::malformed(tag, format!("expected a boolean, got {other}"))),
        },
        vocab::NUMBER_INT => match unwrap_scalar(payload) {
            Json::Number(n) if n.as_i64().is_some() => {
                Ok(State::int(n.as_i64().unwrap_or_default()))
            }
            other => Err(DecodeError::malformed(tag, format!("expected an integer, got {other}"))),
        },
        vocab::NUMBER_UINT => match unwrap_scalar(payload) {
            Json::Number(n) if n.as_i64().map_or(false, |i| i >= 0) => {
                Ok(State::int(n.as_i64().unwrap_or_default())
                    .with_class(Uri::new(vocab::NUMBER_UINT)))
            }
            other => Err(DecodeError::malformed(
                tag,
                format!("expected an unsigned integer, got {other}"),
            )),
        },
        vocab::NUMBER_FLOAT => match unwrap_scalar(payload) {
            Json::Number(n) => {
                let f = n.as_f64().unwrap_or_default();
                Ok(State::float(f))
            }
            Json::Null => Ok(State::float(f64::NAN)),
            other => Err(DecodeError::malformed(tag, format!("expected a number, got {other}"))),
        },
        vocab::NUMBER => {
            let state = decode_state(unwrap_scalar(payload))?;
            Ok(state.with_class(Uri::new(vocab::NUMBER)))
        }
        vocab::VALUE_STRING => match unwrap_scalar(payload) {
            Json::String(s) => Ok(State::string(s.clone())),
            other => Err(DecodeError::malformed(tag, format!("expected a string, got {other}"))),
        },
        vocab::VALUE_LINK => match unwrap_scalar(payload) {
            Json::String(s) => Ok(State::link(Uri::new(s.clone()))),
            other => Err(DecodeError::malformed(tag, format!("expected a string, got {other}"))),
        },
        vocab::TUPLE => match payload {
            Json::Array(items) => {
                let items = items.iter().map(decode_state).collect::<Result<_, _>>()?;
                Ok(State::tuple(items))
            }
            other => Err(DecodeError::malformed(tag, format!("expected an array, got {other}"))),
        },
        vocab::MAP => match payload {
            Json::Object(obj) => {
                let mut entries = IndexMap::with_capacity(obj.len());
                for (name, value) in obj {
                    entries.insert(name.clone(), decode_state(value)?);
                }
                Ok(State::map(entries))
            }
            other => Err(DecodeError::malformed(tag, format!("expected an object, got {other}"))),
        },
        vocab::REF_ID => match unwrap_scalar(payload) {
            Json::String(s) => Ok(State::from_ref(
                Ref::Id(IdRef::new(s.strip_prefix('$').unwrap_or(s))),
                generic,
            )),
            other => Err(DecodeError::malformed(tag, format!("expected a name, got {other}"))),
        },
        vocab::OP_REF_GET | vocab::OP_REF_PUT | vocab::OP_REF_POST | vocab::OP_REF_DELETE => {
            decode_op_ref(tag, payload)
        }
        vocab::REF_IF => {
            let [cond, then, or_else] = expect_args::<3>(tag, payload)?;
            let cond = decode_state(cond)?;
            let then = decode_state(then)?;
            let or_else = decode_state(or_else)?;
            Ok(State::from_ref(
                Ref::If(IfRef::from_parts(cond, then, or_else)),
                generic,
            ))
        }
        vocab::REF_WHILE => {
            let [cond, step, state] = expect_args::<3>(tag, payload)?;
            let cond = decode_op(cond)?;
            let step = decode_op(step)?;
            let state = decode_state_map(tag, state)?;
            Ok(State::from_ref(
                Ref::While(WhileRef::new(cond, step, state)),
                generic,
            ))
        }
        vocab::REF_AFTER => {
            let [when, then] = expect_args::<2>(tag, payload)?;
            let when = match when {
                Json::Array(items) => {
                    items.iter().map(decode_state).collect::<Result<_, _>>()?
                }
                single => vec![decode_state(single)?],
            };
            let then = decode_state(then)?;
            Ok(State::from_ref(Ref::After(AfterRef::new(when, then)), generic))
        }
        vocab::REF_CLOSURE => {
            let [captures, op] = expect_args::<2>(tag, payload)?;
            let captures = decode_state_map(tag, captures)?;
            let op = decode_op(op)?;
            Ok(State::from_ref(
                Ref::Closure(ClosureRef::from_parts(captures, op)),
                generic,
            ))
        }
        vocab::CLASS => Err(DecodeError::malformed(
            tag,
            "a class declaration is not a state",
        )),
        _ => {
            if let Some(code) = ErrorCode::from_path(tag) {
                return match unwrap_scalar(payload) {
                    Json::String(message) => Ok(State::error(code, message.clone())),
                    other => Err(DecodeError::malformed(
                        tag,
                        format!("expected a message, got {other}"),
                    )),
                };
            }
            if ErrorCode::is_error_tag(tag) {
                return Err(DecodeError::UnknownTag(tag.to_owned()));
            }
            if tag.starts_with(vocab::STATE) {
                // An opaque typed state: keep the payload, carry the tag.
                let state = decode_state(payload)?;
                return Ok(state.with_class(Uri::new(tag)));
            }
            Err(DecodeError::UnknownTag(tag.to_owned()))
        }
    }
}

fn decode_op_ref(tag: &str, payload: &Json) -> Result<State, DecodeError> {
    let Json::Array(args) = payload else {
        return Err(DecodeError::malformed(tag, "expected an argument array"));
    };
    let subject = args
        .first()
        .ok_or_else(|| DecodeError::malformed(tag, "missing subject"))
        .and_then(decode_subject)?;

    let op = match tag {
        vocab::OP_REF_GET | vocab::OP_REF_DELETE => {
            let key = match args.get(1) {
                Some(key) => decode_state(key)?,
                None => State::none(),
            };
            if tag == vocab::OP_REF_GET {
                OpRef::get(subject, key)
            } else {
                OpRef::delete(subject, key)
            }
        }
        vocab::OP_REF_PUT => {
            let key = args
                .get(1)
                .ok_or_else(|| DecodeError::malformed(tag, "missing key"))
                .and_then(decode_state)?;
            let value = args
                .get(2)
                .ok_or_else(|| DecodeError::malformed(tag, "missing value"))
                .and_then(decode_state)?;
            OpRef::put(subject, key, value)
        }
        _ => {
            let params = match args.get(1) {
                Some(params) => decode_state_map(tag, params)?,
                None => IndexMap::new(),
            };
            OpRef::post(subject, params)
        }
    };
    Ok(State::from_ref(Ref::Op(op), Uri::new(vocab::STATE)))
}

fn decode_subject(json: &Json) -> Result<Subject, DecodeError> {
    match json {
        Json::String(s) => {
            if let Some(name) = s.strip_prefix('$') {
                let (name, path) = match name.split_once('/') {
                    Some((name, path)) => (name, path),
                    None => (name, ""),
                };
                Ok(Subject::Id {
                    name: name.to_owned(),
                    path: path.to_owned(),
                })
            } else {
                Ok(Subject::Link(Uri::new(s.clone())))
            }
        }
        Json::Array(parts) if parts.len() == 2 => {
            let subject = decode_state(&parts[0])?;
            let path = parts[1].as_str().ok_or_else(|| {
                DecodeError::malformed("subject", "expected a path string")
            })?;
            Ok(Subject::Method {
                subject: Box::new(subject),
                path: path.to_owned(),
            })
        }
        other => Err(DecodeError::malformed(
            "subject",
            format!("expected an address, got {other}"),
        )),
    }
}

fn decode_state_map(tag: &str, json: &Json) -> Result<IndexMap<String, State>, DecodeError> {
    let Json::Object(obj) = json else {
        return Err(DecodeError::malformed(tag, "expected an object"));
    };
    let mut entries = IndexMap::with_capacity(obj.len());
    for (name, value) in obj {
        entries.insert(name.clone(), decode_state(value)?);
    }
    Ok(entries)
}

fn expect_args<'a, const N: usize>(
    tag: &str,
    payload: &'a Json,
) -> Result<[&'a Json; N], DecodeError> {
    let Json::Array(args) = payload else {
        return Err(DecodeError::malformed(tag, "expected an argument array"));
    };
    if args.len() != N {
        return Err(DecodeError::malformed(
            tag,
            format!("expected {N} arguments, got {}", args.len()),
        ));
    }
    let mut out = [payload; N];
    for (slot, arg) in out.iter_mut().zip(args.iter()) {
        *slot = arg;
    }
    Ok(out)
}

/// Decodes a frozen context from an ordered object of name to state.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if the payload is not an object, or
/// any error decoding an entry.
pub fn decode_context(json: &Json) -> Result<Context, DecodeError> {
    let Json::Object(obj) = json else {
        return Err(DecodeError::malformed("context", "expected an object"));
    };
    let mut entries = IndexMap::with_capacity(obj.len());
    for (name, value) in obj {
        entries.insert(name.clone(), decode_state(value)?);
    }
    Ok(Context::from_frozen(entries))
}

/// Decodes a traced op definition.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownTag`] if the envelope's tag is not an op
/// definition and [`DecodeError::Malformed`] if the payload has the wrong
/// shape.
pub fn decode_op(json: &Json) -> Result<OpDef, DecodeError> {
    let Json::Object(obj) = json else {
        return Err(DecodeError::malformed("op", "expected a tagged object"));
    };
    let Some((tag, payload)) = obj.iter().next().filter(|_| obj.len() == 1) else {
        return Err(DecodeError::malformed("op", "expected a single type tag"));
    };
    let Json::Array(args) = payload else {
        return Err(DecodeError::malformed(tag, "expected an argument array"));
    };

    let key_name = |index: usize| -> Result<String, DecodeError> {
        args.get(index)
            .and_then(Json::as_str)
            .map(str::to_owned)
            .ok_or_else(|| DecodeError::malformed(tag.clone(), "expected a parameter name"))
    };

    match tag.as_str() {
        vocab::OP_DEF_GET => {
            let graph = graph_arg(tag, args, 1)?;
            Ok(OpDef::Get {
                key_name: key_name(0)?,
                graph,
            })
        }
        vocab::OP_DEF_PUT => {
            let graph = graph_arg(tag, args, 2)?;
            Ok(OpDef::Put {
                key_name: key_name(0)?,
                value_name: key_name(1)?,
                graph,
            })
        }
        vocab::OP_DEF_POST => {
            let params = match args.first() {
                Some(Json::Array(params)) => params
                    .iter()
                    .map(|p| {
                        p.as_str().map(str::to_owned).ok_or_else(|| {
                            DecodeError::malformed(tag.clone(), "expected a parameter name")
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => {
                    return Err(DecodeError::malformed(tag.clone(), "expected a parameter list"))
                }
            };
            let graph = graph_arg(tag, args, 1)?;
            Ok(OpDef::Post { params, graph })
        }
        vocab::OP_DEF_DELETE => {
            let graph = graph_arg(tag, args, 1)?;
            Ok(OpDef::Delete {
                key_name: key_name(0)?,
                graph,
            })
        }
        other => Err(DecodeError::UnknownTag(other.to_owned())),
    }
}

fn graph_arg(tag: &str, args: &[Json], index: usize) -> Result<Context, DecodeError> {
    let graph = args
        .get(index)
        .ok_or_else(|| DecodeError::malformed(tag, "missing graph"))?;
    decode_context(graph)
}

/// Decodes a class declaration.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] unless the payload is a `/class`
/// envelope of URI, parent URI, and method table.
pub fn decode_class(json: &Json) -> Result<ClassDef, DecodeError> {
    let Json::Object(obj) = json else {
        return Err(DecodeError::malformed(vocab::CLASS, "expected a tagged object"));
    };
    let payload = match obj.get(vocab::CLASS) {
        Some(payload) if obj.len() == 1 => payload,
        _ => return Err(DecodeError::malformed(vocab::CLASS, "expected a /class tag")),
    };
    let [uri, parent, methods] = expect_args::<3>(vocab::CLASS, payload)?;
    let uri = uri
        .as_str()
        .map(Uri::new)
        .ok_or_else(|| DecodeError::malformed(vocab::CLASS, "expected a class URI"))?;
    let parent = parent
        .as_str()
        .map(Uri::new)
        .ok_or_else(|| DecodeError::malformed(vocab::CLASS, "expected a parent URI"))?;
    let Json::Object(methods) = methods else {
        return Err(DecodeError::malformed(vocab::CLASS, "expected a method table"));
    };
    let methods = methods
        .iter()
        .map(|(name, op)| Ok(MethodDef::new(name.clone(), decode_op(op)?)))
        .collect::<Result<Vec<_>, DecodeError>>()?;
    Ok(ClassDef::from_parts(uri, parent, methods))
}

/// Decodes a host response, surfacing error envelopes as typed errors.
///
/// # Errors
///
/// Returns [`ResponseError::Host`] if the response is an error envelope
/// and [`ResponseError::Decode`] if it cannot be decoded at all.
pub fn decode_response(json: &Json) -> Result<State, ResponseError> {
    let state = decode_state(json)?;
    if let Some(err) = state.as_host_error() {
        return Err(ResponseError::Host(err));
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_literals_encode_bare() {
        assert_eq!(encode_state(&State::none()), json!(null));
        assert_eq!(encode_state(&State::boolean(true)), json!(true));
        assert_eq!(encode_state(&State::int(3)), json!(3));
        assert_eq!(encode_state(&State::float(0.5)), json!(0.5));
        assert_eq!(encode_state(&State::string("a")), json!("a"));
        assert_eq!(encode_state(&State::float(f64::NAN)), json!(null));
    }

    #[test]
    fn links_are_always_tagged() {
        let link = State::link(Uri::new("/app/table"));
        let encoded = encode_state(&link);
        assert_eq!(encoded, json!({ (vocab::VALUE_LINK): "/app/table" }));
        assert_eq!(decode_state(&encoded).expect("decodes"), link);
    }

    #[test]
    fn id_refs_encode_as_dollar_names() {
        let id = State::from_ref(Ref::Id(IdRef::new("x")), Uri::new(vocab::STATE));
        let encoded = encode_state(&id);
        assert_eq!(encoded, json!("$x"));
        assert_eq!(decode_state(&encoded).expect("decodes"), id);
    }

    #[test]
    fn non_canonical_classes_are_tagged() {
        let count = State::int(3).with_class(Uri::new(vocab::NUMBER_UINT));
        let encoded = encode_state(&count);
        assert_eq!(encoded, json!({ (vocab::NUMBER_UINT): 3 }));
        assert_eq!(decode_state(&encoded).expect("decodes"), count);
    }

    #[test]
    fn tagged_scalars_may_wrap_their_payload() {
        let decoded = decode_state(&json!({ (vocab::NUMBER_INT): [10] })).expect("decodes");
        assert_eq!(decoded, State::int(10));
    }

    #[test]
    fn op_refs_round_trip() {
        let subject = Subject::Id {
            name: "table".to_owned(),
            path: "count".to_owned(),
        };
        let op = State::from_ref(
            Ref::Op(OpRef::get(subject, State::none())),
            Uri::new(vocab::STATE),
        );
        let encoded = encode_state(&op);
        assert_eq!(encoded, json!({ (vocab::OP_REF_GET): ["$table/count", null] }));
        assert_eq!(decode_state(&encoded).expect("decodes"), op);
    }

    #[test]
    fn contexts_preserve_assignment_order() {
        let mut cxt = Context::new();
        cxt.assign("a", State::int(1)).expect("fresh name");
        cxt.assign("b", State::int(2)).expect("fresh name");
        let frozen = cxt.finalize(None).expect("non-empty");

        let encoded = encode_context(&frozen);
        let names: Vec<&String> = encoded
            .as_object()
            .expect("an object")
            .keys()
            .collect();
        assert_eq!(names, ["a", "b"]);

        assert_eq!(decode_context(&encoded).expect("decodes"), frozen);
    }

    #[test]
    fn unknown_tags_fail_loudly() {
        let err = decode_state(&json!({"/vendor/widget": 1})).expect_err("unknown tag");
        assert_eq!(err, DecodeError::UnknownTag("/vendor/widget".to_owned()));
    }

    #[test]
    fn error_envelopes_become_typed_errors() {
        let err = decode_response(&json!({"/error/not_found": "no such row"}))
            .expect_err("an error envelope");
        match err {
            ResponseError::Host(host) => {
                assert_eq!(host.code, ErrorCode::NotFound);
                assert_eq!(host.message, "no such row");
            }
            other => panic!("expected a host error, got {other:?}"),
        }
    }

    #[test]
    fn opaque_typed_states_pass_through() {
        let encoded = json!({ (vocab::COLLECTION_BTREE): [["alice", 3]] });
        let decoded = decode_state(&encoded).expect("decodes");
        assert_eq!(decoded.class().as_str(), vocab::COLLECTION_BTREE);
        assert_eq!(encode_state(&decoded), encoded);
    }
}
