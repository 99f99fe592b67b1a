//! The execution-host seam.
//!
//! Evaluating a graph is entirely the host's job; the only thing this
//! crate asks of a host is a synchronous request/response primitive over
//! encoded payloads. Transport is the implementor's concern.

use crate::context::Context;
use crate::error::{HostError, ResponseError};
use crate::state::State;
use crate::wire;

/// A remote engine that evaluates encoded graphs.
pub trait Host {
    /// Evaluates an encoded graph, returning the encoded result.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if evaluation fails; transport failures
    /// should be mapped onto an appropriate error code by the
    /// implementor.
    fn execute(&self, graph: &serde_json::Value) -> Result<serde_json::Value, HostError>;
}

/// Encodes a frozen context, hands it to the host, and decodes the
/// response into a typed state.
///
/// # Errors
///
/// Returns [`ResponseError::Host`] if the host fails or answers with an
/// error envelope, and [`ResponseError::Decode`] if the response cannot
/// be decoded.
pub fn execute(host: &impl Host, cxt: &Context) -> Result<State, ResponseError> {
    let encoded = wire::encode_context(cxt);
    match host.execute(&encoded) {
        Ok(response) => wire::decode_response(&response),
        Err(err) => Err(ResponseError::Host(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    struct Canned(serde_json::Value);

    impl Host for Canned {
        fn execute(&self, _graph: &serde_json::Value) -> Result<serde_json::Value, HostError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn responses_decode_into_states() {
        let mut cxt = Context::new();
        cxt.assign("x", State::int(5)).expect("fresh name");
        let frozen = cxt.finalize(None).expect("non-empty");

        let host = Canned(json!(10));
        let result = execute(&host, &frozen).expect("a literal response");
        assert_eq!(result, State::int(10));
    }

    #[test]
    fn error_envelopes_become_host_errors() {
        let mut cxt = Context::new();
        cxt.assign("x", State::int(5)).expect("fresh name");
        let frozen = cxt.finalize(None).expect("non-empty");

        let host = Canned(json!({"/error/bad_request": "negative input"}));
        let err = execute(&host, &frozen).expect_err("an error envelope");
        match err {
            ResponseError::Host(host) => assert_eq!(host.code, ErrorCode::BadRequest),
            other => panic!("expected a host error, got {other:?}"),
        }
    }
}
