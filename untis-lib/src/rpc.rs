//! JSON-RPC envelopes and result unwrapping.

use serde_json::{json, Value};

use crate::{http::Payload, Error};

/// `{id, method, params, jsonrpc: "2.0"}`
pub(crate) fn envelope(identity: &str, method: &str, params: Value) -> Value {
    json!({
        "id": identity,
        "method": method,
        "params": params,
        "jsonrpc": "2.0",
    })
}

/// Pull `result` out of a JSON-RPC response.
///
/// A missing or empty `result` is [`Error::NoResult`], a `result.code` (or a JSON-RPC `error`
/// member) is [`Error::ServerCode`].
pub(crate) fn unwrap_result(payload: Payload) -> Result<Value, Error> {
    let mut response = payload.into_json().ok_or(Error::NoResult)?;

    let result = response.get_mut("result").map(Value::take);
    match result {
        Some(result) if is_truthy(&result) => {
            if let Some(code) = result.get("code").filter(|code| is_truthy(code)) {
                return Err(server_code(code, result.get("message")));
            }
            Ok(result)
        }
        _ => match response.get("error").filter(|error| is_truthy(error)) {
            Some(error) => Err(server_code(
                error.get("code").unwrap_or(&Value::Null),
                error.get("message"),
            )),
            None => Err(Error::NoResult),
        },
    }
}

fn server_code(code: &Value, message: Option<&Value>) -> Error {
    Error::ServerCode {
        code: scalar_to_string(code),
        message: message.and_then(Value::as_str).map(ToOwned::to_owned),
    }
}

/// Render a JSON scalar without the quotes `Value::to_string` puts around strings.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        other => other.to_string(),
    }
}

/// JavaScript truthiness, which is what the server's own clients test for.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        assert_eq!(
            envelope("Awesome", "getRooms", json!({})),
            json!({"id": "Awesome", "method": "getRooms", "params": {}, "jsonrpc": "2.0"})
        );
    }

    #[test]
    fn unwraps_result() {
        let payload = Payload::Json(json!({"result": [{"id": 1}]}));
        assert_eq!(unwrap_result(payload).unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn missing_or_empty_result() {
        for body in [json!({}), json!({"result": null}), json!({"result": 0}), json!({"result": ""})] {
            assert!(matches!(
                unwrap_result(Payload::Json(body)),
                Err(Error::NoResult)
            ));
        }
        assert!(matches!(
            unwrap_result(Payload::Text("<html>".into())),
            Err(Error::NoResult)
        ));
    }

    #[test]
    fn result_code_is_an_error() {
        let err = unwrap_result(Payload::Json(json!({"result": {"code": -8520}}))).unwrap_err();
        assert!(matches!(err, Error::ServerCode { ref code, .. } if code == "-8520"));
    }

    #[test]
    fn error_member_is_an_error() {
        let err = unwrap_result(Payload::Json(
            json!({"error": {"code": -8504, "message": "bad credentials"}}),
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ServerCode { ref code, message: Some(ref message) }
                if code == "-8504" && message == "bad credentials"
        ));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(123)));
    }
}
