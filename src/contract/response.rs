use serde_json::{json, Value};

use crate::recorder::RecordingStatus;

const VALUE_RESPONSE_KEY: &str = "value";
const STATUS_RESPONSE_KEY: &str = "status";

pub fn from_boolean(value: bool) -> Value {
    if value {
        success_response()
    } else {
        fail_response()
    }
}

pub fn success_response() -> Value {
    json!({ VALUE_RESPONSE_KEY: true })
}

pub fn fail_response() -> Value {
    json!({ VALUE_RESPONSE_KEY: false })
}

pub fn data_response(data: Value) -> Value {
    json!({ VALUE_RESPONSE_KEY: data })
}

pub fn status_response(status: RecordingStatus) -> Value {
    json!({ STATUS_RESPONSE_KEY: status.as_str() })
}
