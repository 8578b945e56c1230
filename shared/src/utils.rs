use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The envelope the function gateway expects back from an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub is_base64_encoded: bool,
    pub body: String,
}

pub fn response(
    status_code: u16,
    headers: HashMap<String, String>,
    is_base64_encoded: bool,
    body: String,
) -> GatewayResponse {
    GatewayResponse {
        status_code,
        headers,
        is_base64_encoded,
        body,
    }
}

pub fn json_response<T: Serialize>(
    status: &StatusCode,
    body: &T,
) -> Result<GatewayResponse, serde_json::Error> {
    let headers = HashMap::from([("Content-Type".to_string(), "application/json".to_string())]);

    Ok(response(
        status.as_u16(),
        headers,
        false,
        serde_json::to_string(body)?,
    ))
}

pub fn text_response(status: &StatusCode, body: &str) -> GatewayResponse {
    response(status.as_u16(), HashMap::new(), false, body.to_string())
}
