use http::StatusCode;
use lambda_runtime::{tracing, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use shared::core::{decode_body, NameRecord, NameRepository};
use shared::utils::{json_response, text_response, GatewayResponse};
use std::collections::HashMap;

const SAVE_NAME_ROUTE: &str = "/save_name";
const GATEWAY_ONLY_MESSAGE: &str = "Эту функцию следует вызывать при помощи api-gateway";
const UNKNOWN_ROUTE_MESSAGE: &str = "Данного пути не существует";
const MISSING_NAME_MESSAGE: &str = "В теле запроса отсутствует параметр name";

/// The HTTP-shaped event the gateway forwards to the function.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GatewayEvent {
    pub name: Option<String>,
    pub is_base64_encoded: bool,
    pub body: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

impl GatewayEvent {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    /// Missing `Origin` yields a relative short link.
    fn origin(&self) -> &str {
        self.header("Origin").unwrap_or_default()
    }
}

#[derive(Serialize)]
struct SavedName {
    name: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub(crate) struct HandlerDeps<R: NameRepository> {
    pub name_repo: R,
}

pub(crate) async fn function_handler<R: NameRepository>(
    deps: &HandlerDeps<R>,
    event: LambdaEvent<GatewayEvent>,
) -> Result<GatewayResponse, Error> {
    tracing::info!("Received event: {:?}", event.payload);

    let event = event.payload;
    let route = match event.name.as_deref() {
        Some(route) if !route.is_empty() => route,
        _ => return Ok(text_response(&StatusCode::NOT_FOUND, GATEWAY_ONLY_MESSAGE)),
    };
    // the gateway may leave a trailing `?` on the path
    let route = route.strip_suffix('?').unwrap_or(route);

    match route {
        SAVE_NAME_ROUTE => save_name(&deps.name_repo, &event).await,
        _ => Ok(text_response(&StatusCode::NOT_FOUND, UNKNOWN_ROUTE_MESSAGE)),
    }
}

async fn save_name<R: NameRepository>(
    name_repo: &R,
    event: &GatewayEvent,
) -> Result<GatewayResponse, Error> {
    let body = match event.body.as_deref() {
        Some(body) if !body.is_empty() => body,
        _ => {
            return Ok(json_response(
                &StatusCode::BAD_REQUEST,
                &ErrorBody {
                    error: MISSING_NAME_MESSAGE,
                },
            )?)
        }
    };

    let body = decode_body(body, event.is_base64_encoded)?;
    let record = NameRecord::from_body(&body);

    // the link is handed out even when the upsert did not complete
    if let Err(e) = name_repo.store(&record).await {
        tracing::error!("Failed to store name {}: {:?}", record.id, e);
    }

    let short_link = format!("{}/r/{}", event.origin(), record.id);
    Ok(json_response(&StatusCode::OK, &SavedName { name: short_link })?)
}
