pub mod cli;

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Json, Path, Query, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::calculators::{Calculator, CalculatorDescriptor};
use crate::core::CalcError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculatorResponse {
    slug: &'static str,
    title: &'static str,
    result: Value,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/calculators", get(list_handler))
        .route(
            "/api/calculators/:slug",
            get(evaluate_get_handler).post(evaluate_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(config: ServeConfig) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "calculator API listening");
    info!("try: curl http://{addr}/api/calculators");

    axum::serve(listener, router()).await
}

async fn list_handler() -> Response {
    let descriptors: Vec<CalculatorDescriptor> =
        Calculator::ALL.iter().map(|calc| calc.descriptor()).collect();
    json_response(StatusCode::OK, descriptors)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", "not-found")
}

async fn evaluate_get_handler(
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    evaluate_handler_impl(&slug, payload_from_query(params))
}

async fn evaluate_post_handler(
    Path(slug): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => evaluate_handler_impl(&slug, payload),
        Err(rejection) => error_response(
            StatusCode::BAD_REQUEST,
            &format!("Invalid JSON payload: {}", rejection.body_text()),
            "domain",
        ),
    }
}

fn evaluate_handler_impl(slug: &str, payload: Value) -> Response {
    let Some(calculator) = Calculator::from_slug(slug) else {
        warn!(slug, "unknown calculator requested");
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("Unknown calculator: {slug}"),
            "not-found",
        );
    };

    match calculator.evaluate(payload) {
        Ok(result) => json_response(
            StatusCode::OK,
            CalculatorResponse {
                slug: calculator.slug(),
                title: calculator.descriptor().title,
                result,
            },
        ),
        Err(err) => error_response(status_for(&err), &err.to_string(), err.kind()),
    }
}

fn status_for(err: &CalcError) -> StatusCode {
    match err {
        CalcError::Domain(_) => StatusCode::BAD_REQUEST,
        CalcError::MissingInput(_) | CalcError::Numeric(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Query strings carry only text; numbers and flags are recovered here so the
/// calculators can deserialize them like a JSON body.
fn payload_from_query(params: HashMap<String, String>) -> Value {
    let map: Map<String, Value> = params
        .into_iter()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .map(|(key, raw)| (key, query_value(raw.trim())))
        .collect();
    Value::Object(map)
}

fn query_value(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    match (raw.parse::<f64>(), raw) {
        (Ok(float), _) if float.is_finite() => Value::from(float),
        (_, "true") => Value::Bool(true),
        (_, "false") => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str, kind: &'static str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            kind,
        },
    )
}
