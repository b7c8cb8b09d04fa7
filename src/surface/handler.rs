//! Transport-agnostic request routing for the status/config surface.
//!
//! | Route          | Method | Answer                                   |
//! |----------------|--------|------------------------------------------|
//! | `/`            | GET    | status JSON                              |
//! | `/api/status`  | GET    | status JSON                              |
//! | `/api/config`  | GET    | configuration JSON                       |
//! | `/api/config`  | POST   | 303 → `/`, 422 on rejected fields, 500 on save failure |
//!
//! Error bodies always list the rejected field names, including on a 500.
//!
//! The HTTP server adapter turns a [`Response`] into wire bytes; this
//! module only decides what to answer.

use heapless::Vec;
use log::warn;
use serde::Serialize;

use crate::app::ports::{EventSink, StoragePort};
use crate::app::service::RegulatorService;
use crate::config::FieldRejection;

use super::form;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Json { status: u16, body: String },
    Redirect { location: &'static str },
}

impl Response {
    pub fn status(&self) -> u16 {
        match self {
            Self::Json { status, .. } => *status,
            Self::Redirect { .. } => 303,
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::Json { status, body },
            Err(_) => Self::Json {
                status: 500,
                body: String::from(r#"{"error":"encoding failed"}"#),
            },
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, &ErrorBody { error: message, rejected: &[] })
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    rejected: &'a [&'a str],
}

pub const ROUTE_ROOT: &str = "/";
pub const ROUTE_STATUS: &str = "/api/status";
pub const ROUTE_CONFIG: &str = "/api/config";

/// Answer one request against the live service.
pub fn route<S: StoragePort>(
    service: &mut RegulatorService<S>,
    method: Method,
    path: &str,
    body: &[u8],
    sink: &mut impl EventSink,
) -> Response {
    // Ignore any query string.
    let path = path.split('?').next().unwrap_or(path);

    match (path, method) {
        (ROUTE_ROOT | ROUTE_STATUS, Method::Get) => Response::json(200, &service.status()),
        (ROUTE_CONFIG, Method::Get) => Response::json(200, service.config()),
        (ROUTE_CONFIG, Method::Post) => write_config(service, body, sink),
        (ROUTE_ROOT | ROUTE_STATUS | ROUTE_CONFIG, _) => Response::error(405, "method not allowed"),
        _ => Response::error(404, "not found"),
    }
}

fn write_config<S: StoragePort>(
    service: &mut RegulatorService<S>,
    body: &[u8],
    sink: &mut impl EventSink,
) -> Response {
    let parsed = match form::parse_config_form(body) {
        Ok(p) => p,
        Err(e) => return Response::error(413, &e.to_string()),
    };

    // Parse failures and range failures are disjoint: a field that did
    // not parse never reached the store.
    let mut rejected: Vec<FieldRejection, 6> = Vec::new();
    let _ = rejected.extend_from_slice(&parsed.rejected);

    let (status, error) = match service.write_config(&parsed.update, sink) {
        Ok(outcome) => {
            let _ = rejected.extend_from_slice(&outcome.report.rejected);
            if rejected.is_empty() {
                return Response::Redirect { location: ROUTE_ROOT };
            }
            warn!(
                "Config update partially rejected: {}",
                form::rejected_names(&rejected)
            );
            (422, String::from("invalid fields retained previous values"))
        }
        Err(failure) => {
            let _ = rejected.extend_from_slice(&failure.report.rejected);
            warn!("Config write not persisted: {}", failure);
            (500, failure.error.to_string())
        }
    };

    let names: Vec<&str, 6> = rejected.iter().map(|r| r.field.form_key()).collect();
    Response::json(
        status,
        &ErrorBody {
            error: &error,
            rejected: &names,
        },
    )
}
