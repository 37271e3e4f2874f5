//! Content negotiation between JSON, XML and YAML representations.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_YAML: &str = "application/yaml";

/// Wire representation of a request or response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
    Yaml,
}

impl Format {
    /// Match a single media type, ignoring parameters such as `charset` or `q`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" | "application/*" | "*/*" => Some(Format::Json),
            "application/xml" | "text/xml" => Some(Format::Xml),
            "application/yaml" | "application/x-yaml" | "text/yaml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// First recognized entry of an `Accept` header; JSON when nothing matches.
    pub fn from_accept(accept: Option<&str>) -> Self {
        accept
            .into_iter()
            .flat_map(|value| value.split(','))
            .find_map(Self::from_mime)
            .unwrap_or_default()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Json => APPLICATION_JSON,
            Format::Xml => APPLICATION_XML,
            Format::Yaml => APPLICATION_YAML,
        }
    }
}

/// Response format requested through the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepts(pub Format);

impl<S> FromRequestParts<S> for Accepts
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok());
        Ok(Accepts(Format::from_accept(accept)))
    }
}

/// A body rendered in the negotiated format.
///
/// `root` names the document element of XML output.
pub struct Negotiated<T> {
    format: Format,
    root: &'static str,
    body: T,
}

impl<T> Negotiated<T> {
    pub fn new(format: Format, root: &'static str, body: T) -> Self {
        Self {
            format,
            root,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for Negotiated<T> {
    fn into_response(self) -> Response {
        let rendered = match self.format {
            Format::Json => serde_json::to_vec(&self.body).map_err(|e| e.to_string()),
            Format::Xml => quick_xml::se::to_string_with_root(self.root, &self.body)
                .map(String::into_bytes)
                .map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::to_string(&self.body)
                .map(String::into_bytes)
                .map_err(|e| e.to_string()),
        };

        match rendered {
            Ok(bytes) => (
                [(header::CONTENT_TYPE, self.format.content_type())],
                bytes,
            )
                .into_response(),
            Err(e) => AppError::internal(anyhow::anyhow!(
                "failed to render {} response: {}",
                self.format.content_type(),
                e
            ))
            .into_response(),
        }
    }
}

/// Request body decoded from JSON, XML or YAML according to `Content-Type`.
///
/// An empty body yields `Payload(None)` so handlers can decide how to treat a
/// missing object.
#[derive(Debug)]
pub struct Payload<T>(pub Option<T>);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let format = match req.headers().get(header::CONTENT_TYPE) {
            Some(value) => {
                let content_type = value.to_str().unwrap_or_default().to_string();
                Format::from_mime(&content_type).ok_or_else(|| {
                    AppError::unsupported_media_type(format!(
                        "content type '{}' is not supported",
                        content_type
                    ))
                })?
            }
            None => Format::Json,
        };

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(None));
        }

        let text = std::str::from_utf8(&bytes)
            .map_err(|_| AppError::bad_request("request body is not valid UTF-8"))?;

        let decoded = match format {
            Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Format::Xml => quick_xml::de::from_str(text).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        };

        decoded
            .map(|value| Payload(Some(value)))
            .map_err(|e| AppError::bad_request(format!("malformed request body: {}", e)))
    }
}
