//! Content negotiation.
//!
//! # Responsibilities
//! - Resolve an `Accept` header value to a content type and marshaller
//! - Marshal values to the resolved format
//!
//! # Design Decisions
//! - Empty or `*/*` resolves to `application/json`
//! - Exact matches only: no q-weights, wildcards or parameters
//! - The registry is a fixed table; there is no runtime registration

use serde::Serialize;
use thiserror::Error;

/// Content type used when the client expresses no preference.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Supported content types and their marshallers.
pub const SUPPORTED: [(&str, Format); 4] = [
    ("application/json", Format::Json),
    ("application/xml", Format::Xml),
    ("text/json", Format::JsonIndented),
    ("text/xml", Format::XmlIndented),
];

/// The marshalling functions available to negotiated responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Compact JSON.
    Json,
    /// JSON indented by two spaces.
    JsonIndented,
    /// Compact XML.
    Xml,
    /// XML indented by four spaces.
    XmlIndented,
}

/// Errors raised while marshalling a value.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml: {0}")]
    Xml(String),
}

/// Negotiation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("no formatter for content type: {0}")]
    InvalidAccept(String),
}

impl Format {
    /// Marshal a value in this format.
    pub fn marshal<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>, MarshalError> {
        match self {
            Format::Json => Ok(serde_json::to_vec(value)?),
            Format::JsonIndented => Ok(serde_json::to_vec_pretty(value)?),
            Format::Xml => quick_xml::se::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| MarshalError::Xml(e.to_string())),
            Format::XmlIndented => {
                let mut buf = String::new();
                let mut serializer = quick_xml::se::Serializer::new(&mut buf);
                serializer.indent(' ', 4);
                value
                    .serialize(serializer)
                    .map_err(|e| MarshalError::Xml(e.to_string()))?;
                Ok(buf.into_bytes())
            }
        }
    }
}

/// The outcome of negotiation: the response content type and its marshaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiation {
    pub content_type: &'static str,
    pub format: Format,
}

impl Negotiation {
    pub fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, MarshalError> {
        self.format.marshal(value)
    }
}

impl Default for Negotiation {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE,
            format: Format::Json,
        }
    }
}

/// Resolve an `Accept` header value.
pub fn negotiate(accept: &str) -> Result<Negotiation, NegotiationError> {
    let accept = accept.trim();
    if accept.is_empty() || accept == "*/*" {
        return Ok(Negotiation::default());
    }

    SUPPORTED
        .iter()
        .find(|(content_type, _)| *content_type == accept)
        .map(|&(content_type, format)| Negotiation {
            content_type,
            format,
        })
        .ok_or_else(|| NegotiationError::InvalidAccept(accept.to_string()))
}
