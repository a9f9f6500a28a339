//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → server.rs (buffer body, hand to Endware::serve)
//!     → request.rs (capture request info, negotiate)
//!     → negotiate.rs (Accept → content type + marshaller)
//!     → [endpoint reply dispatched by the reply module]
//!     → response.rs (immutable response)
//!     → writer.rs (headers, status, body onto the transport)
//! ```

pub mod headers;
pub mod negotiate;
pub mod request;
pub mod response;
pub mod server;
pub mod writer;

pub use headers::{canonical_header_key, Headers};
pub use negotiate::{negotiate, Format, MarshalError, Negotiation, NegotiationError};
pub use request::{decode_body, decode_body_strict, ApiRequest, DecodeError, RequestInfo};
pub use response::Response;
pub use server::endpoint;
pub use writer::{BufferedWriter, ResponseWriter};
