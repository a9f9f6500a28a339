//! Marshallable content.

use serde::Serialize;

use crate::http::negotiate::{Format, MarshalError};

/// A value that can be marshalled to any negotiated format.
///
/// Implemented for every `Serialize + Send` type, so endpoint code hands over
/// plain data and the format is chosen later by negotiation.
pub trait Content: Send {
    fn marshal(&self, format: Format) -> Result<Vec<u8>, MarshalError>;
}

impl<T: Serialize + Send> Content for T {
    fn marshal(&self, format: Format) -> Result<Vec<u8>, MarshalError> {
        format.marshal(self)
    }
}
