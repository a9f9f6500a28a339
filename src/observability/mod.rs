//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Response pipeline produces:
//!     → logging.rs (internal error snapshots → diagnostic hook)
//!     → metrics.rs (response and internal error counters)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{DiagnosticHook, InternalError};
