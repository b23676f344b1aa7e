//! Error types for the plan lifecycle core.
//!
//! - **CoreError**: the single error envelope returned by every service, tagged with a
//!   [`CoreErrorKind`] the outer API layer maps onto a transport status.
//! - **PlanError**: domain failures of the status state machine, snapshot store and
//!   confirmation protocol. Converts into `CoreError`.

pub mod core_error;
pub mod plan;

pub use core_error::{CoreError, CoreErrorKind, CoreResult};
pub use plan::PlanError;

