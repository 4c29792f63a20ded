//! Command handlers, one module per operation.
//!
//! Every handler follows the same shape: optional pre-wait, the domain
//! operation against the session, optional post-wait, typed result. The
//! pre/post waits are the synchronization primitives from [`crate::sync`];
//! whether they run is the caller's autoWait decision.

use std::time::Duration;

pub mod click;
pub mod eval;
pub mod screenshot;
pub mod snapshot;
pub mod typing;
pub mod wait;

pub use click::click;
pub use eval::eval;
pub use screenshot::screenshot;
pub use snapshot::snapshot;
pub use typing::type_text;
pub use wait::wait_for;

/// Deadline for the interactive pre-wait on click and type.
pub const DEFAULT_INTERACTIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default deadline for the wait command.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5000;
