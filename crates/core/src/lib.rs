//! Core of the wv visual-testing surface.
//!
//! This crate owns everything between the wire protocol and the operating
//! system: the driver supervisor and its exclusive [`Session`], the
//! DOM-stability and interactivity waits, and the command handlers (click,
//! type, wait, eval, snapshot, screenshot).
//!
//! Front-ends (`wv-cli`) construct a [`Supervisor`] at process start and pass
//! it by reference into dispatch; there is no hidden global session state.

pub mod a11y;
pub mod commands;
pub mod error;
pub mod session;
pub mod sync;

pub use error::{Error, Result};
pub use session::{ConnectOptions, Session, Supervisor};
