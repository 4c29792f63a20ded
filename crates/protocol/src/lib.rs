//! Wire types for the wv command protocol.
//!
//! This crate contains the serde-serializable types exchanged between the
//! `wv` front-ends (CLI, batch, HTTP server) and their callers. These types
//! represent the "protocol layer" - the shapes of data as they appear on the
//! wire.
//!
//! Types in this crate are pure data: no behavior beyond serialization,
//! deserialization, and trivial constructors. Command execution lives in
//! `wv-core`; dispatch lives in `wv-cli`.

pub mod command;
pub mod response;

pub use command::*;
pub use response::*;
