//! Front-ends for the wv visual-testing surface.
//!
//! Three paths share one dispatch core: a one-shot CLI run
//! (connect, execute, disconnect), a batch runner fed a JSON array on stdin,
//! and the persistent HTTP command server.

pub mod cli;
pub mod context;
pub mod dispatch;
pub mod logging;
pub mod output;
pub mod run;
pub mod server;
