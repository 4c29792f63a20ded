//! Process plumbing for the wv control process.
//!
//! Everything in this crate deals with operating-system processes rather than
//! WebDriver semantics: locating and launching the bridge executable under a
//! self-terminating supervisor shell, walking and killing process trees,
//! scoped kill guards, and the optional Xvfb virtual display.
//!
//! The session layer in `wv-core` builds on these primitives; nothing here
//! speaks the wire protocol.

pub mod bridge;
pub mod display;
pub mod error;
pub mod guard;
pub mod proctree;

pub use bridge::{BridgePorts, BridgeProcess, find_bridge_executable};
pub use display::XvfbDisplay;
pub use error::{Error, Result};
pub use guard::KillGuard;
pub use proctree::{KillSignal, descendants_of, kill_by_name, kill_tree, process_exists};
