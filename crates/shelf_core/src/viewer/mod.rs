//! crates/shelf_core/src/viewer/mod.rs
//!
//! The PDF reading view, modeled as pure state machines: page
//! navigation, touch-gesture interpretation, view modes, and the
//! debounced persistence of reading progress. Everything here is
//! IO-free except the progress writer, which talks to the database
//! port through its sink.

pub mod debounce;
pub mod gesture;
pub mod modes;
pub mod nav;
pub mod progress;
pub mod session;

pub use progress::ProgressWriter;
pub use session::{ViewerEvent, ViewerInput, ViewerSession};
