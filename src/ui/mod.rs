//! Output side of the engine.
//!
//! - **segments**: frames of `(text, color)` runs, the engine's only output
//! - **renderer**: crossterm renderer used by the demo binary

pub mod renderer;
pub mod segments;

pub use renderer::Renderer;
pub use segments::{Frame, Row, Segment};
