//! Core building blocks of the scramble engine.
//!
//! - **color**: pulse palette lookup and fade-to-white blending
//! - **grid**: text-to-grid formatting, cell positions, overlays
//! - **position**: collision-avoiding spawn placement
//! - **unit**: the growing/active/fading unit state machine
//!
//! # Architecture
//!
//! ```text
//! unit ──> color
//!   │
//!   └────> grid <── position
//! ```

pub mod color;
pub mod grid;
pub mod position;
pub mod unit;
