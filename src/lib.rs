//! glyphscramble - decrypting-text animation engine
//!
//! Takes a block of text and keeps overlaying it with randomized
//! "decrypting" glyphs: fixed-position flicker, travelling scan tails,
//! spreading bursts and full-text fuzz. The engine is driven by elapsed
//! time and emits frames of colored text segments; presentation is left to
//! the caller.
//!
//! # Variants
//!
//! | Variant | Layout | Behaviour |
//! |---------|--------|-----------|
//! | spot-pulse | grid | single cells pulse, then fade back |
//! | global-fuzz | text | random cells rewritten every tick |
//! | linear-scan | text | cursors drag scrambled tails |
//! | radial-spread | grid | bursts grow from points, then fade |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use glyphscramble::{Config, EffectInstance, Surface, Variant};
//!
//! let config = Config::default().effect_config(Variant::RadialSpread);
//! let mut effect = EffectInstance::new("ACCESS GRANTED", Surface::new(320, 64), config);
//! if let Some(frame) = effect.advance(Duration::from_millis(100)) {
//!     for row in &frame {
//!         for segment in row {
//!             print!("{}", segment.text);
//!         }
//!         println!();
//!     }
//! }
//! let restore = effect.stop();
//! assert!(restore.is_some());
//! ```

pub mod config;
pub mod core;
pub mod effect;
pub mod ui;

pub use config::{Config, ConfigError, EffectConfig, Variant};
pub use crate::core::grid::Surface;
pub use effect::{EffectInstance, EffectKind, Restore};
pub use ui::segments::{Frame, Row, Segment};
