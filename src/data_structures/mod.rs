//! Engine data structures.
//!
//! - `ring_buffer` is the fixed-size arrival buffer for spawn-ready emotes
//! - `counter` counts live references per shared texture
//! - `instance` holds per-emote transformation data
//! - `texture` wraps emote textures and animated frame strips

pub mod counter;
pub mod instance;
pub mod ring_buffer;
pub mod texture;
