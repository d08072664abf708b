//! emote-ngin
//!
//! Smooths bursts of chat-triggered emotes into a steady stream of objects
//! walking through a real-time scene, and releases their shared textures
//! exactly when the last emote using them disappears. Runs natively and on
//! WASM.
//!
//! High-level modules
//! - `pipeline`: arrival buffer, drain step, per-frame update/expiry loop
//! - `emote`: the object capability the pipeline drives, plus the walking emote
//! - `data_structures`: ring buffer, reference counter, transforms, texture frames
//! - `resources`: shared resource disposal and keyframe animation
//! - `loader`: asynchronous emote construction
//! - `flow`: the host loop (window, frame and timer triggers)
//! - `overlay`: the flow wiring all of the above together
//! - `settings`: tunables and URL query parsing
//!

pub mod context;
pub mod data_structures;
pub mod emote;
pub mod flow;
pub mod loader;
pub mod overlay;
pub mod pipeline;
pub mod resources;
pub mod scene;
pub mod settings;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use instant::{Duration, Instant};
pub use winit::event::WindowEvent;
