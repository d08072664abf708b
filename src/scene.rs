//! Host-owned scene collection.
//!
//! The pipeline never renders anything itself. It tells the host when an
//! emote becomes visible and when it has to go, and the host mirrors that in
//! whatever scene structure it draws from.

/// Outbound insertion/removal calls made by the pipeline.
pub trait Scene<O> {
    /// Called once when `emote` is admitted from the arrival buffer.
    fn add(&mut self, emote: &O);

    /// Called once when `emote` expires, right before it is dropped.
    fn remove(&mut self, emote: &O);
}

/// For hosts that draw straight from [`EmotePipeline::active`](crate::pipeline::EmotePipeline::active)
/// and keep no scene of their own.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unmanaged;

impl<O> Scene<O> for Unmanaged {
    fn add(&mut self, _: &O) {}

    fn remove(&mut self, _: &O) {}
}
