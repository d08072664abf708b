//! Emote textures.
//!
//! [`Texture`] bundles the GPU objects of one emote image. Many emotes can
//! point at the same texture; it is released through
//! [`SharedResource::dispose`] once the last of them leaves the scene.
//! [`FrameStrip`] picks the current frame of an animated (GIF-style) emote
//! laid out as a horizontal strip.

use instant::Duration;

use crate::resources::SharedResource;

#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    pub fn new(texture: wgpu::Texture, sampler: Option<wgpu::Sampler>) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            sampler,
        }
    }
}

impl SharedResource for Texture {
    fn dispose(&mut self) {
        self.texture.destroy();
    }
}

impl SharedResource for wgpu::Texture {
    fn dispose(&mut self) {
        self.destroy();
    }
}

/// Frame timing for an animated emote texture.
///
/// All frames live side by side in one texture; [`uv_offset`](Self::uv_offset)
/// returns the horizontal offset of the frame visible at a given time.
#[derive(Clone, Debug)]
pub struct FrameStrip {
    delays: Vec<Duration>,
    total: Duration,
}

impl FrameStrip {
    /// A strip with per-frame delays. Zero delays are bumped to 10ms, the
    /// same floor browsers apply to GIFs.
    pub fn new(delays: Vec<Duration>) -> Self {
        let delays: Vec<Duration> = delays
            .into_iter()
            .map(|d| d.max(Duration::from_millis(10)))
            .collect();
        let total = delays.iter().sum();
        Self { delays, total }
    }

    /// A single still frame.
    pub fn still() -> Self {
        Self::new(vec![Duration::from_secs(1)])
    }

    pub fn frame_count(&self) -> usize {
        self.delays.len()
    }

    /// Index of the frame shown `elapsed` after the animation started, looping.
    pub fn frame_at(&self, elapsed: Duration) -> usize {
        if self.delays.len() <= 1 || self.total.is_zero() {
            return 0;
        }
        let mut remaining = Duration::from_nanos(
            (elapsed.as_nanos() % self.total.as_nanos()) as u64,
        );
        for (idx, delay) in self.delays.iter().enumerate() {
            if remaining < *delay {
                return idx;
            }
            remaining -= *delay;
        }
        self.delays.len() - 1
    }

    /// U offset in `[0, 1)` of the frame shown at `elapsed`.
    pub fn uv_offset(&self, elapsed: Duration) -> f32 {
        match self.frame_count() {
            0 => 0.0,
            n => self.frame_at(elapsed) as f32 / n as f32,
        }
    }
}
