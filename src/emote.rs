//! Emotes: the objects that walk through the scene.
//!
//! The pipeline only needs four things from an object, captured by the
//! [`Emote`] trait: which shared texture it uses, when it expires, how far its
//! animation has played, and a way to advance it by one frame. Everything
//! else (meshes, materials, how the walk looks) belongs to whoever built the
//! object. [`WalkingEmote`] is the stock implementation used by the overlay.

use std::{fmt::Debug, hash::Hash, sync::Arc};

use cgmath::Deg;
use instant::{Duration, Instant};

use crate::{
    data_structures::{instance::Instance, texture::FrameStrip},
    resources::animation::{AnimationClip, AnimationMixer},
};

/// When an active emote leaves the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// Fixed time after admission.
    Lifespan(Duration),
    /// Once the emote's own animation clock reaches the clip duration.
    AnimationEnd(Duration),
}

impl Expiry {
    pub fn is_expired(&self, age: Duration, animation_time: Duration) -> bool {
        match *self {
            Expiry::Lifespan(lifespan) => age >= lifespan,
            Expiry::AnimationEnd(duration) => animation_time >= duration,
        }
    }
}

pub trait Emote {
    /// Key of the shared texture backing this emote.
    type Key: Clone + Eq + Hash + Debug;

    fn resource_key(&self) -> Self::Key;

    fn expiry(&self) -> Expiry;

    /// Progress of the emote's intrinsic animation. Only consulted for
    /// [`Expiry::AnimationEnd`].
    fn animation_time(&self) -> Duration {
        Duration::ZERO
    }

    /// Advance animation and transform state by one (clamped) frame delta.
    ///
    /// `now` is the unclamped frame time, for state that follows the wall
    /// clock rather than the animation clock.
    fn update(&mut self, dt: Duration, now: Instant);
}

/// An emote that has been admitted into the scene, stamped with its
/// admission time.
#[derive(Clone, Debug)]
pub struct Active<O> {
    emote: O,
    admitted_at: Instant,
}

impl<O: Emote> Active<O> {
    pub(crate) fn new(emote: O, admitted_at: Instant) -> Self {
        Self { emote, admitted_at }
    }

    pub fn admitted_at(&self) -> Instant {
        self.admitted_at
    }

    /// Time since admission; zero if `now` lies before the admission stamp.
    pub fn age(&self, now: Instant) -> Duration {
        if now > self.admitted_at {
            now - self.admitted_at
        } else {
            Duration::ZERO
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.emote
            .expiry()
            .is_expired(self.age(now), self.emote.animation_time())
    }

    pub fn emote(&self) -> &O {
        &self.emote
    }

    pub fn emote_mut(&mut self) -> &mut O {
        &mut self.emote
    }

    pub fn into_inner(self) -> O {
        self.emote
    }
}

/// A textured emote walking along a keyframed path.
///
/// Each frame the walk clip is sampled onto a copy of the base pose (shrunk
/// to [`WalkingEmote::SCALE`]), then the model is turned upright: the emote
/// quads are authored lying in the XZ plane facing down the path.
#[derive(Clone, Debug)]
pub struct WalkingEmote<K> {
    key: K,
    mixer: AnimationMixer,
    base: Instance,
    transform: Instance,
    frames: FrameStrip,
    texture_seed: Duration,
    texture_origin: Option<Instant>,
    uv_offset: f32,
    lifespan: Option<Duration>,
}

impl<K> WalkingEmote<K>
where
    K: Clone + Eq + Hash + Debug,
{
    pub const SCALE: f32 = 0.8;

    pub fn new(key: K, walk: Arc<AnimationClip>) -> Self {
        let mut base = Instance::new();
        base.scale_by(Self::SCALE);
        Self {
            key,
            mixer: AnimationMixer::new(walk),
            transform: base.clone(),
            base,
            frames: FrameStrip::still(),
            texture_seed: Duration::ZERO,
            texture_origin: None,
            uv_offset: 0.0,
            lifespan: None,
        }
    }

    /// Use an animated texture strip instead of a still image.
    pub fn with_frames(mut self, frames: FrameStrip) -> Self {
        self.frames = frames;
        self
    }

    /// Start the texture animation at `seed` so emotes sharing a texture
    /// don't blink in lockstep.
    pub fn with_texture_seed(mut self, seed: Duration) -> Self {
        self.texture_seed = seed;
        self.uv_offset = self.frames.uv_offset(seed);
        self
    }

    /// Expire after a fixed time instead of at the end of the walk.
    pub fn with_lifespan(mut self, lifespan: Duration) -> Self {
        self.lifespan = Some(lifespan);
        self
    }

    pub fn transform(&self) -> &Instance {
        &self.transform
    }

    pub fn uv_offset(&self) -> f32 {
        self.uv_offset
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }
}

impl<K> Emote for WalkingEmote<K>
where
    K: Clone + Eq + Hash + Debug,
{
    type Key = K;

    fn resource_key(&self) -> K {
        self.key.clone()
    }

    fn expiry(&self) -> Expiry {
        match self.lifespan {
            Some(lifespan) => Expiry::Lifespan(lifespan),
            None => Expiry::AnimationEnd(self.mixer.clip().duration()),
        }
    }

    fn animation_time(&self) -> Duration {
        self.mixer.time()
    }

    fn update(&mut self, dt: Duration, now: Instant) {
        // texture frames follow wall time from the first update on
        let origin = *self.texture_origin.get_or_insert(now);
        let shown_for = if now > origin { now - origin } else { Duration::ZERO };
        self.uv_offset = self.frames.uv_offset(self.texture_seed + shown_for);

        let mut pose = self.base.clone();
        self.mixer.update(dt, &mut pose);
        pose.rotate_x(Deg(-90.0));
        pose.rotate_z(Deg(90.0));
        pose.translate_y(-0.1);
        self.transform = pose;
    }
}
