//! Keyframed transform animation for emotes.
//!
//! An [`AnimationClip`] is loaded once and shared by every emote that plays
//! it. Each emote owns an [`AnimationMixer`], which is just a clock plus a
//! reference to the clip; the mixer's time is what the update loop compares
//! against the clip duration for animation-bound expiry.

use std::sync::Arc;

use cgmath::{InnerSpace, VectorSpace};
use instant::Duration;

use crate::data_structures::instance::Instance;

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
}

impl Keyframes {
    fn len(&self) -> usize {
        match self {
            Keyframes::Translation(v) => v.len(),
            Keyframes::Rotation(v) => v.len(),
            Keyframes::Scale(v) => v.len(),
        }
    }
}

/// One animated property with its own timestamps (seconds).
#[derive(Clone, Debug)]
pub struct Track {
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
}

/// A named set of tracks. The duration is the last timestamp over all tracks.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    tracks: Vec<Track>,
    duration: Duration,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let tracks: Vec<Track> = tracks
            .into_iter()
            .filter(|track| {
                let usable = !track.timestamps.is_empty()
                    && track.timestamps.len() == track.keyframes.len();
                if !usable {
                    log::warn!(
                        "dropping animation track with {} timestamps and {} keyframes",
                        track.timestamps.len(),
                        track.keyframes.len()
                    );
                }
                usable
            })
            .collect();
        let end = tracks
            .iter()
            .filter_map(|track| track.timestamps.last())
            .fold(0.0_f32, |acc, &t| acc.max(t));
        Self {
            name: name.into(),
            tracks,
            duration: Duration::from_secs_f32(end.max(0.0)),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Sample every track at `time` seconds and write the result into `target`.
    ///
    /// Properties without a track keep their current value.
    pub fn sample(&self, time: f32, target: &mut Instance) {
        for track in &self.tracks {
            let (i, j, t) = locate(&track.timestamps, time);
            match &track.keyframes {
                Keyframes::Translation(frames) => {
                    target.position = frames[i].lerp(frames[j], t);
                }
                Keyframes::Rotation(frames) => {
                    target.rotation = frames[i].slerp(frames[j], t).normalize();
                }
                Keyframes::Scale(frames) => {
                    target.scale = frames[i].lerp(frames[j], t);
                }
            }
        }
    }
}

/// Find the keyframe pair surrounding `time` and the blend factor between them.
fn locate(timestamps: &[f32], time: f32) -> (usize, usize, f32) {
    let last = timestamps.len() - 1;
    if time <= timestamps[0] {
        return (0, 0, 0.0);
    }
    if time >= timestamps[last] {
        return (last, last, 0.0);
    }
    let j = timestamps.partition_point(|&ts| ts <= time);
    let i = j - 1;
    let span = timestamps[j] - timestamps[i];
    let t = if span > 0.0 {
        (time - timestamps[i]) / span
    } else {
        0.0
    };
    (i, j, t)
}

/// Plays one clip. The clock only moves forward through [`update`](Self::update).
#[derive(Clone, Debug)]
pub struct AnimationMixer {
    clip: Arc<AnimationClip>,
    time: Duration,
    looping: bool,
}

impl AnimationMixer {
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: Duration::ZERO,
            looping: false,
        }
    }

    /// Wrap sampling around the clip end instead of holding the last frame.
    ///
    /// The mixer time keeps growing either way, so animation-bound expiry
    /// still fires once the clip has played through.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn is_finished(&self) -> bool {
        self.time >= self.clip.duration()
    }

    /// Advance by `dt` and pose `target`.
    pub fn update(&mut self, dt: Duration, target: &mut Instance) {
        self.time += dt;
        let duration = self.clip.duration().as_secs_f32();
        let mut t = self.time.as_secs_f32();
        if self.looping && duration > 0.0 {
            t %= duration;
        }
        self.clip.sample(t, target);
    }
}
