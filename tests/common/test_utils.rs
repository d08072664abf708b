#![allow(dead_code)]

use std::{cell::Cell, rc::Rc};

use emote_ngin::{
    Duration, Instant,
    emote::{Emote, Expiry},
    resources::{Dispose, SharedResource},
    scene::Scene,
};

/// Offset `ms` milliseconds from `t0`.
pub fn at(t0: Instant, ms: u64) -> Instant {
    t0 + Duration::from_millis(ms)
}

/// A scripted emote that records how it was driven.
#[derive(Debug)]
pub struct TestEmote {
    pub name: &'static str,
    pub key: u32,
    pub expiry: Expiry,
    pub animation_time: Duration,
    pub updates: usize,
    pub deltas: Vec<Duration>,
}

impl TestEmote {
    pub fn new(name: &'static str, key: u32) -> Self {
        Self::with_lifespan(name, key, Duration::from_millis(2000))
    }

    pub fn with_lifespan(name: &'static str, key: u32, lifespan: Duration) -> Self {
        Self {
            name,
            key,
            expiry: Expiry::Lifespan(lifespan),
            animation_time: Duration::ZERO,
            updates: 0,
            deltas: Vec::new(),
        }
    }

    /// Expires once it has been advanced by `duration` in total.
    pub fn animated(name: &'static str, key: u32, duration: Duration) -> Self {
        Self {
            expiry: Expiry::AnimationEnd(duration),
            ..Self::new(name, key)
        }
    }
}

impl Emote for TestEmote {
    type Key = u32;

    fn resource_key(&self) -> u32 {
        self.key
    }

    fn expiry(&self) -> Expiry {
        self.expiry
    }

    fn animation_time(&self) -> Duration {
        self.animation_time
    }

    fn update(&mut self, dt: Duration, _: Instant) {
        self.updates += 1;
        self.animation_time += dt;
        self.deltas.push(dt);
    }
}

#[derive(Debug, Default)]
pub struct RecordingScene {
    pub added: Vec<&'static str>,
    pub removed: Vec<&'static str>,
}

impl RecordingScene {
    pub fn visible(&self) -> usize {
        self.added.len() - self.removed.len()
    }
}

impl Scene<TestEmote> for RecordingScene {
    fn add(&mut self, emote: &TestEmote) {
        self.added.push(emote.name);
    }

    fn remove(&mut self, emote: &TestEmote) {
        self.removed.push(emote.name);
    }
}

#[derive(Debug, Default)]
pub struct RecordingDisposer {
    pub disposed: Vec<u32>,
}

impl RecordingDisposer {
    pub fn times(&self, key: u32) -> usize {
        self.disposed.iter().filter(|&&k| k == key).count()
    }
}

impl Dispose<u32> for RecordingDisposer {
    fn dispose(&mut self, key: &u32) {
        self.disposed.push(*key);
    }
}

/// Stand-in for a GPU texture; counts how often it was released.
#[derive(Debug, Default)]
pub struct FakeTexture {
    pub released: Rc<Cell<usize>>,
}

impl FakeTexture {
    pub fn new(released: Rc<Cell<usize>>) -> Self {
        Self { released }
    }
}

impl SharedResource for FakeTexture {
    fn dispose(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}
