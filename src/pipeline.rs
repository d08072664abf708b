//! Admission, flow control and lifecycle of emotes.
//!
//! Emotes arrive in bursts whenever chat gets busy, but should trickle into
//! the scene at a steady pace. [`EmotePipeline`] sits between the two:
//!
//! 1. [`spawn`](EmotePipeline::spawn) / [`spawn_burst`](EmotePipeline::spawn_burst)
//!    park constructed emotes in a fixed-size [`RingBuffer`]. Requests that
//!    arrive while the render loop is stalled (e.g. a backgrounded tab) are
//!    dropped instead, so resuming doesn't flood the scene with stale emotes.
//! 2. [`timer_tick`](EmotePipeline::timer_tick) runs on a fixed period and
//!    admits at most one queued emote into the active set, taking a
//!    reference on its texture.
//! 3. [`frame_tick`](EmotePipeline::frame_tick) runs once per rendered frame.
//!    It scans the active set back to front, updates live emotes and removes
//!    expired ones. Dropping the last reference to a texture disposes it.
//!
//! Nothing in here fails at runtime. Empty queues, overflow and stale drops
//! are ordinary outcomes that show up in [`Stats`].

use anyhow::Result;
use instant::{Duration, Instant};

use crate::{
    data_structures::{counter::Counter, ring_buffer::RingBuffer},
    emote::{Active, Emote},
    resources::Dispose,
    scene::Scene,
    settings::Settings,
};

/// What happened to a single spawn request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Parked in the arrival buffer.
    Queued,
    /// Parked, but the buffer was full and its oldest emote was discarded.
    Evicted,
    /// Not queued: the render loop hasn't produced a frame in a while.
    DroppedStale,
}

/// Counters since construction plus the current sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub admitted: usize,
    pub expired: usize,
    pub disposed: usize,
    /// Queued emotes overwritten by newer arrivals.
    pub evicted: usize,
    /// Emotes dropped because they arrived during a stall.
    pub dropped_stale: usize,
    /// Emotes cut from bursts larger than `max_per_burst`.
    pub truncated: usize,
    pub active: usize,
    pub queued: usize,
}

#[derive(Debug)]
pub struct EmotePipeline<O: Emote> {
    settings: Settings,
    queue: RingBuffer<O>,
    active: Vec<Active<O>>,
    references: Counter<O::Key>,
    last_frame: Instant,
    stats: Stats,
}

impl<O: Emote> EmotePipeline<O> {
    /// `now` counts as the first processed frame for the stale check.
    pub fn new(settings: Settings, now: Instant) -> Result<Self> {
        let queue = RingBuffer::new(settings.capacity)?;
        log::info!(
            "emote pipeline ready: capacity {}, one admission every {:?}",
            settings.capacity,
            settings.tick_period
        );
        Ok(Self {
            settings,
            queue,
            active: Vec::new(),
            references: Counter::new(),
            last_frame: now,
            stats: Stats::default(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access for runtime tweaks. Buffer capacity is fixed at
    /// construction and not affected by later changes.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn last_frame(&self) -> Instant {
        self.last_frame
    }

    /// Whether more than `stale_after` has passed since the last frame.
    pub fn is_stale(&self, now: Instant) -> bool {
        elapsed_between(self.last_frame, now) > self.settings.stale_after
    }

    /// Queue one constructed emote unless the render loop is stalled.
    pub fn spawn(&mut self, emote: O, now: Instant) -> Admission {
        if self.is_stale(now) {
            self.stats.dropped_stale += 1;
            log::debug!("dropped emote {:?}, no frame for a while", emote.resource_key());
            return Admission::DroppedStale;
        }
        self.enqueue(emote)
    }

    /// Queue the emotes of one chat message.
    ///
    /// Goes through [`accept_request`](Self::accept_request) first, so a
    /// burst is either dropped as a whole or cut to `max_per_burst`.
    /// Returns how many emotes were queued.
    pub fn spawn_burst(&mut self, emotes: impl IntoIterator<Item = O>, now: Instant) -> usize {
        let emotes: Vec<O> = emotes.into_iter().collect();
        let accepted = self.accept_request(emotes.len(), now);
        emotes
            .into_iter()
            .take(accepted)
            .map(|emote| self.enqueue(emote))
            .count()
    }

    /// Admission control for a request of `requested` emotes that may still
    /// need to be constructed.
    ///
    /// Returns how many of them may be built and queued: `0` while the render
    /// loop is stalled, otherwise at most `max_per_burst`. Dropped and cut
    /// emotes are counted in [`Stats`].
    pub fn accept_request(&mut self, requested: usize, now: Instant) -> usize {
        if self.is_stale(now) {
            self.stats.dropped_stale += requested;
            log::debug!("dropped request for {} emotes, no frame for a while", requested);
            return 0;
        }
        let limit = self.settings.max_per_burst;
        if requested > limit {
            self.stats.truncated += requested - limit;
        }
        requested.min(limit)
    }

    /// Queue an emote whose request already passed
    /// [`accept_request`](Self::accept_request), without another stall check.
    pub fn enqueue(&mut self, emote: O) -> Admission {
        match self.queue.enqueue(emote) {
            Some(evicted) => {
                self.stats.evicted += 1;
                log::debug!(
                    "arrival buffer full, discarded queued emote {:?}",
                    evicted.resource_key()
                );
                Admission::Evicted
            }
            None => Admission::Queued,
        }
    }

    /// Drain step: admit at most one queued emote.
    ///
    /// The emote is stamped with `now`, appended to the active set, handed to
    /// the scene and its texture gains a reference. Returns the admitted
    /// emote, or `None` if the buffer was empty.
    pub fn timer_tick(&mut self, now: Instant, scene: &mut impl Scene<O>) -> Option<&O> {
        let emote = self.queue.dequeue()?;
        let key = emote.resource_key();
        scene.add(&emote);
        self.active.push(Active::new(emote, now));
        let count = self.references.increment(key);
        self.stats.admitted += 1;
        log::trace!("admitted emote, texture now used {} times", count);
        self.active.last().map(Active::emote)
    }

    /// Per-frame update: expire or advance every active emote.
    ///
    /// The delta since the previous frame is clamped to `[0, max_delta]`,
    /// applied to every surviving emote and returned. The active set is
    /// walked from the back so removals never skip an element.
    pub fn frame_tick(
        &mut self,
        now: Instant,
        scene: &mut impl Scene<O>,
        disposer: &mut impl Dispose<O::Key>,
    ) -> Duration {
        let dt = elapsed_between(self.last_frame, now).min(self.settings.max_delta);
        self.last_frame = now;

        for index in (0..self.active.len()).rev() {
            if !self.active[index].is_expired(now) {
                self.active[index].emote_mut().update(dt, now);
                continue;
            }
            let expired = self.active.remove(index);
            scene.remove(expired.emote());
            self.stats.expired += 1;
            self.release(expired.emote().resource_key(), disposer);
        }
        dt
    }

    fn release(&mut self, key: O::Key, disposer: &mut impl Dispose<O::Key>) {
        if self.references.peek(&key) == 0 {
            // every admission takes a reference, so this would be a double release
            log::warn!("texture {:?} released without a live reference", key);
            return;
        }
        if self.references.decrement(&key) == 0 {
            disposer.dispose(&key);
            self.stats.disposed += 1;
            log::debug!("last emote using texture {:?} expired", key);
        }
    }

    pub fn active(&self) -> &[Active<O>] {
        &self.active
    }

    /// Queued emotes, next to be admitted first.
    pub fn queued(&self) -> impl Iterator<Item = &O> + '_ {
        self.queue.iter()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Active emotes currently using `key`.
    pub fn references(&self, key: &O::Key) -> usize {
        self.references.peek(key)
    }

    /// Number of distinct textures still in use.
    pub fn live_textures(&self) -> usize {
        self.references.len()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            active: self.active.len(),
            queued: self.queue.len(),
            ..self.stats
        }
    }
}

fn elapsed_between(earlier: Instant, later: Instant) -> Duration {
    if later > earlier {
        later - earlier
    } else {
        Duration::ZERO
    }
}
