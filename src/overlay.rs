//! The emote overlay flow.
//!
//! [`EmoteOverlay`] wires an [`EmotePipeline`] into the host loop: chat spawn
//! requests come in as custom events, are admission-checked and loaded, and
//! the loaded emotes are queued on the next frame. Frames run the update
//! loop, ticks run the drain step.

use anyhow::Result;
use instant::{Duration, Instant};
use winit::event::WindowEvent;

use crate::{
    context::Context,
    emote::Emote,
    flow::{GraphicsFlow, Out},
    loader::{LoadFuture, Loader},
    pipeline::{EmotePipeline, Stats},
    resources::Dispose,
    scene::Scene,
    settings::Settings,
};

/// Emotes found in one chat message, still to be constructed.
pub struct SpawnRequest<O> {
    pub channel: String,
    pub emotes: Vec<LoadFuture<O>>,
}

pub struct EmoteOverlay<O: Emote, S, D> {
    pipeline: EmotePipeline<O>,
    loader: Loader<O>,
    scene: S,
    disposer: D,
}

impl<O, S, D> EmoteOverlay<O, S, D>
where
    O: Emote + 'static,
    S: Scene<O>,
    D: Dispose<O::Key>,
{
    pub fn new(settings: Settings, now: Instant, scene: S, disposer: D) -> Result<Self> {
        Ok(Self {
            pipeline: EmotePipeline::new(settings, now)?,
            loader: Loader::new()?,
            scene,
            disposer,
        })
    }

    /// Admission-check a request and start loading the accepted emotes.
    /// Returns how many were accepted.
    pub fn request(&mut self, mut emotes: Vec<LoadFuture<O>>, now: Instant) -> usize {
        let accepted = self.pipeline.accept_request(emotes.len(), now);
        emotes.truncate(accepted);
        self.loader.load(emotes);
        accepted
    }

    /// Queue whatever finished loading, then run the update loop.
    pub fn frame(&mut self, now: Instant) -> Duration {
        for batch in self.loader.collect() {
            for emote in batch {
                self.pipeline.enqueue(emote);
            }
        }
        self.pipeline
            .frame_tick(now, &mut self.scene, &mut self.disposer)
    }

    /// Run one drain step; `true` if an emote was admitted.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.pipeline.timer_tick(now, &mut self.scene).is_some()
    }

    pub fn pipeline(&self) -> &EmotePipeline<O> {
        &self.pipeline
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn disposer(&self) -> &D {
        &self.disposer
    }

    pub fn stats(&self) -> Stats {
        self.pipeline.stats()
    }

    pub fn failed_loads(&self) -> usize {
        self.loader.failed()
    }

    fn sync_settings(&mut self, settings: &Settings) {
        let own = self.pipeline.settings_mut();
        own.stale_after = settings.stale_after;
        own.max_delta = settings.max_delta;
        own.max_per_burst = settings.max_per_burst;
        own.tick_period = settings.tick_period;
    }
}

impl<O, S, D> GraphicsFlow<SpawnRequest<O>> for EmoteOverlay<O, S, D>
where
    O: Emote + 'static,
    S: Scene<O>,
    D: Dispose<O::Key>,
{
    fn on_init(&mut self, ctx: &mut Context) -> Out<SpawnRequest<O>> {
        if ctx.settings.channels.is_empty() {
            log::warn!("no channels configured, add ?channels=name to the URL");
        } else {
            log::info!("showing emotes from {:?}", ctx.settings.channels);
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _: Duration) -> Out<SpawnRequest<O>> {
        self.sync_settings(&ctx.settings);
        self.frame(ctx.now());
        Out::Empty
    }

    fn on_tick(&mut self, ctx: &Context) -> Out<SpawnRequest<O>> {
        self.tick(ctx.now());
        if ctx.settings.show_stats {
            if let Some(window) = ctx.window() {
                let stats = self.stats();
                window.set_title(&format!(
                    "emotes {}/{} (queued {})",
                    stats.active, ctx.settings.capacity, stats.queued
                ));
            }
        }
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &WindowEvent) -> Out<SpawnRequest<O>> {
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        event: SpawnRequest<O>,
    ) -> Option<SpawnRequest<O>> {
        let requested = event.emotes.len();
        let accepted = self.request(event.emotes, ctx.now());
        log::trace!(
            "{} emotes from #{}, {} accepted",
            requested,
            event.channel,
            accepted
        );
        None
    }
}
