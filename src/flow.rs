//! Host loop: window, frame and timer triggers.
//!
//! A "flow" is a self-contained piece of the overlay that reacts to frames,
//! timer ticks, window events and custom events (such as chat spawn
//! requests). [`run`] owns the winit event loop and drives every flow:
//!
//! 1. Custom events sent through an [`EventSender`] go to
//!    `on_custom_events`, each flow may consume or pass them on
//! 2. Each redraw calls `on_update` with the time since the previous frame,
//!    then requests the next redraw right away
//! 3. A [`Ticker`] holds the wall-clock deadline of the next `on_tick`. The
//!    loop sleeps at most until that deadline, so ticks keep their period
//!    however slow the frames are
//!
//! Everything runs on the event loop thread, so flows need no locking.

use std::{future::Future, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{context::Context, settings::Settings};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

///
/// Output of every lifecycle hook.
///
/// `Out::FutEvent` resolves futures to custom events, which are fed back into
/// `on_custom_events` once resolved.
///
/// `Out::Configure` mutates the [`Context`] at runtime, e.g. to change the
/// drain period or the stale threshold.
///
/// `Empty` is the default when nothing needs to happen.
///
pub enum Out<E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<E> Default for Out<E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// A part of the overlay driven by the host loop.
pub trait GraphicsFlow<E> {
    /// Called once after the window exists and before the first frame.
    fn on_init(&mut self, ctx: &mut Context) -> Out<E>;

    /// Called every frame with the unclamped time since the previous frame.
    fn on_update(&mut self, ctx: &Context, dt: Duration) -> Out<E>;

    /// Called every `ctx.settings.tick_period` of wall-clock time, whether or
    /// not frames are being drawn.
    fn on_tick(&mut self, ctx: &Context) -> Out<E>;

    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent) -> Out<E>;

    /// Handle a custom event. Returning it hands it to the next flow,
    /// returning `None` consumes it.
    fn on_custom_events(&mut self, ctx: &Context, event: E) -> Option<E>;
}

/// Builds a flow once the loop is up. The sender lets the flow (or an event
/// source it spawns) push custom events into the loop.
pub type FlowConstructor<E> =
    Box<dyn FnOnce(EventSender<E>) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<E>>>>>>;

/// Fixed wall-clock deadlines for the drain step, independent of frames.
///
/// The host loop sleeps until [`next_tick`](Self::next_tick) and calls
/// [`poll`](Self::poll) whenever it wakes up. Each deadline fires once. If
/// whole periods were missed (a suspended tab, a blocked loop), they are
/// skipped and the schedule restarts from `now`, like a browser interval
/// after throttling.
#[derive(Clone, Debug)]
pub struct Ticker {
    period: Duration,
    next_tick: Instant,
}

impl Ticker {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_tick: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Takes effect from the next deadline on.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    /// Time left until the next deadline, zero if it has passed.
    pub fn until_next(&self, now: Instant) -> Duration {
        if self.next_tick > now {
            self.next_tick - now
        } else {
            Duration::ZERO
        }
    }

    /// `true` if a deadline has been reached; moves on to the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_tick {
            return false;
        }
        self.next_tick += self.period;
        if self.next_tick <= now {
            self.next_tick = now + self.period;
        }
        true
    }
}

/// Cloneable handle for sending custom events into a running loop.
pub struct EventSender<E: 'static>(EventLoopProxy<FlowEvent<E>>);

impl<E: 'static> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E: 'static> EventSender<E> {
    pub fn send(&self, event: E) -> anyhow::Result<()> {
        self.0
            .send_event(FlowEvent::Custom(event))
            .map_err(|_| anyhow::anyhow!("the event loop is closed"))
    }

    /// Ask the loop to shut down after the current iteration.
    pub fn exit(&self) -> anyhow::Result<()> {
        self.0
            .send_event(FlowEvent::Exit)
            .map_err(|_| anyhow::anyhow!("the event loop is closed"))
    }
}

pub(crate) enum FlowEvent<E: 'static> {
    #[allow(dead_code)]
    Initialized(Vec<Box<dyn GraphicsFlow<E>>>),
    Custom(E),
    Exit,
}

struct App<E: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent<E>>,
    settings: Settings,
    ctx: Option<Context>,
    graphics_flows: Vec<Box<dyn GraphicsFlow<E>>>,
    // taken on first resume
    constructors: Option<Vec<FlowConstructor<E>>>,
    last_time: Instant,
    ticker: Ticker,
}

impl<E: 'static> App<E> {
    fn new(
        event_loop: &EventLoop<FlowEvent<E>>,
        settings: Settings,
        constructors: Vec<FlowConstructor<E>>,
    ) -> anyhow::Result<Self> {
        let ticker = Ticker::new(settings.tick_period, Instant::now());
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            settings,
            ctx: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            ticker,
        })
    }

    fn init_flows(&mut self) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_init(ctx);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                ctx,
                self.proxy.clone(),
                out,
            );
        }
        self.last_time = Instant::now();
        if let Some(window) = ctx.window() {
            window.request_redraw();
        }
    }

    fn redraw(&mut self) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        let now = Instant::now();
        let dt = now - self.last_time;
        self.last_time = now;
        ctx.set_now(now);

        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_update(ctx, dt);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                ctx,
                self.proxy.clone(),
                out,
            );
        }

        // keep the frame loop going
        if let Some(window) = ctx.window() {
            window.request_redraw();
        }
    }

    fn tick(&mut self) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        let now = Instant::now();
        self.ticker.set_period(ctx.settings.tick_period);
        if !self.ticker.poll(now) {
            return;
        }
        ctx.set_now(now);
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_tick(ctx);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                ctx,
                self.proxy.clone(),
                out,
            );
        }
    }
}

impl<E: 'static> ApplicationHandler<FlowEvent<E>> for App<E> {
    fn new_events(&mut self, _: &ActiveEventLoop, _: StartCause) {
        // every wake-up, timer or not, checks the drain deadline
        self.tick();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let timeout = self.ticker.until_next(Instant::now());
        event_loop.set_control_flow(ControlFlow::wait_duration(timeout));
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("emote-ngin");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            window_attributes = window_attributes.with_append(true);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create a window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.ctx = Some(Context::with_window(window, self.settings.clone()));

        let Some(constructors) = self.constructors.take() else {
            return;
        };
        let flow_futures: Vec<_> = constructors
            .into_iter()
            .map(|constructor| constructor(EventSender(self.proxy.clone())))
            .collect();
        let init_future = futures::future::join_all(flow_futures);

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.graphics_flows = self.async_runtime.block_on(init_future);
            self.init_flows();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let flows = init_future.await;
                assert!(proxy.send_event(FlowEvent::Initialized(flows)).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<E>) {
        match event {
            FlowEvent::Initialized(flows) => {
                // only sent by the wasm `spawn_local` above
                self.graphics_flows = flows;
                self.init_flows();
            }
            FlowEvent::Custom(custom_event) => {
                let Some(ctx) = self.ctx.as_mut() else {
                    log::warn!("custom event arrived before the window was ready");
                    return;
                };
                // spawn requests are judged against the time they arrive
                ctx.set_now(Instant::now());
                let result = self
                    .graphics_flows
                    .iter_mut()
                    .fold(Some(custom_event), |event, flow| {
                        flow.on_custom_events(ctx, event?)
                    });
                if result.is_some() {
                    log::warn!("Custom event was not consumed by any flow");
                }
            }
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_window_events(ctx, &event);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                ctx,
                self.proxy.clone(),
                out,
            );
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn handle_flow_output<E: 'static>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    ctx: &mut Context,
    proxy: EventLoopProxy<FlowEvent<E>>,
    out: Out<E>,
) {
    match out {
        Out::FutEvent(futures) => {
            let fut =
                async move { futures::future::join_all(futures.into_iter().map(Pin::from)).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let resolved = async_runtime.block_on(fut);
                for event in resolved {
                    if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                        log::error!("Event loop was closed before all events could be processed.");
                    }
                }
            }

            #[cfg(target_arch = "wasm32")]
            {
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = fut.await;
                    for event in resolved {
                        assert!(proxy.send_event(FlowEvent::Custom(event)).is_ok());
                    }
                });
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Open a window and run `constructors`' flows until the window closes.
pub fn run<E: 'static>(
    settings: Settings,
    constructors: Vec<FlowConstructor<E>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent<E>> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, settings, constructors)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
