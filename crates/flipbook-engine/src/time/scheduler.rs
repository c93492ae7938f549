use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::fps::{FpsHook, FpsSampler};
use super::host::{FramePump, IntervalTimer};
use crate::error::{Error, Result};

/// Per-tick consumer; receives the elapsed milliseconds since the previous tick.
pub type TickFn = Box<dyn FnMut(f64)>;

/// Lifecycle hook run around the first frame request.
pub type HookFn = Box<dyn FnMut()>;

/// Scheduler configuration.
///
/// Host facilities are injected explicitly; nothing is discovered from the
/// environment. A scheduler without a frame pump cannot be constructed.
#[derive(Default)]
pub struct SchedulerOptions {
    /// Run just before the first frame request.
    pub on_start: Option<HookFn>,
    /// Run just after the first frame request.
    pub on_started: Option<HookFn>,
    /// Receives FPS samples: `Some(n)` per window, `None` when sampling stops.
    pub on_fps_change: Option<FpsHook>,
    pub frame_pump: Option<Box<dyn FramePump>>,
    /// Periodic timer closing FPS windows. Required when measuring FPS.
    pub fps_timer: Option<Box<dyn IntervalTimer>>,
    /// Enable FPS sampling when the scheduler starts.
    pub measure_fps: bool,
}

impl SchedulerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub fn on_started(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_started = Some(Box::new(hook));
        self
    }

    pub fn on_fps_change(mut self, hook: impl FnMut(Option<f64>) + 'static) -> Self {
        self.on_fps_change = Some(Box::new(hook));
        self
    }

    pub fn frame_pump(mut self, pump: impl FramePump + 'static) -> Self {
        self.frame_pump = Some(Box::new(pump));
        self
    }

    pub fn fps_timer(mut self, timer: impl IntervalTimer + 'static) -> Self {
        self.fps_timer = Some(Box::new(timer));
        self
    }

    pub fn measure_fps(mut self, enabled: bool) -> Self {
        self.measure_fps = enabled;
        self
    }
}

/// Two-step construction for hosts that wire the tick consumer late.
#[derive(Default)]
pub struct SchedulerBuilder {
    on_tick: Option<TickFn>,
    options: SchedulerOptions,
}

impl SchedulerBuilder {
    pub fn on_tick(mut self, on_tick: impl FnMut(f64) + 'static) -> Self {
        self.on_tick = Some(Box::new(on_tick));
        self
    }

    pub fn options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<FrameScheduler> {
        let on_tick = self
            .on_tick
            .ok_or_else(|| Error::ArgumentType("'on_tick' must be provided".to_string()))?;

        FrameScheduler::from_parts(on_tick, self.options)
    }
}

struct Inner {
    latest_tick_time: Cell<f64>,
    started: Cell<bool>,
    ticks: Cell<u64>,
    measure_fps: bool,
    on_tick: RefCell<TickFn>,
    on_start: RefCell<Option<HookFn>>,
    on_started: RefCell<Option<HookFn>>,
    pump: RefCell<Box<dyn FramePump>>,
    fps: Rc<FpsSampler>,
}

/// Variable-rate tick loop driven by an injected frame pump.
///
/// Each frame the pump reports an absolute time `t`; the scheduler hands
/// `t - latest_tick_time` to the tick consumer and re-registers for the next
/// frame. Steps run to completion one at a time.
///
/// Handles are cheap clones of one scheduler. The pending frame callback only
/// holds a weak reference, so dropping every handle ends the loop.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<Inner>,
}

impl FrameScheduler {
    pub fn new(on_tick: impl FnMut(f64) + 'static, options: SchedulerOptions) -> Result<Self> {
        Self::from_parts(Box::new(on_tick), options)
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    fn from_parts(on_tick: TickFn, options: SchedulerOptions) -> Result<Self> {
        let SchedulerOptions {
            on_start,
            on_started,
            on_fps_change,
            frame_pump,
            fps_timer,
            measure_fps,
        } = options;

        let pump = frame_pump.ok_or(Error::FramePumpUnavailable)?;

        if measure_fps && fps_timer.is_none() {
            return Err(Error::OptionType(
                "'measure_fps' requires 'fps_timer' to be provided".to_string(),
            ));
        }

        Ok(Self {
            inner: Rc::new(Inner {
                latest_tick_time: Cell::new(0.0),
                started: Cell::new(false),
                ticks: Cell::new(0),
                measure_fps,
                on_tick: RefCell::new(on_tick),
                on_start: RefCell::new(on_start),
                on_started: RefCell::new(on_started),
                pump: RefCell::new(pump),
                fps: FpsSampler::new(fps_timer, on_fps_change),
            }),
        })
    }

    /// Starts the loop. Calling it again is a no-op.
    pub fn start(&self) {
        let inner = &self.inner;
        if inner.started.replace(true) {
            log::warn!("frame scheduler already started");
            return;
        }

        if inner.measure_fps {
            if let Err(e) = inner.fps.toggle(Some(true)) {
                log::error!("failed to reset fps sampler: {e}");
            }
        }
        run_hook(&inner.on_start);

        schedule(inner);

        run_hook(&inner.on_started);
        log::debug!("frame scheduler started");
    }

    /// Enables or disables FPS sampling; `None` flips the current state.
    pub fn toggle_fps(&self, explicit: Option<bool>) -> Result<bool> {
        self.inner.fps.toggle(explicit)
    }

    pub fn fps_enabled(&self) -> bool {
        self.inner.fps.is_enabled()
    }

    /// Latest completed FPS sample; `None` while sampling is off.
    pub fn current_fps(&self) -> Option<f64> {
        self.inner.fps.current()
    }

    /// Host time of the latest tick, 0 before the first one.
    pub fn latest_tick_time(&self) -> f64 {
        self.inner.latest_tick_time.get()
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.get()
    }

    pub fn tick_count(&self) -> u64 {
        self.inner.ticks.get()
    }

    pub fn can_measure_fps(&self) -> bool {
        self.inner.fps.has_timer()
    }
}

fn run_hook(hook: &RefCell<Option<HookFn>>) {
    if let Some(hook) = hook.borrow_mut().as_mut() {
        hook();
    }
}

fn schedule(inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    let callback = Box::new(move |time: f64| {
        if let Some(inner) = weak.upgrade() {
            step(&inner, time);
        }
    });

    match inner.pump.try_borrow_mut() {
        Ok(mut pump) => pump.request_frame(callback),
        Err(_) => log::error!("frame pump invoked its callback re-entrantly; tick loop stopped"),
    }
}

fn step(inner: &Rc<Inner>, time: f64) {
    let step_time = time - inner.latest_tick_time.get();
    if step_time < 0.0 {
        log::trace!("frame pump went back in time by {}ms", -step_time);
    }

    inner.fps.record_frame();
    inner.ticks.set(inner.ticks.get() + 1);

    match inner.on_tick.try_borrow_mut() {
        Ok(mut on_tick) => on_tick(step_time),
        Err(_) => log::error!("tick consumer re-entered at t={time}"),
    }

    inner.latest_tick_time.set(time);

    schedule(inner);
}
