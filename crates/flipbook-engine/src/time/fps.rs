use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::host::{IntervalId, IntervalTimer};
use crate::error::{Error, Result};

/// Length of one FPS sampling window.
pub const FPS_WINDOW: Duration = Duration::from_millis(1000);

pub type FpsHook = Box<dyn FnMut(Option<f64>)>;

/// Counts ticks per one-second window and reports the tally.
///
/// The window is closed by an interval timer, not by ticks, so a stalled loop
/// reports 0 rather than nothing.
pub(crate) struct FpsSampler {
    enabled: Cell<bool>,
    frames_this_window: Cell<u32>,
    current: Cell<Option<f64>>,
    interval: Cell<Option<IntervalId>>,
    timer: RefCell<Option<Box<dyn IntervalTimer>>>,
    on_change: RefCell<Option<FpsHook>>,
}

impl FpsSampler {
    pub(crate) fn new(
        timer: Option<Box<dyn IntervalTimer>>,
        on_change: Option<FpsHook>,
    ) -> Rc<Self> {
        Rc::new(Self {
            enabled: Cell::new(false),
            frames_this_window: Cell::new(0),
            current: Cell::new(None),
            interval: Cell::new(None),
            timer: RefCell::new(timer),
            on_change: RefCell::new(on_change),
        })
    }

    pub(crate) fn has_timer(&self) -> bool {
        self.timer.borrow().is_some()
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub(crate) fn current(&self) -> Option<f64> {
        self.current.get()
    }

    pub(crate) fn record_frame(&self) {
        if self.enabled.get() {
            self.frames_this_window
                .set(self.frames_this_window.get().saturating_add(1));
        }
    }

    /// Enables, re-arms, or disables sampling. Returns the resulting state.
    pub(crate) fn toggle(self: &Rc<Self>, explicit: Option<bool>) -> Result<bool> {
        let enable = explicit.unwrap_or(!self.enabled.get());

        if enable {
            self.enable()?;
        } else {
            self.disable();
        }

        Ok(enable)
    }

    fn enable(self: &Rc<Self>) -> Result<()> {
        let weak: Weak<Self> = Rc::downgrade(self);

        {
            let mut timer = self.timer.borrow_mut();
            let Some(timer) = timer.as_mut() else {
                return Err(Error::OptionType(
                    "measuring FPS requires an interval timer (SchedulerOptions::fps_timer)"
                        .to_string(),
                ));
            };

            if let Some(id) = self.interval.take() {
                timer.clear_interval(id);
            }

            let id = timer.set_interval(
                FPS_WINDOW,
                Box::new(move || {
                    if let Some(sampler) = weak.upgrade() {
                        sampler.close_window();
                    }
                }),
            );
            self.interval.set(Some(id));
        }

        self.enabled.set(true);
        self.frames_this_window.set(0);
        self.report(Some(0.0));

        log::debug!("fps sampling enabled");
        Ok(())
    }

    fn disable(&self) {
        if let Some(id) = self.interval.take() {
            if let Some(timer) = self.timer.borrow_mut().as_mut() {
                timer.clear_interval(id);
            }
        }

        self.enabled.set(false);
        self.frames_this_window.set(0);
        self.report(None);

        log::debug!("fps sampling disabled");
    }

    fn close_window(&self) {
        if !self.enabled.get() {
            return;
        }

        let tally = self.frames_this_window.replace(0);
        self.report(Some(f64::from(tally)));
    }

    fn report(&self, fps: Option<f64>) {
        self.current.set(fps);

        // A hook that toggles sampling from inside itself would re-enter here.
        match self.on_change.try_borrow_mut() {
            Ok(mut hook) => {
                if let Some(hook) = hook.as_mut() {
                    hook(fps);
                }
            }
            Err(_) => log::warn!("fps hook re-entered; sample {fps:?} not reported"),
        }
    }
}

impl Drop for FpsSampler {
    fn drop(&mut self) {
        if let Some(id) = self.interval.take() {
            if let Some(timer) = self.timer.get_mut().as_mut() {
                timer.clear_interval(id);
            }
        }
    }
}
