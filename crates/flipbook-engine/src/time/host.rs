use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Callback handed to a frame pump; receives the absolute frame time in
/// milliseconds since an arbitrary fixed origin.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Callback driven by an [`IntervalTimer`].
pub type IntervalCallback = Box<dyn FnMut()>;

/// Host facility that delivers one callback per display refresh.
///
/// Implementations must defer the callback: invoking it from inside
/// `request_frame` re-enters the scheduler and is treated as a fault.
pub trait FramePump {
    fn request_frame(&mut self, callback: FrameCallback);
}

impl<F> FramePump for F
where
    F: FnMut(FrameCallback),
{
    fn request_frame(&mut self, callback: FrameCallback) {
        self(callback)
    }
}

/// Identifies a running interval so it can be cleared.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct IntervalId(u64);

/// Wall-clock periodic timer, independent of frame delivery.
pub trait IntervalTimer {
    fn set_interval(&mut self, period: Duration, callback: IntervalCallback) -> IntervalId;
    fn clear_interval(&mut self, id: IntervalId);
}

struct Interval {
    id: IntervalId,
    period_ms: f64,
    next_due: f64,
    // `None` while the callback is running.
    callback: Option<IntervalCallback>,
}

#[derive(Default)]
struct HostState {
    now: f64,
    next_id: u64,
    frames: Vec<FrameCallback>,
    intervals: Vec<Interval>,
}

/// Deterministic single-threaded host.
///
/// Time only moves when the owner calls [`ManualHost::advance_to`]. Clones
/// share the same queues, so one clone can be injected as the frame pump,
/// another as the interval timer, and a third kept by the driver.
#[derive(Clone, Default)]
pub struct ManualHost {
    state: Rc<RefCell<HostState>>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current host time in milliseconds.
    pub fn now(&self) -> f64 {
        self.state.borrow().now
    }

    /// Number of frame callbacks waiting for the next advance.
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    /// Number of live intervals.
    pub fn active_intervals(&self) -> usize {
        self.state.borrow().intervals.len()
    }

    /// Moves host time to `now_ms`, fires due intervals, then delivers one
    /// frame to every callback queued before this call.
    ///
    /// Time never moves backwards; an earlier `now_ms` is delivered as the
    /// current time. Non-finite times are ignored.
    pub fn advance_to(&self, now_ms: f64) {
        if !now_ms.is_finite() {
            log::warn!("ignoring non-finite host time {now_ms}");
            return;
        }

        let now = {
            let mut state = self.state.borrow_mut();
            state.now = state.now.max(now_ms);
            state.now
        };

        self.fire_intervals(now);

        let frames = std::mem::take(&mut self.state.borrow_mut().frames);
        for callback in frames {
            callback(now);
        }
    }

    /// Advances by `delta_ms` from the current host time.
    pub fn advance_by(&self, delta_ms: f64) {
        let now = self.now();
        self.advance_to(now + delta_ms);
    }

    fn fire_intervals(&self, now: f64) {
        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .intervals
                    .iter_mut()
                    .filter(|i| i.callback.is_some() && i.next_due <= now)
                    .min_by(|a, b| a.next_due.total_cmp(&b.next_due));

                match next {
                    Some(interval) => {
                        interval.next_due += interval.period_ms;
                        interval.callback.take().map(|cb| (interval.id, cb))
                    }
                    None => None,
                }
            };

            let Some((id, mut callback)) = due else {
                break;
            };

            callback();

            // The callback may have cleared its own interval.
            let mut state = self.state.borrow_mut();
            if let Some(interval) = state.intervals.iter_mut().find(|i| i.id == id) {
                interval.callback = Some(callback);
            }
        }
    }
}

impl FramePump for ManualHost {
    fn request_frame(&mut self, callback: FrameCallback) {
        self.state.borrow_mut().frames.push(callback);
    }
}

impl IntervalTimer for ManualHost {
    fn set_interval(&mut self, period: Duration, callback: IntervalCallback) -> IntervalId {
        let mut state = self.state.borrow_mut();
        let id = IntervalId(state.next_id);
        state.next_id += 1;

        let period_ms = (period.as_secs_f64() * 1000.0).max(1.0);
        let next_due = state.now + period_ms;
        state.intervals.push(Interval {
            id,
            period_ms,
            next_due,
            callback: Some(callback),
        });

        id
    }

    fn clear_interval(&mut self, id: IntervalId) {
        self.state.borrow_mut().intervals.retain(|i| i.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn frame_callbacks_receive_host_time() {
        let mut host = ManualHost::new();
        let seen = Rc::new(Cell::new(0.0));

        let s = seen.clone();
        host.request_frame(Box::new(move |t| s.set(t)));
        host.advance_to(16.0);

        assert_eq!(seen.get(), 16.0);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn frames_requested_during_delivery_wait_for_next_advance() {
        let host = ManualHost::new();
        let count = Rc::new(Cell::new(0));

        let mut pump = host.clone();
        let inner_pump = host.clone();
        let c = count.clone();
        pump.request_frame(Box::new(move |_| {
            c.set(c.get() + 1);
            let mut p = inner_pump;
            p.request_frame(Box::new(|_| {}));
        }));

        host.advance_to(16.0);
        assert_eq!(count.get(), 1);
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn time_does_not_move_backwards() {
        let host = ManualHost::new();
        host.advance_to(50.0);
        host.advance_to(20.0);
        assert_eq!(host.now(), 50.0);
    }

    #[test]
    fn non_finite_time_is_ignored() {
        let mut host = ManualHost::new();
        let fired = Rc::new(Cell::new(0));
        let frames = Rc::new(Cell::new(0));

        let f = fired.clone();
        host.set_interval(Duration::from_millis(1000), Box::new(move || f.set(f.get() + 1)));
        let c = frames.clone();
        host.request_frame(Box::new(move |_| c.set(c.get() + 1)));

        host.advance_to(f64::INFINITY);
        host.advance_to(f64::NAN);
        assert_eq!(host.now(), 0.0);
        assert_eq!(fired.get(), 0);
        assert_eq!(frames.get(), 0);

        host.advance_to(1000.0);
        assert_eq!(fired.get(), 1);
        assert_eq!(frames.get(), 1);
    }

    // ── intervals ─────────────────────────────────────────────────────────

    #[test]
    fn interval_fires_once_per_period_even_on_long_jumps() {
        let mut host = ManualHost::new();
        let fired = Rc::new(Cell::new(0));

        let f = fired.clone();
        host.set_interval(Duration::from_millis(1000), Box::new(move || f.set(f.get() + 1)));

        host.advance_to(999.0);
        assert_eq!(fired.get(), 0);

        host.advance_to(1000.0);
        assert_eq!(fired.get(), 1);

        host.advance_to(3500.0);
        assert_eq!(fired.get(), 3);
    }

    #[test]
    fn cleared_interval_stops_firing() {
        let mut host = ManualHost::new();
        let fired = Rc::new(Cell::new(0));

        let f = fired.clone();
        let id = host.set_interval(Duration::from_millis(100), Box::new(move || f.set(f.get() + 1)));
        host.advance_to(100.0);
        host.clear_interval(id);
        host.advance_to(500.0);

        assert_eq!(fired.get(), 1);
        assert_eq!(host.active_intervals(), 0);
    }

    #[test]
    fn interval_can_clear_itself() {
        let host = ManualHost::new();
        let fired = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<IntervalId>>> = Rc::new(Cell::new(None));

        let mut timer = host.clone();
        let inner_timer = host.clone();
        let f = fired.clone();
        let slot = id_slot.clone();
        let id = timer.set_interval(
            Duration::from_millis(10),
            Box::new(move || {
                f.set(f.get() + 1);
                if let Some(id) = slot.get() {
                    let mut t = inner_timer.clone();
                    t.clear_interval(id);
                }
            }),
        );
        id_slot.set(Some(id));

        host.advance_to(100.0);
        assert_eq!(fired.get(), 1);
        assert_eq!(host.active_intervals(), 0);
    }
}
