use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::error::{Error, Result};
use crate::image::ImageDimensions;

pub type LoadOutcome = Result<ImageDimensions, Error>;

#[derive(Default)]
struct Slot {
    outcome: Option<LoadOutcome>,
    wakers: Vec<Waker>,
}

/// Shared, settle-once view of a sprite's image load.
///
/// Every clone observes the same outcome: the decoded dimensions, an
/// [`Error::ImageDecode`], or an [`Error::SpriteCancelLoad`]. Dropping a
/// handle never affects the load.
#[derive(Clone, Default)]
pub struct LoadHandle {
    slot: Rc<RefCell<Slot>>,
}

impl LoadHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records the outcome and wakes awaiters. Later settles are ignored;
    /// returns whether this call settled the handle.
    pub(crate) fn settle(&self, outcome: LoadOutcome) -> bool {
        let wakers = {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_some() {
                return false;
            }
            slot.outcome = Some(outcome);
            std::mem::take(&mut slot.wakers)
        };

        for waker in wakers {
            waker.wake();
        }
        true
    }

    pub fn is_settled(&self) -> bool {
        self.slot.borrow().outcome.is_some()
    }

    /// The outcome, if already settled.
    pub fn outcome(&self) -> Option<LoadOutcome> {
        self.slot.borrow().outcome.clone()
    }

    /// True when both handles observe the same load.
    pub fn same_load(&self, other: &LoadHandle) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Future for LoadHandle {
    type Output = LoadOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();

        if let Some(outcome) = &slot.outcome {
            return Poll::Ready(outcome.clone());
        }

        if !slot.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            slot.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
