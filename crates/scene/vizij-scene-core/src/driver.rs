//! Frame driver: the {Stopped, Running} loop around the host's frame clock.
//!
//! The driver never calls the advance step itself. The host's
//! [`FrameScheduler`] delivers a callback for every requested frame, and the
//! host forwards it to [`SceneView::tick`](crate::scene::SceneView::tick),
//! which brackets the step with [`FrameDriver::begin_step`] and
//! [`FrameDriver::end_step`]. Keeping scheduling behind a trait lets tests
//! drive frames by hand with synthetic timestamps.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Opaque id of one requested frame callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u32);

/// Host capability that delivers one callback per requested frame
/// (e.g. `requestAnimationFrame`).
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    #[default]
    Stopped,
    Running,
}

#[derive(Debug, Default)]
pub struct FrameDriver {
    state: DriverState,
    pending: Option<FrameHandle>,
    last_timestamp: Option<f64>,
    frames: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    #[inline]
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Number of steps taken while running. Counted whether or not an
    /// artboard was loaded to advance.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start running. The first frame is requested only if none is pending,
    /// and the next step advances by zero.
    pub fn enable(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.state == DriverState::Stopped {
            self.last_timestamp = None;
        }
        self.state = DriverState::Running;
        if self.pending.is_none() {
            self.pending = Some(scheduler.request_frame());
        }
    }

    /// Stop running and cancel the pending frame, if any.
    pub fn disable(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.state = DriverState::Stopped;
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// Cancel the pending frame without stopping. Used before stepping out of
    /// band so the next `end_step` leaves a single frame in flight.
    pub fn cancel_pending(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// Consume the delivered frame and compute the elapsed time in seconds.
    ///
    /// Returns `None` while stopped: a callback that slipped past a cancel
    /// must not advance anything. The first step after enabling only records
    /// the baseline and yields zero.
    pub fn begin_step(&mut self, timestamp_ms: f64) -> Option<f32> {
        self.pending = None;
        if self.state == DriverState::Stopped {
            return None;
        }
        let elapsed = match self.last_timestamp {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);
        self.frames = self.frames.wrapping_add(1);
        Some(elapsed)
    }

    /// Request the next frame if still running.
    pub fn end_step(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.state == DriverState::Running && self.pending.is_none() {
            self.pending = Some(scheduler.request_frame());
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    next: u32,
    pending: Vec<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

/// Scheduler for headless hosts and tests: frames are requested into a
/// queue and delivered by whoever owns a clone.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not yet cancelled or delivered.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn requested(&self) -> usize {
        self.state.borrow().requested
    }

    pub fn cancelled(&self) -> usize {
        self.state.borrow().cancelled
    }

    /// Pop the oldest pending frame, as the host would when its clock fires.
    pub fn deliver(&self) -> Option<FrameHandle> {
        let mut st = self.state.borrow_mut();
        if st.pending.is_empty() {
            None
        } else {
            Some(st.pending.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut st = self.state.borrow_mut();
        st.next = st.next.wrapping_add(1);
        let handle = FrameHandle(st.next);
        st.pending.push(handle);
        st.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut st = self.state.borrow_mut();
        let before = st.pending.len();
        st.pending.retain(|h| *h != handle);
        if st.pending.len() != before {
            st.cancelled += 1;
        }
    }
}
