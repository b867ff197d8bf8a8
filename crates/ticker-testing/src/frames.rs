use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use ticker_core::{FrameCallback, FrameRequestId, FrameScheduler};

struct FrameEntry {
    id: FrameRequestId,
    callback: FrameCallback,
}

/// Frame source whose frames are delivered by calling [`fire_frame`](Self::fire_frame).
#[derive(Default)]
pub struct ManualFrameScheduler {
    queue: RefCell<VecDeque<FrameEntry>>,
    next_id: Cell<FrameRequestId>,
    frames_fired: Cell<u64>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers one frame to every callback requested before this call, in
    /// request order. Requests made while the frame is delivered wait for the
    /// next frame. Returns how many callbacks ran.
    ///
    /// A request cancelled by an earlier callback in the same frame does not
    /// run. If a callback panics, the requests after it stay queued.
    pub fn fire_frame(&self, time_ms: Option<f64>) -> usize {
        self.frames_fired.set(self.frames_fired.get() + 1);
        let Some(last_id) = self.queue.borrow().back().map(|entry| entry.id) else {
            return 0;
        };
        let mut count = 0;
        while let Some(entry) = self.pop_up_to(last_id) {
            (entry.callback)(time_ms);
            count += 1;
        }
        count
    }

    fn pop_up_to(&self, last_id: FrameRequestId) -> Option<FrameEntry> {
        let mut queue = self.queue.borrow_mut();
        if queue.front().is_some_and(|entry| entry.id <= last_id) {
            queue.pop_front()
        } else {
            None
        }
    }

    /// Number of frame requests waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_pending(&self, id: FrameRequestId) -> bool {
        self.queue.borrow().iter().any(|entry| entry.id == id)
    }

    pub fn frames_fired(&self) -> u64 {
        self.frames_fired.get()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn schedule_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.queue
            .borrow_mut()
            .push_back(FrameEntry { id, callback });
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        let mut queue = self.queue.borrow_mut();
        if let Some(index) = queue.iter().position(|entry| entry.id == id) {
            queue.remove(index);
        }
    }
}

impl fmt::Debug for ManualFrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrameScheduler")
            .field("pending", &self.pending())
            .field("frames_fired", &self.frames_fired.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/frames_tests.rs"]
mod tests;
