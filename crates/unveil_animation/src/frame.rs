//! Host-driven frame queue
//!
//! Replaces recursive `setTimeout` / `requestAnimationFrame` chains with an
//! explicit queue the host drains once per frame. Nothing here runs on its
//! own: the host calls [`FrameQueue::advance`] with the current time and acts
//! on the payloads it gets back.
//!
//! - Timeouts fire on the first `advance` at or after their due time, ordered
//!   by due time, then by scheduling order.
//! - Frame requests fire on the next `advance`, after any due timeouts.
//!   Requests made while handling that batch wait for the following one.
//!
//! ```rust
//! use unveil_animation::FrameQueue;
//!
//! let mut queue = FrameQueue::new();
//! queue.set_timeout(0.0, 100.0, "reveal");
//! queue.request_frame("count");
//!
//! assert_eq!(queue.advance(16.0), vec!["count"]);
//! assert_eq!(queue.advance(100.0), vec!["reveal"]);
//! assert!(queue.is_idle());
//! ```

use slotmap::{new_key_type, SlotMap};
use tracing::trace;

new_key_type! {
    /// Handle to a pending timeout
    pub struct TimerId;
    /// Handle to a pending frame request
    pub struct FrameId;
}

struct Timer<T> {
    due_ms: f64,
    seq: u64,
    payload: T,
}

struct FrameRequest<T> {
    seq: u64,
    payload: T,
}

/// Pending timeouts and frame requests, keyed by handle
pub struct FrameQueue<T> {
    timers: SlotMap<TimerId, Timer<T>>,
    frames: SlotMap<FrameId, FrameRequest<T>>,
    next_seq: u64,
}

impl<T> FrameQueue<T> {
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            frames: SlotMap::with_key(),
            next_seq: 0,
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Schedule `payload` to fire `delay_ms` after `now_ms`
    pub fn set_timeout(&mut self, now_ms: f64, delay_ms: f64, payload: T) -> TimerId {
        let seq = self.bump_seq();
        self.timers.insert(Timer {
            due_ms: now_ms + delay_ms.max(0.0),
            seq,
            payload,
        })
    }

    /// Schedule `payload` for the next frame
    pub fn request_frame(&mut self, payload: T) -> FrameId {
        let seq = self.bump_seq();
        self.frames.insert(FrameRequest { seq, payload })
    }

    pub fn cancel_timeout(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(id).map(|timer| timer.payload)
    }

    pub fn cancel_frame(&mut self, id: FrameId) -> Option<T> {
        self.frames.remove(id).map(|frame| frame.payload)
    }

    /// Remove and return everything due at `now_ms`
    pub fn advance(&mut self, now_ms: f64) -> Vec<T> {
        let mut due: Vec<(TimerId, f64, u64)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due_ms <= now_ms)
            .map(|(id, timer)| (id, timer.due_ms, timer.seq))
            .collect();
        due.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)));

        let mut payloads: Vec<T> = due
            .into_iter()
            .filter_map(|(id, _, _)| self.timers.remove(id))
            .map(|timer| timer.payload)
            .collect();

        let mut frames: Vec<FrameRequest<T>> = self.frames.drain().map(|(_, f)| f).collect();
        frames.sort_by_key(|frame| frame.seq);
        payloads.extend(frames.into_iter().map(|frame| frame.payload));

        if !payloads.is_empty() {
            trace!(
                "frame queue: {} due at {:.1}ms, {} timers left",
                payloads.len(),
                now_ms,
                self.timers.len()
            );
        }
        payloads
    }

    /// True when nothing is scheduled
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.frames.is_empty()
    }

    /// Earliest pending timeout
    pub fn next_deadline(&self) -> Option<f64> {
        self.timers
            .values()
            .map(|timer| timer.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn pending_timeouts(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }
}

impl<T> Default for FrameQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_wait_for_due_time() {
        let mut queue = FrameQueue::new();
        queue.set_timeout(0.0, 100.0, 1);

        assert!(queue.advance(99.9).is_empty());
        assert_eq!(queue.advance(100.0), vec![1]);
        assert!(queue.advance(500.0).is_empty());
    }

    #[test]
    fn test_timeouts_ordered_by_due_then_insertion() {
        let mut queue = FrameQueue::new();
        queue.set_timeout(0.0, 300.0, "c");
        queue.set_timeout(0.0, 150.0, "b1");
        queue.set_timeout(0.0, 0.0, "a");
        queue.set_timeout(0.0, 150.0, "b2");

        assert_eq!(queue.advance(1000.0), vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn test_frames_follow_timeouts() {
        let mut queue = FrameQueue::new();
        queue.request_frame("frame");
        queue.set_timeout(0.0, 0.0, "timeout");

        assert_eq!(queue.advance(0.0), vec!["timeout", "frame"]);
    }

    #[test]
    fn test_frame_requested_during_batch_waits() {
        let mut queue = FrameQueue::new();
        queue.request_frame(0);

        let batch = queue.advance(16.0);
        assert_eq!(batch, vec![0]);
        // Handler reschedules
        queue.request_frame(1);

        assert_eq!(queue.advance(32.0), vec![1]);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_cancel() {
        let mut queue = FrameQueue::new();
        let timer = queue.set_timeout(0.0, 10.0, "t");
        let frame = queue.request_frame("f");

        assert_eq!(queue.cancel_timeout(timer), Some("t"));
        assert_eq!(queue.cancel_frame(frame), Some("f"));
        assert_eq!(queue.cancel_frame(frame), None);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_next_deadline() {
        let mut queue: FrameQueue<()> = FrameQueue::new();
        assert_eq!(queue.next_deadline(), None);

        queue.set_timeout(50.0, 100.0, ());
        queue.set_timeout(0.0, 80.0, ());
        assert_eq!(queue.next_deadline(), Some(80.0));
        assert_eq!(queue.pending_timeouts(), 2);
        assert_eq!(queue.pending_frames(), 0);
    }

    #[test]
    fn test_negative_delay_fires_immediately() {
        let mut queue = FrameQueue::new();
        queue.set_timeout(10.0, -5.0, ());
        assert_eq!(queue.advance(10.0).len(), 1);
    }
}
