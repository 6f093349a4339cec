#![forbid(unsafe_code)]

//! Ingress queue: unbounded FIFO of display requests.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use danmaku_core::Rgba;

/// Identifier assigned to a request at submission. Strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A producer's request to show one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRequest {
    text: String,
    color: Rgba,
}

impl DisplayRequest {
    /// Create a request.
    pub fn new(text: impl Into<String>, color: Rgba) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    /// Message text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Message color.
    #[inline]
    pub fn color(&self) -> Rgba {
        self.color
    }
}

/// A request waiting in the queue.
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    id: RequestId,
    request: DisplayRequest,
    submitted_at: Duration,
}

impl QueuedRequest {
    /// Submission identifier.
    #[inline]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The request itself.
    #[inline]
    pub fn request(&self) -> &DisplayRequest {
        &self.request
    }

    /// Scheduler clock time at submission.
    #[inline]
    pub fn submitted_at(&self) -> Duration {
        self.submitted_at
    }
}

/// Unbounded FIFO. Never rejects, never reorders.
#[derive(Debug, Default)]
pub struct IngressQueue {
    items: VecDeque<QueuedRequest>,
    next_id: u64,
    high_water: usize,
}

impl IngressQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request to the tail. O(1) amortized.
    pub fn push(&mut self, request: DisplayRequest, now: Duration) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.items.push_back(QueuedRequest {
            id,
            request,
            submitted_at: now,
        });
        self.high_water = self.high_water.max(self.items.len());
        id
    }

    /// The head request, left in place.
    #[inline]
    pub fn peek(&self) -> Option<&QueuedRequest> {
        self.items.front()
    }

    /// Remove and return the head request.
    #[inline]
    pub fn pop(&mut self) -> Option<QueuedRequest> {
        self.items.pop_front()
    }

    /// Requests waiting.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Largest length the queue has reached.
    #[inline]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Waiting requests, head first.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedRequest> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_and_ids() {
        let mut q = IngressQueue::new();
        let a = q.push(DisplayRequest::new("a", Rgba::WHITE), Duration::ZERO);
        let b = q.push(DisplayRequest::new("b", Rgba::WHITE), Duration::from_millis(3));
        assert!(a < b);
        assert_eq!(q.peek().map(|r| r.id()), Some(a));
        assert_eq!(q.len(), 2);
        let head = q.pop().unwrap();
        assert_eq!(head.request().text(), "a");
        let next = q.pop().unwrap();
        assert_eq!(next.submitted_at(), Duration::from_millis(3));
        assert!(q.is_empty());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut q = IngressQueue::new();
        q.push(DisplayRequest::new("x", Rgba::BLACK), Duration::ZERO);
        assert!(q.peek().is_some());
        assert!(q.peek().is_some());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn high_water_tracks_peak() {
        let mut q = IngressQueue::new();
        for _ in 0..5 {
            q.push(DisplayRequest::new("m", Rgba::WHITE), Duration::ZERO);
        }
        q.pop();
        q.pop();
        assert_eq!(q.high_water(), 5);
        assert_eq!(q.iter().count(), 3);
    }

    #[test]
    fn request_id_display() {
        assert_eq!(RequestId(7).to_string(), "#7");
    }
}
