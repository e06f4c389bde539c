//! Cancelable deferred actions on simulated time.
//!
//! Owners keep a `DeferredQueue` of plain action values and advance it from
//! their own `update`. Dropping or clearing the queue cancels everything in
//! it, so nothing can fire into an owner that has been destroyed.

/// Handle to a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<A> {
    id: TaskId,
    due_at: f64,
    action: A,
}

#[derive(Debug)]
pub struct DeferredQueue<A> {
    now: f64,
    next_id: u64,
    pending: Vec<Pending<A>>,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> DeferredQueue<A> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Schedule `action` to become due `delay_ms` from now. A zero delay
    /// becomes due on the next `advance`, never immediately.
    pub fn schedule(&mut self, delay_ms: f64, action: A) -> TaskId {
        let delay = if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 };
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due_at: self.now + delay,
            action,
        });
        id
    }

    /// Cancel one action. Returns false if it already fired or was canceled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance simulated time and return every action now due, earliest
    /// first, ties in scheduling order.
    pub fn advance(&mut self, delta_ms: f64) -> Vec<A> {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.now += delta_ms;
        }
        let now = self.now;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_at <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|p| p.action).collect()
    }
}
