//! Pending delayed sends, ordered by due instant.

use crate::actor::system::Address;
use crate::core::ActorId;
use std::collections::BTreeMap;
use tokio::time::Instant;

/// A delayed send waiting for its due instant.
#[derive(Clone, Debug)]
pub(crate) struct Timer<E> {
    /// The actor whose action scheduled it. Stopping it cancels the timer.
    pub origin: ActorId,
    pub to: Address,
    pub event: E,
}

/// Timers keyed by `(due, sequence)`: equal deadlines fire in scheduling
/// order.
#[derive(Debug)]
pub(crate) struct TimerQueue<E> {
    timers: BTreeMap<(Instant, u64), Timer<E>>,
    sequence: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            sequence: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn schedule(&mut self, due: Instant, timer: Timer<E>) {
        self.sequence += 1;
        self.timers.insert((due, self.sequence), timer);
    }

    /// Remove and return the earliest timer due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Timer<E>> {
        let key = *self.timers.keys().next()?;
        if key.0 > now {
            return None;
        }
        self.timers.remove(&key)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.timers.keys().next().map(|(due, _)| *due)
    }

    /// Drop every timer scheduled by `origin`.
    pub fn cancel_from(&mut self, origin: ActorId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| timer.origin != origin);
        before - self.timers.len()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn timer(origin: ActorId, event: &'static str) -> Timer<&'static str> {
        Timer {
            origin,
            to: Address::Actor(origin),
            event,
        }
    }

    #[test]
    fn fires_in_due_then_scheduling_order() {
        let now = Instant::now();
        let origin = ActorId::new();
        let mut queue = TimerQueue::default();
        queue.schedule(now + Duration::from_millis(20), timer(origin, "late"));
        queue.schedule(now + Duration::from_millis(10), timer(origin, "first"));
        queue.schedule(now + Duration::from_millis(10), timer(origin, "second"));

        let later = now + Duration::from_millis(30);
        let fired: Vec<_> = std::iter::from_fn(|| queue.pop_due(later))
            .map(|t| t.event)
            .collect();

        assert_eq!(fired, vec!["first", "second", "late"]);
    }

    #[test]
    fn nothing_fires_early() {
        let now = Instant::now();
        let mut queue = TimerQueue::default();
        queue.schedule(now + Duration::from_millis(300), timer(ActorId::new(), "turn"));

        assert!(queue.pop_due(now).is_none());
        assert_eq!(queue.next_due(), Some(now + Duration::from_millis(300)));
    }

    #[test]
    fn cancel_only_touches_the_origin() {
        let now = Instant::now();
        let (a, b) = (ActorId::new(), ActorId::new());
        let mut queue = TimerQueue::default();
        queue.schedule(now, timer(a, "a1"));
        queue.schedule(now, timer(b, "b1"));
        queue.schedule(now, timer(a, "a2"));

        assert_eq!(queue.cancel_from(a), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_due(now).map(|t| t.event), Some("b1"));
    }
}
