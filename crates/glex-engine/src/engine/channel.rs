use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::input::PointerEvent;

/// Last-write-wins slot with a dirty flag.
///
/// Any thread may `publish`; only the render side `take`s. The flag is set and
/// cleared under the value lock, so a value published mid-frame is picked up
/// by the next `take` and never applied twice.
#[derive(Debug, Default)]
pub(crate) struct Slot<T> {
    value: Mutex<T>,
    dirty: AtomicBool,
}

impl<T: Clone> Slot<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            dirty: AtomicBool::new(false),
        }
    }

    /// Replaces the value and marks it dirty.
    pub fn publish(&self, value: T) {
        let mut v = self.value.lock();
        *v = value;
        self.dirty.store(true, Ordering::Release);
    }

    /// Edits the value in place; marks dirty only if `edit` returns true.
    pub fn update(&self, edit: impl FnOnce(&mut T) -> bool) -> bool {
        let mut v = self.value.lock();
        let changed = edit(&mut v);
        if changed {
            self.dirty.store(true, Ordering::Release);
        }
        changed
    }

    /// Returns the value if dirty, clearing the flag.
    pub fn take(&self) -> Option<T> {
        if !self.dirty.load(Ordering::Acquire) {
            return None;
        }
        let v = self.value.lock();
        self.dirty.store(false, Ordering::Release);
        Some(v.clone())
    }

    /// Returns the value regardless of the flag, clearing it.
    pub fn take_current(&self) -> T {
        let v = self.value.lock();
        self.dirty.store(false, Ordering::Release);
        v.clone()
    }

    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn clear_dirty(&self) {
        let _v = self.value.lock();
        self.dirty.store(false, Ordering::Release);
    }
}

/// Latest pointer sample, stamped with a strictly increasing sequence number.
///
/// Superseded samples are dropped; the reader applies a sample only if its
/// sequence is newer than the last one it applied.
#[derive(Debug, Default)]
pub(crate) struct PointerChannel {
    next_seq: AtomicU64,
    latest: Mutex<Option<PointerEvent>>,
}

impl PointerChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps and stores a sample; returns its sequence number.
    pub fn publish(&self, mut event: PointerEvent) -> u64 {
        let mut latest = self.latest.lock();
        // Stamped under the lock so stored samples are always the newest.
        event.seq = self.next_seq.fetch_add(1, Ordering::AcqRel) + 1;
        *latest = Some(event);
        event.seq
    }

    /// The stored sample if it is newer than `applied`.
    pub fn newer_than(&self, applied: u64) -> Option<PointerEvent> {
        self.latest.lock().filter(|e| e.seq > applied)
    }

    /// Sequence number of the most recent sample (0 if none).
    pub fn last_seq(&self) -> u64 {
        self.next_seq.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        *self.latest.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerAction;

    fn sample(x: f32) -> PointerEvent {
        PointerEvent {
            x,
            y: 0.0,
            action: PointerAction::Move,
            pointer_id: 0,
            seq: 0,
        }
    }

    // ── Slot ──────────────────────────────────────────────────────────────

    #[test]
    fn take_returns_value_once() {
        let slot = Slot::new(0);
        assert_eq!(slot.take(), None);
        slot.publish(3);
        assert_eq!(slot.take(), Some(3));
        assert_eq!(slot.take(), None);
        assert_eq!(slot.get(), 3);
    }

    #[test]
    fn last_write_wins() {
        let slot = Slot::new(String::new());
        slot.publish("a".into());
        slot.publish("b".into());
        assert_eq!(slot.take().as_deref(), Some("b"));
    }

    #[test]
    fn update_marks_dirty_only_on_change() {
        let slot = Slot::new(vec![1]);
        assert!(!slot.update(|_| false));
        assert!(!slot.is_dirty());
        assert!(slot.update(|v| {
            v.push(2);
            true
        }));
        assert_eq!(slot.take(), Some(vec![1, 2]));
    }

    #[test]
    fn take_current_clears_flag() {
        let slot = Slot::new(1);
        slot.publish(2);
        assert_eq!(slot.take_current(), 2);
        assert!(!slot.is_dirty());
        assert_eq!(slot.take_current(), 2);
    }

    // ── PointerChannel ────────────────────────────────────────────────────

    #[test]
    fn sequence_is_strictly_increasing() {
        let ch = PointerChannel::new();
        let a = ch.publish(sample(1.0));
        let b = ch.publish(sample(2.0));
        assert!(b > a);
        assert_eq!(ch.last_seq(), b);
    }

    #[test]
    fn sample_applied_at_most_once() {
        let ch = PointerChannel::new();
        ch.publish(sample(1.0));
        let e = ch.newer_than(0).unwrap();
        assert_eq!(e.x, 1.0);
        assert!(ch.newer_than(e.seq).is_none());
    }

    #[test]
    fn superseded_samples_are_skipped() {
        let ch = PointerChannel::new();
        ch.publish(sample(1.0));
        ch.publish(sample(2.0));
        let e = ch.newer_than(0).unwrap();
        assert_eq!(e.x, 2.0);
        assert_eq!(e.seq, 2);
    }
}
