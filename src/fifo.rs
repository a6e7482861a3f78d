//! Lossy single-producer / single-consumer order queue
//!
//! A fixed ring of `AtomicU64` slots, each holding one packed [`DspOrder`].
//! Pushing never fails: when the ring is full the oldest unread entry is
//! dropped. The consumer drains everything and keeps only the newest value.
//!
//! Both the consumer and a producer dropping the oldest entry advance the read
//! cursor with `compare_exchange`, so a slot is only accepted by the consumer
//! if the cursor still pointed at it after the load. Slots are single words,
//! so a value read can never be torn.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::order::DspOrder;

/// Smallest ring that can hold a value while another is being written
pub const MIN_CAPACITY: usize = 2;

/// Bounded, lock-free, lossy order queue
#[derive(Debug)]
pub struct OrderFifo {
    slots: Box<[AtomicU64]>,
    /// Total entries consumed or dropped (wrapping)
    read: AtomicUsize,
    /// Total entries pushed (wrapping)
    write: AtomicUsize,
}

impl OrderFifo {
    /// Allocate the ring; the only allocation this type ever makes
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        let sentinel = DspOrder::sentinel().to_bits();
        let slots = (0..capacity).map(|_| AtomicU64::new(sentinel)).collect();
        Self {
            slots,
            read: AtomicUsize::new(0),
            write: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Entries waiting to be drained
    pub fn len(&self) -> usize {
        let w = self.write.load(Ordering::Acquire);
        let r = self.read.load(Ordering::Acquire);
        w.wrapping_sub(r).min(self.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Producer side. Drops the oldest unread entry when full.
    pub fn push(&self, order: DspOrder) {
        let capacity = self.capacity();
        let w = self.write.load(Ordering::Relaxed);

        let r = self.read.load(Ordering::Acquire);
        if w.wrapping_sub(r) >= capacity {
            // The consumer may have advanced in the meantime; either way the
            // slot at `w` is free afterwards
            let _ = self.read.compare_exchange(
                r,
                r.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }

        self.slots[w % capacity].store(order.to_bits(), Ordering::Release);
        self.write.store(w.wrapping_add(1), Ordering::Release);
    }

    /// Consumer side. Drains the ring and returns the newest entry, if any.
    pub fn drain_latest(&self) -> Option<DspOrder> {
        let capacity = self.capacity();
        let mut latest = None;

        loop {
            let r = self.read.load(Ordering::Acquire);
            let w = self.write.load(Ordering::Acquire);
            if r == w {
                break;
            }

            let bits = self.slots[r % capacity].load(Ordering::Acquire);
            if self
                .read
                .compare_exchange(r, r.wrapping_add(1), Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                latest = Some(bits);
            }
        }

        latest.map(DspOrder::from_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::DspOption;
    use std::sync::Arc;
    use std::thread;

    fn rotated(by: usize) -> DspOrder {
        let mut slots = DspOption::ALL;
        slots.rotate_left(by % DspOption::COUNT);
        DspOrder::new(slots)
    }

    #[test]
    fn test_empty_drain_is_none() {
        let fifo = OrderFifo::new(4);
        assert!(fifo.is_empty());
        assert_eq!(fifo.drain_latest(), None);
    }

    #[test]
    fn test_drain_returns_latest_only() {
        let fifo = OrderFifo::new(8);
        for i in 0..3 {
            fifo.push(rotated(i));
        }
        assert_eq!(fifo.len(), 3);
        assert_eq!(fifo.drain_latest(), Some(rotated(2)));
        assert_eq!(fifo.drain_latest(), None);
    }

    #[test]
    fn test_overflow_drops_oldest_and_keeps_newest() {
        let fifo = OrderFifo::new(2);
        for i in 0..7 {
            fifo.push(rotated(i));
        }
        assert_eq!(fifo.len(), 2);
        assert_eq!(fifo.drain_latest(), Some(rotated(6)));
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_capacity_floor() {
        assert_eq!(OrderFifo::new(0).capacity(), MIN_CAPACITY);
    }

    #[test]
    fn test_concurrent_producer_last_value_wins() {
        let fifo = Arc::new(OrderFifo::new(3));
        let producer = {
            let fifo = Arc::clone(&fifo);
            thread::spawn(move || {
                for i in 0..10_000 {
                    fifo.push(rotated(i));
                }
            })
        };

        let mut seen = 0;
        while !producer.is_finished() {
            if let Some(order) = fifo.drain_latest() {
                assert!(order.is_permutation());
                seen += 1;
            }
        }
        producer.join().unwrap();

        if let Some(order) = fifo.drain_latest() {
            assert_eq!(order, rotated(9_999));
            seen += 1;
        }
        assert!(seen > 0);
    }
}
