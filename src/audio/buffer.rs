//! Lock-free ring buffer for playback samples
//!
//! Single-producer single-consumer. The producer half ([`RingWriter`]) owns
//! the write cursor and a flush marker; the consumer half ([`RingReader`])
//! owns the read cursor. Each half stores only to its own atomics and loads
//! the other's, so no lock is taken on either side.
//!
//! Cursors are monotonically increasing sample counts; the slot for cursor
//! `c` is `c % capacity`. Overflow never blocks: the reader treats anything
//! older than `write - capacity` as gone, and `clear` moves the flush marker
//! up to the write cursor. The reader's effective start is therefore
//! `max(read, flush, write - capacity)`.
//!
//! An overflowing write reuses slots the reader may be copying at that
//! moment. The writer publishes how far it is about to write before touching
//! any slot, and the reader checks that mark after copying, discarding the
//! prefix that may have been overwritten. Drained output is therefore always
//! in write order.

use crossbeam::utils::CachePadded;
use std::sync::atomic::{fence, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared {
    /// f32 bit patterns
    slots: Box<[AtomicU32]>,
    capacity: u64,
    write: CachePadded<AtomicU64>,
    /// End of the write in progress; equals `write` between writes
    claim: CachePadded<AtomicU64>,
    read: CachePadded<AtomicU64>,
    flush: CachePadded<AtomicU64>,
    overflowed: AtomicU64,
    underruns: AtomicUsize,
}

impl Shared {
    /// First unread sample that is still valid, given a write cursor.
    ///
    /// Never exceeds `write`: a flush newer than the loaded cursor simply
    /// leaves nothing to read.
    #[inline]
    fn effective_read(&self, write: u64) -> u64 {
        let read = self.read.load(Ordering::Acquire);
        let flush = self.flush.load(Ordering::Acquire);
        read.max(flush)
            .max(write.saturating_sub(self.capacity))
            .min(write)
    }
}

/// Allocate a ring of `capacity` samples and split it into its two halves
pub fn playback_ring(capacity: usize) -> (RingWriter, RingReader) {
    let capacity = capacity.max(1);
    let slots: Box<[AtomicU32]> = (0..capacity).map(|_| AtomicU32::new(0)).collect();

    let shared = Arc::new(Shared {
        slots,
        capacity: capacity as u64,
        write: CachePadded::new(AtomicU64::new(0)),
        claim: CachePadded::new(AtomicU64::new(0)),
        read: CachePadded::new(AtomicU64::new(0)),
        flush: CachePadded::new(AtomicU64::new(0)),
        overflowed: AtomicU64::new(0),
        underruns: AtomicUsize::new(0),
    });

    (
        RingWriter {
            shared: shared.clone(),
        },
        RingReader {
            shared,
            last_flush: 0,
        },
    )
}

/// Producer half, owned by the network-arrival side
pub struct RingWriter {
    shared: Arc<Shared>,
}

impl RingWriter {
    /// Append samples, dropping the oldest unread audio on overflow
    pub fn write(&self, samples: &[f32]) {
        let shared = &*self.shared;
        let cap = shared.capacity;
        let write = shared.write.load(Ordering::Relaxed);
        let end = write + samples.len() as u64;

        // Announce the overwrite before any slot changes
        shared.claim.store(end, Ordering::Relaxed);
        fence(Ordering::Release);

        // Only the newest `capacity` samples of a single write can survive
        let skip = (samples.len() as u64).saturating_sub(cap);
        for (i, &s) in samples.iter().enumerate().skip(skip as usize) {
            let slot = ((write + i as u64) % cap) as usize;
            shared.slots[slot].store(s.to_bits(), Ordering::Relaxed);
        }

        let unread = write - shared.effective_read(write);
        let dropped = (unread + samples.len() as u64).saturating_sub(cap);
        if dropped > 0 {
            shared.overflowed.fetch_add(dropped, Ordering::Relaxed);
        }

        shared.write.store(end, Ordering::Release);
    }

    /// Discard everything written so far. O(1); storage is left untouched.
    pub fn clear(&self) {
        let write = self.shared.write.load(Ordering::Relaxed);
        self.shared.flush.store(write, Ordering::Release);
    }

    pub fn available(&self) -> usize {
        available(&self.shared)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity as usize
    }

    pub fn overflow_count(&self) -> u64 {
        self.shared.overflowed.load(Ordering::Relaxed)
    }

    pub fn underrun_count(&self) -> usize {
        self.shared.underruns.load(Ordering::Relaxed)
    }
}

/// Consumer half, owned by the output device callback
pub struct RingReader {
    shared: Arc<Shared>,
    last_flush: u64,
}

impl RingReader {
    /// Copy up to `out.len()` samples, padding the rest with silence.
    ///
    /// Returns the number of real samples copied. Performs no allocation.
    pub fn drain_into(&mut self, out: &mut [f32]) -> usize {
        let shared = &*self.shared;
        let write = shared.write.load(Ordering::Acquire);
        let start = shared.effective_read(write);
        let available = (write - start) as usize;
        let n = available.min(out.len());

        for (i, slot) in out[..n].iter_mut().enumerate() {
            let idx = ((start + i as u64) % shared.capacity) as usize;
            *slot = f32::from_bits(shared.slots[idx].load(Ordering::Relaxed));
        }

        // Samples older than `claim - capacity` may have been overwritten
        // while they were copied
        fence(Ordering::Acquire);
        let valid_from = shared
            .claim
            .load(Ordering::Relaxed)
            .saturating_sub(shared.capacity);
        let torn = (valid_from.saturating_sub(start) as usize).min(n);
        if torn > 0 {
            out.copy_within(torn..n, 0);
        }
        let real = n - torn;
        out[real..].fill(0.0);

        if real < out.len() {
            shared.underruns.fetch_add(1, Ordering::Relaxed);
        }

        shared.read.store(start + n as u64, Ordering::Release);
        real
    }

    /// Allocating convenience around [`drain_into`](Self::drain_into)
    pub fn drain(&mut self, count: usize) -> Vec<f32> {
        let mut out = vec![0.0; count];
        self.drain_into(&mut out);
        out
    }

    /// True once per `clear` issued by the writer since the last call
    pub fn take_flush(&mut self) -> bool {
        let flush = self.shared.flush.load(Ordering::Acquire);
        if flush != self.last_flush {
            self.last_flush = flush;
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> usize {
        available(&self.shared)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity as usize
    }
}

fn available(shared: &Shared) -> usize {
    let write = shared.write.load(Ordering::Acquire);
    (write - shared.effective_read(write)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    #[test]
    fn test_write_then_drain() {
        let (writer, mut reader) = playback_ring(8);
        writer.write(&[1.0, 2.0, 3.0]);
        assert_eq!(reader.available(), 3);
        assert_eq!(reader.drain(3), vec![1.0, 2.0, 3.0]);
        assert_eq!(reader.available(), 0);
    }

    #[test]
    fn test_underrun_pads_with_silence() {
        let (writer, mut reader) = playback_ring(8);
        writer.write(&[0.5, 0.25]);
        let mut out = [9.0f32; 5];
        assert_eq!(reader.drain_into(&mut out), 2);
        assert_eq!(out, [0.5, 0.25, 0.0, 0.0, 0.0]);
        assert_eq!(writer.underrun_count(), 1);
    }

    #[test]
    fn test_overflow_keeps_newest() {
        let (writer, mut reader) = playback_ring(4);
        writer.write(&ramp(6));
        assert_eq!(reader.available(), 4);
        assert_eq!(reader.drain(4), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_overflow_across_writes() {
        let (writer, mut reader) = playback_ring(4);
        writer.write(&[0.0, 1.0, 2.0]);
        assert_eq!(reader.drain(1), vec![0.0]);
        writer.write(&[3.0, 4.0, 5.0]);
        assert_eq!(writer.overflow_count(), 1);
        assert_eq!(reader.drain(4), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_wraparound() {
        let (writer, mut reader) = playback_ring(4);
        for round in 0..10 {
            let base = round as f32 * 3.0;
            writer.write(&[base, base + 1.0, base + 2.0]);
            assert_eq!(reader.drain(3), vec![base, base + 1.0, base + 2.0]);
        }
    }

    #[test]
    fn test_clear_flushes_without_touching_storage() {
        let (writer, mut reader) = playback_ring(8);
        writer.write(&[1.0, 1.0, 1.0]);
        writer.clear();
        assert_eq!(reader.available(), 0);
        assert!(reader.take_flush());
        assert!(!reader.take_flush());
        assert_eq!(reader.drain(4), vec![0.0; 4]);

        writer.write(&[2.0]);
        assert_eq!(reader.drain(2), vec![2.0, 0.0]);
    }

    #[test]
    fn test_concurrent_producer_consumer_preserves_order() {
        let (writer, mut reader) = playback_ring(1 << 16);
        let total = 50_000usize;

        let producer = std::thread::spawn(move || {
            for block in ramp(total).chunks(100) {
                writer.write(block);
                std::thread::yield_now();
            }
        });

        let mut received = Vec::with_capacity(total);
        let mut out = [0.0f32; 64];
        while received.len() < total {
            let n = reader.drain_into(&mut out);
            received.extend_from_slice(&out[..n]);
        }
        producer.join().unwrap();

        assert_eq!(received, ramp(total));
    }

    #[test]
    fn test_concurrent_overflow_never_reorders() {
        let (writer, mut reader) = playback_ring(64);
        let total = 200_000usize;

        let producer = std::thread::spawn(move || {
            let input: Vec<f32> = (1..=total).map(|i| i as f32).collect();
            for block in input.chunks(48) {
                writer.write(block);
            }
        });

        let mut last = 0.0f32;
        let mut out = [0.0f32; 32];
        while !producer.is_finished() || reader.available() > 0 {
            let n = reader.drain_into(&mut out);
            for &s in &out[..n] {
                assert!(s > last, "{} after {}", s, last);
                last = s;
            }
            assert!(out[n..].iter().all(|&s| s == 0.0));
        }
        producer.join().unwrap();
        assert_eq!(last, total as f32);
    }

    proptest! {
        #[test]
        fn overflow_drops_exactly_the_oldest(cap in 1usize..64, extra in 1usize..64) {
            let (writer, mut reader) = playback_ring(cap);
            let input = ramp(cap + extra);
            for chunk in input.chunks(7) {
                writer.write(chunk);
            }
            prop_assert_eq!(reader.drain(cap), input[extra..].to_vec());
        }

        #[test]
        fn drain_pads_to_requested_length(written in 0usize..32, request in 0usize..64) {
            let (writer, mut reader) = playback_ring(32);
            writer.write(&vec![0.5; written]);
            let out = reader.drain(request);
            prop_assert_eq!(out.len(), request);
            let real = written.min(request);
            prop_assert!(out[..real].iter().all(|&s| s == 0.5));
            prop_assert!(out[real..].iter().all(|&s| s == 0.0));
        }

        #[test]
        fn clear_yields_silence(prefill in 0usize..64, request in 0usize..64) {
            let (writer, mut reader) = playback_ring(32);
            writer.write(&vec![0.9; prefill]);
            writer.clear();
            prop_assert_eq!(reader.drain(request), vec![0.0; request]);
        }
    }
}
