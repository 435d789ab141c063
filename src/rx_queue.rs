//! Software receive queue filled from the receive interrupt

use crate::message::{wire, CanFrame};
use crate::ring_buffer::{CapacityError, RingBuffer};
pub use crate::tx_queue::QueueFull;
use ecan_core::WireWords;

/// Incoming frames waiting to be picked up by the application
pub struct RxQueue<'a> {
    buffer: RingBuffer<'a>,
    pending: usize,
}

impl<'a> RxQueue<'a> {
    /// Queue over `storage`, which must hold a whole, non-zero number of
    /// [`wire::RECORD_LEN`] byte records.
    pub fn new(storage: &'a mut [u8]) -> Result<Self, CapacityError> {
        Ok(Self {
            buffer: RingBuffer::new(storage, wire::RECORD_LEN)?,
            pending: 0,
        })
    }

    /// Number of whole frames ready for [`RxQueue::dequeue`]
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Number of frames the queue can hold
    pub fn capacity(&self) -> usize {
        self.buffer.capacity() / wire::RECORD_LEN
    }

    /// Frames dropped because the queue was full
    pub fn overflow_count(&self) -> usize {
        self.buffer.overflow_count()
    }

    /// Store a frame read from message object `slot`.
    ///
    /// A full queue keeps its contents; the new frame is dropped and counted.
    pub fn on_frame_received(&mut self, words: &WireWords, slot: u8) -> Result<(), QueueFull> {
        let record = wire::serialize(&wire::decode(words, slot));
        match self.buffer.write_all(&record) {
            Ok(()) => {
                self.pending += 1;
                Ok(())
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "rx queue full, frame from slot {} dropped ({} overflows)",
                    slot,
                    self.buffer.overflow_count()
                );
                Err(QueueFull)
            }
        }
    }

    /// Oldest received frame, if any
    pub fn dequeue(&mut self) -> Option<CanFrame> {
        if self.pending == 0 {
            return None;
        }
        let mut record = [0; wire::RECORD_LEN];
        self.buffer.read_exact(&mut record)?;
        self.pending -= 1;
        Some(wire::deserialize(&record))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use embedded_can::{ExtendedId, Frame, StandardId};

    fn words(id: u16, byte: u8) -> WireWords {
        let frame = CanFrame::new(StandardId::new(id).unwrap(), &[byte]).unwrap();
        wire::encode(&frame)
    }

    #[test]
    fn pending_count_tracks_receptions_and_dequeues() {
        let mut storage = [0; 8 * wire::RECORD_LEN];
        let mut rx = RxQueue::new(&mut storage).unwrap();
        assert_eq!(rx.pending_count(), 0);
        assert_eq!(rx.dequeue(), None);

        for k in 0..5u16 {
            rx.on_frame_received(&words(k, k as u8), 1).unwrap();
        }
        assert_eq!(rx.pending_count(), 5);
        for j in 1..=3 {
            rx.dequeue().unwrap();
            assert_eq!(rx.pending_count(), 5 - j);
        }
        rx.on_frame_received(&words(9, 9), 1).unwrap();
        assert_eq!(rx.pending_count(), 3);
    }

    #[test]
    fn frames_come_out_in_arrival_order() {
        let mut storage = [0; 4 * wire::RECORD_LEN];
        let mut rx = RxQueue::new(&mut storage).unwrap();
        let ext = CanFrame::new_remote_request(ExtendedId::new(0x1abc_def0).unwrap(), 2).unwrap();

        rx.on_frame_received(&words(0x100, 1), 3).unwrap();
        rx.on_frame_received(&wire::encode(&ext), 4).unwrap();
        rx.on_frame_received(&words(0x300, 3), 5).unwrap();

        let first = rx.dequeue().unwrap();
        assert_eq!(first.raw_id(), 0x100);
        assert_eq!(first.data(), &[1]);
        assert_eq!(first.hardware_slot(), 3);

        let second = rx.dequeue().unwrap();
        assert_eq!(second, ext);
        assert_eq!(second.hardware_slot(), 4);

        assert_eq!(rx.dequeue().unwrap().raw_id(), 0x300);
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn overflow_drops_newest() {
        let mut storage = [0; 2 * wire::RECORD_LEN];
        let mut rx = RxQueue::new(&mut storage).unwrap();
        rx.on_frame_received(&words(1, 1), 0).unwrap();
        rx.on_frame_received(&words(2, 2), 0).unwrap();
        assert_eq!(rx.on_frame_received(&words(3, 3), 0), Err(QueueFull));
        assert_eq!(rx.overflow_count(), 1);
        assert_eq!(rx.pending_count(), 2);

        assert_eq!(rx.dequeue().unwrap().raw_id(), 1);
        assert_eq!(rx.dequeue().unwrap().raw_id(), 2);
        assert_eq!(rx.dequeue(), None);

        // Space is reclaimed after dequeuing
        rx.on_frame_received(&words(4, 4), 0).unwrap();
        assert_eq!(rx.dequeue().unwrap().raw_id(), 4);
        assert_eq!(rx.overflow_count(), 1);
    }
}
