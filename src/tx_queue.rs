//! Software transmit queue chained through a single hardware buffer
//!
//! Frames wait in a ring buffer. The frame at the front of the ring is the one
//! currently staged in the peripheral; it stays there until the peripheral
//! reports completion, so `Idle` always means the ring is empty.

use crate::config::OverflowPolicy;
use crate::message::{wire, CanFrame};
use crate::ring_buffer::{CapacityError, RingBuffer};
use ecan_core::Dependencies;

/// There is no room left in the queue; the frame was dropped
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Transmit state machine
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    /// Nothing is staged in the hardware
    Idle,
    /// Exactly one frame has been handed to the hardware and has not
    /// completed yet
    Sending,
}

/// Outgoing frames for one hardware transmit buffer
pub struct TxQueue<'a> {
    buffer: RingBuffer<'a>,
    state: TxState,
    slot: u8,
    policy: OverflowPolicy,
    overflows_before_reset: usize,
    discarded: usize,
}

impl<'a> TxQueue<'a> {
    /// Queue over `storage` feeding message object `slot`.
    ///
    /// `storage` must hold a whole, non-zero number of [`wire::RECORD_LEN`]
    /// byte records.
    pub fn new(
        storage: &'a mut [u8],
        slot: u8,
        policy: OverflowPolicy,
    ) -> Result<Self, CapacityError> {
        Ok(Self {
            buffer: RingBuffer::new(storage, wire::RECORD_LEN)?,
            state: TxState::Idle,
            slot,
            policy,
            overflows_before_reset: 0,
            discarded: 0,
        })
    }

    /// Current state of the state machine
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Message object used for transmission
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Frames waiting, including the one in flight
    pub fn len(&self) -> usize {
        self.buffer.len() / wire::RECORD_LEN
    }

    /// Returns `true` if nothing is queued or in flight
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of frames the queue can hold, including the one in flight
    pub fn capacity(&self) -> usize {
        self.buffer.capacity() / wire::RECORD_LEN
    }

    /// Frames refused because the queue was full, since construction
    pub fn overflow_count(&self) -> usize {
        self.overflows_before_reset
            .wrapping_add(self.buffer.overflow_count())
    }

    /// Queued frames thrown away by [`OverflowPolicy::ResetAll`] recovery
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Queue `frame` and start transmitting it if the hardware is idle.
    pub fn enqueue<D: Dependencies>(
        &mut self,
        frame: &CanFrame,
        hw: &mut D,
    ) -> Result<(), QueueFull> {
        let record = wire::serialize(&frame.with_slot(self.slot));
        if self.buffer.write_all(&record).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "tx queue full, frame {} dropped ({} overflows)",
                frame.raw_id(),
                self.overflow_count()
            );
            return Err(QueueFull);
        }
        if self.state == TxState::Idle {
            self.state = TxState::Sending;
            hw.hardware_transmit(self.slot, &wire::record_words(&record));
        }
        Ok(())
    }

    /// Retire the frame in flight and stage the next one, if any.
    ///
    /// Called from the transmit complete interrupt.
    pub fn on_hardware_complete<D: Dependencies>(&mut self, hw: &mut D) {
        if self.state == TxState::Idle {
            #[cfg(feature = "defmt")]
            defmt::debug!("spurious transmit completion on slot {}", self.slot);
            return;
        }
        self.buffer.discard(wire::RECORD_LEN);

        if self.policy == OverflowPolicy::ResetAll && self.buffer.overflow_count() != 0 {
            let dropped = self.len();
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "tx queue overflowed {} times, discarding {} queued frames",
                self.buffer.overflow_count(),
                dropped
            );
            self.overflows_before_reset = self.overflow_count();
            self.discarded = self.discarded.wrapping_add(dropped);
            self.buffer.reset();
        }

        let mut record = [0; wire::RECORD_LEN];
        if self.buffer.peek_many(&mut record) == wire::RECORD_LEN {
            hw.hardware_transmit(self.slot, &wire::record_words(&record));
        } else {
            self.state = TxState::Idle;
        }
    }
}
