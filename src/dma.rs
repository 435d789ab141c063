//! Volatile access to the DMA message object array
//!
//! The peripheral reads and writes message objects in RAM behind the core's
//! back. Target HALs can wrap that array in [`MessageObjects`] to implement
//! [`ecan_core::Dependencies::hardware_transmit`] and
//! [`ecan_core::Dependencies::hardware_receive_words`].

use ecan_core::{WireWords, WIRE_WORDS};
use vcell::VolatileCell;

/// One message object: seven frame words followed by the filter hit word
pub type MessageObject = [u16; 8];

/// Index is out of bounds
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfBounds;

/// View over the message objects of one peripheral
pub struct MessageObjects<'a> {
    memory: &'a [VolatileCell<MessageObject>],
}

impl<'a> MessageObjects<'a> {
    /// Wrap `memory`, typically the array the DMA channels point into.
    pub fn new(memory: &'a [VolatileCell<MessageObject>]) -> Self {
        Self { memory }
    }

    /// Number of message objects
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns `true` if there are no message objects
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    fn object(&self, slot: u8) -> Result<&VolatileCell<MessageObject>, OutOfBounds> {
        self.memory.get(usize::from(slot)).ok_or(OutOfBounds)
    }

    /// Store `words` in message object `slot`, leaving the filter hit word
    /// untouched.
    pub fn write_wire(&self, slot: u8, words: &WireWords) -> Result<(), OutOfBounds> {
        let cell = self.object(slot)?;
        let mut object = cell.get();
        object[..WIRE_WORDS].copy_from_slice(words);
        cell.set(object);
        Ok(())
    }

    /// Frame words of message object `slot`
    pub fn read_wire(&self, slot: u8) -> Result<WireWords, OutOfBounds> {
        let object = self.object(slot)?.get();
        let mut words = [0; WIRE_WORDS];
        words.copy_from_slice(&object[..WIRE_WORDS]);
        Ok(words)
    }

    /// Number of the acceptance filter that accepted the frame in `slot`
    pub fn filter_hit(&self, slot: u8) -> Result<u8, OutOfBounds> {
        let object = self.object(slot)?.get();
        Ok(((object[WIRE_WORDS] >> 8) & 0x1f) as u8)
    }
}
