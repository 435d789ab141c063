//! Interrupt flags and routing of interrupt causes to the queues

use crate::rx_queue::RxQueue;
use crate::tx_queue::TxQueue;
use bitfield::bitfield;
use ecan_core::Dependencies;

bitfield! {
    /// A set of CAN interrupts.
    ///
    /// Bit positions match the peripheral's flag (`CxINTF`) and enable
    /// (`CxINTE`) registers.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct InterruptSet(u16);

    /// Invalid Message Received
    pub ivrif, set_ivrif: 7;
    /// Bus Wake-up Activity
    pub wakif, set_wakif: 6;
    /// Error
    pub errif, set_errif: 5;
    /// FIFO Almost Full
    pub fifoif, set_fifoif: 3;
    /// Receive Buffer Overflow
    pub rxovif, set_rxovif: 2;
    /// Receive Buffer
    pub rbif, set_rbif: 1;
    /// Transmit Buffer
    pub tbif, set_tbif: 0;
}

/// Bits of [`InterruptSet`] that name an interrupt
pub(crate) const VALID_BITS: u16 = 0x00ef;

impl FromIterator<Interrupt> for InterruptSet {
    fn from_iter<T: IntoIterator<Item = Interrupt>>(iter: T) -> Self {
        let mut set = 0_u16;
        for int in iter.into_iter() {
            set |= u16::from(int);
        }
        InterruptSet(set)
    }
}

impl core::fmt::Debug for InterruptSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "InterruptSet {{ ")?;
        if self.ivrif() {
            write!(f, "IVRIF ")?;
        }
        if self.wakif() {
            write!(f, "WAKIF ")?;
        }
        if self.errif() {
            write!(f, "ERRIF ")?;
        }
        if self.fifoif() {
            write!(f, "FIFOIF ")?;
        }
        if self.rxovif() {
            write!(f, "RXOVIF ")?;
        }
        if self.rbif() {
            write!(f, "RBIF ")?;
        }
        if self.tbif() {
            write!(f, "TBIF ")?;
        }
        write!(f, "}}")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InterruptSet {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "InterruptSet({=u16:#x})", self.0)
    }
}

/// Interrupt causes of the CAN peripheral
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interrupt {
    /// TBIF
    TransmitBuffer = 0,
    /// RBIF
    ReceiveBuffer = 1,
    /// RXOVIF
    ReceiveOverrun = 2,
    /// FIFOIF
    FifoAlmostFull = 3,
    /// ERRIF
    Error = 5,
    /// WAKIF
    WakeUp = 6,
    /// IVRIF
    InvalidMessage = 7,
}

impl From<Interrupt> for u16 {
    fn from(x: Interrupt) -> Self {
        1 << x as u16
    }
}

/// The number does not name an interrupt
#[derive(Debug)]
pub struct InvalidInterruptNumber;

impl TryFrom<u8> for Interrupt {
    type Error = InvalidInterruptNumber;

    fn try_from(value: u8) -> Result<Self, InvalidInterruptNumber> {
        use Interrupt::*;
        let ret = match value {
            0 => TransmitBuffer,
            1 => ReceiveBuffer,
            2 => ReceiveOverrun,
            3 => FifoAlmostFull,
            5 => Error,
            6 => WakeUp,
            7 => InvalidMessage,
            _ => Err(InvalidInterruptNumber)?,
        };
        Ok(ret)
    }
}

impl InterruptSet {
    /// An iterator visiting all elements in ascending bit order.
    pub fn iter(&self) -> Iter {
        Iter {
            flags: *self,
            index: 0,
        }
    }

    /// Returns `true` if `interrupt` is in the set
    pub fn contains(&self, interrupt: Interrupt) -> bool {
        self.0 & u16::from(interrupt) != 0
    }
}

/// An iterator over the items of an [`InterruptSet`].
///
/// This `struct` is created by [`InterruptSet::iter`].
pub struct Iter {
    flags: InterruptSet,
    index: u8,
}

impl Iterator for Iter {
    type Item = Interrupt;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < 8 {
            let i = self.index;
            self.index += 1;
            // Bit 4 is reserved and skipped here.
            if let Ok(int) = Interrupt::try_from(i) {
                if self.flags.0 & (1 << i) != 0 {
                    return Some(int);
                }
            }
        }
        None
    }
}

/// A set of message objects, one bit per slot
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotSet(pub u32);

impl SlotSet {
    /// An iterator visiting all slots in ascending order.
    pub fn iter(&self) -> SlotIter {
        SlotIter(self.0)
    }
}

impl FromIterator<u8> for SlotSet {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut set = 0_u32;
        for slot in iter.into_iter() {
            set |= 1_u32.checked_shl(slot.into()).unwrap_or(0);
        }
        SlotSet(set)
    }
}

/// An iterator over the slots of a [`SlotSet`].
///
/// This `struct` is created by [`SlotSet::iter`].
pub struct SlotIter(u32);

impl Iterator for SlotIter {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }
        let slot = self.0.trailing_zeros();
        // Clear the lowest set bit
        self.0 &= self.0 - 1;
        Some(slot as u8)
    }
}

/// Routes interrupt causes of the peripheral to the transmit and receive
/// queues.
///
/// Every flag is acknowledged only after the queue operation it stands for
/// has completed.
pub struct InterruptAdapter<'a> {
    /// Outgoing frames
    pub tx: TxQueue<'a>,
    /// Incoming frames
    pub rx: RxQueue<'a>,
    hardware_overruns: usize,
}

impl<'a> InterruptAdapter<'a> {
    /// Bundle the two queues.
    pub fn new(tx: TxQueue<'a>, rx: RxQueue<'a>) -> Self {
        Self {
            tx,
            rx,
            hardware_overruns: 0,
        }
    }

    /// Receive overruns reported by the peripheral itself
    pub fn hardware_overruns(&self) -> usize {
        self.hardware_overruns
    }

    /// Handle all flagged causes and return the flags that were cleared.
    ///
    /// Causes without a handler here ([`Interrupt::Error`],
    /// [`Interrupt::WakeUp`], ...) are cleared as well and left for the
    /// caller to act upon through the returned set.
    pub fn service<D: Dependencies>(&mut self, hw: &mut D) -> InterruptSet {
        let flags = InterruptSet(hw.interrupt_flags() & VALID_BITS);

        if flags.tbif() {
            self.tx.on_hardware_complete(hw);
            hw.clear_interrupt_flags(Interrupt::TransmitBuffer.into());
        }
        if flags.rbif() {
            let full = SlotSet(hw.full_receive_slots());
            let tx_slot = self.tx.slot();
            for slot in full.iter().filter(|&slot| slot != tx_slot) {
                self.receive_slot(slot, hw);
            }
            hw.clear_interrupt_flags(Interrupt::ReceiveBuffer.into());
        }
        if flags.rxovif() {
            self.count_overrun();
            hw.clear_interrupt_flags(Interrupt::ReceiveOverrun.into());
        }

        let handled = InterruptSet::from_iter([
            Interrupt::TransmitBuffer,
            Interrupt::ReceiveBuffer,
            Interrupt::ReceiveOverrun,
        ]);
        let rest = flags.0 & !handled.0;
        if rest != 0 {
            hw.clear_interrupt_flags(rest);
        }
        flags
    }

    /// Transmission from message object `slot` has completed.
    pub fn on_transmit_complete<D: Dependencies>(&mut self, slot: u8, hw: &mut D) {
        if slot == self.tx.slot() {
            self.tx.on_hardware_complete(hw);
        } else {
            #[cfg(feature = "defmt")]
            defmt::debug!("transmit completion on foreign slot {}", slot);
        }
    }

    /// Message object `slot` holds a received frame.
    pub fn on_receive_complete<D: Dependencies>(&mut self, slot: u8, hw: &mut D) {
        if slot == self.tx.slot() {
            #[cfg(feature = "defmt")]
            defmt::debug!("receive completion on transmit slot {}", slot);
            return;
        }
        self.receive_slot(slot, hw);
    }

    fn receive_slot<D: Dependencies>(&mut self, slot: u8, hw: &mut D) {
        let words = hw.hardware_receive_words(slot);
        // A full queue has already counted the loss, the slot is freed either way
        let _ = self.rx.on_frame_received(&words, slot);
        hw.release_receive_slot(slot);
    }

    fn count_overrun(&mut self) {
        self.hardware_overruns = self.hardware_overruns.wrapping_add(1);
        #[cfg(feature = "defmt")]
        defmt::warn!("hardware receive overrun ({})", self.hardware_overruns);
    }
}
