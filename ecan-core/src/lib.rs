#![no_std]
#![warn(missing_docs)]

//! `ecan-core` provides a set of essential abstractions that serve as a thin
//! integration layer between platform independent [`ecan`] crate and platform
//! specific HAL crates (in documentation also referred to as _target HALs_).
//!
//! Traits from this crate are not supposed to be implemented by the
//! application developer; implementations should be provided by target HALs.
//!
//! Everything that is a mechanical translation of the datasheet lives on this
//! side of the boundary: bit-time calculation, acceptance filters and masks,
//! DMA channel wiring and the per-slot transmit request bits. `ecan` only
//! decides *which* words go into *which* message object and *when*.
//!
//! [`ecan`]: <https://docs.rs/crate/ecan/>

pub use fugit;

/// Number of 16-bit words describing one frame in a hardware message object.
///
/// A message object in DMA RAM is 8 words long; the eighth word holds the
/// filter hit code written by the peripheral and is not part of the frame.
pub const WIRE_WORDS: usize = 7;

/// A frame in the peripheral's word oriented representation
pub type WireWords = [u16; WIRE_WORDS];

/// Operating mode requested from the peripheral
///
/// Discriminants are the values of the `REQOP` request field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Normal operation on the bus
    Normal = 0,
    /// Module disabled
    Disabled = 1,
    /// Internal loopback, frames are not put on the bus
    Loopback = 2,
    /// Receive only, no acknowledgements are generated
    ListenOnly = 3,
    /// Configuration mode
    Configuration = 4,
    /// Receive all messages, including the ones with errors
    ListenAll = 7,
}

impl OperatingMode {
    /// Raw `REQOP` value requesting this mode
    pub fn request_code(self) -> u8 {
        self as u8
    }
}

/// Settings handed over to [`Dependencies::configure`]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusParameters {
    /// Nominal bitrate of the bus
    pub bitrate: fugit::HertzU32,
    /// Mode to leave the peripheral in once configured
    pub mode: OperatingMode,
    /// Message object reserved for outgoing frames
    pub transmit_slot: u8,
}

/// Trait representing CAN peripheral dependencies
///
/// Structs implementing [`Dependencies`] should
/// - enclose all object representable dependencies of the CAN peripheral
///   (clocks, pins, DMA channels and the DMA message object array) and release
///   them upon destruction
/// - be constructible only when it is safe and sound to interact with CAN
///   peripheral (respective clocks and pins have been already configured)
/// - be a singleton (only a single instance for a specific peripheral must
///   exist at the same time)
///
/// All methods are called by `ecan` with interrupts masked, so
/// implementations do not need any synchronization of their own. None of
/// them may block.
///
/// # Example
/// ```no_run
/// use ecan_core::{BusParameters, Dependencies, WireWords};
/// use fugit::HertzU32;
///
/// pub struct Ecan1 {
///     message_ram: [[u16; 8]; 4],
///     flags: u16,
/// }
///
/// impl Dependencies for Ecan1 {
///     const MESSAGE_OBJECTS: u8 = 4;
///
///     fn can_clock(&self) -> HertzU32 {
///         HertzU32::from_raw(40_000_000)
///     }
///     fn configure(&mut self, _parameters: &BusParameters) {
///         // program CxCFG1/CxCFG2, filters, DMA channels, request mode
///     }
///     fn hardware_transmit(&mut self, slot: u8, words: &WireWords) {
///         self.message_ram[slot as usize][..7].copy_from_slice(words);
///         // and set TXREQ for `slot`
///     }
///     fn hardware_receive_words(&mut self, slot: u8) -> WireWords {
///         let mut words = [0; 7];
///         words.copy_from_slice(&self.message_ram[slot as usize][..7]);
///         words
///     }
///     fn interrupt_flags(&self) -> u16 {
///         self.flags
///     }
///     fn clear_interrupt_flags(&mut self, mask: u16) {
///         self.flags &= !mask;
///     }
///     fn set_interrupt_enable(&mut self, _mask: u16) {}
///     fn full_receive_slots(&self) -> u32 {
///         0
///     }
///     fn release_receive_slot(&mut self, _slot: u8) {}
/// }
/// ```
pub trait Dependencies {
    /// Number of message objects in the DMA RAM, both directions included.
    const MESSAGE_OBJECTS: u8;

    /// Frequency of CAN specific clock (`FCAN`) the bit timing is derived from.
    fn can_clock(&self) -> fugit::HertzU32;

    /// Bring the peripheral from reset to operation.
    ///
    /// This covers the bit timing, filter and mask setup, DMA channels,
    /// declaring `parameters.transmit_slot` as a transmit buffer and finally
    /// requesting `parameters.mode`. Interrupt causes are enabled separately
    /// through [`Dependencies::set_interrupt_enable`].
    fn configure(&mut self, parameters: &BusParameters);

    /// Write `words` into message object `slot` and assert its transmit
    /// request bit. Must return immediately.
    fn hardware_transmit(&mut self, slot: u8, words: &WireWords);

    /// Read the words of a completed reception from message object `slot`.
    fn hardware_receive_words(&mut self, slot: u8) -> WireWords;

    /// Raw interrupt flag register (`CxINTF`).
    fn interrupt_flags(&self) -> u16;

    /// Clear the flags set in `mask`. Flags not in `mask` are unaffected.
    fn clear_interrupt_flags(&mut self, mask: u16);

    /// Overwrite the interrupt enable register (`CxINTE`) with `mask`.
    fn set_interrupt_enable(&mut self, mask: u16);

    /// Bitmask of message objects holding a received frame (`CxRXFUL`).
    fn full_receive_slots(&self) -> u32;

    /// Hand message object `slot` back to the peripheral for reception.
    fn release_receive_slot(&mut self, slot: u8);
}
