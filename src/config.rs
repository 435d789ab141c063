//! CAN bus configuration

use crate::interrupt::{Interrupt, InterruptSet};
use fugit::HertzU32;

pub use ecan_core::OperatingMode;

/// Configuration for the CAN bus
#[derive(Copy, Clone, Debug)]
pub struct CanConfig {
    /// The bitrate of the bus. Bit timing itself is derived by the target HAL.
    pub bitrate: HertzU32,
    /// Mode the peripheral is left in after configuration
    pub mode: OperatingMode,
    /// Tx configuration
    pub tx: TxConfig,
    /// Interrupt causes enabled on [`crate::bus::CanConfigurable::finalize`]
    pub interrupts: InterruptSet,
}

impl CanConfig {
    /// Create an instance
    ///
    /// Bitrate value must be provided, all other settings come pre-populated
    /// with default values: normal mode, transmission through message object
    /// 0 and the transmit, receive and receive overrun interrupts.
    pub fn new(bitrate: HertzU32) -> Self {
        Self {
            bitrate,
            mode: OperatingMode::Normal,
            tx: TxConfig::default(),
            interrupts: [
                Interrupt::TransmitBuffer,
                Interrupt::ReceiveBuffer,
                Interrupt::ReceiveOverrun,
            ]
            .into_iter()
            .collect(),
        }
    }
}

/// Denotes a TX related configuration
#[derive(Default, Copy, Clone, Debug)]
pub struct TxConfig {
    /// Message object used as the transmit buffer. Must be configured as a
    /// transmitter by the target HAL.
    pub slot: u8,
    /// What to do once the transmit queue has refused a frame
    pub overflow_policy: OverflowPolicy,
}

/// Reaction of the transmit queue to having overflowed
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverflowPolicy {
    /// Refuse the frame that does not fit and keep everything already queued
    #[default]
    DropNewest,
    /// Like [`OverflowPolicy::DropNewest`], but once the frame in flight
    /// completes the whole backlog is discarded so that fresh frames go out
    /// without waiting behind stale ones
    ResetAll,
}
