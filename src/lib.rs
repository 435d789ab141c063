#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
//! # ECAN
//!
//! ## Overview
//! This crate provides a platform-agnostic, interrupt driven message driver
//! for ECAN style CAN peripherals, where frames are exchanged with the
//! peripheral through an array of DMA message objects.
//!
//! It provides the following features:
//!
//! - a transmit queue chained through a single hardware transmit buffer, so
//!   that queueing a frame never waits for the bus
//! - a receive queue filled from the receive interrupt
//! - overflow accounting in both directions; no frame is lost silently
//! - a codec between [`CanFrame`] and the peripheral's word layout for
//!   standard and extended identifiers, data and remote frames
//! - an [`embedded_can::nb::Can`] implementation
//!
//! Register programming (bit timing, acceptance filters, DMA channels) is not
//! part of this crate. A platform-specific HAL takes care of it by
//! implementing [`Dependencies`], which [`CanConfigurable`] holds onto until
//! the bus is [`released`].
//!
//! ## Queue memory
//!
//! The queues live in a [`SharedMemory`] instance whose sizes are selected by
//! implementing [`Capacities`] on a marker type. It is zeroed on
//! construction of [`CanConfigurable`], so it can be placed in a `NOLOAD`
//! section.
//!
//! ```no_run
//! use ecan::generic_array::typenum::consts::*;
//! use ecan::messageram::SharedMemory;
//! struct Capacities;
//! impl ecan::messageram::Capacities for Capacities {
//!     // 8 frames of 16 bytes
//!     type TxQueueBytes = U128;
//!     // 32 frames of 16 bytes
//!     type RxQueueBytes = U512;
//! }
//!
//! #[link_section = ".can"]
//! static mut QUEUES: SharedMemory<Capacities> = SharedMemory::new();
//! ```
//!
//! ## General usage example
//!
//! ```no_run
//! # use ecan::generic_array::typenum::consts::*;
//! # use ecan::messageram::SharedMemory;
//! # struct Capacities;
//! # impl ecan::messageram::Capacities for Capacities {
//! #     type TxQueueBytes = U128;
//! #     type RxQueueBytes = U512;
//! # }
//! # static mut QUEUES: SharedMemory<Capacities> = SharedMemory::new();
//! # pub mod hal {
//! #     pub mod can {
//! #         use ecan::core::{BusParameters, WireWords};
//! #         pub struct Dependencies(());
//! #         impl ecan::core::Dependencies for Dependencies {
//! #             const MESSAGE_OBJECTS: u8 = 8;
//! #             fn can_clock(&self) -> fugit::HertzU32 { unreachable!() }
//! #             fn configure(&mut self, _: &BusParameters) { unreachable!() }
//! #             fn hardware_transmit(&mut self, _: u8, _: &WireWords) { unreachable!() }
//! #             fn hardware_receive_words(&mut self, _: u8) -> WireWords { unreachable!() }
//! #             fn interrupt_flags(&self) -> u16 { unreachable!() }
//! #             fn clear_interrupt_flags(&mut self, _: u16) { unreachable!() }
//! #             fn set_interrupt_enable(&mut self, _: u16) { unreachable!() }
//! #             fn full_receive_slots(&self) -> u32 { unreachable!() }
//! #             fn release_receive_slot(&mut self, _: u8) { unreachable!() }
//! #         }
//! #         impl Dependencies {
//! #             pub fn new() -> Result<Dependencies, ()> {
//! #                 Ok(Dependencies(()))
//! #             }
//! #         }
//! #     }
//! # }
//! use ecan::config::OverflowPolicy;
//! use ecan::embedded_can::{Frame, StandardId};
//! use ecan::message::CanFrame;
//! use fugit::RateExtU32 as _;
//!
//! let dependencies = hal::can::Dependencies::new(/* all required parameters */).unwrap();
//! let mut can = ecan::bus::CanConfigurable::new(
//!     500.kHz(),
//!     dependencies,
//!     unsafe { &mut *core::ptr::addr_of_mut!(QUEUES) },
//! );
//!
//! // The peripheral is not running yet and the config can still be changed.
//! can.config().tx.slot = 0;
//! can.config().tx.overflow_policy = OverflowPolicy::ResetAll;
//!
//! let can = can.finalize().unwrap();
//!
//! // From the interrupt handler
//! can.on_interrupt();
//!
//! // From the application
//! let frame = CanFrame::new(StandardId::new(0x402).unwrap(), &[1, 2, 3]).unwrap();
//! if can.transmit(&frame).is_err() {
//!     // Queue full, the frame is counted in `transmit_overflow_count`
//! }
//! while let Some(frame) = can.receive() {
//!     let _ = frame.data();
//! }
//! ```
//!
//! [`CanFrame`]: message::CanFrame
//! [`Dependencies`]: ecan_core::Dependencies
//! [`CanConfigurable`]: bus::CanConfigurable
//! [`released`]: bus::Can::release
//! [`SharedMemory`]: messageram::SharedMemory
//! [`Capacities`]: messageram::Capacities

pub mod bus;
pub mod config;
pub mod dma;
pub mod interrupt;
pub mod message;
pub mod messageram;
pub mod prelude;
pub mod ring_buffer;
pub mod rx_queue;
pub mod tx_queue;

#[cfg(test)]
mod mock;

pub use ecan_core as core;
pub use embedded_can;
pub use generic_array;
