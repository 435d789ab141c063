//! Bus facade shared between the application and the interrupt handler

use crate::config::CanConfig;
use crate::interrupt::{InterruptAdapter, InterruptSet, VALID_BITS};
use crate::message::CanFrame;
use crate::messageram::{Capacities, SharedMemory, SharedMemoryInner};
use crate::ring_buffer::CapacityError;
use crate::rx_queue::RxQueue;
use crate::tx_queue::{QueueFull, TxQueue, TxState};
use core::cell::RefCell;
use critical_section::Mutex;
use ecan_core::{BusParameters, Dependencies};
use fugit::HertzU32;

/// Errors that may occur during configuration
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    /// Queue storage cannot hold a whole number of frames
    Capacity(CapacityError),
    /// Bitrate is zero or too high for the CAN clock
    BitrateOutOfRange {
        /// Provided peripheral clock
        can_clock: HertzU32,
        /// Bitrate requested in [`CanConfig`]
        bitrate: HertzU32,
    },
    /// Transmit slot does not name a message object
    TransmitSlotOutOfRange(u8),
}

impl From<CapacityError> for ConfigurationError {
    fn from(value: CapacityError) -> Self {
        Self::Capacity(value)
    }
}

/// Error reported through [`embedded_can::nb::Can`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Received frames were lost since the previous call to `receive`
    Overrun,
}

impl embedded_can::Error for Error {
    fn kind(&self) -> embedded_can::ErrorKind {
        match self {
            Self::Overrun => embedded_can::ErrorKind::Overrun,
        }
    }
}

/// Fewest time quanta a bit can be divided into
const MIN_TIME_QUANTA: u32 = 8;

/// A CAN bus in configuration mode. Use [`CanConfigurable::finalize`] to
/// start transmitting and receiving.
pub struct CanConfigurable<'a, D, C: Capacities> {
    dependencies: D,
    config: CanConfig,
    memory: &'a mut SharedMemoryInner<C>,
}

impl<'a, D: Dependencies, C: Capacities> CanConfigurable<'a, D, C> {
    /// Create a [`CanConfigurable`] instance.
    ///
    /// `memory` is zeroed and handed to the queues; frames never live
    /// anywhere else.
    pub fn new(bitrate: HertzU32, dependencies: D, memory: &'a mut SharedMemory<C>) -> Self {
        Self {
            dependencies,
            config: CanConfig::new(bitrate),
            memory: memory.init(),
        }
    }

    /// Allows reconfiguring config
    pub fn config(&mut self) -> &mut CanConfig {
        &mut self.config
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let can_clock = self.dependencies.can_clock();
        let bitrate = self.config.bitrate;
        let fits = bitrate
            .raw()
            .checked_mul(MIN_TIME_QUANTA)
            .map_or(false, |needed| needed <= can_clock.raw());
        if bitrate.raw() == 0 || !fits {
            return Err(ConfigurationError::BitrateOutOfRange { can_clock, bitrate });
        }
        let slot = self.config.tx.slot;
        if slot >= D::MESSAGE_OBJECTS {
            return Err(ConfigurationError::TransmitSlotOutOfRange(slot));
        }
        Ok(())
    }

    /// Locks the configuration and enters the configured operating mode.
    pub fn finalize(self) -> Result<Can<'a, D>, ConfigurationError> {
        self.validate()?;
        let Self {
            mut dependencies,
            config,
            memory,
        } = self;

        let SharedMemoryInner { tx_queue, rx_queue } = memory;
        let tx = TxQueue::new(tx_queue, config.tx.slot, config.tx.overflow_policy)?;
        let rx = RxQueue::new(rx_queue)?;

        dependencies.configure(&BusParameters {
            bitrate: config.bitrate,
            mode: config.mode,
            transmit_slot: config.tx.slot,
        });
        // Nothing that happened before configuration is of interest
        dependencies.clear_interrupt_flags(VALID_BITS);
        dependencies.set_interrupt_enable(config.interrupts.0 & VALID_BITS);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "CAN up at {} bit/s in {}, tx slot {}, queues {}/{} frames",
            config.bitrate.raw(),
            config.mode,
            config.tx.slot,
            tx.capacity(),
            rx.capacity()
        );

        Ok(Can {
            state: Mutex::new(RefCell::new(State {
                queues: InterruptAdapter::new(tx, rx),
                dependencies,
                config,
                reported_losses: 0,
            })),
        })
    }
}

struct State<'a, D> {
    queues: InterruptAdapter<'a>,
    dependencies: D,
    config: CanConfig,
    /// Losses already reported through [`Error::Overrun`]
    reported_losses: usize,
}

impl<D> State<'_, D> {
    fn receive_losses(&self) -> usize {
        self.queues
            .rx
            .overflow_count()
            .wrapping_add(self.queues.hardware_overruns())
    }
}

/// An operational CAN bus.
///
/// All methods take `&self` and run with interrupts masked, so a single
/// instance can be shared between the application and the CAN interrupt
/// handler, for example through a `static`.
pub struct Can<'a, D> {
    state: Mutex<RefCell<State<'a, D>>>,
}

impl<'a, D: Dependencies> Can<'a, D> {
    fn with<R>(&self, f: impl FnOnce(&mut State<'a, D>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    /// Queue `frame` for transmission.
    ///
    /// If the transmit buffer is idle the frame is handed to the hardware
    /// right away. A full queue drops the frame and counts the overflow.
    pub fn transmit(&self, frame: &CanFrame) -> Result<(), QueueFull> {
        self.with(|s| s.queues.tx.enqueue(frame, &mut s.dependencies))
    }

    /// Oldest received frame, if any
    pub fn receive(&self) -> Option<CanFrame> {
        self.with(|s| s.queues.rx.dequeue())
    }

    /// Received frames waiting to be picked up
    pub fn pending_count(&self) -> usize {
        self.with(|s| s.queues.rx.pending_count())
    }

    /// Frames refused by the transmit queue
    pub fn transmit_overflow_count(&self) -> usize {
        self.with(|s| s.queues.tx.overflow_count())
    }

    /// Frames dropped because the receive queue was full
    pub fn receive_overflow_count(&self) -> usize {
        self.with(|s| s.queues.rx.overflow_count())
    }

    /// Queued frames discarded by [`crate::config::OverflowPolicy::ResetAll`]
    pub fn transmit_discarded(&self) -> usize {
        self.with(|s| s.queues.tx.discarded())
    }

    /// Receive overruns reported by the peripheral
    pub fn hardware_overruns(&self) -> usize {
        self.with(|s| s.queues.hardware_overruns())
    }

    /// State of the transmit buffer
    pub fn transmit_state(&self) -> TxState {
        self.with(|s| s.queues.tx.state())
    }

    /// The configuration the bus was finalized with
    pub fn config(&self) -> CanConfig {
        self.with(|s| s.config)
    }

    /// Service the CAN interrupt. Call this from the interrupt handler.
    ///
    /// Returns every flag that was cleared, including the ones the driver has
    /// no handler for.
    pub fn on_interrupt(&self) -> InterruptSet {
        self.with(|s| s.queues.service(&mut s.dependencies))
    }

    /// Transmission from message object `slot` has completed.
    ///
    /// For HALs dispatching interrupt causes themselves instead of using
    /// [`Can::on_interrupt`].
    pub fn on_transmit_complete(&self, slot: u8) {
        self.with(|s| s.queues.on_transmit_complete(slot, &mut s.dependencies))
    }

    /// Message object `slot` holds a received frame.
    ///
    /// For HALs dispatching interrupt causes themselves instead of using
    /// [`Can::on_interrupt`].
    pub fn on_receive_complete(&self, slot: u8) {
        self.with(|s| s.queues.on_receive_complete(slot, &mut s.dependencies))
    }

    /// Disable all interrupts and give back the peripheral dependencies.
    pub fn release(self) -> D {
        let mut state = self.state.into_inner().into_inner();
        state.dependencies.set_interrupt_enable(0);
        state.dependencies
    }
}

impl<D: Dependencies> embedded_can::nb::Can for Can<'_, D> {
    type Frame = CanFrame;
    type Error = Error;

    /// Queues the frame and never replaces a pending one. A full queue is
    /// reported as [`nb::Error::WouldBlock`].
    fn transmit(&mut self, frame: &Self::Frame) -> nb::Result<Option<Self::Frame>, Self::Error> {
        Self::transmit(self, frame)
            .map(|()| None)
            .map_err(|QueueFull| nb::Error::WouldBlock)
    }

    /// Frames lost since the previous call are reported once as
    /// [`Error::Overrun`] before the next frame is returned.
    fn receive(&mut self) -> nb::Result<Self::Frame, Self::Error> {
        self.with(|s| {
            let losses = s.receive_losses();
            if losses != s.reported_losses {
                s.reported_losses = losses;
                return Err(nb::Error::Other(Error::Overrun));
            }
            s.queues.rx.dequeue().ok_or(nb::Error::WouldBlock)
        })
    }
}
