//! Backing storage for the software queues.
use core::mem::MaybeUninit;
use generic_array::{ArrayLength, GenericArray};

/// Queue capacities in bytes
///
/// Each queued frame takes [`crate::message::wire::RECORD_LEN`] bytes, so both
/// lengths must be non-zero multiples of it; this is checked by
/// [`crate::bus::CanConfigurable::finalize`].
///
/// ```
/// use ecan::generic_array::typenum::consts::*;
/// use ecan::messageram::Capacities;
///
/// struct Sizes;
/// impl Capacities for Sizes {
///     // 16 frames
///     type TxQueueBytes = U256;
///     // 32 frames
///     type RxQueueBytes = U512;
/// }
/// ```
pub trait Capacities {
    /// Size of the transmit queue, the frame in flight included
    type TxQueueBytes: ArrayLength<u8>;
    /// Size of the receive queue
    type RxQueueBytes: ArrayLength<u8>;
}

pub(super) struct SharedMemoryInner<C: Capacities> {
    pub(super) tx_queue: GenericArray<u8, C::TxQueueBytes>,
    pub(super) rx_queue: GenericArray<u8, C::RxQueueBytes>,
}

/// Memory shared between the interrupt handler and the application. Provide a
/// struct `C` that implements [`Capacities`] to select the sizes of the
/// queues, then construct this using `SharedMemory::<C>::new()`.
pub struct SharedMemory<C: Capacities>(MaybeUninit<SharedMemoryInner<C>>);

impl<C: Capacities> SharedMemory<C> {
    pub(super) fn init(&mut self) -> &mut SharedMemoryInner<C> {
        self.0 = MaybeUninit::zeroed();
        // Safety: All bits 0 is a valid value for byte arrays.
        unsafe { self.0.assume_init_mut() }
    }

    /// All initialization is handled by the type that uses the memory, so this
    /// type can safely be assigned to a link_section that is not
    /// initialized by the system to control its position in memory.
    pub const fn new() -> Self {
        Self(MaybeUninit::uninit())
    }
}

impl<C: Capacities> Default for SharedMemory<C> {
    fn default() -> Self {
        Self::new()
    }
}
