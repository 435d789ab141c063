//! Handling of messages/frames

pub mod host;
pub mod wire;

use core::cmp::min;
use embedded_can::{ExtendedId, Frame, Id, StandardId};

/// Largest payload of a classic CAN frame
pub const MAX_DATA_LEN: usize = 8;

/// Data does not fit in a classic CAN frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TooMuchData;

/// Identifier width of a frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    /// 11-bit identifier
    Standard,
    /// 29-bit identifier
    Extended,
}

/// What the frame carries
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadKind {
    /// 0-8 byte payload
    Data,
    /// Requests transmission of the identified frame, carries no payload
    RemoteRequest,
}

/// Classic CAN frame
///
/// The hardware slot is bookkeeping of where the frame was staged and does
/// not take part in equality.
#[derive(Debug, Copy, Clone)]
pub struct CanFrame {
    id: Id,
    payload_kind: PayloadKind,
    data: [u8; MAX_DATA_LEN],
    len: u8,
    slot: u8,
}

impl CanFrame {
    /// Data frame carrying `data`.
    pub fn new_data(id: impl Into<Id>, data: &[u8]) -> Result<Self, TooMuchData> {
        if data.len() > MAX_DATA_LEN {
            return Err(TooMuchData);
        }
        let mut payload = [0; MAX_DATA_LEN];
        payload[..data.len()].copy_from_slice(data);
        Ok(Self {
            id: id.into(),
            payload_kind: PayloadKind::Data,
            data: payload,
            len: data.len() as u8,
            slot: 0,
        })
    }

    /// Remote request for `desired_len` bytes of the identified frame.
    pub fn new_remote_request(id: impl Into<Id>, desired_len: u8) -> Result<Self, TooMuchData> {
        if usize::from(desired_len) > MAX_DATA_LEN {
            return Err(TooMuchData);
        }
        Ok(Self {
            id: id.into(),
            payload_kind: PayloadKind::RemoteRequest,
            data: [0; MAX_DATA_LEN],
            len: desired_len,
            slot: 0,
        })
    }

    /// Assemble a frame from fields read off the wire. `len` is taken as is.
    pub(crate) fn from_parts(
        id: Id,
        payload_kind: PayloadKind,
        data: [u8; MAX_DATA_LEN],
        len: u8,
        slot: u8,
    ) -> Self {
        Self {
            id,
            payload_kind,
            data,
            len,
            slot,
        }
    }

    /// The same frame, staged in message object `slot`
    pub fn with_slot(self, slot: u8) -> Self {
        Self { slot, ..self }
    }

    /// CAN identifier
    pub fn id(&self) -> Id {
        self.id
    }

    /// Raw identifier value, 11 or 29 bits wide depending on
    /// [`CanFrame::frame_kind`]
    pub fn raw_id(&self) -> u32 {
        match self.id {
            Id::Standard(id) => id.as_raw().into(),
            Id::Extended(id) => id.as_raw(),
        }
    }

    /// Standard or extended identifier
    pub fn frame_kind(&self) -> FrameKind {
        match self.id {
            Id::Standard(_) => FrameKind::Standard,
            Id::Extended(_) => FrameKind::Extended,
        }
    }

    /// Data or remote request
    pub fn payload_kind(&self) -> PayloadKind {
        self.payload_kind
    }

    /// Number of meaningful payload bytes; the requested length for remote
    /// requests.
    ///
    /// Frames decoded from the peripheral report the raw 4-bit field, which
    /// may exceed 8 on a misconfigured bus.
    pub fn valid_length(&self) -> u8 {
        self.len
    }

    /// All eight payload bytes, including the ones past `valid_length`
    pub fn raw_data(&self) -> &[u8; MAX_DATA_LEN] {
        &self.data
    }

    /// Message object the frame occupies or occupied
    pub fn hardware_slot(&self) -> u8 {
        self.slot
    }
}

impl PartialEq for CanFrame {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.payload_kind == other.payload_kind
            && self.len == other.len
            && Frame::data(self) == Frame::data(other)
    }
}

impl Eq for CanFrame {}

#[cfg(feature = "defmt")]
impl defmt::Format for CanFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "CanFrame {{ id: {=u32:#x}, kind: {}, payload: {}, len: {=u8}, data: {=[u8]:#04x} }}",
            self.raw_id(),
            self.frame_kind(),
            self.payload_kind(),
            self.valid_length(),
            Frame::data(self)
        )
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Self::new_data(id, data).ok()
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        let dlc = u8::try_from(dlc).ok()?;
        Self::new_remote_request(id, dlc).ok()
    }

    fn is_extended(&self) -> bool {
        self.frame_kind() == FrameKind::Extended
    }

    fn is_remote_frame(&self) -> bool {
        self.payload_kind == PayloadKind::RemoteRequest
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.len.into()
    }

    fn data(&self) -> &[u8] {
        match self.payload_kind {
            PayloadKind::Data => &self.data[..min(self.len.into(), MAX_DATA_LEN)],
            PayloadKind::RemoteRequest => &[],
        }
    }
}

/// Build an [`Id`] of the requested width, `None` if `raw` does not fit.
pub fn id_from_raw(raw: u32, kind: FrameKind) -> Option<Id> {
    match kind {
        FrameKind::Standard => u16::try_from(raw)
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard),
        FrameKind::Extended => ExtendedId::new(raw).map(Id::Extended),
    }
}
