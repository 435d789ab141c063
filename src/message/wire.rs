//! Conversion between [`CanFrame`] and the message object word layout
//!
//! ```text
//! Word 0: UUUx xxxx xxxx xxxx
//!            |____________|||
//!               SID10:0   SRR IDE
//! Word 1: UUUU xxxx xxxx xxxx
//!              |____________|
//!                 EID17:6
//! Word 2: xxxx xxrU UUUU xxxx
//!         |_____||       |__|
//!         EID5:0 RTR     DLC
//! Word 3-6: data bytes, low byte first
//! ```
//!
//! An extended identifier is split 11 + 12 + 6 bits over words 0, 1 and 2.
//! Remote requests are flagged twice, in SRR and in RTR.

use super::{CanFrame, PayloadKind, MAX_DATA_LEN};
use bitfield::bitfield;
use ecan_core::{WireWords, WIRE_WORDS};
use embedded_can::{ExtendedId, Id, StandardId};

bitfield! {
    /// Word 0 of a message object
    #[derive(Copy, Clone, Default)]
    pub struct Word0(u16);
    impl Debug;

    /// Standard identifier, or bits 28..18 of an extended identifier
    pub u16, sid, set_sid: 12, 2;
    /// Substitute remote request
    pub srr, set_srr: 1;
    /// Identifier extension
    pub ide, set_ide: 0;
}

bitfield! {
    /// Word 1 of a message object
    #[derive(Copy, Clone, Default)]
    pub struct Word1(u16);
    impl Debug;

    /// Bits 17..6 of an extended identifier
    pub u16, eid_17_6, set_eid_17_6: 11, 0;
}

bitfield! {
    /// Word 2 of a message object
    #[derive(Copy, Clone, Default)]
    pub struct Word2(u16);
    impl Debug;

    /// Bits 5..0 of an extended identifier
    pub u16, eid_5_0, set_eid_5_0: 15, 10;
    /// Remote transmission request
    pub rtr, set_rtr: 9;
    /// Data length code
    pub u16, dlc, set_dlc: 3, 0;
}

const SID_MASK: u32 = 0x7ff;
const EID_17_6_MASK: u32 = 0xfff;
const EID_5_0_MASK: u32 = 0x3f;
const DLC_MASK: u16 = 0xf;

/// Length of one frame as stored in the driver's ring buffers
pub const RECORD_LEN: usize = 16;

/// A frame serialized for storage in a ring buffer
///
/// Bytes 0..14 are the wire words in little endian order, byte 14 is the
/// hardware slot and byte 15 is reserved.
pub type Record = [u8; RECORD_LEN];

const SLOT_OFFSET: usize = 2 * WIRE_WORDS;

/// Pack `frame` into the peripheral's word layout.
pub fn encode(frame: &CanFrame) -> WireWords {
    let mut w0 = Word0(0);
    let mut w1 = Word1(0);
    let mut w2 = Word2(0);

    match frame.id() {
        Id::Standard(id) => w0.set_sid(id.as_raw()),
        Id::Extended(id) => {
            let raw = id.as_raw();
            w0.set_ide(true);
            w0.set_sid(((raw >> 18) & SID_MASK) as u16);
            w1.set_eid_17_6(((raw >> 6) & EID_17_6_MASK) as u16);
            w2.set_eid_5_0((raw & EID_5_0_MASK) as u16);
        }
    }

    let remote = frame.payload_kind() == PayloadKind::RemoteRequest;
    w0.set_srr(remote);
    w2.set_rtr(remote);
    w2.set_dlc(u16::from(frame.valid_length()) & DLC_MASK);

    let mut words = [0; WIRE_WORDS];
    words[0] = w0.0;
    words[1] = w1.0;
    words[2] = w2.0;
    if !remote {
        for (word, pair) in words[3..].iter_mut().zip(frame.raw_data().chunks_exact(2)) {
            *word = u16::from_le_bytes([pair[0], pair[1]]);
        }
    }
    words
}

/// Unpack a frame read from message object `slot`.
pub fn decode(words: &WireWords, slot: u8) -> CanFrame {
    let w0 = Word0(words[0]);
    let w1 = Word1(words[1]);
    let w2 = Word2(words[2]);

    let id = if w0.ide() {
        let raw = (u32::from(w0.sid()) << 18)
            | (u32::from(w1.eid_17_6()) << 6)
            | u32::from(w2.eid_5_0());
        // The field widths add up to 29 bits, so the ID is in range
        Id::Extended(unsafe { ExtendedId::new_unchecked(raw) })
    } else {
        // The field is 11 bits wide, so the ID is in range
        Id::Standard(unsafe { StandardId::new_unchecked(w0.sid()) })
    };

    let len = (w2.dlc() & DLC_MASK) as u8;
    if w0.srr() {
        CanFrame::from_parts(id, PayloadKind::RemoteRequest, [0; MAX_DATA_LEN], len, slot)
    } else {
        let mut data = [0; MAX_DATA_LEN];
        for (pair, word) in data.chunks_exact_mut(2).zip(&words[3..]) {
            pair.copy_from_slice(&word.to_le_bytes());
        }
        CanFrame::from_parts(id, PayloadKind::Data, data, len, slot)
    }
}

/// Serialize `frame`, including its hardware slot, into a ring buffer record.
pub fn serialize(frame: &CanFrame) -> Record {
    let mut record = [0; RECORD_LEN];
    for (bytes, word) in record.chunks_exact_mut(2).zip(encode(frame)) {
        bytes.copy_from_slice(&word.to_le_bytes());
    }
    record[SLOT_OFFSET] = frame.hardware_slot();
    record
}

/// Wire words stored in a ring buffer record
pub fn record_words(record: &Record) -> WireWords {
    let mut words = [0; WIRE_WORDS];
    for (word, bytes) in words.iter_mut().zip(record.chunks_exact(2)) {
        *word = u16::from_le_bytes([bytes[0], bytes[1]]);
    }
    words
}

/// Hardware slot stored in a ring buffer record
pub fn record_slot(record: &Record) -> u8 {
    record[SLOT_OFFSET]
}

/// Inverse of [`serialize`].
pub fn deserialize(record: &Record) -> CanFrame {
    decode(&record_words(record), record_slot(record))
}

#[cfg(test)]
mod test {
    use super::*;
    use embedded_can::Frame;

    fn std_id(raw: u16) -> StandardId {
        StandardId::new(raw).unwrap()
    }

    fn ext_id(raw: u32) -> ExtendedId {
        ExtendedId::new(raw).unwrap()
    }

    #[test]
    fn standard_data_frame_layout() {
        let frame =
            CanFrame::new_data(std_id(0x402), &[0xab, 0xcd, 0xef, 0x12, 0x34, 0x56]).unwrap();
        let words = encode(&frame);
        assert_eq!(words[0], 0x402 << 2);
        assert_eq!(words[1], 0);
        assert_eq!(words[2], 6);
        assert_eq!(&words[3..], &[0xcdab, 0x12ef, 0x5634, 0x0000]);
        assert_eq!(decode(&words, 0), frame);
    }

    #[test]
    fn extended_identifier_split() {
        let frame = CanFrame::new_data(ext_id(0x1fff_ffff), &[]).unwrap();
        let words = encode(&frame);
        assert_eq!(words[0], (0x7ff << 2) | 1);
        assert_eq!(words[1], 0xfff);
        assert_eq!(words[2], 0x3f << 10);
        let decoded = decode(&words, 0);
        assert_eq!(decoded.raw_id(), 0x1fff_ffff);
        assert_eq!(decoded, frame);

        // One bit in each field
        let frame = CanFrame::new_data(ext_id((1 << 18) | (1 << 6) | 1), &[1]).unwrap();
        let words = encode(&frame);
        assert_eq!(words[0], (1 << 2) | 1);
        assert_eq!(words[1], 1);
        assert_eq!(words[2], (1 << 10) | 1);
        assert_eq!(decode(&words, 0), frame);
    }

    #[test]
    fn remote_request_flag_is_duplicated() {
        let frame = CanFrame::new_remote_request(std_id(0x123), 8).unwrap();
        let words = encode(&frame);
        assert_eq!(words[0], (0x123 << 2) | 0x2);
        assert_eq!(words[2], 0x0200 | 8);
        assert_eq!(&words[3..], &[0; 4]);
        let decoded = decode(&words, 0);
        assert!(decoded.is_remote_frame());
        assert_eq!(decoded.valid_length(), 8);
        assert_eq!(decoded, frame);

        let frame = CanFrame::new_remote_request(ext_id(0x0abc_def0), 2).unwrap();
        let words = encode(&frame);
        assert_eq!(words[0] & 0x3, 0x3);
        assert_ne!(words[2] & 0x0200, 0);
        assert_eq!(decode(&words, 0), frame);
    }

    #[test]
    fn round_trips_all_lengths_and_kinds() {
        let payload = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        let ids: [Id; 4] = [
            std_id(0).into(),
            std_id(0x7ff).into(),
            ext_id(0).into(),
            ext_id(0x1555_5555).into(),
        ];
        for id in ids {
            for len in 0..=MAX_DATA_LEN {
                let data = CanFrame::new_data(id, &payload[..len]).unwrap();
                assert_eq!(decode(&encode(&data), 0), data);
                let remote = CanFrame::new_remote_request(id, len as u8).unwrap();
                assert_eq!(decode(&encode(&remote), 0), remote);
            }
        }
    }

    #[test]
    fn standard_decode_ignores_extended_fields() {
        let words = [0x402 << 2, 0x0fff, 0xfc00 | 2, 0x0201, 0, 0, 0];
        let frame = decode(&words, 1);
        assert_eq!(frame.id(), Id::Standard(std_id(0x402)));
        assert_eq!(frame.data(), &[1, 2]);
        assert_eq!(frame.hardware_slot(), 1);
    }

    #[test]
    fn oversized_length_passes_through() {
        let words = [0x100 << 2, 0, 0x000c, 1, 2, 3, 4];
        let frame = decode(&words, 0);
        assert_eq!(frame.valid_length(), 12);
        assert_eq!(frame.data().len(), 8);
        assert_eq!(encode(&frame)[2], 0x000c);
    }

    #[test]
    fn record_keeps_slot() {
        let frame = CanFrame::new_data(ext_id(0x12345), &[9, 8, 7])
            .unwrap()
            .with_slot(3);
        let record = serialize(&frame);
        assert_eq!(record_slot(&record), 3);
        assert_eq!(record[15], 0);
        assert_eq!(record_words(&record), encode(&frame));
        let back = deserialize(&record);
        assert_eq!(back, frame);
        assert_eq!(back.hardware_slot(), 3);
    }
}
