//! Flat word encodings for host-side tooling
//!
//! Model-based tools driving the bus from a host exchange frames as fixed
//! size integer vectors rather than structured values. These helpers convert
//! between such vectors and [`CanFrame`].

use super::{id_from_raw, CanFrame, FrameKind, PayloadKind, MAX_DATA_LEN};
use embedded_can::Frame;

impl CanFrame {
    /// Flatten into four words.
    ///
    /// - `[0]`: identifier
    /// - `[1]`: payload bytes 0..4, little endian
    /// - `[2]`: payload bytes 4..8, little endian
    /// - `[3]`: `valid_length << 16`, bit 0 set for remote requests
    pub fn to_host_words(&self) -> [u32; 4] {
        let d = self.raw_data();
        let remote = self.payload_kind() == PayloadKind::RemoteRequest;
        [
            self.raw_id(),
            u32::from_le_bytes([d[0], d[1], d[2], d[3]]),
            u32::from_le_bytes([d[4], d[5], d[6], d[7]]),
            (u32::from(self.valid_length()) << 16) | u32::from(remote),
        ]
    }

    /// Build a frame from an outgoing parameter vector.
    ///
    /// - `[0]`: hardware slot in the low byte, data length in the high byte
    /// - `[1]`, `[2]`: identifier, low and high half
    /// - `[3]`: extended flag in the low byte, remote flag in the high byte
    /// - `[4..8]`: payload, two bytes per word, low byte first
    ///
    /// Returns `None` if the identifier does not fit its width or the length
    /// is larger than 8.
    pub fn from_host_parameters(parameters: &[u16; 8]) -> Option<Self> {
        let slot = parameters[0] as u8;
        let len = (parameters[0] >> 8) as u8;
        let raw_id = u32::from(parameters[1]) | (u32::from(parameters[2]) << 16);
        let kind = if parameters[3] & 0xff != 0 {
            FrameKind::Extended
        } else {
            FrameKind::Standard
        };
        let remote = parameters[3] >> 8 != 0;
        let id = id_from_raw(raw_id, kind)?;

        let frame = if remote {
            CanFrame::new_remote_request(id, len).ok()?
        } else {
            if usize::from(len) > MAX_DATA_LEN {
                return None;
            }
            let mut data = [0; MAX_DATA_LEN];
            for (pair, word) in data.chunks_exact_mut(2).zip(&parameters[4..]) {
                pair.copy_from_slice(&word.to_le_bytes());
            }
            CanFrame::new(id, &data[..usize::from(len)])?
        };
        Some(frame.with_slot(slot))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use embedded_can::{ExtendedId, StandardId};

    #[test]
    fn data_frame_to_host_words() {
        let frame = CanFrame::new_data(StandardId::new(0x300).unwrap(), &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            frame.to_host_words(),
            [0x300, 0x0403_0201, 0x0000_0005, 5 << 16]
        );
    }

    #[test]
    fn remote_frame_to_host_words() {
        let id = ExtendedId::new(0x1abc_d000).unwrap();
        let frame = CanFrame::new_remote_request(id, 3).unwrap();
        assert_eq!(frame.to_host_words(), [0x1abc_d000, 0, 0, (3 << 16) | 1]);
    }

    #[test]
    fn from_parameters() {
        let parameters = [(8 << 8) | 2, 0x0300, 0, 0, 0x1234, 0x5678, 0x1234, 0x5678];
        let frame = CanFrame::from_host_parameters(&parameters).unwrap();
        assert_eq!(frame.raw_id(), 0x300);
        assert_eq!(frame.hardware_slot(), 2);
        assert!(!frame.is_extended());
        assert_eq!(
            frame.data(),
            &[0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0x78, 0x56]
        );

        let frame =
            CanFrame::from_host_parameters(&[4 << 8, 0x5678, 0x1234, 0x0101, 0, 0, 0, 0]).unwrap();
        assert!(frame.is_extended());
        assert!(frame.is_remote_frame());
        assert_eq!(frame.raw_id(), 0x1234_5678);
        assert_eq!(frame.valid_length(), 4);
    }

    #[test]
    fn from_parameters_rejects_invalid() {
        let invalid = [
            // Standard identifier wider than 11 bits
            [0, 0x0800, 0, 0, 0, 0, 0, 0],
            // Extended identifier wider than 29 bits
            [0, 0, 0x2000, 1, 0, 0, 0, 0],
            // Data length above 8
            [9 << 8, 1, 0, 0, 0, 0, 0, 0],
        ];
        for parameters in invalid {
            assert!(CanFrame::from_host_parameters(&parameters).is_none());
        }
    }
}
