//! Badge frame codec.
//!
//! Extracts badge numbers from the raw byte stream of a serial RFID reader.
//! Implements [`Decoder`] so it can sit under a `FramedRead`, but the
//! controller drives it directly from [`BadgeDecoder`](crate::decoder::BadgeDecoder)
//! because reads are polled, not awaited.
//!
//! # Wire Format
//!
//! ```text
//! 0x0A '0' '1' 'A' 'B' '1' '2' '3' '4' '5' '6' [0x0D]
//! ```
//!
//! Bytes before a start marker are skipped. A frame is accepted only when
//! the full payload is present and every payload byte is an ASCII hex
//! digit; the badge number is the eight characters after the two-character
//! site code.
//!
//! ```
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//! use interlock_hardware::codec::BadgeFrameCodec;
//!
//! let mut codec = BadgeFrameCodec::new();
//! let mut buffer = BytesMut::from(&b"\x0A01AB123456\x0D"[..]);
//!
//! let badge = codec.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(badge.as_u32(), 0xAB12_3456);
//! ```

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use interlock_core::{
    BadgeId, Error, Result,
    constants::{BADGE_HEX_LEN, BADGE_HEX_OFFSET, FRAME_LEN, FRAME_START},
};

/// Validate one complete frame and extract its badge number.
///
/// # Errors
///
/// Returns `Error::InvalidBadgeFrame` if the frame has the wrong length, does
/// not begin with the start marker, or carries a non-hex payload.
///
/// # Examples
///
/// ```
/// use interlock_hardware::codec::decode_frame;
///
/// let frame = [0x0A, b'0', b'1', b'A', b'B', b'1', b'2', b'3', b'4', b'5', b'6'];
/// assert_eq!(decode_frame(&frame).unwrap().as_u32(), 2870096982);
///
/// assert!(decode_frame(&frame[..10]).is_err());
/// ```
pub fn decode_frame(frame: &[u8]) -> Result<BadgeId> {
    if frame.len() != FRAME_LEN {
        return Err(Error::InvalidBadgeFrame(format!(
            "expected {FRAME_LEN} bytes, got {}",
            frame.len()
        )));
    }
    if frame[0] != FRAME_START {
        return Err(Error::InvalidBadgeFrame(format!(
            "expected start marker 0x{FRAME_START:02X}, got 0x{:02X}",
            frame[0]
        )));
    }

    let payload = &frame[1..];
    if !payload.iter().all(u8::is_ascii_hexdigit) {
        return Err(Error::InvalidBadgeFrame(format!(
            "payload is not hexadecimal: {payload:02X?}"
        )));
    }

    // All bytes are ASCII hex digits, so the slice is valid UTF-8.
    let hex = std::str::from_utf8(&payload[BADGE_HEX_OFFSET..BADGE_HEX_OFFSET + BADGE_HEX_LEN])
        .map_err(|e| Error::InvalidBadgeFrame(e.to_string()))?;
    BadgeId::from_hex(hex)
}

/// Stream decoder for reader frames.
#[derive(Debug, Default)]
pub struct BadgeFrameCodec {
    _private: (),
}

impl BadgeFrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for BadgeFrameCodec {
    type Item = BadgeId;
    type Error = Error;

    /// Decode the next badge from the buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(badge))` - a valid frame was consumed
    /// - `Ok(None)` - no complete frame yet (noise before a start marker is
    ///   dropped)
    /// - `Err(_)` - a malformed frame was consumed; calling again continues
    ///   with the remaining bytes
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BadgeId>> {
        match src.iter().position(|&b| b == FRAME_START) {
            Some(start) => src.advance(start),
            None => {
                src.clear();
                return Ok(None);
            }
        }

        if src.len() < FRAME_LEN {
            return Ok(None);
        }

        // A second start marker inside the payload means the first frame was
        // cut short; resynchronize on the newer one.
        if let Some(restart) = src[1..FRAME_LEN].iter().position(|&b| b == FRAME_START) {
            src.advance(restart + 1);
            return Err(Error::InvalidBadgeFrame("truncated frame".to_string()));
        }

        let frame = src.split_to(FRAME_LEN);
        decode_frame(&frame).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const SCENARIO_A: [u8; 11] = [
        0x0A, b'0', b'1', b'A', b'B', b'1', b'2', b'3', b'4', b'5', b'6',
    ];

    #[test]
    fn test_decode_frame_scenario() {
        let badge = decode_frame(&SCENARIO_A).unwrap();
        assert_eq!(badge.as_u32(), 0xAB12_3456);
        assert_eq!(badge.to_string(), "2870096982");
    }

    #[test]
    fn test_site_code_is_discarded() {
        let mut other_site = SCENARIO_A;
        other_site[1] = b'F';
        other_site[2] = b'F';
        assert_eq!(decode_frame(&other_site).unwrap(), decode_frame(&SCENARIO_A).unwrap());
    }

    #[rstest]
    #[case(&SCENARIO_A[..10])]
    #[case(&[])]
    #[case(&[0x0A])]
    fn test_decode_frame_short(#[case] frame: &[u8]) {
        assert!(decode_frame(frame).is_err());
    }

    #[test]
    fn test_decode_frame_non_hex_payload() {
        let mut frame = SCENARIO_A;
        frame[6] = b'Z';
        assert!(decode_frame(&frame).is_err());
    }

    #[test]
    fn test_codec_skips_noise_and_stop_byte() {
        let mut codec = BadgeFrameCodec::new();
        let mut buf = BytesMut::from(&b"\xFF\x00garbage"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(b"\x0D\x0A01AB123456\x0D");
        let badge = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(badge.as_u32(), 0xAB12_3456);
        assert_eq!(&buf[..], b"\x0D");
    }

    #[test]
    fn test_codec_waits_for_partial_frame() {
        let mut codec = BadgeFrameCodec::new();
        let mut buf = BytesMut::from(&SCENARIO_A[..6]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 6);

        buf.extend_from_slice(&SCENARIO_A[6..]);
        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_codec_resyncs_on_truncated_frame() {
        let mut codec = BadgeFrameCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"\x0A01AB");
        buf.extend_from_slice(&SCENARIO_A);

        assert!(codec.decode(&mut buf).is_err());
        let badge = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(badge.as_u32(), 0xAB12_3456);
    }

    #[test]
    fn test_codec_consumes_malformed_frame() {
        let mut codec = BadgeFrameCodec::new();
        let mut buf = BytesMut::from(&b"\x0A01XY123456"[..]);
        assert!(codec.decode(&mut buf).is_err());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    proptest! {
        #[test]
        fn prop_wrong_start_marker_never_decodes(
            first in any::<u8>().prop_filter("not the start marker", |b| *b != FRAME_START),
            payload in prop::collection::vec(any::<u8>(), FRAME_LEN - 1),
        ) {
            let mut frame = vec![first];
            frame.extend(payload);
            prop_assert!(decode_frame(&frame).is_err());
        }

        #[test]
        fn prop_wrong_length_never_decodes(
            len in (0usize..64).prop_filter("not the frame length", |n| *n != FRAME_LEN),
            fill in any::<u8>(),
        ) {
            let mut frame = vec![fill; len];
            if let Some(first) = frame.first_mut() {
                *first = FRAME_START;
            }
            prop_assert!(decode_frame(&frame).is_err());
        }

        #[test]
        fn prop_valid_frame_is_deterministic(hex in "[0-9A-Fa-f]{10}") {
            let mut frame = vec![FRAME_START];
            frame.extend_from_slice(hex.as_bytes());
            let first = decode_frame(&frame).unwrap();
            let second = decode_frame(&frame).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(first.as_u32(), u32::from_str_radix(&hex[2..], 16).unwrap());
        }
    }
}
