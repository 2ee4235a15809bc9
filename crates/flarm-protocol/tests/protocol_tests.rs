//! Wire-level tests for FLARM sentence handling
//!
//! Covers:
//! - Line reassembly from arbitrary chunking
//! - Real device captures through the full parse path
//! - Property checks on framing and ID normalization

use flarm_protocol::{
    frame, verify_checksum, AircraftType, FlarmId, NmeaCodec, ParseSentence, Pflaa, Pflau,
    Sentence,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    pub const CAPTURE: &[u8] = b"$PFLAU,3,1,2,1,2,-30,2,-32,755,DD8F12!D-KXYZ*0E\r\n\
$PFLAA,0,-10687,-22561,-10283,1,A4F2EE,136,0,269,0.0,0*4E\r\n\
\r\n\
$PFLAA,1,1200,,150,2,DD8F12,,,,-1.2,1*55\r\n";

    /// Push `data` in the given chunk sizes and collect every line
    pub fn lines_from_chunks(data: &[u8], sizes: &[usize]) -> Vec<String> {
        let mut codec = super::NmeaCodec::new();
        let mut lines = Vec::new();
        let mut rest = data;
        let mut sizes = sizes.iter().cycle();

        while !rest.is_empty() {
            let size = (*sizes.next().unwrap_or(&1)).clamp(1, rest.len());
            let (chunk, tail) = rest.split_at(size);
            codec.push_bytes(chunk);
            while let Some(line) = codec.next_line() {
                lines.push(line);
            }
            rest = tail;
        }
        lines
    }
}

// ============================================================================
// Device captures
// ============================================================================

#[test]
fn capture_parses_end_to_end() {
    let lines = helpers::lines_from_chunks(helpers::CAPTURE, &[4096]);
    assert_eq!(lines.len(), 3);

    let pflau = Pflau::parse(&Sentence::parse(&lines[0]).unwrap()).unwrap();
    assert_eq!(pflau.alarm_level, 2);
    assert_eq!(pflau.relative_distance, Some(755));
    let id = pflau.id.unwrap();
    assert_eq!(id.address, 0xDD8F12);
    assert_eq!(id.tail.as_deref(), Some("D-KXYZ"));

    let pflaa = Pflaa::parse(&Sentence::parse(&lines[1]).unwrap()).unwrap();
    assert_eq!(pflaa.relative_north, Some(-10687));
    assert_eq!(pflaa.relative_east, Some(-22561));
    assert_eq!(pflaa.ground_speed, Some(269.0));
    assert_eq!(pflaa.aircraft_type, AircraftType::Unknown);

    let bearingless = Pflaa::parse(&Sentence::parse(&lines[2]).unwrap()).unwrap();
    assert!(bearingless.is_bearingless());
    assert_eq!(bearingless.relative_north, Some(1200));
    assert_eq!(bearingless.track, None);
    assert_eq!(bearingless.climb_rate, Some(-1.2));
    assert_eq!(bearingless.aircraft_type, AircraftType::Glider);
}

#[test]
fn talker_mismatch_is_rejected() {
    let sentence = Sentence::parse("$PFLAU,0,1,2,1,0,,0,,,*4F").unwrap();
    assert!(Pflaa::parse(&sentence).is_err());
}

#[test]
fn short_pflaa_is_rejected() {
    let sentence = Sentence::parse("PFLAA,0,100,200,30,2,DD8F12").unwrap();
    assert!(Pflaa::parse(&sentence).is_err());
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Chunk boundaries never change the decoded lines
        #[test]
        fn chunking_is_transparent(sizes in prop::collection::vec(1usize..40, 1..20)) {
            let whole = helpers::lines_from_chunks(helpers::CAPTURE, &[4096]);
            let chunked = helpers::lines_from_chunks(helpers::CAPTURE, &sizes);
            prop_assert_eq!(chunked, whole);
        }

        /// The codec never yields a terminator or an empty line
        #[test]
        fn codec_lines_are_clean(data in prop::collection::vec(any::<u8>(), 0..2048)) {
            let mut codec = NmeaCodec::new();
            codec.push_bytes(&data);
            while let Some(line) = codec.next_line() {
                prop_assert!(!line.contains('\n'));
                prop_assert!(!line.ends_with('\r'));
                prop_assert!(!line.trim().is_empty());
            }
        }

        /// A framed body always verifies
        #[test]
        fn framed_sentences_verify(body in "[A-Z]{5}(,[-0-9A-Z.!]{0,8}){0,12}") {
            let framed = frame(&body);
            prop_assert!(framed.starts_with('$'));
            prop_assert!(framed.ends_with("\r\n"));
            prop_assert!(verify_checksum(framed.trim_end()).is_ok());
            let sentence = Sentence::parse(&framed).unwrap();
            prop_assert_eq!(sentence.to_string(), body);
        }

        /// Arbitrary input never panics the tokenizer
        #[test]
        fn tokenizer_total(line in ".{0,120}") {
            let _ = Sentence::parse(&line);
        }

        /// Only the last six hex digits form the address
        #[test]
        fn id_is_24_bit(id in "[0-9A-Fa-f]{1,8}") {
            let parsed = FlarmId::parse(&id).unwrap();
            prop_assert!(parsed.address <= 0xFF_FFFF);
            prop_assert!(parsed.id.len() <= 6);
            prop_assert_eq!(parsed.id.clone(), parsed.id.to_uppercase());
        }
    }
}
