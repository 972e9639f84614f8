//! Round-trip and size tests for the LZSS codec.

use carman_core::crc::Crc32;
use carman_lzss::{EncodeOutcome, LzssDecoder, LzssEncoder, WINDOW_SIZE, decode_lzss, encode_lzss};
use proptest::prelude::*;

fn lcg_bytes(len: usize, alphabet: &[u8]) -> Vec<u8> {
    let mut seed: u64 = 0x123456789ABCDEF0;
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            alphabet[(seed >> 33) as usize % alphabet.len()]
        })
        .collect()
}

fn roundtrip(data: &[u8]) {
    let Some(packed) = encode_lzss(data).unwrap() else {
        return;
    };
    assert!(packed.len() < data.len());
    assert_eq!(decode_lzss(&packed, data.len() as u32).unwrap(), data);
}

#[test]
fn test_window_wraps_several_times() {
    // Several windows worth of low-entropy data so the dictionary evicts
    // and the positions wrap.
    let data = lcg_bytes(WINDOW_SIZE * 5 + 123, b"abcd");
    let packed = encode_lzss(&data).unwrap().expect("four-letter text compresses");
    assert_eq!(decode_lzss(&packed, data.len() as u32).unwrap(), data);
}

#[test]
fn test_long_runs_and_text() {
    roundtrip(&vec![0u8; 100_000]);
    roundtrip(&b"TOBEORNOTTOBEORTOBEORNOT".repeat(500));

    let mut mixed = b"header ".repeat(40);
    mixed.extend(lcg_bytes(3000, b"0123456789abcdef"));
    mixed.extend(vec![b' '; 5000]);
    roundtrip(&mixed);
}

#[test]
fn test_random_data_is_refused() {
    let data = lcg_bytes(10_000, &(0..=255).collect::<Vec<u8>>());
    assert!(encode_lzss(&data).unwrap().is_none());
}

#[test]
fn test_crc_matches_on_both_sides() {
    let data = b"Pack my box with five dozen liquor jugs. ".repeat(64);
    let mut packed = Vec::new();
    let outcome = LzssEncoder::new()
        .compress(&mut &data[..], &mut packed, data.len() as u32)
        .unwrap();
    let EncodeOutcome::Compressed { compressed_size, crc } = outcome else {
        panic!("text should compress");
    };
    assert_eq!(compressed_size as usize, packed.len());
    assert_eq!(crc, Crc32::compute(&data));

    let mut out = Vec::new();
    let decoded_crc = LzssDecoder::new()
        .expand(&mut &packed[..], &mut out, data.len() as u32)
        .unwrap();
    assert_eq!(decoded_crc, crc);
    assert_eq!(out, data);
}

proptest! {
    #[test]
    fn test_roundtrip_arbitrary(data in prop::collection::vec(any::<u8>(), 0..3000)) {
        if let Some(packed) = encode_lzss(&data).unwrap() {
            prop_assert!(packed.len() < data.len());
            let unpacked = decode_lzss(&packed, data.len() as u32).unwrap();
            prop_assert_eq!(&data[..], &unpacked[..]);
        }
    }
}

proptest! {
    #[test]
    fn test_roundtrip_small_alphabet(
        data in prop::collection::vec(prop::sample::select(b"ab\n".to_vec()), 1..20_000)
    ) {
        let packed = encode_lzss(&data).unwrap();
        if let Some(packed) = packed {
            let unpacked = decode_lzss(&packed, data.len() as u32).unwrap();
            prop_assert_eq!(&data[..], &unpacked[..]);
        }
    }
}

proptest! {
    #[test]
    fn test_decoder_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..500),
        size in 0u32..2000
    ) {
        let _ = decode_lzss(&data, size);
    }
}
