#![cfg(feature = "std")]

mod support;

use either::Either::{Left, Right};
use fitfile::sans::{
    Decoder,
    check::compute,
    header::{DocumentHeaderError, HeaderChecksumMismatch},
};
use proptest::prelude::*;

fn header(size: u8, protocol: u8, profile: u16, data_size: u32) -> [u8; 12] {
    let mut r = [0; 12];
    r[0] = size;
    r[1] = protocol;
    r[2..4].copy_from_slice(&profile.to_le_bytes());
    r[4..8].copy_from_slice(&data_size.to_le_bytes());
    r[8..12].copy_from_slice(b".FIT");
    r
}

proptest! {
    #[test]
    fn short_header_fields(protocol: u8, profile: u16, data_size: u32) {
        let (decoded, successor) = Decoder::advance(header(12, protocol, profile, data_size)).unwrap();

        prop_assert_eq!(decoded.size, 12);
        prop_assert_eq!(decoded.protocol_version, protocol);
        prop_assert_eq!(decoded.profile_version, profile);
        prop_assert_eq!(decoded.data_size, data_size);
        prop_assert_eq!(&decoded.data_type, b".FIT");
        prop_assert!(successor.is_right());
    }

    #[test]
    fn zero_checksum_always_passes(protocol: u8, profile: u16, data_size: u32) {
        let (_, successor) = Decoder::advance(header(14, protocol, profile, data_size)).unwrap();
        let Left(state) = successor else {
            panic!("expected an extended header");
        };

        let (found, _) = state.advance([0, 0]).unwrap();
        prop_assert_eq!(found, 0);
    }

    #[test]
    fn nonzero_checksum_must_match(
        protocol: u8,
        profile: u16,
        data_size: u32,
        stored in 1..=u16::MAX,
    ) {
        let r = header(14, protocol, profile, data_size);
        let calculated = compute(&r);

        let (_, successor) = Decoder::advance(r).unwrap();
        let Left(state) = successor else {
            panic!("expected an extended header");
        };

        match state.advance(stored.to_le_bytes()) {
            Ok((found, _)) => {
                prop_assert_eq!(found, stored);
                prop_assert_eq!(stored, calculated);
            }
            Err(HeaderChecksumMismatch { found, calculated: c }) => {
                prop_assert_eq!(found, stored);
                prop_assert_eq!(c, calculated);
                prop_assert_ne!(stored, calculated);
            }
        }
    }

    #[test]
    fn calculated_checksum_passes(protocol: u8, profile: u16, data_size: u32) {
        let r = header(14, protocol, profile, data_size);
        let calculated = compute(&r);

        let (_, successor) = Decoder::advance(r).unwrap();
        let Left(state) = successor else {
            panic!("expected an extended header");
        };

        prop_assert!(state.advance(calculated.to_le_bytes()).is_ok());
    }

    #[test]
    fn single_bit_flip_changes_checksum(
        protocol: u8,
        profile: u16,
        data_size: u32,
        bit in 0..96usize,
    ) {
        let r = header(14, protocol, profile, data_size);
        let mut flipped = r;
        flipped[bit / 8] ^= 1 << (bit % 8);

        prop_assert_ne!(compute(&r), compute(&flipped));
    }

    #[test]
    fn signature_required(
        protocol: u8,
        profile: u16,
        data_size: u32,
        signature: [u8; 4],
    ) {
        prop_assume!(&signature != b".FIT");

        let mut r = header(12, protocol, profile, data_size);
        r[8..12].copy_from_slice(&signature);

        prop_assert_eq!(Decoder::advance(r).unwrap_err(), DocumentHeaderError::NotFitData);
    }

    #[test]
    fn unknown_sizes_rejected(size in prop_oneof![0..12u8, Just(13u8)]) {
        prop_assert_eq!(
            Decoder::advance(header(size, 0x20, 2132, 0)).unwrap_err(),
            DocumentHeaderError::UnknownHeaderLength(size)
        );
    }
}

#[test]
fn extended_header_against_document() {
    let bytes = support::Document::new().extended().build();
    let r: [u8; 12] = bytes[..12].try_into().unwrap();

    let (_, successor) = Decoder::advance(r).unwrap();
    let state = match successor {
        Left(state) => state,
        Right(_) => panic!("expected an extended header"),
    };

    let (found, _) = state.advance([bytes[12], bytes[13]]).unwrap();
    assert_eq!(found, compute(&bytes[..12]));
    assert_eq!(compute(&bytes), 0);
}
