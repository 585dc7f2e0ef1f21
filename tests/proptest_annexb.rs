//! Property-based tests for access unit serialization.
//!
//! Access units are built from arbitrary NAL type / payload combinations and
//! the serializer's size, start-code, RAP and essential-byte accounting is
//! checked against an independent walk over the NAL list.

use proptest::prelude::*;
use vvcsession::engine::synthetic::add_emulation_prevention;
use vvcsession::{
    access_unit_size, write_access_unit, AccessUnit, AccessUnitBuffer, ErrorCode, NalUnit,
    NalUnitType,
};

fn nal_type() -> impl Strategy<Value = NalUnitType> {
    prop::sample::select(NalUnitType::ALL.to_vec())
}

fn access_unit() -> impl Strategy<Value = AccessUnit> {
    prop::collection::vec((nal_type(), prop::collection::vec(any::<u8>(), 0..64)), 1..12).prop_map(
        |nals| {
            let mut au = AccessUnit::new();
            for (t, payload) in nals {
                au.push(NalUnit::new(t, payload));
            }
            au
        },
    )
}

proptest! {
    /// Predicted size equals written bytes equals reported used size.
    #[test]
    fn size_prediction_matches_output(au in access_unit(), slack in 0usize..32) {
        let predicted = access_unit_size(&au);
        let mut payload = vec![0u8; predicted + slack];
        let mut out = AccessUnitBuffer::new(&mut payload);

        write_access_unit(&au, &mut out).unwrap();
        prop_assert_eq!(out.used_size(), predicted);
        prop_assert_eq!(out.data().len(), predicted);
    }

    /// First NAL and parameter sets get 4-byte start codes, others 3.
    #[test]
    fn start_code_lengths(au in access_unit()) {
        let mut payload = vec![0u8; access_unit_size(&au)];
        let mut out = AccessUnitBuffer::new(&mut payload);
        write_access_unit(&au, &mut out).unwrap();
        let data = out.data();

        let mut pos = 0;
        for (i, nal) in au.nals.iter().enumerate() {
            if i == 0 || nal.nal_type.is_parameter_set() {
                prop_assert_eq!(&data[pos..pos + 4], &[0u8, 0, 0, 1][..]);
                pos += 4;
            } else {
                prop_assert_eq!(&data[pos..pos + 3], &[0u8, 0, 1][..]);
                pos += 3;
            }
            prop_assert_eq!(&data[pos..pos + nal.len()], &nal.payload[..]);
            pos += nal.len();
        }
        prop_assert_eq!(pos, data.len());
    }

    /// RAP flag is set iff an IDR, CRA or GDR slice is present.
    #[test]
    fn rap_flag(au in access_unit()) {
        let mut payload = vec![0u8; access_unit_size(&au)];
        let mut out = AccessUnitBuffer::new(&mut payload);
        write_access_unit(&au, &mut out).unwrap();

        let expected = au.nals.iter().any(|n| matches!(
            n.nal_type,
            NalUnitType::CodedSliceIdrWRadl
                | NalUnitType::CodedSliceIdrNLp
                | NalUnitType::CodedSliceCra
                | NalUnitType::CodedSliceGdr
        ));
        prop_assert_eq!(out.is_rap(), expected);
    }

    /// Essential bytes cover framed slice and parameter-set NALs only.
    #[test]
    fn essential_bytes(au in access_unit()) {
        let mut payload = vec![0u8; access_unit_size(&au)];
        let mut out = AccessUnitBuffer::new(&mut payload);
        write_access_unit(&au, &mut out).unwrap();

        let expected: usize = au
            .nals
            .iter()
            .enumerate()
            .filter(|(_, n)| n.nal_type.is_slice() || n.nal_type.is_parameter_set())
            .map(|(i, n)| {
                let sc = if i == 0 || n.nal_type.is_parameter_set() { 4 } else { 3 };
                sc + n.len()
            })
            .sum();
        prop_assert_eq!(out.essential_bytes(), expected);
        prop_assert!(out.essential_bytes() <= out.used_size());
    }

    /// A short buffer is rejected without writing anything.
    #[test]
    fn no_partial_write(au in access_unit(), shortfall in 1usize..8) {
        let required = access_unit_size(&au);
        let capacity = required.saturating_sub(shortfall);
        let mut payload = vec![0xC3u8; capacity];
        let mut out = AccessUnitBuffer::new(&mut payload);

        let err = write_access_unit(&au, &mut out).unwrap_err();
        prop_assert_eq!(err.code(), ErrorCode::NotEnoughMemory);
        prop_assert_eq!(out.used_size(), 0);
        drop(out);
        prop_assert!(payload.iter().all(|&b| b == 0xC3));
    }

    /// Escaped payloads never contain a start code prefix.
    #[test]
    fn emulation_prevention_removes_start_codes(data in prop::collection::vec(0u8..4, 0..256)) {
        let escaped = add_emulation_prevention(&data);
        prop_assert!(!escaped.windows(3).any(|w| w[0] == 0 && w[1] == 0 && w[2] <= 2));
        prop_assert!(escaped.len() >= data.len());
    }
}
