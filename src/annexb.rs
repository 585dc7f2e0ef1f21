//! Annex-B access unit serialization
//!
//! An access unit is written as a sequence of start-code prefixed NAL units.
//! The first NAL unit and every parameter set get `00 00 00 01`, all others
//! `00 00 01`.
//!
//! Serialization is two-phase: [`access_unit_size`] predicts the framed size,
//! the caller's capacity is checked against it, and only then are bytes
//! copied. The same sizing function is used for the post-copy check, so the
//! prediction and the written byte count cannot drift apart.

use crate::nal::{AccessUnit, NalUnit, SliceType};
use crate::{Error, Result};
use std::borrow::Cow;

/// Four-byte start code; the three-byte form is its tail
pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// Capacity of the info string including its terminator
pub const MAX_INFO_STRING_LEN: usize = 1024;

/// Start code length for a NAL unit at the given position
pub fn start_code_len(first: bool, nal: &NalUnit) -> usize {
    if first || nal.nal_type.is_parameter_set() {
        4
    } else {
        3
    }
}

/// Framed size of each NAL unit, in order
pub fn framed_sizes(au: &AccessUnit) -> impl Iterator<Item = usize> + '_ {
    au.nals
        .iter()
        .enumerate()
        .map(|(i, nal)| start_code_len(i == 0, nal) + nal.len())
}

/// Number of bytes the serialized access unit occupies
pub fn access_unit_size(au: &AccessUnit) -> usize {
    framed_sizes(au).sum()
}

/// Caller-owned output buffer for one serialized access unit
///
/// The payload slice is borrowed for the lifetime of the buffer only.
pub struct AccessUnitBuffer<'a> {
    payload: &'a mut [u8],
    used_size: usize,
    essential_bytes: usize,
    rap: bool,
    pub cts: Option<i64>,
    pub dts: Option<i64>,
    pub slice_type: SliceType,
    pub ref_pic: bool,
    pub temporal_layer: u32,
    pub poc: i64,
    pub status: i32,
    info: [u8; MAX_INFO_STRING_LEN],
}

impl std::fmt::Debug for AccessUnitBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessUnitBuffer")
            .field("capacity", &self.capacity())
            .field("used_size", &self.used_size)
            .field("essential_bytes", &self.essential_bytes)
            .field("rap", &self.rap)
            .field("poc", &self.poc)
            .field("slice_type", &self.slice_type)
            .field("info", &self.info())
            .finish()
    }
}

impl<'a> AccessUnitBuffer<'a> {
    pub fn new(payload: &'a mut [u8]) -> Self {
        Self {
            payload,
            used_size: 0,
            essential_bytes: 0,
            rap: false,
            cts: None,
            dts: None,
            slice_type: SliceType::Auto,
            ref_pic: false,
            temporal_layer: 0,
            poc: 0,
            status: 0,
            info: [0; MAX_INFO_STRING_LEN],
        }
    }

    /// Clear everything the serializer fills in; payload bytes are left alone
    pub fn reset(&mut self) {
        self.used_size = 0;
        self.essential_bytes = 0;
        self.rap = false;
        self.cts = None;
        self.dts = None;
        self.slice_type = SliceType::Auto;
        self.ref_pic = false;
        self.temporal_layer = 0;
        self.poc = 0;
        self.status = 0;
        self.info[0] = 0;
    }

    pub fn capacity(&self) -> usize {
        self.payload.len()
    }

    pub fn used_size(&self) -> usize {
        self.used_size
    }

    /// Serialized bytes of the last access unit
    pub fn data(&self) -> &[u8] {
        &self.payload[..self.used_size]
    }

    pub fn essential_bytes(&self) -> usize {
        self.essential_bytes
    }

    /// Whether the access unit holds an IDR, CRA or GDR slice
    pub fn is_rap(&self) -> bool {
        self.rap
    }

    /// Info string bytes without the terminator
    pub fn info_bytes(&self) -> &[u8] {
        let end = self
            .info
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_INFO_STRING_LEN);
        &self.info[..end]
    }

    pub fn info(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.info_bytes())
    }

    /// Raw terminated info string storage
    pub fn info_raw(&self) -> &[u8; MAX_INFO_STRING_LEN] {
        &self.info
    }

    fn set_info(&mut self, info: &str) {
        let bytes = info.as_bytes();
        let len = bytes.len().min(MAX_INFO_STRING_LEN - 1);
        self.info[..len].copy_from_slice(&bytes[..len]);
        self.info[len] = 0;
    }
}

/// Serialize an access unit into the caller's buffer
///
/// Fails with `NotEnoughMemory` before touching the buffer if it is too
/// small; `used_size` then stays zero.
pub fn write_access_unit(au: &AccessUnit, out: &mut AccessUnitBuffer<'_>) -> Result<()> {
    let required = access_unit_size(au);
    if out.capacity() < required {
        return Err(Error::NotEnoughMemory {
            capacity: out.capacity(),
            required,
        });
    }

    let mut used = 0;
    let mut essential = 0;
    let mut rap = false;

    for (i, nal) in au.nals.iter().enumerate() {
        let sc_len = start_code_len(i == 0, nal);
        out.payload[used..used + sc_len].copy_from_slice(&START_CODE[4 - sc_len..]);
        used += sc_len;

        out.payload[used..used + nal.len()].copy_from_slice(&nal.payload);
        used += nal.len();

        if nal.nal_type.is_essential() {
            essential += sc_len + nal.len();
        }
        if nal.nal_type.is_random_access() {
            rap = true;
        }
    }

    if used != required {
        out.used_size = 0;
        return Err(Error::SizeMismatch {
            predicted: required,
            written: used,
        });
    }

    out.used_size = used;
    out.essential_bytes = essential;
    out.rap = rap;
    out.cts = au.cts;
    out.dts = au.dts;
    out.slice_type = au.slice_type;
    out.ref_pic = au.ref_pic;
    out.temporal_layer = au.temporal_layer;
    out.poc = au.poc;
    out.status = au.status;
    out.set_info(&au.info);

    Ok(())
}

/// Serialize an access unit into a freshly allocated vector
pub fn to_annexb(au: &AccessUnit) -> Result<Vec<u8>> {
    let mut data = vec![0u8; access_unit_size(au)];
    let mut out = AccessUnitBuffer::new(&mut data);
    write_access_unit(au, &mut out)?;
    Ok(data)
}
