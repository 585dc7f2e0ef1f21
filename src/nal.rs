//! NAL unit types and the access unit produced by one encode step

/// NAL unit type
///
/// Discriminants are the `nal_unit_type` values written in the NAL header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NalUnitType {
    CodedSliceTrail = 0,
    CodedSliceStsa = 1,
    CodedSliceRadl = 2,
    CodedSliceRasl = 3,
    CodedSliceIdrWRadl = 7,
    CodedSliceIdrNLp = 8,
    CodedSliceCra = 9,
    CodedSliceGdr = 10,
    Opi = 12,
    Dci = 13,
    Vps = 14,
    Sps = 15,
    Pps = 16,
    PrefixAps = 17,
    SuffixAps = 18,
    PictureHeader = 19,
    AccessUnitDelimiter = 20,
    EndOfSequence = 21,
    EndOfBitstream = 22,
    PrefixSei = 23,
    SuffixSei = 24,
    FillerData = 25,
}

impl NalUnitType {
    /// Every defined type
    pub const ALL: [NalUnitType; 22] = [
        NalUnitType::CodedSliceTrail,
        NalUnitType::CodedSliceStsa,
        NalUnitType::CodedSliceRadl,
        NalUnitType::CodedSliceRasl,
        NalUnitType::CodedSliceIdrWRadl,
        NalUnitType::CodedSliceIdrNLp,
        NalUnitType::CodedSliceCra,
        NalUnitType::CodedSliceGdr,
        NalUnitType::Opi,
        NalUnitType::Dci,
        NalUnitType::Vps,
        NalUnitType::Sps,
        NalUnitType::Pps,
        NalUnitType::PrefixAps,
        NalUnitType::SuffixAps,
        NalUnitType::PictureHeader,
        NalUnitType::AccessUnitDelimiter,
        NalUnitType::EndOfSequence,
        NalUnitType::EndOfBitstream,
        NalUnitType::PrefixSei,
        NalUnitType::SuffixSei,
        NalUnitType::FillerData,
    ];

    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| *t as u8 == raw)
    }

    /// DCI, VPS, SPS, PPS or an adaptation parameter set
    ///
    /// These always get a 4-byte start code.
    pub fn is_parameter_set(self) -> bool {
        matches!(
            self,
            NalUnitType::Dci
                | NalUnitType::Vps
                | NalUnitType::Sps
                | NalUnitType::Pps
                | NalUnitType::PrefixAps
                | NalUnitType::SuffixAps
        )
    }

    /// Coded slice of any kind
    pub fn is_slice(self) -> bool {
        matches!(
            self,
            NalUnitType::CodedSliceTrail
                | NalUnitType::CodedSliceStsa
                | NalUnitType::CodedSliceRadl
                | NalUnitType::CodedSliceRasl
                | NalUnitType::CodedSliceIdrWRadl
                | NalUnitType::CodedSliceIdrNLp
                | NalUnitType::CodedSliceCra
                | NalUnitType::CodedSliceGdr
        )
    }

    /// IDR, CRA or GDR slice: decoding can start here
    pub fn is_random_access(self) -> bool {
        matches!(
            self,
            NalUnitType::CodedSliceIdrWRadl
                | NalUnitType::CodedSliceIdrNLp
                | NalUnitType::CodedSliceCra
                | NalUnitType::CodedSliceGdr
        )
    }

    /// Counted toward the essential bytes of an access unit
    pub fn is_essential(self) -> bool {
        self.is_slice() || self.is_parameter_set()
    }
}

/// One coded NAL unit, payload includes the NAL header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    pub nal_type: NalUnitType,
    pub temporal_id: u8,
    pub payload: Vec<u8>,
}

impl NalUnit {
    pub fn new(nal_type: NalUnitType, payload: Vec<u8>) -> Self {
        Self {
            nal_type,
            temporal_id: 0,
            payload,
        }
    }

    /// Two-byte VVC NAL unit header for this type and temporal id
    pub fn header(&self) -> [u8; 2] {
        [0x00, ((self.nal_type as u8) << 3) | (self.temporal_id + 1)]
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Slice type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub enum SliceType {
    B = 0,
    P = 1,
    I = 2,
    #[default]
    Auto = 3,
}

impl SliceType {
    pub fn as_char(self) -> char {
        match self {
            SliceType::B => 'B',
            SliceType::P => 'P',
            SliceType::I => 'I',
            SliceType::Auto => '?',
        }
    }
}

/// NAL units produced for one output time instant, plus picture metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessUnit {
    pub nals: Vec<NalUnit>,
    /// Composition timestamp
    pub cts: Option<i64>,
    /// Decode timestamp
    pub dts: Option<i64>,
    pub slice_type: SliceType,
    pub ref_pic: bool,
    pub temporal_layer: u32,
    pub poc: i64,
    pub status: i32,
    pub info: String,
}

impl AccessUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, nal: NalUnit) {
        self.nals.push(nal);
    }

    pub fn is_empty(&self) -> bool {
        self.nals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nals.len()
    }
}
