//! Encoder session configuration

use crate::log::MessageLevel;
use crate::{Error, Result};

/// Maximum number of lead or trail frames used by temporal filtering
pub const MCTF_RANGE: u32 = 4;

/// Highest allowed quantization parameter
pub const MAX_QP: i32 = 63;

/// Chroma sampling format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub enum ChromaFormat {
    /// 4:0:0 monochrome, no chroma planes
    Cf400 = 0,
    /// 4:2:0, chroma planes half width and half height
    #[default]
    Cf420 = 1,
    /// 4:2:2, chroma planes half width
    Cf422 = 2,
    /// 4:4:4, chroma planes full size
    Cf444 = 3,
}

impl ChromaFormat {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(ChromaFormat::Cf400),
            1 => Some(ChromaFormat::Cf420),
            2 => Some(ChromaFormat::Cf422),
            3 => Some(ChromaFormat::Cf444),
            _ => None,
        }
    }

    pub fn has_chroma(self) -> bool {
        self != ChromaFormat::Cf400
    }

    /// Horizontal and vertical chroma subsampling shifts
    pub fn scale(self) -> (u32, u32) {
        match self {
            ChromaFormat::Cf400 | ChromaFormat::Cf444 => (0, 0),
            ChromaFormat::Cf420 => (1, 1),
            ChromaFormat::Cf422 => (1, 0),
        }
    }

    /// Size of a chroma plane for a luma plane of the given size
    pub fn chroma_size(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            ChromaFormat::Cf400 => (0, 0),
            _ => {
                let (sx, sy) = self.scale();
                ((width + sx) >> sx, (height + sy) >> sy)
            }
        }
    }
}

/// Temporal pre-filter mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub enum FilterMode {
    Off = 0,
    On = 1,
    #[default]
    Auto = 2,
}

/// Temporal pre-filter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TemporalFilter {
    pub mode: FilterMode,
    /// Frames supplied before the first coded picture, used only for filtering
    pub lead_frames: u32,
    /// Frames supplied after the last coded picture, used only for filtering
    pub trail_frames: u32,
}

/// Encoder session configuration
///
/// `Session::init` keeps the caller's copy and a normalized copy with every
/// automatic option resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Source picture width in luma samples
    pub source_width: u32,
    /// Source picture height in luma samples
    pub source_height: u32,
    /// Chroma format of the input pictures
    pub source_chroma_format: ChromaFormat,
    /// Chroma format coded internally; `None` follows the source
    pub internal_chroma_format: Option<ChromaFormat>,
    /// Frames per second
    pub frame_rate: u32,
    /// Base quantization parameter (0-63)
    pub qp: i32,
    /// Target bitrate in bits per second; 0 selects constant QP
    pub target_bitrate: u32,
    /// Number of rate-control passes (1 or 2)
    pub num_passes: u32,
    /// Pictures per group of pictures
    pub gop_size: u32,
    /// Distance between intra pictures; 0 derives about one second
    pub intra_period: u32,
    /// Worker threads; negative selects all available cores
    pub threads: i32,
    /// Temporal pre-filter
    pub temporal_filter: TemporalFilter,
    /// Enable visual-activity driven QP adaptation
    pub adaptive_qp: bool,
    /// Message verbosity
    pub verbosity: MessageLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_width: 1920,
            source_height: 1080,
            source_chroma_format: ChromaFormat::Cf420,
            internal_chroma_format: None,
            frame_rate: 60,
            qp: 32,
            target_bitrate: 0,
            num_passes: 1,
            gop_size: 32,
            intra_period: 0,
            threads: -1,
            temporal_filter: TemporalFilter::default(),
            adaptive_qp: true,
            verbosity: MessageLevel::Warning,
        }
    }
}

impl Config {
    /// Configuration for a given picture size, other options at defaults
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            source_width: width,
            source_height: height,
            ..Default::default()
        }
    }

    /// Chroma format used internally (resolved or following the source)
    pub fn chroma_format(&self) -> ChromaFormat {
        self.internal_chroma_format
            .unwrap_or(self.source_chroma_format)
    }

    pub fn lead_frames(&self) -> u32 {
        self.temporal_filter.lead_frames
    }

    pub fn trail_frames(&self) -> u32 {
        self.temporal_filter.trail_frames
    }

    /// Check the options without resolving anything
    pub fn validate(&self) -> Result<()> {
        if self.source_width == 0 || self.source_height == 0 {
            return Err(Error::Parameter(format!(
                "invalid source size {}x{}",
                self.source_width, self.source_height
            )));
        }

        let (sx, sy) = self.chroma_format().scale();
        if self.source_width % (1 << sx) != 0 || self.source_height % (1 << sy) != 0 {
            return Err(Error::Parameter(format!(
                "source size {}x{} is not a multiple of the chroma subsampling",
                self.source_width, self.source_height
            )));
        }

        if self.frame_rate == 0 {
            return Err(Error::Parameter("frame rate must be positive".to_string()));
        }

        if !(0..=MAX_QP).contains(&self.qp) {
            return Err(Error::Parameter(format!(
                "QP {} out of range 0..={}",
                self.qp, MAX_QP
            )));
        }

        if !(1..=2).contains(&self.num_passes) {
            return Err(Error::Parameter(format!(
                "number of passes must be 1 or 2, got {}",
                self.num_passes
            )));
        }

        if self.num_passes == 2 && self.target_bitrate == 0 {
            return Err(Error::Parameter(
                "two-pass encoding requires a target bitrate".to_string(),
            ));
        }

        if !self.gop_size.is_power_of_two() || self.gop_size > 32 {
            return Err(Error::Parameter(format!(
                "GOP size {} not supported, use 1, 2, 4, 8, 16 or 32",
                self.gop_size
            )));
        }

        if self.intra_period != 0 && self.intra_period % self.gop_size != 0 {
            return Err(Error::Parameter(format!(
                "intra period {} must be a multiple of the GOP size {}",
                self.intra_period, self.gop_size
            )));
        }

        let filter = &self.temporal_filter;
        if filter.lead_frames > MCTF_RANGE || filter.trail_frames > MCTF_RANGE {
            return Err(Error::Parameter(format!(
                "lead/trail frames must not exceed {}",
                MCTF_RANGE
            )));
        }

        if filter.mode == FilterMode::Off && (filter.lead_frames > 0 || filter.trail_frames > 0)
        {
            return Err(Error::Parameter(
                "lead/trail frames require temporal filtering".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate and return a copy with every automatic option resolved
    pub fn normalized(&self) -> Result<Config> {
        self.validate()?;

        let mut cfg = self.clone();

        cfg.internal_chroma_format = Some(self.chroma_format());

        if cfg.intra_period == 0 {
            // about one second, rounded up to whole GOPs
            let gops = cfg.frame_rate.div_ceil(cfg.gop_size).max(1);
            cfg.intra_period = gops * cfg.gop_size;
        }

        if cfg.threads < 0 {
            cfg.threads = std::thread::available_parallelism()
                .map(|n| n.get() as i32)
                .unwrap_or(1);
        }

        if cfg.temporal_filter.mode == FilterMode::Auto {
            cfg.temporal_filter.mode = if cfg.gop_size > 1 {
                FilterMode::On
            } else {
                FilterMode::Off
            };
        }

        if cfg.temporal_filter.mode == FilterMode::Off
            && (cfg.temporal_filter.lead_frames > 0 || cfg.temporal_filter.trail_frames > 0)
        {
            return Err(Error::Parameter(
                "lead/trail frames require temporal filtering".to_string(),
            ));
        }

        Ok(cfg)
    }
}
