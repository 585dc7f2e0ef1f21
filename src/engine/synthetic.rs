//! Synthetic reference engine
//!
//! Produces structurally valid VVC access units without doing any pixel
//! coding: parameter sets before every IDR, one slice NAL per picture, NAL
//! headers with proper types and temporal ids, and emulation-prevented
//! payloads carrying the picture's QP decisions and a luma digest. The output
//! is not decodable. It exercises everything around a real engine: picture
//! delay, lead/trail frames, flushing, two-pass statistics and the
//! reconstructed-picture callback.

use super::{Engine, ReconCallback};
use crate::annexb::access_unit_size;
use crate::config::Config;
use crate::error::{EngineFault, EngineResult};
use crate::frame::{Frame, OwnedFrame};
use crate::log::Logger;
use crate::nal::{AccessUnit, NalUnit, NalUnitType, SliceType};
use crate::rate_control::{ctu_grid, AdaptiveQp, FixedQp, PictureContext, QpAdvisor};
use std::collections::VecDeque;

/// Sample bit depth written into the sequence parameter set
const BIT_DEPTH: u8 = 10;

#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    pictures: u64,
    bytes: u64,
    qp_sum: i64,
}

/// Engine that emits well-formed but non-decodable NAL units
pub struct SyntheticEngine {
    config: Config,
    advisor: Box<dyn QpAdvisor>,
    recon: Option<ReconCallback>,
    pass: u32,
    queue: VecDeque<OwnedFrame>,
    lead_remaining: u32,
    next_poc: i64,
    first_pass_activity: Vec<f64>,
    reference_activity: Option<f64>,
    stats: Stats,
}

impl SyntheticEngine {
    /// Create an engine whose advisor follows `config.adaptive_qp`
    pub fn new(config: Config, log: &Logger) -> EngineResult<Self> {
        let advisor: Box<dyn QpAdvisor> = if config.adaptive_qp {
            Box::new(AdaptiveQp)
        } else {
            Box::new(FixedQp)
        };
        Self::with_advisor(config, advisor, log)
    }

    pub fn with_advisor(
        config: Config,
        advisor: Box<dyn QpAdvisor>,
        log: &Logger,
    ) -> EngineResult<Self> {
        if config.intra_period == 0 || config.gop_size == 0 {
            return Err(EngineFault::new(
                "engine requires a normalized configuration",
            ));
        }

        log.verbose(format_args!(
            "synthetic engine {}x{} {:?}, GOP {}, intra period {}, lookahead {}",
            config.source_width,
            config.source_height,
            config.chroma_format(),
            config.gop_size,
            config.intra_period,
            lookahead(&config)
        ));

        let lead_remaining = config.lead_frames();
        Ok(Self {
            config,
            advisor,
            recon: None,
            pass: 0,
            queue: VecDeque::new(),
            lead_remaining,
            next_poc: 0,
            first_pass_activity: Vec::new(),
            reference_activity: None,
            stats: Stats::default(),
        })
    }

    fn code_picture(&mut self, pic: OwnedFrame, au: &mut AccessUnit, log: &Logger) -> EngineResult<()> {
        let poc = self.next_poc;
        self.next_poc += 1;

        let gop = self.config.gop_size;
        let intra = poc % self.config.intra_period as i64 == 0;
        let slice_type = if intra {
            SliceType::I
        } else if gop == 1 {
            SliceType::P
        } else {
            SliceType::B
        };
        let tid = temporal_layer(poc, gop);

        let decision = self.advisor.decide(&PictureContext {
            poc,
            slice_type,
            base_qp: self.config.qp,
            luma: pic.luma(),
            first_pass_activity: self.reference_activity,
        })?;

        let (cols, rows) = ctu_grid(self.config.source_width, self.config.source_height);
        if decision.ctu_qp.len() != (cols * rows) as usize {
            return Err(EngineFault::new(format!(
                "advisor returned {} CTU QPs for a {}x{} CTU grid",
                decision.ctu_qp.len(),
                cols,
                rows
            )));
        }

        if self.pass == 0 && self.config.num_passes == 2 {
            self.first_pass_activity.push(decision.visual_activity);
        }

        if intra {
            au.push(self.sps());
            au.push(self.pps(decision.qp));
        }

        let nal_type = if intra {
            NalUnitType::CodedSliceIdrNLp
        } else {
            NalUnitType::CodedSliceTrail
        };

        let mut rbsp = Vec::with_capacity(16 + decision.ctu_qp.len());
        rbsp.extend_from_slice(&(poc as u32).to_be_bytes());
        rbsp.push(slice_type as u8);
        rbsp.push(decision.qp as u8);
        rbsp.extend_from_slice(&(decision.ctu_qp.len() as u16).to_be_bytes());
        rbsp.extend(decision.ctu_qp.iter().map(|&qp| qp as u8));
        rbsp.extend_from_slice(&luma_digest(&pic).to_be_bytes());
        au.push(make_nal(nal_type, tid, rbsp));

        au.cts = pic.cts;
        au.dts = pic.cts;
        au.slice_type = slice_type;
        au.ref_pic = gop == 1 || tid < gop.trailing_zeros() as u8;
        au.temporal_layer = tid as u32;
        au.poc = poc;
        au.status = 0;

        let bytes = access_unit_size(au);
        au.info = format!(
            "POC {:4} TId: {:1} ( {}-SLICE, QP {:2} ) {:10} bits",
            poc,
            tid,
            slice_type.as_char(),
            decision.qp,
            bytes * 8
        );
        log.details(format_args!("{}", au.info));

        self.stats.pictures += 1;
        self.stats.bytes += bytes as u64;
        self.stats.qp_sum += decision.qp as i64;

        if let Some(callback) = self.recon.as_mut() {
            callback(&pic.view());
        }

        Ok(())
    }

    fn sps(&self) -> NalUnit {
        let cfg = &self.config;
        let mut rbsp = vec![0u8, cfg.chroma_format() as u8, BIT_DEPTH];
        rbsp.extend_from_slice(&cfg.source_width.to_be_bytes());
        rbsp.extend_from_slice(&cfg.source_height.to_be_bytes());
        rbsp.push(cfg.gop_size as u8);
        rbsp.extend_from_slice(&cfg.intra_period.to_be_bytes());
        make_nal(NalUnitType::Sps, 0, rbsp)
    }

    fn pps(&self, qp: i32) -> NalUnit {
        make_nal(NalUnitType::Pps, 0, vec![0, 0, qp as u8])
    }
}

/// Pictures held back before coding starts
fn lookahead(config: &Config) -> usize {
    (config.gop_size as usize - 1).max(config.trail_frames() as usize)
}

/// Temporal layer of a picture in a dyadic GOP
fn temporal_layer(poc: i64, gop: u32) -> u8 {
    if gop <= 1 {
        return 0;
    }
    let pos = (poc % gop as i64) as u32;
    if pos == 0 {
        0
    } else {
        (gop.trailing_zeros() - pos.trailing_zeros()) as u8
    }
}

fn luma_digest(pic: &OwnedFrame) -> u32 {
    pic.planes[0]
        .samples
        .iter()
        .fold(0u32, |acc, &s| acc.wrapping_mul(31).wrapping_add(s as u16 as u32))
}

/// Two-byte NAL header followed by the escaped payload with trailing bits
fn make_nal(nal_type: NalUnitType, temporal_id: u8, mut rbsp: Vec<u8>) -> NalUnit {
    rbsp.push(0x80);
    let mut nal = NalUnit {
        nal_type,
        temporal_id,
        payload: Vec::new(),
    };
    let header = nal.header();
    nal.payload.extend_from_slice(&header);
    nal.payload.extend(add_emulation_prevention(&rbsp));
    nal
}

/// Insert 0x03 wherever two zero bytes are followed by a byte <= 3
pub fn add_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() + data.len() / 64 + 1);
    let mut zeros = 0;

    for &byte in data {
        if zeros == 2 && byte <= 3 {
            result.push(3);
            zeros = 0;
        }

        result.push(byte);
        if byte == 0 {
            zeros += 1;
        } else {
            zeros = 0;
        }
    }

    result
}

impl Engine for SyntheticEngine {
    fn init_pass(&mut self, pass: u32, log: &Logger) -> EngineResult<()> {
        if pass > 1 {
            return Err(EngineFault::new(format!("pass {} not supported", pass)));
        }

        if pass == 1 {
            let samples = &self.first_pass_activity;
            self.reference_activity = if samples.is_empty() {
                None
            } else {
                Some(samples.iter().sum::<f64>() / samples.len() as f64)
            };
        } else {
            self.first_pass_activity.clear();
            self.reference_activity = None;
        }

        self.pass = pass;
        self.queue.clear();
        self.lead_remaining = self.config.lead_frames();
        self.next_poc = 0;
        self.stats = Stats::default();

        log.verbose(format_args!(
            "starting pass {} (reference activity {:?})",
            pass, self.reference_activity
        ));
        Ok(())
    }

    fn encode_picture(
        &mut self,
        flush: bool,
        frame: Option<&Frame<'_>>,
        au: &mut AccessUnit,
        log: &Logger,
    ) -> EngineResult<bool> {
        if let Some(frame) = frame {
            if self.lead_remaining > 0 {
                self.lead_remaining -= 1;
                log.details(format_args!(
                    "lead frame {} consumed for filtering",
                    frame.sequence_number
                ));
                return Ok(false);
            }
            self.queue
                .push_back(OwnedFrame::copy_from(frame, self.config.chroma_format()));
        }

        if flush {
            let trail = self.config.trail_frames() as usize;
            if self.queue.len() > trail {
                if let Some(pic) = self.queue.pop_front() {
                    self.code_picture(pic, au, log)?;
                }
            }
            if self.queue.len() <= trail {
                if !self.queue.is_empty() {
                    log.details(format_args!("{} trail frames dropped", self.queue.len()));
                }
                self.queue.clear();
                return Ok(true);
            }
            return Ok(false);
        }

        if self.queue.len() > lookahead(&self.config) {
            if let Some(pic) = self.queue.pop_front() {
                self.code_picture(pic, au, log)?;
            }
        }

        Ok(false)
    }

    fn uninit(&mut self, log: &Logger) -> EngineResult<()> {
        if !self.queue.is_empty() {
            log.warning(format_args!(
                "{} pictures discarded without coding",
                self.queue.len()
            ));
        }
        self.queue.clear();
        self.recon = None;
        Ok(())
    }

    fn print_summary(&self, log: &Logger) {
        let stats = &self.stats;
        let avg_qp = if stats.pictures > 0 {
            stats.qp_sum as f64 / stats.pictures as f64
        } else {
            0.0
        };
        log.info(format_args!(
            "pass {}: {} pictures, {} bytes, average QP {:.2}",
            self.pass, stats.pictures, stats.bytes, avg_qp
        ));
    }

    fn set_recon_callback(&mut self, callback: Option<ReconCallback>) {
        self.recon = callback;
    }
}
