//! Rate-control / QP advisor contract
//!
//! An engine asks its advisor for the QP of every picture it codes. The
//! advisor returns a picture QP, one QP per 128x128 coding tree unit and the
//! picture's visual activity.

use crate::config::MAX_QP;
use crate::error::{EngineFault, EngineResult};
use crate::frame::Plane;
use crate::nal::SliceType;

/// Coding tree unit size in luma samples
pub const CTU_SIZE: u32 = 128;

/// Largest QP change the adaptive advisor applies to a picture or a CTU
pub const MAX_QP_OFFSET: i32 = 6;

/// Picture handed to the advisor
#[derive(Debug, Clone, Copy)]
pub struct PictureContext<'a> {
    pub poc: i64,
    pub slice_type: SliceType,
    pub base_qp: i32,
    pub luma: Plane<'a>,
    /// Mean visual activity measured over the whole first pass
    pub first_pass_activity: Option<f64>,
}

/// QP decision for one picture
#[derive(Debug, Clone, PartialEq)]
pub struct QpDecision {
    pub qp: i32,
    /// Raster-order QP per CTU
    pub ctu_qp: Vec<i32>,
    pub visual_activity: f64,
}

/// Per-picture QP advisor
pub trait QpAdvisor: Send {
    fn decide(&mut self, ctx: &PictureContext<'_>) -> EngineResult<QpDecision>;
}

/// Number of CTU columns and rows covering a picture
pub fn ctu_grid(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(CTU_SIZE), height.div_ceil(CTU_SIZE))
}

/// Mean absolute Laplacian over a region of a plane
///
/// Border samples of the plane are skipped. Returns 0 for regions without
/// interior samples.
pub fn visual_activity(plane: &Plane<'_>, x0: u32, y0: u32, width: u32, height: u32) -> f64 {
    let x_start = x0.max(1);
    let y_start = y0.max(1);
    let x_end = (x0 + width).min(plane.width.saturating_sub(1));
    let y_end = (y0 + height).min(plane.height.saturating_sub(1));
    if x_start >= x_end || y_start >= y_end {
        return 0.0;
    }

    let mut sum = 0u64;
    for y in y_start..y_end {
        let above = plane.row(y - 1);
        let row = plane.row(y);
        let below = plane.row(y + 1);
        for x in x_start as usize..x_end as usize {
            let hp = 4 * row[x] as i32
                - row[x - 1] as i32
                - row[x + 1] as i32
                - above[x] as i32
                - below[x] as i32;
            sum += hp.unsigned_abs() as u64;
        }
    }

    let count = (x_end - x_start) as u64 * (y_end - y_start) as u64;
    sum as f64 / count as f64
}

/// Picture visual activity
pub fn picture_activity(luma: &Plane<'_>) -> f64 {
    visual_activity(luma, 0, 0, luma.width, luma.height)
}

fn ctu_count(luma: &Plane<'_>) -> usize {
    let (cols, rows) = ctu_grid(luma.width, luma.height);
    (cols * rows) as usize
}

fn check_qp(qp: i32) -> EngineResult<i32> {
    if (0..=MAX_QP).contains(&qp) {
        Ok(qp)
    } else {
        Err(EngineFault::new(format!("base QP {} out of range", qp)))
    }
}

/// log2 ratio mapped to a QP offset: 3 QP steps per doubling
fn qp_offset(value: f64, reference: f64) -> i32 {
    let ratio = value.max(1.0) / reference.max(1.0);
    ((3.0 * ratio.log2()).round() as i32).clamp(-MAX_QP_OFFSET, MAX_QP_OFFSET)
}

/// Constant QP for every picture and CTU
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedQp;

impl QpAdvisor for FixedQp {
    fn decide(&mut self, ctx: &PictureContext<'_>) -> EngineResult<QpDecision> {
        let qp = check_qp(ctx.base_qp)?;
        Ok(QpDecision {
            qp,
            ctu_qp: vec![qp; ctu_count(&ctx.luma)],
            visual_activity: picture_activity(&ctx.luma),
        })
    }
}

/// Visual-activity driven QP adaptation
///
/// Busy CTUs get a higher QP than the picture, flat CTUs a lower one. In a
/// second pass the picture QP also follows the picture's activity relative
/// to the first-pass mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveQp;

impl QpAdvisor for AdaptiveQp {
    fn decide(&mut self, ctx: &PictureContext<'_>) -> EngineResult<QpDecision> {
        let base = check_qp(ctx.base_qp)?;
        let luma = &ctx.luma;
        let activity = picture_activity(luma);

        let qp = match ctx.first_pass_activity {
            Some(reference) => (base + qp_offset(activity, reference)).clamp(0, MAX_QP),
            None => base,
        };

        let (cols, rows) = ctu_grid(luma.width, luma.height);
        let mut ctu_qp = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let ctu_activity =
                    visual_activity(luma, col * CTU_SIZE, row * CTU_SIZE, CTU_SIZE, CTU_SIZE);
                ctu_qp.push((qp + qp_offset(ctu_activity, activity)).clamp(0, MAX_QP));
            }
        }

        Ok(QpDecision {
            qp,
            ctu_qp,
            visual_activity: activity,
        })
    }
}
