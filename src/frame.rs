//! Input picture views and their validation
//!
//! Planes borrow caller memory for the duration of one call. Nothing here
//! keeps a reference past that; engines that need a picture later copy it
//! into an [`OwnedFrame`].

use crate::config::{ChromaFormat, Config};
use crate::{Error, Result};

/// Plane index
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum PlaneId {
    Y = 0,
    Cb = 1,
    Cr = 2,
}

/// Borrowed view of one image plane
#[derive(Debug, Clone, Copy, Default)]
pub struct Plane<'a> {
    /// Samples, row after row; `None` stands for a null pointer
    pub data: Option<&'a [i16]>,
    /// Width in samples
    pub width: u32,
    /// Height in samples
    pub height: u32,
    /// Distance between rows in samples; 0 on a chroma plane means `width`
    pub stride: u32,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [i16], width: u32, height: u32, stride: u32) -> Self {
        Self {
            data: Some(data),
            width,
            height,
            stride,
        }
    }

    /// Stride used for addressing, resolving 0 to the plane width
    pub fn effective_stride(&self) -> usize {
        if self.stride == 0 {
            self.width as usize
        } else {
            self.stride as usize
        }
    }

    /// Minimum number of samples the data slice must hold
    pub fn required_len(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        self.effective_stride() * (self.height as usize - 1) + self.width as usize
    }

    /// One row of samples
    ///
    /// Only valid on a plane that passed [`validate_input`].
    pub fn row(&self, y: u32) -> &'a [i16] {
        match self.data {
            Some(data) => {
                let start = y as usize * self.effective_stride();
                &data[start..start + self.width as usize]
            }
            None => &[],
        }
    }
}

/// Borrowed input picture
#[derive(Debug, Clone, Copy, Default)]
pub struct Frame<'a> {
    /// Luma, Cb, Cr; chroma planes are ignored for monochrome
    pub planes: [Plane<'a>; 3],
    /// Caller-assigned running number
    pub sequence_number: u64,
    /// Composition timestamp, if known
    pub cts: Option<i64>,
}

impl<'a> Frame<'a> {
    pub fn new(planes: [Plane<'a>; 3]) -> Self {
        Self {
            planes,
            sequence_number: 0,
            cts: None,
        }
    }

    /// Monochrome picture with only a luma plane
    pub fn luma_only(luma: Plane<'a>) -> Self {
        Self::new([luma, Plane::default(), Plane::default()])
    }

    pub fn plane(&self, id: PlaneId) -> &Plane<'a> {
        &self.planes[id as usize]
    }
}

/// Check an input picture against the session geometry
///
/// Checks run in a fixed order and stop at the first violation. Failures are
/// reported as `Unspecified` with a descriptive message.
pub fn validate_input(frame: &Frame<'_>, config: &Config) -> Result<()> {
    let chroma = config.chroma_format();
    let luma = frame.plane(PlaneId::Y);
    let cb = frame.plane(PlaneId::Cb);
    let cr = frame.plane(PlaneId::Cr);

    if luma.data.is_none() {
        return Err(invalid("InputPicture: invalid input buffers"));
    }

    if chroma.has_chroma() && (cb.data.is_none() || cr.data.is_none()) {
        return Err(invalid("InputPicture: invalid input buffers for chroma"));
    }

    if luma.width != config.source_width {
        return Err(invalid("InputPicture: unsupported width"));
    }

    if luma.height != config.source_height {
        return Err(invalid("InputPicture: unsupported height"));
    }

    if luma.width > luma.stride {
        return Err(invalid("InputPicture: unsupported width stride combination"));
    }

    if chroma.has_chroma() {
        let min_stride = if chroma == ChromaFormat::Cf444 {
            luma.width
        } else {
            luma.width / 2
        };

        if cb.stride != 0 && min_stride > cb.stride {
            return Err(invalid(
                "InputPicture: unsupported width cstride combination for 2nd plane",
            ));
        }

        if cr.stride != 0 && min_stride > cr.stride {
            return Err(invalid(
                "InputPicture: unsupported width cstride combination for 3rd plane",
            ));
        }
    }

    let planes = if chroma.has_chroma() { 3 } else { 1 };
    for (idx, plane) in frame.planes.iter().take(planes).enumerate() {
        let len = plane.data.map_or(0, |d| d.len());
        if len < plane.required_len() {
            return Err(Error::Unspecified(format!(
                "InputPicture: plane {} holds {} samples, needs {}",
                idx,
                len,
                plane.required_len()
            )));
        }
    }

    Ok(())
}

fn invalid(msg: &str) -> Error {
    Error::Unspecified(msg.to_string())
}

/// Owned copy of a picture, packed without row padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    pub planes: Vec<OwnedPlane>,
    pub sequence_number: u64,
    pub cts: Option<i64>,
}

/// Owned, tightly packed plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPlane {
    pub samples: Vec<i16>,
    pub width: u32,
    pub height: u32,
}

impl OwnedPlane {
    pub fn view(&self) -> Plane<'_> {
        Plane::new(&self.samples, self.width, self.height, self.width)
    }
}

impl OwnedFrame {
    /// Copy a validated frame; chroma planes are copied only if `chroma` has them
    pub fn copy_from(frame: &Frame<'_>, chroma: ChromaFormat) -> Self {
        let count = if chroma.has_chroma() { 3 } else { 1 };
        let planes = frame.planes[..count]
            .iter()
            .map(|plane| {
                let mut samples = Vec::with_capacity(plane.width as usize * plane.height as usize);
                for y in 0..plane.height {
                    samples.extend_from_slice(plane.row(y));
                }
                OwnedPlane {
                    samples,
                    width: plane.width,
                    height: plane.height,
                }
            })
            .collect();

        Self {
            planes,
            sequence_number: frame.sequence_number,
            cts: frame.cts,
        }
    }

    /// Borrowed view of this picture
    pub fn view(&self) -> Frame<'_> {
        let mut planes = [Plane::default(); 3];
        for (slot, plane) in planes.iter_mut().zip(&self.planes) {
            *slot = plane.view();
        }
        Frame {
            planes,
            sequence_number: self.sequence_number,
            cts: self.cts,
        }
    }

    pub fn luma(&self) -> Plane<'_> {
        self.planes[0].view()
    }
}
