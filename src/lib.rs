//! vvcsession - Session control and Annex-B packaging for a VVC encoder
//!
//! This library provides:
//! - [`Session`]: the encoder lifecycle (init, passes, encode/flush, uninit)
//!   with input validation and a fault boundary around the engine
//! - [`annexb`]: serialization of access units into caller-owned buffers
//! - [`engine`]: the engine contract and a synthetic reference engine
//! - [`ffi`]: a C ABI over all of the above
//!
//! ```no_run
//! use vvcsession::{AccessUnitBuffer, Config, Frame, Plane, Session};
//!
//! let mut session = Session::default();
//! session.init(&Config::new(64, 64))?;
//!
//! let luma = vec![512i16; 64 * 64];
//! let chroma = vec![512i16; 32 * 32];
//! let frame = Frame::new([
//!     Plane::new(&luma, 64, 64, 64),
//!     Plane::new(&chroma, 32, 32, 32),
//!     Plane::new(&chroma, 32, 32, 32),
//! ]);
//!
//! let mut payload = vec![0u8; 1 << 16];
//! let mut au = AccessUnitBuffer::new(&mut payload);
//! session.encode(Some(&frame), &mut au)?;
//! while !session.encode(None, &mut au)? {}
//! session.uninit()?;
//! # Ok::<(), vvcsession::Error>(())
//! ```

pub mod annexb;
pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod frame;
pub mod heap;
pub mod log;
pub mod nal;
pub mod rate_control;
pub mod session;
pub mod simd;

pub use annexb::{access_unit_size, to_annexb, write_access_unit, AccessUnitBuffer};
pub use config::{ChromaFormat, Config, FilterMode, TemporalFilter};
pub use engine::{Engine, EngineFactory, SyntheticEngine};
pub use error::{error_message, EngineFault, EngineResult, Error, ErrorCode, Result};
pub use frame::{Frame, Plane, PlaneId};
pub use log::{Logger, MessageLevel};
pub use nal::{AccessUnit, NalUnit, NalUnitType, SliceType};
pub use session::{Session, SessionState};
pub use simd::SimdLevel;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
