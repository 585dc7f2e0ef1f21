//! Common test utilities

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vvcsession::{
    AccessUnit, ChromaFormat, Config, Engine, EngineFault, EngineResult, Frame, Logger, NalUnit,
    NalUnitType, Plane, Session,
};

/// Planar 4:2:0 (or other) test picture with a gradient and a moving block
pub struct TestPicture {
    pub width: u32,
    pub height: u32,
    pub y: Vec<i16>,
    pub cb: Vec<i16>,
    pub cr: Vec<i16>,
    chroma: (u32, u32),
}

impl TestPicture {
    pub fn new(width: u32, height: u32, chroma: ChromaFormat, number: u32) -> Self {
        let mut y = vec![0i16; (width * height) as usize];
        for row in 0..height {
            for col in 0..width {
                let mut v = 256 + ((row + col) % 64) as i16 * 4;
                if (col / 8 + number) % 4 == 0 && row < height / 2 {
                    v += 200;
                }
                y[(row * width + col) as usize] = v;
            }
        }

        let (cw, ch) = chroma.chroma_size(width, height);
        let cb = vec![512i16; (cw * ch) as usize];
        let cr = vec![480i16; (cw * ch) as usize];

        Self {
            width,
            height,
            y,
            cb,
            cr,
            chroma: (cw, ch),
        }
    }

    pub fn frame(&self) -> Frame<'_> {
        let (cw, ch) = self.chroma;
        Frame::new([
            Plane::new(&self.y, self.width, self.height, self.width),
            Plane::new(&self.cb, cw, ch, cw),
            Plane::new(&self.cr, cw, ch, cw),
        ])
    }
}

/// Split an Annex-B stream into (start code length, NAL bytes) pairs
pub fn split_annexb(data: &[u8]) -> Vec<(usize, Vec<u8>)> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            let long = i > 0 && data[i - 1] == 0;
            starts.push((if long { i - 1 } else { i }, i + 3));
            i += 3;
        } else {
            i += 1;
        }
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &(sc, body))| {
            let end = starts.get(n + 1).map_or(data.len(), |next| next.0);
            (body - sc, data[body..end].to_vec())
        })
        .collect()
}

/// NAL unit type from a two-byte NAL header
pub fn nal_type_of(nal: &[u8]) -> Option<NalUnitType> {
    nal.get(1).and_then(|b| NalUnitType::from_raw(b >> 3))
}

/// Verify that a file exists and has non-zero size
pub fn verify_file_exists_with_size<P: AsRef<Path>>(path: P) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() > 0,
        Err(_) => false,
    }
}

/// What a [`ScriptedEngine`] does on each encode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    /// One slice per frame, done on the first flush call
    #[default]
    Normal,
    /// Reports done on every call
    AlwaysDone,
    /// Fails every encode call with an engine fault
    Fault,
    /// Panics inside every encode call
    Panic,
    /// Encodes normally but panics when a recon callback is installed
    ReconPanic,
}

/// Engine stub that counts its invocations
pub struct ScriptedEngine {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    payload_len: usize,
    poc: i64,
}

impl Engine for ScriptedEngine {
    fn init_pass(&mut self, _pass: u32, _log: &Logger) -> EngineResult<()> {
        self.poc = 0;
        Ok(())
    }

    fn encode_picture(
        &mut self,
        flush: bool,
        frame: Option<&Frame<'_>>,
        au: &mut AccessUnit,
        _log: &Logger,
    ) -> EngineResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            Behavior::Fault => return Err(EngineFault::new("scripted engine fault")),
            Behavior::Panic => panic!("scripted engine panic"),
            _ => {}
        }

        if frame.is_some() {
            let nal_type = if self.poc == 0 {
                NalUnitType::CodedSliceIdrNLp
            } else {
                NalUnitType::CodedSliceTrail
            };
            let mut payload = vec![0x00, (nal_type as u8) << 3 | 1];
            payload.resize(self.payload_len, 0xA5);
            au.push(NalUnit::new(nal_type, payload));
            au.poc = self.poc;
            au.info = format!("POC {}", self.poc);
            self.poc += 1;
        }

        Ok(flush || self.behavior == Behavior::AlwaysDone)
    }

    fn uninit(&mut self, _log: &Logger) -> EngineResult<()> {
        Ok(())
    }

    fn print_summary(&self, log: &Logger) {
        log.info(format_args!("scripted engine: {} pictures", self.poc));
    }

    fn set_recon_callback(&mut self, _callback: Option<vvcsession::engine::ReconCallback>) {
        if self.behavior == Behavior::ReconPanic {
            panic!("recon install failed");
        }
    }
}

/// Session over a [`ScriptedEngine`] plus its invocation counter
pub fn scripted_session(behavior: Behavior) -> (Session, Arc<AtomicUsize>) {
    scripted_session_with_payload(behavior, 16)
}

pub fn scripted_session_with_payload(behavior: Behavior, payload_len: usize) -> (Session, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let session = Session::new(
        move |_cfg: &Config, _log: &Logger| -> EngineResult<Box<dyn Engine>> {
            Ok(Box::new(ScriptedEngine {
                behavior,
                calls: Arc::clone(&counter),
                payload_len,
                poc: 0,
            }))
        },
    );
    (session, calls)
}

/// Small configuration the tests share: 64x64 4:2:0, GOP 8, one second intra period
pub fn small_config() -> Config {
    let mut cfg = Config::new(64, 64);
    cfg.gop_size = 8;
    cfg.frame_rate = 8;
    cfg
}
