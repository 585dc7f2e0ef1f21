//! FFI (Foreign Function Interface) for C/Go interoperability
//!
//! Every entry point returns an [`ErrorCode`] value as `c_int` unless noted
//! otherwise. Null pointers are rejected before anything else runs, and
//! panics never unwind into the caller.

use crate::annexb::{AccessUnitBuffer, MAX_INFO_STRING_LEN};
use crate::config::{ChromaFormat, Config, FilterMode, TemporalFilter};
use crate::engine::ReconCallback;
use crate::error::{error_message, ErrorCode};
use crate::frame::{Frame, Plane};
use crate::heap::malloc_trim_hook;
use crate::log::{MessageCallback, MessageLevel};
use crate::nal::SliceType;
use crate::simd::SimdLevel;
use crate::{Error, Result, Session};
use libc::{c_char, c_int, c_void};
use std::ffi::{CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;
use std::sync::{Arc, OnceLock};

/// Opaque session handle
pub struct VvcSession {
    session: Session,
    last_error: CString,
    encoder_info: CString,
}

/// FFI configuration structure
///
/// `internal_chroma_format` -1 follows the source format. `temporal_filter`
/// is 0 (off), 1 (on) or 2 (auto).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VvcConfig {
    pub source_width: c_int,
    pub source_height: c_int,
    pub source_chroma_format: c_int,
    pub internal_chroma_format: c_int,
    pub frame_rate: c_int,
    pub qp: c_int,
    pub target_bitrate: c_int,
    pub num_passes: c_int,
    pub gop_size: c_int,
    pub intra_period: c_int,
    pub threads: c_int,
    pub temporal_filter: c_int,
    pub lead_frames: c_int,
    pub trail_frames: c_int,
    pub adaptive_qp: bool,
    pub verbosity: c_int,
}

/// FFI plane structure, sizes in samples
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VvcPlane {
    pub ptr: *const i16,
    pub width: c_int,
    pub height: c_int,
    pub stride: c_int,
}

/// FFI picture structure
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VvcYuvBuffer {
    pub planes: [VvcPlane; 3],
    pub sequence_number: u64,
    pub cts: i64,
    pub cts_valid: bool,
}

/// FFI access unit structure
///
/// `payload` and `payload_size` are set by the caller (or by
/// [`vvcsession_access_unit_alloc_payload`]); everything else is written by
/// [`vvcsession_encode`].
#[repr(C)]
pub struct VvcAccessUnit {
    pub payload: *mut u8,
    pub payload_size: c_int,
    pub payload_used_size: c_int,
    pub essential_bytes: c_int,
    pub rap: bool,
    pub cts: i64,
    pub dts: i64,
    pub cts_valid: bool,
    pub dts_valid: bool,
    pub slice_type: SliceType,
    pub ref_pic: bool,
    pub temporal_layer: c_int,
    pub poc: i64,
    pub status: c_int,
    pub info_string: [c_char; MAX_INFO_STRING_LEN],
}

impl Default for VvcAccessUnit {
    fn default() -> Self {
        Self {
            payload: ptr::null_mut(),
            payload_size: 0,
            payload_used_size: 0,
            essential_bytes: 0,
            rap: false,
            cts: 0,
            dts: 0,
            cts_valid: false,
            dts_valid: false,
            slice_type: SliceType::Auto,
            ref_pic: false,
            temporal_layer: 0,
            poc: 0,
            status: 0,
            info_string: [0; MAX_INFO_STRING_LEN],
        }
    }
}

/// Reconstructed picture callback
pub type VvcReconCallback = unsafe extern "C" fn(ctx: *mut c_void, yuv: *const VvcYuvBuffer);

/// Log message callback; `message` is valid only during the call
pub type VvcLogCallback = unsafe extern "C" fn(ctx: *mut c_void, level: c_int, message: *const c_char);

/// Caller context pointer handed back to C callbacks
#[derive(Clone, Copy)]
struct CallbackContext(*mut c_void);

// SAFETY: the pointer is never dereferenced on the Rust side; the caller
// guarantees it may be used from the thread calling into the session.
unsafe impl Send for CallbackContext {}
unsafe impl Sync for CallbackContext {}

impl CallbackContext {
    fn get(&self) -> *mut c_void {
        self.0
    }
}

fn code_of<T>(result: &Result<T>) -> c_int {
    match result {
        Ok(_) => ErrorCode::Ok as c_int,
        Err(e) => ErrorCode::from(e) as c_int,
    }
}

/// Run an entry point, mapping a panic to `Unspecified`
fn ffi_guard<F>(op: F) -> c_int
where
    F: FnOnce() -> c_int,
{
    panic::catch_unwind(AssertUnwindSafe(op)).unwrap_or(ErrorCode::Unspecified as c_int)
}

/// Convert to a C string, dropping interior NUL bytes
fn to_cstring(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

fn non_negative(value: c_int, name: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::Parameter(format!("{} must not be negative, got {}", name, value)))
}

fn clamp_dim(value: c_int) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl VvcConfig {
    /// Convert into a [`Config`], rejecting values with no meaning
    pub fn to_config(&self) -> Result<Config> {
        let chroma = |raw: c_int| {
            ChromaFormat::from_raw(raw)
                .ok_or_else(|| Error::Parameter(format!("unknown chroma format {}", raw)))
        };

        let internal_chroma_format = match self.internal_chroma_format {
            -1 => None,
            raw => Some(chroma(raw)?),
        };

        let mode = match self.temporal_filter {
            0 => FilterMode::Off,
            1 => FilterMode::On,
            2 => FilterMode::Auto,
            raw => {
                return Err(Error::Parameter(format!(
                    "unknown temporal filter mode {}",
                    raw
                )))
            }
        };

        Ok(Config {
            source_width: non_negative(self.source_width, "source width")?,
            source_height: non_negative(self.source_height, "source height")?,
            source_chroma_format: chroma(self.source_chroma_format)?,
            internal_chroma_format,
            frame_rate: non_negative(self.frame_rate, "frame rate")?,
            qp: self.qp,
            target_bitrate: non_negative(self.target_bitrate, "target bitrate")?,
            num_passes: non_negative(self.num_passes, "number of passes")?,
            gop_size: non_negative(self.gop_size, "GOP size")?,
            intra_period: non_negative(self.intra_period, "intra period")?,
            threads: self.threads,
            temporal_filter: TemporalFilter {
                mode,
                lead_frames: non_negative(self.lead_frames, "lead frames")?,
                trail_frames: non_negative(self.trail_frames, "trail frames")?,
            },
            adaptive_qp: self.adaptive_qp,
            verbosity: MessageLevel::from_raw(self.verbosity),
        })
    }
}

impl From<&Config> for VvcConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            source_width: cfg.source_width as c_int,
            source_height: cfg.source_height as c_int,
            source_chroma_format: cfg.source_chroma_format as c_int,
            internal_chroma_format: cfg.internal_chroma_format.map_or(-1, |c| c as c_int),
            frame_rate: cfg.frame_rate as c_int,
            qp: cfg.qp,
            target_bitrate: cfg.target_bitrate as c_int,
            num_passes: cfg.num_passes as c_int,
            gop_size: cfg.gop_size as c_int,
            intra_period: cfg.intra_period as c_int,
            threads: cfg.threads,
            temporal_filter: match cfg.temporal_filter.mode {
                FilterMode::Off => 0,
                FilterMode::On => 1,
                FilterMode::Auto => 2,
            },
            lead_frames: cfg.temporal_filter.lead_frames as c_int,
            trail_frames: cfg.temporal_filter.trail_frames as c_int,
            adaptive_qp: cfg.adaptive_qp,
            verbosity: cfg.verbosity as c_int,
        }
    }
}

impl VvcPlane {
    /// Borrow the plane's samples
    ///
    /// # Safety
    /// - a non-null `ptr` must point to at least `stride * (height - 1) + width`
    ///   readable samples (stride 0 counts as width) for `'a`
    unsafe fn as_plane<'a>(&self) -> Plane<'a> {
        let mut plane = Plane {
            data: None,
            width: clamp_dim(self.width),
            height: clamp_dim(self.height),
            stride: clamp_dim(self.stride),
        };
        if !self.ptr.is_null() {
            plane.data = Some(slice::from_raw_parts(self.ptr, plane.required_len()));
        }
        plane
    }

    fn from_plane(plane: &Plane<'_>) -> Self {
        Self {
            ptr: plane.data.map_or(ptr::null(), |d| d.as_ptr()),
            width: plane.width as c_int,
            height: plane.height as c_int,
            stride: plane.effective_stride() as c_int,
        }
    }
}

impl VvcYuvBuffer {
    /// # Safety
    /// - every non-null plane pointer must satisfy [`VvcPlane::as_plane`]
    unsafe fn as_frame<'a>(&self) -> Frame<'a> {
        Frame {
            planes: [
                self.planes[0].as_plane(),
                self.planes[1].as_plane(),
                self.planes[2].as_plane(),
            ],
            sequence_number: self.sequence_number,
            cts: self.cts_valid.then_some(self.cts),
        }
    }

    fn from_frame(frame: &Frame<'_>) -> Self {
        Self {
            planes: [
                VvcPlane::from_plane(&frame.planes[0]),
                VvcPlane::from_plane(&frame.planes[1]),
                VvcPlane::from_plane(&frame.planes[2]),
            ],
            sequence_number: frame.sequence_number,
            cts: frame.cts.unwrap_or(0),
            cts_valid: frame.cts.is_some(),
        }
    }
}

impl VvcAccessUnit {
    fn store(&mut self, out: &AccessUnitBuffer<'_>) {
        self.payload_used_size = out.used_size() as c_int;
        self.essential_bytes = out.essential_bytes() as c_int;
        self.rap = out.is_rap();
        self.cts = out.cts.unwrap_or(0);
        self.cts_valid = out.cts.is_some();
        self.dts = out.dts.unwrap_or(0);
        self.dts_valid = out.dts.is_some();
        self.slice_type = out.slice_type;
        self.ref_pic = out.ref_pic;
        self.temporal_layer = out.temporal_layer as c_int;
        self.poc = out.poc;
        self.status = out.status;
        for (dst, &src) in self.info_string.iter_mut().zip(out.info_raw()) {
            *dst = src as c_char;
        }
    }
}

/// Fill `config` with default options
///
/// # Safety
/// - `config` must be a valid pointer to a `VvcConfig`
#[no_mangle]
pub unsafe extern "C" fn vvcsession_config_default(config: *mut VvcConfig) -> c_int {
    if config.is_null() {
        return ErrorCode::Parameter as c_int;
    }
    *config = VvcConfig::from(&Config::default());
    ErrorCode::Ok as c_int
}

/// Create a session; free it with [`vvcsession_destroy`]
#[no_mangle]
pub extern "C" fn vvcsession_create() -> *mut VvcSession {
    panic::catch_unwind(|| {
        let mut session = Session::with_synthetic_engine();
        session.set_post_call_hook(Some(malloc_trim_hook()));
        Box::into_raw(Box::new(VvcSession {
            session,
            last_error: CString::default(),
            encoder_info: CString::default(),
        }))
    })
    .unwrap_or(ptr::null_mut())
}

/// Destroy a session, uninitializing it first if needed
///
/// # Safety
/// - `handle` must come from [`vvcsession_create`] or be null
#[no_mangle]
pub unsafe extern "C" fn vvcsession_destroy(handle: *mut VvcSession) {
    if handle.is_null() {
        return;
    }
    let _ = panic::catch_unwind(AssertUnwindSafe(|| drop(Box::from_raw(handle))));
}

/// Initialize a session
///
/// # Safety
/// - `handle` must be a valid session handle
/// - `config` must be a valid pointer to a `VvcConfig`
#[no_mangle]
pub unsafe extern "C" fn vvcsession_init(handle: *mut VvcSession, config: *const VvcConfig) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }
    if config.is_null() {
        return ErrorCode::Parameter as c_int;
    }

    let session = &mut (*handle).session;
    let config = &*config;
    ffi_guard(|| {
        let result = match config.to_config() {
            Ok(cfg) => session.init(&cfg),
            Err(e) => session.record(Err(e)),
        };
        code_of(&result)
    })
}

/// Start rate-control pass 0 or 1
///
/// # Safety
/// - `handle` must be a valid session handle
#[no_mangle]
pub unsafe extern "C" fn vvcsession_init_pass(handle: *mut VvcSession, pass: c_int) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }

    let session = &mut (*handle).session;
    ffi_guard(|| {
        let result = match u32::try_from(pass) {
            Ok(pass) => session.init_pass(pass),
            Err(_) => session.record(Err(Error::NotSupported(format!(
                "initPass({}) no support for pass {}. use 0 (first pass) and 1 (second pass)",
                pass, pass
            )))),
        };
        code_of(&result)
    })
}

/// Validate a configuration without a session
///
/// # Safety
/// - `config` must be a valid pointer to a `VvcConfig`
#[no_mangle]
pub unsafe extern "C" fn vvcsession_check_config(config: *const VvcConfig) -> c_int {
    if config.is_null() {
        return ErrorCode::Parameter as c_int;
    }

    let config = &*config;
    ffi_guard(|| code_of(&config.to_config().and_then(|cfg| Session::check_config(&cfg))))
}

/// Reconfigure a running session (always unsupported once initialized)
///
/// # Safety
/// - `handle` must be a valid session handle
/// - `config` must be a valid pointer to a `VvcConfig`
#[no_mangle]
pub unsafe extern "C" fn vvcsession_reconfig(handle: *mut VvcSession, config: *const VvcConfig) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }
    if config.is_null() {
        return ErrorCode::Parameter as c_int;
    }

    let session = &mut (*handle).session;
    let config = &*config;
    ffi_guard(|| {
        let result = config
            .to_config()
            .and_then(|cfg| session.reconfig(&cfg));
        code_of(&result)
    })
}

/// Copy the normalized configuration into `config`
///
/// # Safety
/// - `handle` must be a valid session handle
/// - `config` must be a valid pointer to a `VvcConfig`
#[no_mangle]
pub unsafe extern "C" fn vvcsession_get_config(handle: *mut VvcSession, config: *mut VvcConfig) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }
    if config.is_null() {
        return ErrorCode::Parameter as c_int;
    }

    let session = &mut (*handle).session;
    let result = session.config().map(VvcConfig::from);
    match session.record(result) {
        Ok(cfg) => {
            *config = cfg;
            ErrorCode::Ok as c_int
        }
        Err(e) => ErrorCode::from(&e) as c_int,
    }
}

/// Encode one picture, or run one flush step when `yuv` is null
///
/// # Safety
/// - `handle` must be a valid session handle
/// - `yuv` must be null or point to a valid `VvcYuvBuffer` whose planes
///   satisfy the documented sample counts
/// - `au` must point to a valid `VvcAccessUnit` whose `payload` holds
///   `payload_size` writable bytes (or is null)
/// - `done` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn vvcsession_encode(
    handle: *mut VvcSession,
    yuv: *const VvcYuvBuffer,
    au: *mut VvcAccessUnit,
    done: *mut bool,
) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }
    if !done.is_null() {
        *done = false;
    }

    let session = &mut (*handle).session;
    let frame = if yuv.is_null() {
        None
    } else {
        Some((*yuv).as_frame())
    };

    ffi_guard(|| {
        let mut empty: [u8; 0] = [];
        let au = au.as_mut();
        let payload: &mut [u8] = match &au {
            Some(au) if !au.payload.is_null() && au.payload_size > 0 => {
                slice::from_raw_parts_mut(au.payload, au.payload_size as usize)
            }
            _ => &mut empty,
        };

        let mut out = AccessUnitBuffer::new(payload);
        let result = session.encode(frame.as_ref(), &mut out);

        if let Some(au) = au {
            au.store(&out);
        }
        if let (Ok(true), false) = (&result, done.is_null()) {
            *done = true;
        }
        code_of(&result)
    })
}

/// Uninitialize a session; it can be initialized again afterwards
///
/// # Safety
/// - `handle` must be a valid session handle
#[no_mangle]
pub unsafe extern "C" fn vvcsession_uninit(handle: *mut VvcSession) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }

    let session = &mut (*handle).session;
    ffi_guard(|| code_of(&session.uninit()))
}

/// Number of lead frames the caller must feed before the first picture
///
/// # Safety
/// - `handle` must be a valid session handle or null
#[no_mangle]
pub unsafe extern "C" fn vvcsession_get_num_lead_frames(handle: *const VvcSession) -> c_int {
    handle
        .as_ref()
        .map_or(0, |h| h.session.num_lead_frames() as c_int)
}

/// Number of trailing frames the caller feeds after the last picture
///
/// # Safety
/// - `handle` must be a valid session handle or null
#[no_mangle]
pub unsafe extern "C" fn vvcsession_get_num_trail_frames(handle: *const VvcSession) -> c_int {
    handle
        .as_ref()
        .map_or(0, |h| h.session.num_trail_frames() as c_int)
}

/// Log the engine's encoding summary
///
/// # Safety
/// - `handle` must be a valid session handle
#[no_mangle]
pub unsafe extern "C" fn vvcsession_print_summary(handle: *mut VvcSession) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }

    let session = &mut (*handle).session;
    ffi_guard(|| code_of(&session.print_summary()))
}

/// Install (or remove, with a null callback) the reconstructed picture callback
///
/// # Safety
/// - `handle` must be a valid session handle
/// - `callback` must stay callable with `ctx` until replaced or the session
///   is uninitialized
#[no_mangle]
pub unsafe extern "C" fn vvcsession_set_recon_callback(
    handle: *mut VvcSession,
    ctx: *mut c_void,
    callback: Option<VvcReconCallback>,
) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }

    let session = &mut (*handle).session;
    let ctx = CallbackContext(ctx);
    let callback = callback.map(|callback| -> ReconCallback {
        Box::new(move |frame: &Frame<'_>| {
            let yuv = VvcYuvBuffer::from_frame(frame);
            // SAFETY: the caller promised the callback accepts ctx.
            unsafe { callback(ctx.get(), &yuv) };
        })
    });

    ffi_guard(|| code_of(&session.set_recon_callback(callback)))
}

/// Install (or remove, with a null callback) the log message callback
///
/// # Safety
/// - `handle` must be a valid session handle
/// - `callback` must stay callable with `ctx` until replaced or the session
///   is destroyed
#[no_mangle]
pub unsafe extern "C" fn vvcsession_register_log_callback(
    handle: *mut VvcSession,
    ctx: *mut c_void,
    callback: Option<VvcLogCallback>,
) -> c_int {
    if handle.is_null() {
        return ErrorCode::Initialize as c_int;
    }

    let session = &mut (*handle).session;
    let ctx = CallbackContext(ctx);
    let callback = callback.map(|callback| -> MessageCallback {
        Arc::new(move |level: MessageLevel, message: &str| {
            let message = to_cstring(message);
            // SAFETY: the caller promised the callback accepts ctx.
            unsafe { callback(ctx.get(), level as c_int, message.as_ptr()) };
        })
    });

    session.register_message_callback(callback);
    ErrorCode::Ok as c_int
}

/// Select a SIMD extension by id; null or "" selects the highest supported
///
/// Returns the selected level's name, or null for an unknown id.
///
/// # Safety
/// - `handle` must be a valid session handle
/// - `id` must be a valid null-terminated string or null
#[no_mangle]
pub unsafe extern "C" fn vvcsession_set_simd_extension(
    handle: *mut VvcSession,
    id: *const c_char,
) -> *const c_char {
    static NAMES: OnceLock<Vec<(SimdLevel, CString)>> = OnceLock::new();

    if handle.is_null() {
        return ptr::null();
    }

    let id = if id.is_null() {
        ""
    } else {
        match CStr::from_ptr(id).to_str() {
            Ok(s) => s,
            Err(_) => return ptr::null(),
        }
    };

    let Some(level) = (*handle).session.set_simd_extension(id) else {
        return ptr::null();
    };

    let names = NAMES.get_or_init(|| {
        [
            SimdLevel::Scalar,
            SimdLevel::Sse41,
            SimdLevel::Sse42,
            SimdLevel::Avx,
            SimdLevel::Avx2,
            SimdLevel::Avx512,
        ]
        .into_iter()
        .map(|level| (level, to_cstring(level.name())))
        .collect()
    });

    names
        .iter()
        .find(|(l, _)| *l == level)
        .map_or(ptr::null(), |(_, name)| name.as_ptr())
}

/// Get version string
#[no_mangle]
pub extern "C" fn vvcsession_get_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// Version and capability string of an initialized session
///
/// The pointer stays valid until the next call on this handle.
///
/// # Safety
/// - `handle` must be a valid session handle
#[no_mangle]
pub unsafe extern "C" fn vvcsession_get_encoder_info(handle: *mut VvcSession) -> *const c_char {
    let Some(handle) = handle.as_mut() else {
        return ptr::null();
    };
    handle.encoder_info = to_cstring(handle.session.encoder_info());
    handle.encoder_info.as_ptr()
}

/// Message of the session's most recent failure
///
/// The pointer stays valid until the next call on this handle.
///
/// # Safety
/// - `handle` must be a valid session handle
#[no_mangle]
pub unsafe extern "C" fn vvcsession_get_last_error(handle: *mut VvcSession) -> *const c_char {
    let Some(handle) = handle.as_mut() else {
        return ptr::null();
    };
    handle.last_error = to_cstring(handle.session.last_error());
    handle.last_error.as_ptr()
}

/// Fixed message for an error code; never null
#[no_mangle]
pub extern "C" fn vvcsession_get_error_message(code: c_int) -> *const c_char {
    static MESSAGES: OnceLock<Vec<(c_int, CString)>> = OnceLock::new();
    static UNKNOWN: OnceLock<CString> = OnceLock::new();

    let messages = MESSAGES.get_or_init(|| {
        ErrorCode::ALL
            .into_iter()
            .map(|code| (code as c_int, to_cstring(code.message())))
            .collect()
    });

    match messages.iter().find(|(c, _)| *c == code) {
        Some((_, message)) => message.as_ptr(),
        None => UNKNOWN
            .get_or_init(|| to_cstring(error_message(code)))
            .as_ptr(),
    }
}

/// Reset an access unit to its empty state
///
/// The payload pointer is cleared, not freed.
///
/// # Safety
/// - `au` must be a valid pointer to a `VvcAccessUnit`
#[no_mangle]
pub unsafe extern "C" fn vvcsession_access_unit_default(au: *mut VvcAccessUnit) {
    let Some(au) = au.as_mut() else {
        return;
    };
    *au = VvcAccessUnit::default();
}

/// Allocate a zeroed payload of `size` bytes for an access unit
///
/// # Safety
/// - `au` must be a valid pointer to a `VvcAccessUnit` whose payload is
///   null or was allocated by this function
#[no_mangle]
pub unsafe extern "C" fn vvcsession_access_unit_alloc_payload(au: *mut VvcAccessUnit, size: c_int) -> c_int {
    let Some(au) = au.as_mut() else {
        return ErrorCode::Allocate as c_int;
    };
    if size <= 0 {
        return ErrorCode::Allocate as c_int;
    }

    vvcsession_access_unit_free_payload(au);

    let mut buf: Vec<u8> = Vec::new();
    if buf.try_reserve_exact(size as usize).is_err() {
        return ErrorCode::Allocate as c_int;
    }
    buf.resize(size as usize, 0);

    au.payload = Box::into_raw(buf.into_boxed_slice()) as *mut u8;
    au.payload_size = size;
    ErrorCode::Ok as c_int
}

/// Free a payload allocated by [`vvcsession_access_unit_alloc_payload`]
///
/// # Safety
/// - `au` must be a valid pointer to a `VvcAccessUnit` whose payload is
///   null or was allocated by this library
#[no_mangle]
pub unsafe extern "C" fn vvcsession_access_unit_free_payload(au: *mut VvcAccessUnit) {
    let Some(au) = au.as_mut() else {
        return;
    };
    if !au.payload.is_null() && au.payload_size > 0 {
        let raw = ptr::slice_from_raw_parts_mut(au.payload, au.payload_size as usize);
        drop(Box::from_raw(raw));
    }
    au.payload = ptr::null_mut();
    au.payload_size = 0;
    au.payload_used_size = 0;
}
