//! Encoder session controller
//!
//! A [`Session`] owns the engine, both configuration snapshots and the
//! lifecycle state. Every public operation checks its preconditions first,
//! then runs engine work through [`boundary::guard`] so that neither engine
//! faults nor panics leave the session. Each failure is also recorded as the
//! session's last error.
//!
//! ```text
//! Uninitialized --init--> Initialized --frame--> Encoding --flush--> Flushing --done--> Finalized
//!        ^                     ^                                                           |
//!        +------ uninit -------+------------------------ init_pass ------------------------+
//! ```

use crate::annexb::{write_access_unit, AccessUnitBuffer};
use crate::boundary;
use crate::config::Config;
use crate::engine::{Engine, EngineFactory, ReconCallback, SyntheticFactory};
use crate::frame::{validate_input, Frame};
use crate::heap::PostCallHook;
use crate::log::{Logger, MessageCallback};
use crate::nal::AccessUnit;
use crate::simd::SimdLevel;
use crate::{Error, Result, VERSION};
use std::fmt;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initialized,
    Encoding,
    Flushing,
    Finalized,
}

/// One encoder session
///
/// Not meant for concurrent use; callers serialize access.
pub struct Session {
    state: SessionState,
    requested: Option<Config>,
    config: Option<Config>,
    capabilities: String,
    encoder_info: String,
    engine: Option<Box<dyn Engine>>,
    factory: Box<dyn EngineFactory>,
    last_error: String,
    logger: Logger,
    simd: SimdLevel,
    post_call: Option<PostCallHook>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("encoder_info", &self.encoder_info)
            .field("last_error", &self.last_error)
            .field("simd", &self.simd)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::with_synthetic_engine()
    }
}

fn not_initialized() -> Error {
    Error::Initialize(String::new())
}

/// Build environment summary, e.g. `[linux][x86_64][64 bit] `
fn compile_info() -> String {
    format!(
        "[{}][{}][{} bit] ",
        std::env::consts::OS,
        std::env::consts::ARCH,
        usize::BITS
    )
}

impl Session {
    /// Create a session whose engine is built by `factory` on `init`
    pub fn new(factory: impl EngineFactory + 'static) -> Self {
        Self {
            state: SessionState::Uninitialized,
            requested: None,
            config: None,
            capabilities: String::new(),
            encoder_info: String::new(),
            engine: None,
            factory: Box::new(factory),
            last_error: String::new(),
            logger: Logger::default(),
            simd: SimdLevel::detect(),
            post_call: None,
        }
    }

    /// Session backed by the synthetic reference engine
    pub fn with_synthetic_engine() -> Self {
        Self::new(SyntheticFactory)
    }

    /// Library version
    pub fn version() -> &'static str {
        VERSION
    }

    /// Validate a configuration without touching any session
    pub fn check_config(config: &Config) -> Result<()> {
        config.normalized().map(|_| ())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state != SessionState::Uninitialized
    }

    /// Normalized configuration in use
    pub fn config(&self) -> Result<&Config> {
        self.config.as_ref().ok_or_else(not_initialized)
    }

    /// Configuration exactly as passed to `init`
    pub fn requested_config(&self) -> Option<&Config> {
        self.requested.as_ref()
    }

    /// Version and capability string; empty before `init`
    pub fn encoder_info(&self) -> &str {
        &self.encoder_info
    }

    /// Build and SIMD summary, e.g. `[linux][x86_64][64 bit] [SIMD=AVX2]`
    pub fn capabilities(&self) -> &str {
        &self.capabilities
    }

    /// Message of the most recent failure, empty if nothing failed yet
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn simd_level(&self) -> SimdLevel {
        self.simd
    }

    pub fn num_lead_frames(&self) -> u32 {
        self.config.as_ref().map_or(0, Config::lead_frames)
    }

    pub fn num_trail_frames(&self) -> u32 {
        self.config.as_ref().map_or(0, Config::trail_frames)
    }

    /// Install or remove the message callback; allowed in any state
    pub fn register_message_callback(&mut self, callback: Option<MessageCallback>) {
        self.logger.set_callback(callback);
    }

    /// Install a hook run after every `encode` and `uninit`
    pub fn set_post_call_hook(&mut self, hook: Option<PostCallHook>) {
        self.post_call = hook;
    }

    /// Select the SIMD level for engines created afterwards
    ///
    /// Returns the level actually selected, which never exceeds what the CPU
    /// supports, or `None` for an unknown id.
    pub fn set_simd_extension(&mut self, id: &str) -> Option<SimdLevel> {
        let level = SimdLevel::select(id)?;
        self.simd = level;
        Some(level)
    }

    /// Normalize `config`, create the engine and enter `Initialized`
    pub fn init(&mut self, config: &Config) -> Result<()> {
        let result = self.try_init(config);
        self.record(result)
    }

    fn try_init(&mut self, config: &Config) -> Result<()> {
        if self.is_initialized() {
            return Err(not_initialized());
        }

        let normalized = config.normalized()?;

        let capabilities = format!("{}[SIMD={}]", compile_info(), self.simd_level());
        let factory = &self.factory;
        let logger = &self.logger;
        let engine = boundary::guard(|| factory.create(&normalized, logger))?;

        self.logger.set_verbosity(normalized.verbosity);
        self.logger.verbose(format_args!(
            "session initialized: {}x{} {:?}, {} pass(es), {} threads",
            normalized.source_width,
            normalized.source_height,
            normalized.chroma_format(),
            normalized.num_passes,
            normalized.threads
        ));

        self.encoder_info = format!("vvcsession ver. {} {}", VERSION, capabilities);
        self.capabilities = capabilities;
        self.requested = Some(config.clone());
        self.config = Some(normalized);
        self.engine = Some(engine);
        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Start rate-control pass `pass`
    ///
    /// Pass 1 is accepted only after the previous pass was flushed to the
    /// end. Passes above 1 do not exist.
    pub fn init_pass(&mut self, pass: u32) -> Result<()> {
        let result = self.try_init_pass(pass);
        self.record(result)
    }

    fn try_init_pass(&mut self, pass: u32) -> Result<()> {
        if !self.is_initialized() {
            return Err(not_initialized());
        }

        if pass > 1 {
            return Err(Error::NotSupported(format!(
                "initPass({}) no support for pass {}. use 0 (first pass) and 1 (second pass)",
                pass, pass
            )));
        }

        if pass == 1 && self.state != SessionState::Finalized {
            return Err(Error::Initialize(format!(
                "initPass({}) cannot initPass {} without having flushed the last pass. flush encoder till all frames are processed",
                pass, pass
            )));
        }

        let engine = self.engine.as_mut().ok_or_else(not_initialized)?;
        let logger = &self.logger;
        boundary::guard(|| engine.init_pass(pass, logger))?;

        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Changing the configuration of a running session is not supported
    pub fn reconfig(&mut self, _config: &Config) -> Result<()> {
        let result = if self.is_initialized() {
            Err(Error::NotSupported(
                "reconfiguration of an initialized encoder is not supported".to_string(),
            ))
        } else {
            Err(not_initialized())
        };
        self.record(result)
    }

    /// Run one encode step
    ///
    /// `Some(frame)` submits a picture, `None` requests a flush step. The
    /// produced access unit, if any, is serialized into `out`. Returns `true`
    /// once a flush has drained the engine; the session is then `Finalized`.
    pub fn encode(&mut self, frame: Option<&Frame<'_>>, out: &mut AccessUnitBuffer<'_>) -> Result<bool> {
        let result = self.try_encode(frame, out);
        self.record(result)
    }

    fn try_encode(&mut self, frame: Option<&Frame<'_>>, out: &mut AccessUnitBuffer<'_>) -> Result<bool> {
        if !self.is_initialized() {
            return Err(not_initialized());
        }

        if self.state == SessionState::Finalized {
            return Err(Error::RestartRequired(
                "encoder already flushed, please reinit.".to_string(),
            ));
        }

        if out.capacity() == 0 {
            return Err(Error::NoOutputBuffer(
                "access unit has no payload size. AU payload must have a sufficient size to store encoded data."
                    .to_string(),
            ));
        }

        let config = self.config.as_ref().ok_or_else(not_initialized)?;
        let flush = match frame {
            Some(frame) => {
                if self.state == SessionState::Flushing {
                    return Err(Error::RestartRequired(
                        "encoder already received flush indication, please reinit.".to_string(),
                    ));
                }
                validate_input(frame, config)?;
                if self.state == SessionState::Initialized {
                    self.state = SessionState::Encoding;
                }
                false
            }
            None => {
                if self.state == SessionState::Encoding {
                    self.state = SessionState::Flushing;
                }
                true
            }
        };

        out.reset();

        let engine = self.engine.as_mut().ok_or_else(not_initialized)?;
        let logger = &self.logger;
        let mut au = AccessUnit::new();
        let mut done = boundary::guard(|| engine.encode_picture(flush, frame, &mut au, logger))?;

        if done {
            if self.state == SessionState::Flushing {
                self.state = SessionState::Finalized;
            } else {
                self.logger
                    .details(format_args!("done signal outside of flushing ignored"));
                done = false;
            }
        }

        let written = if au.is_empty() {
            Ok(())
        } else {
            write_access_unit(&au, out)
        };

        self.run_post_call_hook();
        written.map(|_| done)
    }

    /// Tear down the engine and return to `Uninitialized`
    pub fn uninit(&mut self) -> Result<()> {
        let result = self.try_uninit();
        self.record(result)
    }

    fn try_uninit(&mut self) -> Result<()> {
        if !self.is_initialized() {
            return Err(not_initialized());
        }

        if let Some(engine) = self.engine.as_mut() {
            let logger = &self.logger;
            boundary::guard(|| engine.uninit(logger))?;
        }

        self.engine = None;
        self.config = None;
        self.requested = None;
        self.state = SessionState::Uninitialized;
        self.run_post_call_hook();
        Ok(())
    }

    /// Let the engine report its statistics through the logger
    pub fn print_summary(&mut self) -> Result<()> {
        let result = match self.engine.as_ref() {
            Some(engine) if self.is_initialized() => {
                let logger = &self.logger;
                boundary::guard(|| {
                    engine.print_summary(logger);
                    Ok(())
                })
            }
            _ => Err(not_initialized()),
        };
        self.record(result)
    }

    /// Install or remove the reconstructed-picture callback
    pub fn set_recon_callback(&mut self, callback: Option<ReconCallback>) -> Result<()> {
        let result = match self.engine.as_mut() {
            Some(engine) => boundary::catch(|| {
                engine.set_recon_callback(callback);
                Ok(())
            }),
            None => Err(not_initialized()),
        };
        self.record(result)
    }

    fn run_post_call_hook(&mut self) {
        if let Some(hook) = self.post_call.as_mut() {
            // a failing hook must not change the outcome
            let _ = boundary::catch(|| {
                hook();
                Ok(())
            });
        }
    }

    pub(crate) fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.last_error = err.to_string();
            self.logger
                .verbose(format_args!("[{:?}] {}", err.code(), self.last_error));
        }
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_initialized() {
            let _ = self.try_uninit();
        }
    }
}
