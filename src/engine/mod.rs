//! Encoder engines
//!
//! The session drives an [`Engine`] but never looks inside it. An engine
//! turns input pictures into NAL units and reports when a flush has drained
//! everything it buffered.

pub mod synthetic;

use crate::config::Config;
use crate::error::EngineResult;
use crate::frame::Frame;
use crate::log::Logger;
use crate::nal::AccessUnit;

pub use synthetic::SyntheticEngine;

/// Callback receiving each reconstructed picture, invoked synchronously
/// from within `encode`
pub type ReconCallback = Box<dyn FnMut(&Frame<'_>) + Send>;

/// Picture-level encoder behind a session
pub trait Engine: Send {
    /// Prepare rate-control pass `pass` (0 or 1)
    fn init_pass(&mut self, pass: u32, log: &Logger) -> EngineResult<()>;

    /// Run one encode step
    ///
    /// `frame` is `None` while flushing. Produced NAL units are appended to
    /// `au`. Returns `true` once a flush has emitted everything.
    fn encode_picture(
        &mut self,
        flush: bool,
        frame: Option<&Frame<'_>>,
        au: &mut AccessUnit,
        log: &Logger,
    ) -> EngineResult<bool>;

    /// Release engine resources
    fn uninit(&mut self, log: &Logger) -> EngineResult<()>;

    /// Report encoding statistics through the logger
    fn print_summary(&self, log: &Logger);

    fn set_recon_callback(&mut self, callback: Option<ReconCallback>);
}

/// Creates an engine for a normalized configuration
pub trait EngineFactory: Send {
    fn create(&self, config: &Config, log: &Logger) -> EngineResult<Box<dyn Engine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(&Config, &Logger) -> EngineResult<Box<dyn Engine>> + Send,
{
    fn create(&self, config: &Config, log: &Logger) -> EngineResult<Box<dyn Engine>> {
        self(config, log)
    }
}

/// Factory for [`SyntheticEngine`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticFactory;

impl EngineFactory for SyntheticFactory {
    fn create(&self, config: &Config, log: &Logger) -> EngineResult<Box<dyn Engine>> {
        Ok(Box::new(SyntheticEngine::new(config.clone(), log)?))
    }
}
