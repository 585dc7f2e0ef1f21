//! Session-owned message logging
//!
//! Messages always go to `tracing`. If a callback is registered and the
//! message level is within the configured verbosity, the callback receives
//! it too.

use std::fmt;
use std::sync::Arc;

/// Message severity, lower is more important
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(C)]
pub enum MessageLevel {
    Silent = 0,
    Error = 1,
    Warning = 2,
    #[default]
    Info = 3,
    Notice = 4,
    Verbose = 5,
    Details = 6,
}

impl MessageLevel {
    /// Convert a raw level, clamping out-of-range values
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            i32::MIN..=0 => MessageLevel::Silent,
            1 => MessageLevel::Error,
            2 => MessageLevel::Warning,
            3 => MessageLevel::Info,
            4 => MessageLevel::Notice,
            5 => MessageLevel::Verbose,
            _ => MessageLevel::Details,
        }
    }
}

/// Message callback type
pub type MessageCallback = Arc<dyn Fn(MessageLevel, &str) + Send + Sync>;

/// Logger handed to every component that reports messages
#[derive(Clone, Default)]
pub struct Logger {
    verbosity: MessageLevel,
    callback: Option<MessageCallback>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("verbosity", &self.verbosity)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl Logger {
    pub fn new(verbosity: MessageLevel) -> Self {
        Self {
            verbosity,
            callback: None,
        }
    }

    pub fn verbosity(&self) -> MessageLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: MessageLevel) {
        self.verbosity = verbosity;
    }

    /// Replace the message callback; `None` removes it
    pub fn set_callback(&mut self, callback: Option<MessageCallback>) {
        self.callback = callback;
    }

    pub fn log(&self, level: MessageLevel, args: fmt::Arguments<'_>) {
        if level == MessageLevel::Silent {
            return;
        }

        match level {
            MessageLevel::Error => tracing::error!("{}", args),
            MessageLevel::Warning => tracing::warn!("{}", args),
            MessageLevel::Info | MessageLevel::Notice => tracing::info!("{}", args),
            MessageLevel::Verbose => tracing::debug!("{}", args),
            _ => tracing::trace!("{}", args),
        }

        if level <= self.verbosity {
            if let Some(callback) = &self.callback {
                callback(level, &args.to_string());
            }
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(MessageLevel::Error, args);
    }

    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.log(MessageLevel::Warning, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(MessageLevel::Info, args);
    }

    pub fn verbose(&self, args: fmt::Arguments<'_>) {
        self.log(MessageLevel::Verbose, args);
    }

    pub fn details(&self, args: fmt::Arguments<'_>) {
        self.log(MessageLevel::Details, args);
    }
}
