//! Diagnostics sinks, progress callback and the per-invocation session.

use crate::{color::ColorManager, error::ConvertError};
use log::{error, warn};
use std::fmt::Display;

/// Where translation warnings and errors go. The library never shows UI.
pub trait Diagnostics {
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Forward to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&mut self, msg: &str) {
        warn!("{msg}");
    }

    fn error(&mut self, msg: &str) {
        error!("{msg}");
    }
}

/// Keep messages for later inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectDiagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Diagnostics for CollectDiagnostics {
    fn warn(&mut self, msg: &str) {
        self.warnings.push(msg.to_owned());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_owned());
    }
}

/// Smallest fraction change reported.
const PROGRESS_STEP: f64 = 0.05;

/// Coarse progress, calls the callback at most once per 5% step.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<Box<dyn FnMut(f64) + 'a>>,
    last: Option<f64>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(callback: impl FnMut(f64) + 'a) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            last: None,
        }
    }

    /// Report `done` of `total` items.
    pub fn report(&mut self, done: usize, total: usize) {
        let Some(cb) = &mut self.callback else {
            return;
        };
        #[allow(clippy::cast_precision_loss)]
        let fraction = if total == 0 {
            1.0
        } else {
            (done as f64 / total as f64).min(1.0)
        };
        let due = match self.last {
            None => true,
            Some(last) => fraction - last >= PROGRESS_STEP || (fraction >= 1.0 && last < 1.0),
        };
        if due {
            cb(fraction);
            self.last = Some(fraction);
        }
    }
}

/// Collaborators of one import or export run.
pub struct Session<'a> {
    pub cms: &'a dyn ColorManager,
    diag: &'a mut dyn Diagnostics,
    pub progress: ProgressReporter<'a>,
}

impl<'a> Session<'a> {
    pub fn new(cms: &'a dyn ColorManager, diag: &'a mut dyn Diagnostics) -> Self {
        Self {
            cms,
            diag,
            progress: ProgressReporter::default(),
        }
    }

    pub fn with_progress(mut self, callback: impl FnMut(f64) + 'a) -> Self {
        self.progress = ProgressReporter::new(callback);
        self
    }

    pub fn warn(&mut self, msg: impl Display) {
        self.diag.warn(&msg.to_string());
    }

    pub fn error(&mut self, msg: impl Display) {
        self.diag.error(&msg.to_string());
    }

    /// Absorb a per-object error into the diagnostics, fatal errors are
    /// returned to the caller.
    pub fn absorb<T>(&mut self, r: Result<T, ConvertError>) -> Result<Option<T>, ConvertError> {
        match r {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.warn(e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests;
