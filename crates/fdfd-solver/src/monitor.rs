//! Progress reporting for the iterative driver.

use fdfd_core::VecField;

/// Receives the current physical iterate and the error history.
///
/// The driver calls this every `monitor_every_n` iterations and once more
/// after the loop ends. `errs` holds one entry per completed iteration.
pub trait Monitor {
    fn on_progress(&mut self, x: &VecField, errs: &[f64]);
}

impl<F> Monitor for F
where
    F: FnMut(&VecField, &[f64]),
{
    fn on_progress(&mut self, x: &VecField, errs: &[f64]) {
        self(x, errs)
    }
}

/// Ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl Monitor for NoopMonitor {
    fn on_progress(&mut self, _x: &VecField, _errs: &[f64]) {}
}

/// Logs the latest error through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMonitor;

impl Monitor for LogMonitor {
    fn on_progress(&mut self, x: &VecField, errs: &[f64]) {
        match errs.last() {
            Some(err) => log::info!(
                "iteration {}: residual {:.3e}, max |E| {:.3e}",
                errs.len(),
                err,
                x.max_abs()
            ),
            None => log::info!("no iterations completed"),
        }
    }
}
