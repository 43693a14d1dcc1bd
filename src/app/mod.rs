mod runner;
mod runtime;
mod types;

#[cfg(test)]
mod tests;

pub use runner::CaptureApp;
pub use runtime::install_signal_handlers;
pub use types::{RunOutcome, RunPlan, ShutdownReason};
