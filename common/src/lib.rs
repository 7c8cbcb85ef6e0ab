//! Shared library for the LCP copy tools
//!
//! Hosts the bounded-queue pipeline used by `lcp` and the parallel
//! whole-file copy engine used by `mcp`, plus the error taxonomy and the
//! common binary harness (tracing setup, summary printing, exit mapping).

use anyhow::Result;

pub mod copy;
pub mod errors;
pub mod pipeline;
pub mod queue;
pub mod sink;
pub mod source;

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
}

fn init_tracing(output: &OutputConfig) {
    let level = if output.quiet {
        "off"
    } else {
        match output.verbose {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run an engine under the shared harness.
///
/// Initializes tracing from the verbosity settings, invokes `func` and
/// prints its summary when requested. Returns `None` on failure so binaries
/// can map it to exit code 1; the error itself is reported here (unless
/// quiet).
pub fn run<F, S>(output: &OutputConfig, func: F) -> Option<S>
where
    F: FnOnce() -> Result<S>,
    S: std::fmt::Display,
{
    init_tracing(output);
    match func() {
        Ok(summary) => {
            if output.print_summary {
                println!("{}", &summary);
            }
            Some(summary)
        }
        Err(error) => {
            if !output.quiet {
                tracing::error!("{:#}", &error);
            }
            None
        }
    }
}
