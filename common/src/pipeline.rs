//! Line-streaming copy pipeline
//!
//! The orchestrator owns the queue monitor and the sink, hands them to the
//! worker pools via `Arc`, joins every thread and only then flushes the
//! output. The pipeline as a whole moves through three states: OPEN
//! (producers still reading), DRAINING (input exhausted, queue may still
//! hold records) and CLOSED (queue drained, consumers exiting). Transitions
//! are monotonic.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::errors::Error;
use crate::queue::{BoundedQueue, Popped};
use crate::sink::LineSink;
use crate::source::LineSource;

/// Fixed capacity of the in-flight record buffer.
pub const QUEUE_CAPACITY: usize = 20;

pub const MIN_THREADS: usize = 2;
pub const MAX_THREADS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Number of reader threads, also the number of writer threads unless
    /// `single_writer` is set
    pub threads: usize,
    /// Run exactly one writer thread
    pub single_writer: bool,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if !(MIN_THREADS..=MAX_THREADS).contains(&self.threads) {
            return Err(Error::Usage(format!(
                "thread_count must be between {} and {}, got {}",
                MIN_THREADS, MAX_THREADS, self.threads
            )));
        }
        Ok(())
    }

    pub fn writers(&self) -> usize {
        if self.single_writer { 1 } else { self.threads }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Summary {
    pub lines_copied: u64,
    pub readers: usize,
    pub writers: usize,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "copied {} line(s) using {} reader(s) and {} writer(s)",
            self.lines_copied, self.readers, self.writers
        )
    }
}

fn run_reader(queue: &BoundedQueue<LineSource>) -> Result<()> {
    let mut pushed = 0u64;
    loop {
        match queue.push_next() {
            Ok(true) => pushed += 1,
            Ok(false) => break,
            Err(error) => return Err(error).context("failed reading from input file"),
        }
    }
    debug!(pushed, "reader finished");
    Ok(())
}

fn run_writer(queue: &BoundedQueue<LineSource>, sink: &LineSink) -> Result<()> {
    let mut written = 0u64;
    loop {
        match queue.pop() {
            Popped::Line(line) => {
                if let Err(error) = sink.append(&line) {
                    // unblock the remaining workers before failing
                    queue.shutdown();
                    return Err(error).context("failed writing to output file");
                }
                written += 1;
            }
            Popped::EndOfStream => break,
        }
    }
    debug!(written, "writer finished");
    Ok(())
}

/// Copy `input` to `output` line by line through the bounded queue.
///
/// Opens both files before any thread is created, so open failures never
/// leak threads. If a later spawn fails, the queue is shut down and the
/// already-created threads are joined before the error is returned.
pub fn copy_lines(
    input: &std::path::Path,
    output: &std::path::Path,
    settings: &Settings,
) -> Result<Summary> {
    settings.validate()?;
    let source = LineSource::open(input).map_err(|error| Error::resource_open(input, error))?;
    let sink = Arc::new(
        LineSink::create(output).map_err(|error| Error::resource_open(output, error))?,
    );
    let queue = Arc::new(BoundedQueue::new(QUEUE_CAPACITY, source));
    debug!(
        readers = settings.threads,
        writers = settings.writers(),
        "starting pipeline"
    );

    let mut handles: Vec<std::thread::JoinHandle<Result<()>>> = vec![];
    let mut spawn_error: Option<Error> = None;
    for i in 0..settings.threads + settings.writers() {
        let queue = queue.clone();
        let sink = sink.clone();
        let (name, work): (String, Box<dyn FnOnce() -> Result<()> + Send>) =
            if i < settings.threads {
                (format!("reader-{i}"), Box::new(move || run_reader(&queue)))
            } else {
                (
                    format!("writer-{}", i - settings.threads),
                    Box::new(move || run_writer(&queue, &sink)),
                )
            };
        match std::thread::Builder::new().name(name).spawn(work) {
            Ok(handle) => handles.push(handle),
            Err(error) => {
                spawn_error = Some(Error::ThreadCreation(error));
                break;
            }
        }
    }
    if spawn_error.is_some() {
        queue.shutdown();
    }

    let mut worker_error: Option<anyhow::Error> = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                if worker_error.is_none() {
                    worker_error = Some(error);
                } else {
                    tracing::error!("{:#}", error);
                }
            }
            Err(_) => {
                if worker_error.is_none() {
                    worker_error = Some(anyhow::anyhow!("worker thread panicked"));
                }
            }
        }
    }
    if let Some(error) = spawn_error {
        return Err(error.into());
    }
    if let Some(error) = worker_error {
        return Err(error);
    }

    let lines_copied = sink.finish().context("failed to flush output file")?;
    Ok(Summary {
        lines_copied,
        readers: settings.threads,
        writers: settings.writers(),
    })
}
