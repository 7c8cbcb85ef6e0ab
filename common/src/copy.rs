//! Parallel whole-file copy engine
//!
//! Copies the first n regular files of a directory, ordered by the first run
//! of decimal digits in each filename, using one worker thread per file.
//! Workers share no mutable state; each one copies its own file end to end
//! and reports a per-task summary that the orchestrator sums up.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use tracing::debug;

use crate::errors::Error;

pub const MAX_FILES: usize = 10;

static DIGIT_RUN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\d+").expect("digit regex must compile"));

/// Sort key: value of the first run of decimal digits in the filename.
///
/// Filenames without digits sort as key 0. Runs too long for u64 sort last
/// rather than failing the whole copy.
fn numeric_key(name: &std::ffi::OsStr) -> u64 {
    let name = name.to_string_lossy();
    match DIGIT_RUN.find(&name) {
        Some(digits) => digits.as_str().parse().unwrap_or(u64::MAX),
        None => 0,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Summary {
    pub files_copied: u64,
    pub bytes_copied: u64,
}

impl std::ops::Add for Summary {
    type Output = Summary;
    fn add(self, other: Summary) -> Summary {
        Summary {
            files_copied: self.files_copied + other.files_copied,
            bytes_copied: self.bytes_copied + other.bytes_copied,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "copied {} file(s), {} byte(s)",
            self.files_copied, self.bytes_copied
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Number of files to copy, one worker thread each
    pub max_files: usize,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=MAX_FILES).contains(&self.max_files) {
            return Err(Error::Usage(format!(
                "n must be between 1 and {}, got {}",
                MAX_FILES, self.max_files
            )));
        }
        Ok(())
    }
}

/// Regular files in `dir`, ordered by numeric key with the filename as a
/// deterministic tie-break.
fn sorted_files(dir: &std::path::Path) -> Result<Vec<std::path::PathBuf>> {
    let entries =
        std::fs::read_dir(dir).map_err(|error| Error::resource_open(dir, error))?;
    let mut files = vec![];
    for entry in entries {
        let entry = entry.map_err(|error| Error::resource_open(dir, error))?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by_key(|path| {
        let name = path.file_name().unwrap_or_default();
        (numeric_key(name), name.to_owned())
    });
    Ok(files)
}

fn copy_one(src: &std::path::Path, dst: &std::path::Path) -> Result<Summary> {
    let bytes_copied = std::fs::copy(src, dst)
        .with_context(|| format!("failed copying {:?} to {:?}", src, dst))?;
    debug!(?src, ?dst, bytes_copied, "copied file");
    Ok(Summary {
        files_copied: 1,
        bytes_copied,
    })
}

/// Copy the first `settings.max_files` files of `src_dir` into `dst_dir`,
/// one worker thread per file.
///
/// The destination directory is created if absent. A spawn failure joins the
/// already-created workers before returning; worker copy failures are
/// collected and the first one is surfaced after every thread has joined.
pub fn copy_files(
    src_dir: &std::path::Path,
    dst_dir: &std::path::Path,
    settings: &Settings,
) -> Result<Summary> {
    settings.validate()?;
    if !src_dir.is_dir() {
        return Err(Error::resource_open(
            src_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        )
        .into());
    }
    let mut files = sorted_files(src_dir)?;
    files.truncate(settings.max_files);
    if !dst_dir.exists() {
        debug!(?dst_dir, "creating destination directory");
        std::fs::create_dir_all(dst_dir)
            .map_err(|error| Error::resource_open(dst_dir, error))?;
    }

    let mut handles: Vec<std::thread::JoinHandle<Result<Summary>>> = vec![];
    let mut spawn_error: Option<Error> = None;
    for (i, src) in files.into_iter().enumerate() {
        let dst = dst_dir.join(src.file_name().unwrap_or_default());
        let task = move || copy_one(&src, &dst);
        match std::thread::Builder::new()
            .name(format!("copier-{i}"))
            .spawn(task)
        {
            Ok(handle) => handles.push(handle),
            Err(error) => {
                spawn_error = Some(Error::ThreadCreation(error));
                break;
            }
        }
    }

    let mut summary = Summary::default();
    let mut worker_error: Option<anyhow::Error> = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(task_summary)) => summary = summary + task_summary,
            Ok(Err(error)) => {
                if worker_error.is_none() {
                    worker_error = Some(error);
                } else {
                    tracing::error!("{:#}", error);
                }
            }
            Err(_) => {
                if worker_error.is_none() {
                    worker_error = Some(anyhow::anyhow!("copy thread panicked"));
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
    Ok(summary)
}
