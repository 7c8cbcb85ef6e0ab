//! Serialized line-oriented output
//!
//! More than one consumer may append concurrently, so the separator decision
//! and the write itself happen under a single sink lock. Without that, two
//! writers can interleave bytes mid-record and corrupt the output.

use std::io::Write;

use parking_lot::Mutex;

pub const SEPARATOR: u8 = b'\n';

struct SinkState {
    writer: std::io::BufWriter<std::fs::File>,
    lines_written: u64,
}

/// Append-only sink shared by the consumer pool.
///
/// A separator is written before every record except the first one, so the
/// output never carries a trailing separator after the final record.
pub struct LineSink {
    state: Mutex<SinkState>,
}

impl LineSink {
    pub fn create(path: &std::path::Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(LineSink {
            state: Mutex::new(SinkState {
                writer: std::io::BufWriter::new(file),
                lines_written: 0,
            }),
        })
    }

    pub fn append(&self, line: &[u8]) -> std::io::Result<()> {
        let mut state = self.state.lock();
        if state.lines_written > 0 {
            state.writer.write_all(&[SEPARATOR])?;
        }
        state.writer.write_all(line)?;
        state.lines_written += 1;
        Ok(())
    }

    /// Flush buffered output and report how many records were written.
    pub fn finish(&self) -> std::io::Result<u64> {
        let mut state = self.state.lock();
        state.writer.flush()?;
        Ok(state.lines_written)
    }
}
