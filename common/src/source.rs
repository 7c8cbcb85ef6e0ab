//! Line-oriented input cursor
//!
//! A `LineSource` is a sequential cursor over newline-delimited records. It
//! is not thread-safe on its own; the pipeline serializes access to it by
//! storing it inside the queue monitor's locked state (see `queue`).

use std::io::BufRead;

/// One record, without its terminator. Produced once, consumed once.
pub type Line = bytes::Bytes;

/// Seam between the queue monitor and the concrete input.
///
/// `next_line` returns `Ok(None)` at end of input. Implemented by
/// `LineSource` for files and by in-memory stubs in tests.
pub trait LineRead: Send {
    fn next_line(&mut self) -> std::io::Result<Option<Line>>;
}

/// Buffered cursor over a text file.
pub struct LineSource {
    reader: std::io::BufReader<std::fs::File>,
}

impl LineSource {
    pub fn open(path: &std::path::Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(LineSource {
            reader: std::io::BufReader::new(file),
        })
    }
}

impl LineRead for LineSource {
    fn next_line(&mut self) -> std::io::Result<Option<Line>> {
        let mut buf = vec![];
        let read = self.reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        // strip the terminator; the final line may not have one
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        Ok(Some(Line::from(buf)))
    }
}
