//! Newline framing over a chunked request body.
//!
//! Chunk boundaries fall anywhere, so partial lines are buffered until their
//! `\n` arrives. A line longer than the limit is discarded up to its newline
//! and reported once as `Frame::Oversized`; the buffer never grows past the
//! limit.

use bytes::{Bytes, BytesMut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One line, without its `\n` or trailing `\r`.
    Line(Bytes),
    Oversized,
}

#[derive(Debug)]
pub struct LineSplitter {
    buf: BytesMut,
    max_line_bytes: usize,
    oversized: bool,
}

impl LineSplitter {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_line_bytes,
            oversized: false,
        }
    }

    /// Feed one chunk; every line it completes is appended to `out`.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<Frame>) {
        let mut rest = chunk;
        while !rest.is_empty() {
            let Some(i) = rest.iter().position(|b| *b == b'\n') else {
                self.buffer(rest);
                return;
            };
            let (head, tail) = rest.split_at(i);
            rest = &tail[1..];

            self.buffer(head);
            if let Some(frame) = self.take() {
                out.push(frame);
            }
        }
    }

    /// End of body: flush an unterminated last line.
    pub fn finish(mut self) -> Option<Frame> {
        self.take()
    }

    fn buffer(&mut self, part: &[u8]) {
        if self.oversized {
            return;
        }
        if self.buf.len() + part.len() > self.max_line_bytes {
            self.oversized = true;
            self.buf.clear();
            return;
        }
        self.buf.extend_from_slice(part);
    }

    fn take(&mut self) -> Option<Frame> {
        if std::mem::take(&mut self.oversized) {
            return Some(Frame::Oversized);
        }
        if self.buf.is_empty() {
            return None;
        }
        let mut line = self.buf.split().freeze();
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        (!line.is_empty()).then_some(Frame::Line(line))
    }
}
