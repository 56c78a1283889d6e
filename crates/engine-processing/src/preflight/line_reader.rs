//! Byte-position and line-count tracking for the preflight scan.

use std::io::{BufRead, BufReader, Read};

/// Invoked once per fully-consumed line with `(line, offset)`, where
/// `offset` is the byte position just past the line terminator.
pub type NewLineFn = Box<dyn FnMut(i64, i64)>;

/// Wraps a byte stream and tracks how much of it the caller has
/// consumed.
///
/// At most one source line is handed out per `read` call. `offset`
/// counts bytes consumed by the caller, not bytes buffered internally,
/// and the newline callback fires only once every byte of a line,
/// terminator included, has been handed out. The downstream record
/// parser therefore leaves `offset` sitting exactly on the start of
/// the next record after each successful read, which is what makes
/// these offsets usable as batch boundaries.
pub struct LineReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
    pos: usize,
    line: i64,
    offset: i64,
    on_new_line: Option<NewLineFn>,
}

impl<R: Read> LineReader<R> {
    pub fn new(
        inner: R,
        start_line: i64,
        start_offset: i64,
        on_new_line: Option<NewLineFn>,
    ) -> Self {
        Self {
            inner: BufReader::new(inner),
            pending: Vec::new(),
            pos: 0,
            line: start_line,
            offset: start_offset,
            on_new_line,
        }
    }

    /// Count of lines fully handed out so far, including the resumed
    /// starting count.
    pub fn line(&self) -> i64 {
        self.line
    }

    /// Byte position of the next unconsumed byte in the source.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl<R: Read> Read for LineReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos >= self.pending.len() {
            self.pending.clear();
            self.pos = 0;
            // read_until returns a partial line only at end of stream,
            // so a non-empty buffer without '\n' is the final line.
            if self.inner.read_until(b'\n', &mut self.pending)? == 0 {
                return Ok(0);
            }
        }

        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        self.offset += n as i64;

        if self.pos == self.pending.len() {
            self.line += 1;
            if let Some(on_new_line) = self.on_new_line.as_mut() {
                on_new_line(self.line, self.offset);
            }
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn drain(reader: &mut impl Read, chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn callback_fires_once_per_line_with_exact_offsets() {
        let src = b"a,b,c\nxx,yy,zz\nq\n".to_vec();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);

        let mut reader = LineReader::new(
            Cursor::new(src.clone()),
            0,
            0,
            Some(Box::new(move |line, offset| {
                sink.borrow_mut().push((line, offset));
            })),
        );

        let out = drain(&mut reader, 4096);
        assert_eq!(out, src);
        assert_eq!(*fired.borrow(), vec![(1, 6), (2, 15), (3, 17)]);
        assert_eq!(reader.line(), 3);
        assert_eq!(reader.offset(), 17);
    }

    #[test]
    fn small_destination_buffers_defer_the_callback() {
        // A 1-byte destination forces many reads per line; the callback
        // must still fire exactly once per line, at the terminator.
        let src = b"ab\ncd\n".to_vec();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);

        let mut reader = LineReader::new(
            Cursor::new(src.clone()),
            0,
            0,
            Some(Box::new(move |line, offset| {
                sink.borrow_mut().push((line, offset));
            })),
        );

        let out = drain(&mut reader, 1);
        assert_eq!(out, src);
        assert_eq!(*fired.borrow(), vec![(1, 3), (2, 6)]);
    }

    #[test]
    fn unterminated_final_line_still_counts() {
        let mut reader = LineReader::new(Cursor::new(b"a\nbc".to_vec()), 0, 0, None);
        let out = drain(&mut reader, 4096);
        assert_eq!(out, b"a\nbc");
        assert_eq!(reader.line(), 2);
        assert_eq!(reader.offset(), 4);
    }

    #[test]
    fn resumes_from_checkpoint_counters() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let mut reader = LineReader::new(
            Cursor::new(b"x,y,z\n".to_vec()),
            2,
            12,
            Some(Box::new(move |line, offset| {
                sink.borrow_mut().push((line, offset));
            })),
        );
        drain(&mut reader, 4096);
        assert_eq!(*fired.borrow(), vec![(3, 18)]);
    }

    #[test]
    fn empty_source_reports_eof_without_firing() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let mut reader = LineReader::new(
            Cursor::new(Vec::new()),
            0,
            0,
            Some(Box::new(move |line, offset| {
                sink.borrow_mut().push((line, offset));
            })),
        );
        assert!(drain(&mut reader, 16).is_empty());
        assert!(fired.borrow().is_empty());
        assert_eq!(reader.line(), 0);
        assert_eq!(reader.offset(), 0);
    }
}
