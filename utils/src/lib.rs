use std::io::BufWriter;
use std::io::Cursor;
use std::io::Write;

enum LogOrWrite {
    Log(Cursor<Vec<u8>>),
    Write(BufWriter<Box<dyn Write>>),
}

impl Write for LogOrWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            LogOrWrite::Log(inner) => inner.write(buf),
            LogOrWrite::Write(inner) => inner.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            LogOrWrite::Log(_) => Ok(()),
            LogOrWrite::Write(inner) => inner.flush(),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            LogOrWrite::Log(inner) => inner.write_all(buf),
            LogOrWrite::Write(inner) => inner.write_all(buf),
        }
    }
}

/// A pair of buffered output streams for observational output like
/// rendered graphs or warnings. Tests can use [`DiagnosticEmitter::log_to_buffer`]
/// to capture everything that was written.
pub struct DiagnosticEmitter {
    out: LogOrWrite,
    err: LogOrWrite,
}

impl DiagnosticEmitter {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            out: LogOrWrite::Write(BufWriter::new(out)),
            err: LogOrWrite::Write(BufWriter::new(err)),
        }
    }

    /// Create an emitter that retains everything in memory instead of
    /// writing to actual streams.
    pub fn log_to_buffer() -> Self {
        Self {
            out: LogOrWrite::Log(Cursor::new(Vec::new())),
            err: LogOrWrite::Log(Cursor::new(Vec::new())),
        }
    }

    pub fn out(&mut self, msg: &str) {
        self.out
            .write_all(msg.as_bytes())
            .expect("Failed to write to output buffer.");
    }

    pub fn out_ln(&mut self, msg: &str) {
        self.out(msg);
        self.out("\n");
    }

    pub fn err(&mut self, msg: &str) {
        self.err
            .write_all(msg.as_bytes())
            .expect("Failed to write to error buffer.");
    }

    pub fn err_ln(&mut self, msg: &str) {
        self.err(msg);
        self.err("\n");
    }

    /// The contents of the output stream when logging to a buffer,
    /// `None` otherwise.
    pub fn out_buffer(&self) -> Option<String> {
        if let LogOrWrite::Log(inner) = &self.out {
            return Some(
                core::str::from_utf8(inner.get_ref())
                    .expect("Failed to convert bytes to utf-8 string")
                    .to_owned(),
            );
        }
        None
    }

    /// The contents of the error stream when logging to a buffer,
    /// `None` otherwise.
    pub fn err_buffer(&self) -> Option<String> {
        if let LogOrWrite::Log(inner) = &self.err {
            return Some(
                core::str::from_utf8(inner.get_ref())
                    .expect("Failed to convert bytes to utf-8 string")
                    .to_owned(),
            );
        }
        None
    }

    pub fn flush(&mut self) {
        self.out.flush().expect("Failed to flush output buffer.");
        self.err.flush().expect("Failed to flush error buffer.");
    }
}

impl Drop for DiagnosticEmitter {
    fn drop(&mut self) {
        self.flush();
    }
}
