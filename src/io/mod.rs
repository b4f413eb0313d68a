//! Output sinks for factorization statistics, pivot warnings and timings.

use std::fs::File;
use std::io::{stdout, Error, ErrorKind, Stdout, Write};

/// Redirection of the diagnostic output of a solver object.
///
/// Output is only produced when the object is verbose.  The buffer sink
/// keeps everything written since it was installed.
pub trait ConfigurablePrintTarget {
    fn print_to_stdout(&mut self);
    fn print_to_file(&mut self, file: File);
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>);
    fn print_to_buffer(&mut self);
    /// text written to the buffer sink, an error for any other sink
    fn get_print_buffer(&mut self) -> std::io::Result<String>;
}

// where the tracer sends its lines
pub(crate) enum OutputSink {
    Stdout(Stdout),
    File(File),
    Buffer(Vec<u8>),
    Stream(Box<dyn Write + Send + Sync>),
}

impl OutputSink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            OutputSink::Stdout(out) => out,
            OutputSink::File(file) => file,
            OutputSink::Buffer(buffer) => buffer,
            OutputSink::Stream(stream) => stream,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            OutputSink::Stdout(_) => "stdout",
            OutputSink::File(_) => "file",
            OutputSink::Buffer(_) => "buffer",
            OutputSink::Stream(_) => "stream",
        }
    }

    pub(crate) fn contents(&self) -> std::io::Result<String> {
        match self {
            OutputSink::Buffer(buffer) => Ok(String::from_utf8_lossy(buffer).into_owned()),
            other => Err(Error::new(
                ErrorKind::Other,
                format!("output goes to {}, not to a buffer", other.name()),
            )),
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        OutputSink::Stdout(stdout())
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OutputSink({})", self.name())
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}
