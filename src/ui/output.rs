use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProbeState {
    written: Vec<u8>,
    called: bool,
}

/// Output sink that checks everything written against an expected string.
///
/// Clones share state, so a test can keep one handle while the code under
/// test owns another.
#[derive(Debug, Clone)]
pub struct OutputProbe {
    expected: String,
    state: Arc<Mutex<ProbeState>>,
}

impl OutputProbe {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            state: Arc::new(Mutex::new(ProbeState::default())),
        }
    }

    /// True once anything has been written
    pub fn was_called(&self) -> bool {
        self.state.lock().called
    }

    /// Everything written so far, lossily decoded
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().written).into_owned()
    }

    /// True when the output written so far equals the expected string
    pub fn matches(&self) -> bool {
        self.output() == self.expected
    }
}

impl Write for OutputProbe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.written.extend_from_slice(buf);
        state.called = true;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
