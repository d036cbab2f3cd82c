//! Operator-facing console lines and diagnostic tracing setup.

use std::io::Write;

use tracing_subscriber::EnvFilter;

/// Install the stderr tracing subscriber; `filter` falls back to `warn`.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}

/// Sink for the `INFO:` / `WARNING:` / `ERROR:` lines shown to the operator.
pub trait Console: Send + Sync + 'static {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    /// Raw text (help output, grid frames) written to the info stream.
    fn raw(&self, text: &str);
}

/// Writes info to stdout and warnings/errors to stderr.
pub struct StdConsole;

impl Console for StdConsole {
    fn info(&self, message: &str) {
        println!("INFO: {message}");
    }

    fn warning(&self, message: &str) {
        eprintln!("WARNING: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("ERROR: {message}");
    }

    fn raw(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

#[cfg(test)]
pub use memory::MemoryConsole;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use super::Console;

    /// Collects prefixed lines in memory.
    #[derive(Default)]
    pub struct MemoryConsole {
        lines: Mutex<Vec<String>>,
    }

    impl MemoryConsole {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().expect("console mutex poisoned").clone()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.lines
                .lock()
                .expect("console mutex poisoned")
                .iter()
                .any(|line| line.contains(needle))
        }

        fn push(&self, line: String) {
            self.lines.lock().expect("console mutex poisoned").push(line);
        }
    }

    impl Console for MemoryConsole {
        fn info(&self, message: &str) {
            self.push(format!("INFO: {message}"));
        }

        fn warning(&self, message: &str) {
            self.push(format!("WARNING: {message}"));
        }

        fn error(&self, message: &str) {
            self.push(format!("ERROR: {message}"));
        }

        fn raw(&self, text: &str) {
            for line in text.lines() {
                self.push(line.to_string());
            }
        }
    }
}
