//! Reporter emitting GitHub Actions workflow commands
//!
//! `fail` prints `::error::`, `debug` prints `::debug::` and `mask` prints
//! `::add-mask::`; the runner interprets these lines. Plain output is
//! printed as-is.

use crate::core::traits::Reporter;
use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Escape message data for a workflow command
///
/// # Examples
///
/// ```
/// use sn_package_registration::core::reporter::escape_data;
///
/// assert_eq!(escape_data("50% done\nnext"), "50%25 done%0Anext");
/// ```
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Reporter for steps running on a GitHub Actions runner
pub struct ActionsReporter {
    out: Mutex<Box<dyn Write + Send>>,
    failed: AtomicBool,
}

impl Default for ActionsReporter {
    fn default() -> Self {
        Self::stdout()
    }
}

impl ActionsReporter {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            failed: AtomicBool::new(false),
        }
    }

    /// Whether any failure was reported
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Process exit code for the run
    pub fn exit_code(&self) -> i32 {
        if self.has_failed() { 1 } else { 0 }
    }

    fn write_line(&self, line: &str) {
        // a poisoned lock still holds a usable writer
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::warn!("failed to write step output: {}", e);
        }
    }
}

impl Reporter for ActionsReporter {
    fn fail(&self, message: &str) {
        self.failed.store(true, Ordering::SeqCst);
        self.write_line(&format!("::error::{}", escape_data(message)));
    }

    fn debug(&self, message: &str) {
        self.write_line(&format!("::debug::{}", escape_data(message)));
    }

    fn info(&self, message: &str) {
        self.write_line(message);
    }

    fn mask(&self, secret: &str) {
        if !secret.is_empty() {
            self.write_line(&format!("::add-mask::{}", escape_data(secret)));
        }
    }
}
