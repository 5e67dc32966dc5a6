//! Geometry kernel interface.
//!
//! A [`Kernel`] runs script source and hands back an [`Evaluation`]: the
//! value the script explicitly showed (if any) plus every top-level binding
//! it created. The kernel is opaque; this crate never interprets scripts.
//!
//! [`ProcessKernel`] drives an external evaluator command over stdio using
//! a JSON wire format:
//!
//! ```text
//! stdin:  <script source>
//! stdout: {"success": true, "first_result": <value or null>, "env": {"name": <value>}}
//!     or: {"success": false, "error": "<diagnostic>"}
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::geometry::Value;

/// Failure reported by the kernel, carrying its diagnostic verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct KernelFailure {
    pub message: String,
}

impl KernelFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful result of running a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// First value the script marked for display.
    #[serde(default)]
    pub first_result: Option<Value>,
    /// Top-level bindings created by the script.
    #[serde(default)]
    pub env: BTreeMap<String, Value>,
}

/// Script execution backend.
///
/// Implementations must run every call in a fresh environment; callers do
/// not cache results.
pub trait Kernel: Send + Sync {
    /// Run `source` and return its result, or the kernel's own failure.
    fn build(&self, source: &str) -> Result<Evaluation, KernelFailure>;
}

/// Wire response from an evaluator process.
#[derive(Debug, Deserialize)]
struct KernelResponse {
    success: bool,
    #[serde(default)]
    first_result: Option<Value>,
    #[serde(default)]
    env: BTreeMap<String, Value>,
    #[serde(default)]
    error: Option<String>,
}

impl KernelResponse {
    fn into_result(self) -> Result<Evaluation, KernelFailure> {
        if self.success {
            Ok(Evaluation {
                first_result: self.first_result,
                env: self.env,
            })
        } else {
            Err(KernelFailure::new(
                self.error
                    .unwrap_or_else(|| "script evaluation failed".to_owned()),
            ))
        }
    }
}

/// Kernel backed by an external evaluator command.
///
/// The script is written to the command's stdin and a JSON evaluation is
/// read from its stdout.
#[derive(Debug, Clone)]
pub struct ProcessKernel {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessKernel {
    /// Create a kernel running `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Create a kernel from a command line (`[program, args...]`).
    ///
    /// Returns `None` for an empty command.
    #[must_use]
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Run the evaluator in `dir` (scripts may import files relative to it).
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn run(&self, source: &str) -> Result<Vec<u8>, KernelFailure> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            KernelFailure::new(format!("failed to start evaluator {}: {e}", self.program))
        })?;

        // Feed stdin from a separate thread so a chatty evaluator cannot
        // fill its stdout pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let source = source.to_owned();
            std::thread::spawn(move || stdin.write_all(source.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| KernelFailure::new(format!("evaluator I/O error: {e}")))?;

        if let Some(handle) = writer
            && let Ok(Err(e)) = handle.join()
        {
            tracing::debug!(error = %e, "Evaluator closed stdin early");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            return Err(KernelFailure::new(if message.is_empty() {
                format!("evaluator exited with {}", output.status)
            } else {
                message.to_owned()
            }));
        }

        Ok(output.stdout)
    }
}

impl Kernel for ProcessKernel {
    fn build(&self, source: &str) -> Result<Evaluation, KernelFailure> {
        let stdout = self.run(source)?;
        let response: KernelResponse = serde_json::from_slice(&stdout)
            .map_err(|e| KernelFailure::new(format!("invalid evaluator output: {e}")))?;
        response.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_response_success() {
        let json = r#"{
            "success": true,
            "first_result": {"type": "sketch", "faces": []},
            "env": {"length": {"type": "scalar", "value": 10}}
        }"#;
        let response: KernelResponse = serde_json::from_str(json).unwrap();
        let evaluation = response.into_result().unwrap();

        assert!(matches!(evaluation.first_result, Some(Value::Sketch(_))));
        assert_eq!(evaluation.env.len(), 1);
    }

    #[test]
    fn test_response_failure_keeps_diagnostic() {
        let json = r#"{"success": false, "error": "NameError: name 'bx' is not defined"}"#;
        let response: KernelResponse = serde_json::from_str(json).unwrap();

        let failure = response.into_result().unwrap_err();

        assert_eq!(failure.message, "NameError: name 'bx' is not defined");
    }

    #[test]
    fn test_from_command() {
        let command = vec!["python3".to_owned(), "-m".to_owned(), "cq_eval".to_owned()];
        let kernel = ProcessKernel::from_command(&command).unwrap();

        assert_eq!(kernel.program, "python3");
        assert_eq!(kernel.args, vec!["-m".to_owned(), "cq_eval".to_owned()]);
        assert!(ProcessKernel::from_command(&[]).is_none());
    }

    #[test]
    fn test_missing_program_is_kernel_failure() {
        let kernel = ProcessKernel::new("rw-cadquery-no-such-evaluator", Vec::new());

        let failure = kernel.build("result = 1").unwrap_err();

        assert!(failure.message.contains("failed to start evaluator"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_round_trip() {
        let kernel = ProcessKernel::new(
            "sh",
            vec![
                "-c".to_owned(),
                r#"cat > /dev/null; printf '{"success":true,"env":{"a":{"type":"scalar","value":1}}}'"#
                    .to_owned(),
            ],
        );

        let evaluation = kernel.build("a = 1").unwrap();

        assert!(evaluation.first_result.is_none());
        assert!(evaluation.env.contains_key("a"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_nonzero_exit_uses_stderr() {
        let kernel = ProcessKernel::new(
            "sh",
            vec!["-c".to_owned(), "cat > /dev/null; echo boom >&2; exit 3".to_owned()],
        );

        let failure = kernel.build("").unwrap_err();

        assert_eq!(failure.message, "boom");
    }
}
