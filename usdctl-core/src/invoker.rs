//! External `usdcat` invocation.
//!
//! The converter executable is opaque to us: it is handed an input path and
//! an output path and either produces the output file or fails with a
//! diagnostic. Everything here is plumbing: child environment, argv,
//! captured diagnostics, and an optional per-invocation timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, UsdError};

/// Name of the converter executable, resolved through the extended PATH.
pub const USDCAT: &str = "usdcat";

/// Trait for converter invocation (testable)
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `input` into `output`. On failure the output file must not
    /// be assumed to exist.
    async fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Real converter: spawns `usdcat <input> -o <output>` with the USD
/// runtime's search paths appended to the child environment.
#[derive(Debug, Clone)]
pub struct Invoker {
    usd_root: PathBuf,
    timeout: Option<Duration>,
}

impl Invoker {
    pub fn new(usd_root: impl Into<PathBuf>) -> Self {
        Self {
            usd_root: usd_root.into(),
            timeout: None,
        }
    }

    /// Bound each invocation; on expiry the affected task fails without
    /// blocking sibling workers.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Child PATH: the inherited value with `<root>/bin`, `<root>/lib` and
    /// `<root>/python` appended. Appended, not prepended, so the USD tree
    /// cannot shadow unrelated system tools of the same name.
    fn search_path(&self) -> Result<OsString> {
        extend_path_var(
            std::env::var_os("PATH"),
            [
                self.usd_root.join("bin"),
                self.usd_root.join("lib"),
                self.usd_root.join("python"),
            ],
        )
    }

    /// Child PYTHONPATH: the inherited value with `<root>/lib/python`
    /// appended, for converter builds that bootstrap through Python.
    fn python_path(&self) -> Result<OsString> {
        extend_path_var(
            std::env::var_os("PYTHONPATH"),
            [self.usd_root.join("lib").join("python")],
        )
    }
}

/// Append `extra` entries to a PATH-style variable using the platform's
/// separator.
fn extend_path_var(
    current: Option<OsString>,
    extra: impl IntoIterator<Item = PathBuf>,
) -> Result<OsString> {
    let mut parts: Vec<PathBuf> = current
        .map(|value| std::env::split_paths(&value).collect())
        .unwrap_or_default();
    parts.extend(extra);
    std::env::join_paths(parts)
        .map_err(|err| UsdError::config(format!("cannot extend search path: {err}")))
}

#[async_trait]
impl Converter for Invoker {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(USDCAT);
        cmd.arg(input)
            .arg("-o")
            .arg(output)
            .env("PATH", self.search_path()?)
            .env("PYTHONPATH", self.python_path()?)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out invocation must not linger past its future.
            .kill_on_drop(true);

        debug!(
            input = %input.display(),
            output = %output.display(),
            "invoking usdcat"
        );

        let running = cmd.output();
        let captured = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, running)
                .await
                .map_err(|_| {
                    UsdError::conversion(
                        input,
                        format!("timed out after {}s", limit.as_secs_f64()),
                    )
                })?,
            None => running.await,
        }
        .map_err(|source| UsdError::Spawn { source })?;

        if !captured.status.success() {
            // Prefer stderr; some converter builds print diagnostics on
            // stdout instead.
            let stderr = String::from_utf8_lossy(&captured.stderr);
            let mut diagnostic = stderr.trim().to_string();
            if diagnostic.is_empty() {
                diagnostic = String::from_utf8_lossy(&captured.stdout).trim().to_string();
            }
            if diagnostic.is_empty() {
                diagnostic = format!("exited with {}", captured.status);
            }
            return Err(UsdError::conversion(input, diagnostic));
        }

        Ok(())
    }
}

/// Scripted converter for tests: succeeds by copying input to output, or
/// fails for inputs whose file name is on the failure list.
#[derive(Debug, Default)]
pub struct ScriptedConverter {
    fail_names: Vec<String>,
    calls: std::sync::atomic::AtomicUsize,
}

impl ScriptedConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every task whose input file name equals `name` fail.
    pub fn fail_on(mut self, name: impl Into<String>) -> Self {
        self.fail_names.push(name.into());
        self
    }

    /// Number of conversions attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Converter for ScriptedConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let name = input.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.fail_names.iter().any(|fail| fail == name) {
            return Err(UsdError::conversion(input, "scripted failure"));
        }

        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}
