//! Single-path conversion services composed on the converter invoker:
//! "convert in place" and "materialize a temp preview copy".

use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::invoker::Converter;
use crate::scheduler::ConversionTask;

/// Convert one file to its counterpart form beside the input.
///
/// Returns the derived task so the caller knows where the output landed.
pub async fn convert_one(converter: &dyn Converter, input: &Path) -> Result<ConversionTask> {
    let task = ConversionTask::sibling(input)?;
    converter.convert(&task.input, &task.output).await?;
    info!(
        input = %task.input.display(),
        output = %task.output.display(),
        "converted"
    );
    Ok(task)
}

/// Materialize a converted copy of `input` under `dir` (the preview flow).
///
/// Always reconverts, even when the output path already exists from an
/// earlier preview of the same file: freshness over caching.
pub async fn convert_to_dir(
    converter: &dyn Converter,
    input: &Path,
    dir: &Path,
) -> Result<ConversionTask> {
    let task = ConversionTask::into_dir(input, dir)?;
    converter.convert(&task.input, &task.output).await?;
    info!(
        input = %task.input.display(),
        output = %task.output.display(),
        "materialized preview copy"
    );
    Ok(task)
}

/// Launch an external viewer on `path`, fire-and-forget.
///
/// Spawn failures are surfaced in the log but never block the caller; the
/// viewer's own exit status is nobody's business here.
pub fn launch_viewer(viewer: &str, path: &Path) {
    match tokio::process::Command::new(viewer).arg(path).spawn() {
        Ok(_child) => info!(viewer, path = %path.display(), "viewer launched"),
        Err(err) => warn!(viewer, error = %err, "failed to launch viewer"),
    }
}
