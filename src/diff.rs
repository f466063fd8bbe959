use std::path::Path;
use std::process::Command;

use crate::error::{PatchError, Result};

/// Computes a binary delta between two firmware images. The engine owns the
/// payload format; the contract required here is deterministic output for a
/// given (base, target) pair, reverse-applicable by the same engine to
/// reconstruct the target byte-for-byte.
pub trait DiffEngine {
    /// Write the raw diff from `base` to `target` into `patch_out`.
    fn create_diff(&self, base: &Path, target: &Path, patch_out: &Path) -> Result<()>;

    /// One-shot availability check, run at process start rather than inside
    /// the pipeline.
    fn probe(&self) -> Result<()> {
        Ok(())
    }
}

/// Shells out to `detools create_patch` with heatshrink compression, the
/// payload format the device-side delta updater expects.
pub struct DetoolsEngine {
    program: String,
}

impl DetoolsEngine {
    pub fn new() -> Self {
        Self::with_program("detools")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        DetoolsEngine {
            program: program.into(),
        }
    }
}

impl Default for DetoolsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffEngine for DetoolsEngine {
    fn create_diff(&self, base: &Path, target: &Path, patch_out: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["create_patch", "-c", "heatshrink"])
            .arg(base)
            .arg(target)
            .arg(patch_out)
            .output()
            .map_err(|err| PatchError::DiffEngineFailure {
                reason: format!("failed to run {}: {err}", self.program),
            })?;
        if !output.status.success() {
            return Err(PatchError::DiffEngineFailure {
                reason: format!(
                    "{} create_patch exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }

    fn probe(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|err| PatchError::DiffEngineFailure {
                reason: format!("{} is not runnable: {err}", self.program),
            })?;
        if !output.status.success() {
            return Err(PatchError::DiffEngineFailure {
                reason: format!("{} --version exited with {}", self.program, output.status),
            });
        }
        Ok(())
    }
}
