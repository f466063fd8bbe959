use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::chip::Chip;
use crate::container::FINGERPRINT_LEN;
use crate::error::{PatchError, Result};

/// A firmware image's embedded validation fingerprint: the hex-decoded bytes
/// of a 64-hex-character digest, stored in the container header as extracted
/// (never re-hashed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Decode a fingerprint from the digest string reported by the
    /// image-inspection tool. Any length other than 64 hex characters is a
    /// format violation and must fail before any bytes are written.
    pub fn from_hex(digest: &str) -> Result<Self> {
        if digest.len() != FINGERPRINT_LEN * 2 {
            return Err(PatchError::FormatViolation {
                reason: format!(
                    "validation fingerprint must be {} hex characters, got {}",
                    FINGERPRINT_LEN * 2,
                    digest.len()
                ),
            });
        }
        let bytes = hex::decode(digest).map_err(|err| PatchError::FormatViolation {
            reason: format!("validation fingerprint is not valid hex: {err}"),
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; FINGERPRINT_LEN] =
            bytes
                .try_into()
                .map_err(|_| PatchError::FormatViolation {
                    reason: format!(
                        "validation fingerprint must be {} bytes, got {}",
                        FINGERPRINT_LEN,
                        bytes.len()
                    ),
                })?;
        Ok(Fingerprint(raw))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Obtains the validation fingerprint of a base firmware image. Abstract so
/// the pipeline can be exercised with deterministic fakes.
pub trait FingerprintExtractor {
    fn extract(&self, chip: Chip, image: &Path) -> Result<Fingerprint>;

    /// One-shot availability check, run at process start rather than inside
    /// the pipeline.
    fn probe(&self) -> Result<()> {
        Ok(())
    }
}

static VALIDATION_HASH_RE: OnceLock<Regex> = OnceLock::new();

/// Extract the `Validation Hash: <hex> (valid)` line from an image-info
/// report.
pub fn parse_image_info_report(report: &str) -> Result<Fingerprint> {
    let re = VALIDATION_HASH_RE.get_or_init(|| {
        Regex::new(r"Validation Hash: ([A-Fa-f0-9]+) \(valid\)").expect("hard-coded regex")
    });
    let captures = re
        .captures(report)
        .ok_or_else(|| PatchError::FingerprintUnavailable {
            reason: "image-info report contains no valid validation-hash line".to_string(),
        })?;
    Fingerprint::from_hex(&captures[1])
}

/// Shells out to esptool's `image_info` command and parses its report.
pub struct EsptoolExtractor {
    program: String,
}

impl EsptoolExtractor {
    pub fn new() -> Self {
        Self::with_program("esptool.py")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        EsptoolExtractor {
            program: program.into(),
        }
    }
}

impl Default for EsptoolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintExtractor for EsptoolExtractor {
    fn extract(&self, chip: Chip, image: &Path) -> Result<Fingerprint> {
        let output = Command::new(&self.program)
            .args(["--chip", chip.as_str(), "image_info"])
            .arg(image)
            .output()
            .map_err(|err| PatchError::FingerprintUnavailable {
                reason: format!("failed to run {}: {err}", self.program),
            })?;
        if !output.status.success() {
            return Err(PatchError::FingerprintUnavailable {
                reason: format!(
                    "{} image_info exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        parse_image_info_report(&String::from_utf8_lossy(&output.stdout))
    }

    fn probe(&self) -> Result<()> {
        let output = Command::new(&self.program).arg("version").output().map_err(|err| {
            PatchError::FingerprintUnavailable {
                reason: format!("{} is not runnable: {err}", self.program),
            }
        })?;
        if !output.status.success() {
            return Err(PatchError::FingerprintUnavailable {
                reason: format!("{} version exited with {}", self.program, output.status),
            });
        }
        Ok(())
    }
}
