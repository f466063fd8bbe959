use std::io::Write;
use std::path::{Path, PathBuf};

use crate::chip::Chip;
use crate::container::Header;
use crate::diff::DiffEngine;
use crate::error::{PatchError, Result};
use crate::fingerprint::{Fingerprint, FingerprintExtractor};
use crate::util;

/// Summary statistics for a completed delta patch.
#[derive(Debug, Clone)]
pub struct PatchStats {
    pub base_size: u64,
    pub target_size: u64,
    /// Raw diff payload size, before the 64-byte header is prepended.
    pub diff_size: u64,
    pub output_size: u64,
    /// `100 - diff_size * 100 / target_size`. Negative when the diff is
    /// larger than the target, which is valid if undesirable.
    pub compression_ratio: f64,
    /// BLAKE3 of the finished output file, for out-of-band verification.
    /// Not part of the container format.
    pub checksum: String,
}

/// Summary for a full-package copy.
#[derive(Debug, Clone)]
pub struct PackageStats {
    pub output: PathBuf,
    pub size: u64,
    pub checksum: String,
}

/// Scratch file holding the raw diff before header composition, derived
/// deterministically from the output path: `patch.bin` -> `patch.bin.temp`.
/// Concurrent invocations sharing an output path race on this file; callers
/// must serialize them.
pub fn scratch_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".temp");
    PathBuf::from(name)
}

/// Build a complete patch container at `output`.
///
/// Stages run strictly in sequence: eager input validation, base-image
/// fingerprint extraction, diff computation into the scratch file, header
/// composition, checksum. Any failure aborts the whole run; the scratch
/// file is removed on every path and a failed composition never leaves a
/// partial output behind.
pub fn build_patch(
    extractor: &dyn FingerprintExtractor,
    engine: &dyn DiffEngine,
    chip: Chip,
    base: &Path,
    target: &Path,
    output: &Path,
) -> Result<PatchStats> {
    for path in [base, target] {
        if !path.exists() {
            return Err(PatchError::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
    }

    let fingerprint = extractor.extract(chip, base)?;

    let scratch = scratch_path(output);
    let result = diff_and_compose(engine, &fingerprint, base, target, &scratch, output);

    // Best-effort cleanup, success or failure. Never fatal.
    if let Err(err) = std::fs::remove_file(&scratch) {
        if err.kind() != std::io::ErrorKind::NotFound {
            eprintln!(
                "warning: failed to remove scratch file {}: {err}",
                scratch.display()
            );
        }
    }

    result
}

fn diff_and_compose(
    engine: &dyn DiffEngine,
    fingerprint: &Fingerprint,
    base: &Path,
    target: &Path,
    scratch: &Path,
    output: &Path,
) -> Result<PatchStats> {
    engine.create_diff(base, target, scratch)?;

    let base_size = util::file_size(base)?;
    let target_size = util::file_size(target)?;
    let diff_size = util::file_size(scratch)?;

    if target_size == 0 {
        return Err(PatchError::ZeroLengthTarget);
    }
    let compression_ratio = 100.0 - (diff_size as f64 * 100.0 / target_size as f64);

    compose_container(fingerprint, scratch, output)?;

    let output_size = util::file_size(output)?;
    let checksum = util::checksum_file(output)?.to_hex().to_string();

    Ok(PatchStats {
        base_size,
        target_size,
        diff_size,
        output_size,
        compression_ratio,
        checksum,
    })
}

/// Write the final container: magic (LE), fingerprint, reserved padding,
/// then the scratch file's contents. On any write failure the partial
/// output is removed so no truncated file masquerades as a valid container.
fn compose_container(fingerprint: &Fingerprint, scratch: &Path, output: &Path) -> Result<()> {
    let payload_len = util::file_size(scratch)?;
    let result = (|| -> Result<()> {
        let mut file = std::fs::File::create(output).map_err(|err| {
            PatchError::io(
                format!("failed to create output file: {}", output.display()),
                err,
            )
        })?;
        let write_err = |err| {
            PatchError::io(format!("failed to write output file: {}", output.display()), err)
        };
        file.write_all(&Header::new(*fingerprint).encode())
            .map_err(write_err)?;
        if payload_len > 0 {
            let payload = util::mmap_file(scratch)?;
            file.write_all(&payload).map_err(write_err)?;
        }
        file.flush().map_err(write_err)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(output);
    }
    result
}

/// Default output path for full-package mode: `firmware.bin` ->
/// `firmware_packaged.bin` next to the input.
pub fn default_package_path(firmware: &Path) -> PathBuf {
    let stem = firmware
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    let mut name = stem;
    name.push("_packaged");
    if let Some(ext) = firmware.extension() {
        name.push(".");
        name.push(ext);
    }
    firmware.with_file_name(name)
}

/// Copy a firmware image byte-for-byte to `output` (or a sibling default)
/// and report its size and checksum. No header, no diff.
pub fn build_full_package(firmware: &Path, output: Option<&Path>) -> Result<PackageStats> {
    if !firmware.exists() {
        return Err(PatchError::MissingInputFile {
            path: firmware.to_path_buf(),
        });
    }
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_package_path(firmware));

    std::fs::copy(firmware, &output).map_err(|err| {
        PatchError::io(
            format!(
                "failed to copy {} to {}",
                firmware.display(),
                output.display()
            ),
            err,
        )
    })?;

    let size = util::file_size(&output)?;
    let checksum = util::checksum_file(&output)?.to_hex().to_string();

    Ok(PackageStats {
        output,
        size,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_path_appends_temp_suffix() {
        assert_eq!(
            scratch_path(Path::new("/tmp/patch.bin")),
            Path::new("/tmp/patch.bin.temp")
        );
        assert_eq!(scratch_path(Path::new("patch")), Path::new("patch.temp"));
    }

    #[test]
    fn default_package_path_keeps_extension() {
        assert_eq!(
            default_package_path(Path::new("/fw/app_v2.bin")),
            Path::new("/fw/app_v2_packaged.bin")
        );
        assert_eq!(
            default_package_path(Path::new("firmware")),
            Path::new("firmware_packaged")
        );
    }
}
