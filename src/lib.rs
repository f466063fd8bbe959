//! Delta OTA patch creation for ESP32 firmware.
//!
//! An external diff engine computes a binary delta between a base and a
//! target image; the delta is wrapped in a fixed 64-byte container header
//! (magic number, base-image validation fingerprint, reserved padding) that
//! a device-side updater checks before committing any flash writes.

pub mod assemble;
pub mod chip;
pub mod container;
pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod util;

pub use assemble::{build_full_package, build_patch, PackageStats, PatchStats};
pub use chip::Chip;
pub use container::Header;
pub use diff::{DetoolsEngine, DiffEngine};
pub use error::{PatchError, Result};
pub use fingerprint::{EsptoolExtractor, Fingerprint, FingerprintExtractor};
