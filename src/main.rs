use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use ota_patcher::{
    build_full_package, build_patch, Chip, DetoolsEngine, DiffEngine, EsptoolExtractor,
    FingerprintExtractor,
};

#[derive(Parser)]
#[command(name = "ota-patcher", about = "Delta OTA patch creator for ESP32 firmware")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a delta patch container from a base and a new firmware image
    Delta {
        /// Target chip, passed through to the image-inspection tool
        #[arg(long, value_enum, default_value_t = Chip::Esp32)]
        chip: Chip,
        /// Path to the base (currently deployed) firmware image
        #[arg(long)]
        base: PathBuf,
        /// Path to the new (target) firmware image
        #[arg(long)]
        new: PathBuf,
        /// Output path for the patch container
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Copy a firmware image verbatim as a full update package
    Full {
        /// Path to the firmware image to package
        #[arg(long)]
        firmware: PathBuf,
        /// Output path (defaults to a _packaged sibling of the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Delta {
            chip,
            base,
            new,
            output,
        } => {
            let extractor = EsptoolExtractor::new();
            let engine = DetoolsEngine::new();

            // Tool availability is a process-start precondition, not part of
            // the pipeline itself.
            extractor.probe()?;
            engine.probe()?;

            println!("Creating delta patch...");
            println!("  Chip: {}", chip);
            println!("  Base: {}", base.display());
            println!("  New: {}", new.display());
            println!("  Output: {}", output.display());

            let start = Instant::now();
            let stats = build_patch(&extractor, &engine, chip, &base, &new, &output)?;
            let elapsed = start.elapsed();

            println!("\nPatch created successfully!");
            println!("  Base image: {} bytes", stats.base_size);
            println!("  New image: {} bytes", stats.target_size);
            println!("  Diff payload: {} bytes", stats.diff_size);
            println!("  Patch file: {} bytes", stats.output_size);
            println!("  Compression ratio: {:.1}%", stats.compression_ratio);
            println!("  Checksum (BLAKE3): {}", stats.checksum);
            println!("  Time elapsed: {:.3}s", elapsed.as_secs_f64());
        }
        Commands::Full { firmware, output } => {
            println!("Packaging full firmware...");
            println!("  Firmware: {}", firmware.display());

            let start = Instant::now();
            let stats = build_full_package(&firmware, output.as_deref())?;
            let elapsed = start.elapsed();

            println!("\nFirmware packaged successfully!");
            println!("  Output: {}", stats.output.display());
            println!("  Size: {} bytes", stats.size);
            println!("  Checksum (BLAKE3): {}", stats.checksum);
            println!("  Time elapsed: {:.3}s", elapsed.as_secs_f64());
        }
    }

    Ok(())
}
