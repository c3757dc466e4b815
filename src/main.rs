//! Main entry point for the catpack CLI application.
//!
//! This binary converts resource packs between the CATS and ZIP formats,
//! reading them from the local filesystem or from HTTP URLs.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use catpack::cli::StderrLogger;
use catpack::{Cli, Conversion, Listing};

/// Application entry point.
///
/// Parses command-line arguments, loads the pack and either lists or
/// converts it.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    StderrLogger::init(cli.log_level());

    let source = catpack::io::open(&cli.input)?;
    if cli.is_http_url() && !cli.is_quiet() {
        eprintln!("Downloading {}", cli.input);
    }
    let bytes = source.load().await?;

    if cli.list {
        let listing = catpack::inspect(source.name(), bytes).await?;
        list_files(source.name(), &listing);
        return Ok(());
    }

    let conversion = catpack::convert(source.name(), bytes).await?;
    write_output(&conversion, &cli).await
}

/// Print the decoded entries of a pack, like `unzip -l`.
fn list_files(name: &str, listing: &Listing) {
    println!("Archive:  {} ({})", name, listing.pack_type);
    println!("{:>10}  Name", "Length");
    println!("{}", "-".repeat(40));

    let mut total = 0u64;
    for entry in &listing.files {
        println!("{:>10}  {}", entry.contents.len(), entry.name);
        total += entry.contents.len() as u64;
    }

    println!("{}", "-".repeat(40));
    println!("{:>10}  {} files", total, listing.files.len());
    if listing.skipped_entries > 0 {
        eprintln!("warning: {} entries could not be read", listing.skipped_entries);
    }
}

/// Where the converted pack goes: `-o FILE`, else the derived name inside
/// `-d DIR` or the current directory.
fn output_path(conversion: &Conversion, cli: &Cli) -> PathBuf {
    match (&cli.output, &cli.output_dir) {
        (Some(file), _) => PathBuf::from(file),
        (None, Some(dir)) => PathBuf::from(dir).join(&conversion.output_file_name),
        (None, None) => PathBuf::from(&conversion.output_file_name),
    }
}

/// Write the converted pack, honoring the overwrite flag.
async fn write_output(conversion: &Conversion, cli: &Cli) -> Result<()> {
    let path = output_path(conversion, cli);

    if tokio::fs::try_exists(&path).await? && !cli.force {
        if !cli.is_quiet() {
            eprintln!("Skipping: {} (use -f to overwrite)", path.display());
        }
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &conversion.output).await?;

    if !cli.is_quiet() {
        println!(
            "  converted: {} -> {}",
            conversion.pack_type, conversion.converted_type
        );
        println!(
            "    writing: {} ({})",
            path.display(),
            format_size(conversion.output.len() as u64)
        );
        if conversion.skipped_entries > 0 {
            eprintln!(
                "warning: {} entries could not be read and were left out",
                conversion.skipped_entries
            );
        }
    }

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
