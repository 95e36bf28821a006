//! Main entry point for the efiling-extract CLI application.
//!
//! Archives given on the command line are decoded concurrently, one blocking
//! task per archive, and their entries are listed, piped or written to disk.

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::Env;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use efiling_archive::{Cli, ExtractedEntry, extract_archive, generate_checksum, select_variant};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_filter())).init();

    if cli.check {
        return check_names(&cli);
    }

    // Each archive owns its buffer, so decodes run fully in parallel.
    let tasks: Vec<_> = cli
        .archives
        .iter()
        .map(|path| {
            let path = PathBuf::from(path);
            tokio::task::spawn_blocking(move || {
                let result = extract_archive(&path);
                (path, result)
            })
        })
        .collect();

    let mut failed = 0usize;
    for task in tasks {
        let (path, result) = task.await?;
        let outcome = match result {
            Ok(entries) => process_archive(&path, &entries, &cli).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome.with_context(|| format!("{}", path.display())) {
            if !cli.is_very_quiet() {
                eprintln!("error: {e:#}");
            }
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} archives failed", failed, cli.archives.len());
    }
    Ok(())
}

/// Report the variant each archive name resolves to, without reading files.
fn check_names(cli: &Cli) -> Result<()> {
    let mut failed = 0usize;
    for archive in &cli.archives {
        match select_variant(archive) {
            Ok(variant) => {
                if !cli.is_quiet() {
                    println!("{:<8} {archive}", variant.to_string());
                }
            }
            Err(e) => {
                if !cli.is_very_quiet() {
                    eprintln!("{archive}: {e}");
                }
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} archive names rejected", failed, cli.archives.len());
    }
    Ok(())
}

/// List, pipe or extract the entries of one decoded archive.
async fn process_archive(path: &Path, entries: &[ExtractedEntry], cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        if cli.archives.len() > 1 {
            println!("{}:", path.display());
        }
        list_entries(entries, cli.verbose);
        return Ok(());
    }

    if cli.pipe {
        let mut stdout = tokio::io::stdout();
        let show_names = entries.len() > 1 || cli.archives.len() > 1;
        for entry in entries {
            if show_names {
                stdout
                    .write_all(format!("--- {} ---\n", entry.name).as_bytes())
                    .await?;
            }
            stdout.write_all(&entry.content).await?;
        }
        stdout.flush().await?;
        return Ok(());
    }

    let stem = path
        .file_stem()
        .context("archive path has no file name")?;
    let base = cli
        .extract_dir
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(stem);

    for entry in entries {
        extract_entry(&base, entry, cli).await?;
    }
    Ok(())
}

/// List entries of an archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just entry names, one per line
/// - Verbose format (`-v`): Size, SHA-256 and name
fn list_entries(entries: &[ExtractedEntry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!("{:>10}  {:<64}  Name", "Length", "SHA-256");
    println!("{}", "-".repeat(90));

    let mut total = 0u64;
    for entry in entries {
        println!(
            "{:>10}  {}  {}",
            entry.content.len(),
            generate_checksum(&entry.content),
            entry.name
        );
        total += entry.content.len() as u64;
    }

    println!("{}", "-".repeat(90));
    println!(
        "{:>10}  {:<64}  {} files ({})",
        total,
        "",
        entries.len(),
        format_size(total)
    );
}

/// Resolve an entry name under `base`, refusing names that would escape it.
fn output_path(base: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || name.is_empty() {
        bail!("refusing to write entry {name:?} outside the output directory");
    }
    Ok(base.join(relative))
}

/// Write a single entry to disk.
///
/// Existing files are skipped unless `-o` is given; `-n` skips them silently.
async fn extract_entry(base: &Path, entry: &ExtractedEntry, cli: &Cli) -> Result<()> {
    let output_path = output_path(base, &entry.name)?;

    if fs::try_exists(&output_path).await? {
        if cli.never_overwrite {
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", output_path.display());
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", output_path.display());
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&output_path)
        .await
        .with_context(|| format!("creating {}", output_path.display()))?;
    file.write_all(&entry.content).await?;
    file.flush().await?;

    Ok(())
}

/// Format a byte size into a human-readable string.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_stays_under_base() {
        let base = Path::new("out/NNF20240115093000_A1631");
        assert_eq!(
            output_path(base, "images/0001.tif").unwrap(),
            base.join("images/0001.tif")
        );
        assert!(output_path(base, "../escape.xml").is_err());
        assert!(output_path(base, "a/../../escape.xml").is_err());
        assert!(output_path(base, "/etc/passwd").is_err());
        assert!(output_path(base, "").is_err());
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
