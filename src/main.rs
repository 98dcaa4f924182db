use abi_audit::{AuditReport, CheckConfig, audit_files};
use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "abi-audit")]
#[command(about = "Audit API/ABI compatibility between two revisions of an interface file")]
#[command(version)]
struct Args {
    #[arg(help = "Path to the old revision (.h/.cpp, .capnp or .proto)")]
    old_file: PathBuf,
    #[arg(help = "Path to the new revision (same format as the old one)")]
    new_file: PathBuf,
    #[arg(
        short = 'a',
        long = "added",
        help = "Report functions present only in the new revision"
    )]
    added: bool,
    #[arg(long, help = "Output format", value_enum, default_value = "text")]
    format: OutputFormat,
    #[arg(
        long,
        help = "Path to a YAML config file (default: abi-audit.yaml if present)"
    )]
    config: Option<PathBuf>,
    #[arg(long, help = "C++ standard for native parsing (overrides config)")]
    std: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Exit code 2 is reserved for incompatible changes, so usage errors are
    // handled here instead of through clap's default exit.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let mut config = load_config(args.config.as_deref())?;
    if args.added {
        config.include_added = true;
    }
    if let Some(std) = args.std {
        config.native.std = std;
    }

    let mut report = audit_files(&args.old_file, &args.new_file, &config)?;
    if let AuditReport::Native(audit) = &mut report {
        if !config.include_added {
            audit.report.added.clear();
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }

    Ok(if report.is_breaking() { 2 } else { 0 })
}

fn load_config(path: Option<&Path>) -> Result<CheckConfig> {
    match path {
        Some(path) => Ok(CheckConfig::from_yaml_file(path)?),
        None => {
            // Unset: probe the conventional location and fall back to defaults.
            let default_path = Path::new("abi-audit.yaml");
            if default_path.is_file() {
                Ok(CheckConfig::from_yaml_file(default_path)?)
            } else {
                Ok(CheckConfig::default())
            }
        }
    }
}

fn print_text(report: &AuditReport) {
    match report {
        AuditReport::Schema(audit) => {
            let incompatible: Vec<_> = audit.report.incompatible().collect();
            let source_compatible: Vec<_> = audit.report.source_compatible().collect();
            if incompatible.is_empty() && source_compatible.is_empty() {
                println!("API is backward compatible");
                return;
            }
            if !incompatible.is_empty() {
                println!("Incompatible changes detected:");
                for finding in &incompatible {
                    println!(" - {}", finding.message);
                }
            }
            if !source_compatible.is_empty() {
                if !incompatible.is_empty() {
                    println!();
                }
                println!("Source-compatible changes detected:");
                for finding in &source_compatible {
                    println!(" - {}", finding.message);
                }
            }
        }
        AuditReport::Native(audit) => {
            if let Some(message) = &audit.old_degraded {
                println!(
                    "Note: '{}' did not parse ({message}); treated as empty interface",
                    audit.old_path.display()
                );
            }
            if let Some(message) = &audit.new_degraded {
                println!(
                    "Note: '{}' did not parse ({message}); treated as empty interface",
                    audit.new_path.display()
                );
            }
            let diff = &audit.report;
            if diff.removed.is_empty() && diff.changed.is_empty() && diff.added.is_empty() {
                println!("API is backward compatible");
                return;
            }
            let mut printed = false;
            if !diff.removed.is_empty() {
                for entry in &diff.removed {
                    println!("Function removed: {}", entry.name);
                    if let Some(old_sig) = &entry.old {
                        println!("  {}: {}", audit.old_path.display(), old_sig);
                    }
                }
                printed = true;
            }
            if !diff.changed.is_empty() {
                if printed {
                    println!();
                }
                for entry in &diff.changed {
                    println!("Signature changed: {}", entry.name);
                    if let Some(old_sig) = &entry.old {
                        println!("  {}: {}", audit.old_path.display(), old_sig);
                    }
                    if let Some(new_sig) = &entry.new {
                        println!("  {}: {}", audit.new_path.display(), new_sig);
                    }
                }
                printed = true;
            }
            if !diff.added.is_empty() {
                if printed {
                    println!();
                }
                for entry in &diff.added {
                    println!("Function added: {}", entry.name);
                    if let Some(new_sig) = &entry.new {
                        println!("  {}: {}", audit.new_path.display(), new_sig);
                    }
                }
            }
        }
    }
}
