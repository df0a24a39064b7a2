// ============================================
// WinTools - main.rs
// ============================================
// This is the entry point of the application.
// When you run `cargo run`, this file's `main()` function is called first.
//
// The program flow is:
// 1. Parse the command line (clap)
// 2. Load the ipconfig label table (built-in, or wintools_labels.toml)
// 3. Run the chosen command and print its text to stdout
// 4. Optionally save that text to a file (--save)
//
// Diagnostics go to stderr through the logger; set RUST_LOG=debug for more.
// ============================================

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

// Our modules
mod adapters;     // Adapter records + ipconfig /all scanner
mod external_ip;  // Public IP lookup (ip-api.com)
mod ipconfig;     // Running ipconfig / reading saved dumps
mod labels;       // Locale label tables
mod output;       // Saving output to .txt
mod report;       // Filtered local IP report

use labels::{CompiledLabels, LabelTable};

/// Label file picked up automatically when it sits next to the EXE
const LABELS_FILE_NAME: &str = "wintools_labels.toml";

// ============================================
// COMMAND LINE
// ============================================

#[derive(Parser)]
#[command(name = "wintools", version, about = "Windows network diagnostics")]
struct Cli {
    /// Label table (TOML) for ipconfig output in other languages
    #[arg(long, global = true, value_name = "FILE")]
    labels: Option<PathBuf>,

    /// Also save the output to this file (or into this folder)
    #[arg(long, global = true, value_name = "PATH")]
    save: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Filtered IP info of this machine (runs ipconfig /all)
    Local,
    /// Filtered IP info from a saved ipconfig /all dump ("-" for stdin)
    Parse {
        file: PathBuf,
        /// Print every parsed adapter as JSON instead of the report
        #[arg(long)]
        json: bool,
    },
    /// Public IP address and ISP (ip-api.com)
    External,
}

// ============================================
// MAIN FUNCTION
// ============================================

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("WinTools v{}", env!("CARGO_PKG_VERSION"));

    let (command_line, text) = match cli.command.unwrap_or(Commands::Local) {
        Commands::Local => {
            let labels = load_labels(cli.labels.as_deref())?;
            ("ipconfig /all".to_string(), ipconfig::local_ip_report(&labels))
        }
        Commands::Parse { file, json } => {
            let labels = load_labels(cli.labels.as_deref())?;
            let source = ipconfig::read_dump(&file);
            let text = if json {
                let raw = source?;
                let adapters = adapters::parse_adapters(&raw, &labels);
                serde_json::to_string_pretty(&adapters)?
            } else {
                report::report_from_source(source, &labels)
            };
            (format!("ipconfig /all ({})", file.display()), text)
        }
        Commands::External => ("ip-api.com".to_string(), external_ip::lookup_external_ip()),
    };

    println!("{}", text);

    if let Some(path) = cli.save {
        output::save_output(&path, &command_line, &text)?;
    }

    Ok(())
}

// ============================================
// LABEL TABLE LOADING
// ============================================

/// Pick the label table: --labels, then wintools_labels.toml next to the
/// EXE, then the built-in English + Portuguese labels.
/// A label file only adds to the built-ins, it never removes them.
fn load_labels(explicit: Option<&Path>) -> Result<CompiledLabels> {
    let candidate = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let beside_exe = get_app_directory().join(LABELS_FILE_NAME);
            beside_exe.exists().then_some(beside_exe)
        }
    };

    match candidate {
        Some(path) => LabelTable::load(&path)?.merge(LabelTable::default()).compile(),
        None => CompiledLabels::builtin(),
    }
}

/// Folder containing the running EXE (falls back to the current directory).
fn get_app_directory() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        // Canonicalize to resolve any symlinks/junctions, then get parent
        let resolved = exe_path.canonicalize().unwrap_or(exe_path);
        if let Some(parent) = resolved.parent() {
            // Strip \\?\ prefix that canonicalize adds on Windows
            let parent_str = parent.to_string_lossy();
            if let Some(stripped) = parent_str.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
            return parent.to_path_buf();
        }
    }
    log::warn!("Could not determine EXE directory, using current directory");
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ============================================
// TESTS
// ============================================
