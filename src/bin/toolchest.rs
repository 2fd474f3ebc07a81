//! Toolchest CLI - side-by-side toolchain and database version manager
//!
//! Usage:
//!   toolchest install <tool> <version> --archive <path>
//!   toolchest use <tool> [version]     Switch active version (omit to unset)
//!   toolchest uninstall <tool> <version>
//!   toolchest list <tool>              List installed versions
//!   toolchest status <tool>            Probe the active service
//!   toolchest start <tool> / stop <tool>
//!   toolchest path register|deregister Shell PATH registration

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use toolchest::lifecycle::Lifecycle;
use toolchest::paths::{default_root, Layout};
use toolchest::tool::ToolKind;
use toolchest::{output, pathenv};

#[derive(Parser)]
#[command(name = "toolchest")]
#[command(about = "Side-by-side developer toolchain and database engine version manager")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// State root directory
    #[arg(long, global = true, env = "TOOLCHEST_HOME")]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a version from a local release archive
    Install {
        tool: ToolKind,
        version: String,

        /// Path to the downloaded archive (zip, tar, tar.gz, tar.zst)
        #[arg(short, long)]
        archive: PathBuf,
    },

    /// Make a version the active one (omit version to unset)
    Use {
        tool: ToolKind,
        version: Option<String>,
    },

    /// Remove an installed version and its data
    Uninstall { tool: ToolKind, version: String },

    /// List installed versions
    List { tool: ToolKind },

    /// Show service status for the active version
    Status { tool: ToolKind },

    /// Start the active version's service
    Start { tool: ToolKind },

    /// Stop the active version's service
    Stop { tool: ToolKind },

    /// Manage the shim directory's PATH registration
    Path {
        #[command(subcommand)]
        action: PathAction,
    },
}

#[derive(Subcommand)]
enum PathAction {
    /// Append the shim directory to the shell startup file
    Register {
        /// Shell startup file to edit
        #[arg(long)]
        rc_file: Option<PathBuf>,
    },
    /// Remove the shim directory from the shell startup file
    Deregister {
        #[arg(long)]
        rc_file: Option<PathBuf>,
    },
}

fn default_rc_file() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot locate home directory")?;
    let shell = std::env::var("SHELL").unwrap_or_default();
    Ok(if shell.ends_with("zsh") {
        home.join(".zshrc")
    } else {
        home.join(".bashrc")
    })
}

/// The selected version for a tool, or a readable error.
fn selected_version(engine: &Lifecycle, tool: ToolKind) -> Result<String> {
    engine
        .current_version(tool)?
        .with_context(|| format!("no active version set for {}; run `toolchest use {} <version>`", tool, tool.dir_name()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let root = cli.root.unwrap_or_else(default_root);
    let engine = Lifecycle::new(Layout::new(&root));

    match cli.command {
        Commands::Install { tool, version, archive } => {
            if !archive.exists() {
                bail!("archive not found: {}", archive.display());
            }
            engine.install(tool, &version, &archive).await?;
            output::success(&format!("{} {} installed", tool, version));
        }

        Commands::Use { tool, version } => {
            engine.activate(tool, version.as_deref().unwrap_or("")).await?;
        }

        Commands::Uninstall { tool, version } => {
            engine.uninstall(tool, &version).await?;
        }

        Commands::List { tool } => {
            let versions = engine.list_installed(tool)?;
            if versions.is_empty() {
                output::info(&format!("no {} versions installed", tool));
                return Ok(());
            }

            let current = engine.current_version(tool)?;
            println!("{}", tool.to_string().bold());
            for version in versions {
                if current.as_deref() == Some(version.as_str()) {
                    println!("  {} {}", version.green(), "[active]".dimmed());
                } else {
                    println!("  {}", version);
                }
            }
        }

        Commands::Status { tool } => {
            if !tool.is_stateful() {
                output::info(&format!("{} has no service", tool));
                return Ok(());
            }
            let version = selected_version(&engine, tool)?;
            let status = engine.service_status(tool, &version).await;
            if status.running {
                let detail = match (status.pid, status.port) {
                    (Some(pid), Some(port)) => format!("pid {}, port {}", pid, port),
                    (None, Some(port)) => format!("port {}", port),
                    _ => String::new(),
                };
                println!("{} {} {} {}", tool.to_string().bold(), version, "running".green(), detail.dimmed());
            } else {
                println!("{} {} {}", tool.to_string().bold(), version, "stopped".red());
            }
        }

        Commands::Start { tool } => {
            let version = selected_version(&engine, tool)?;
            engine.service_start(tool, &version).await?;
            output::success(&format!("{} {} started", tool, version));
        }

        Commands::Stop { tool } => {
            let version = selected_version(&engine, tool)?;
            engine.service_stop(tool, &version).await?;
            output::success(&format!("{} {} stopped", tool, version));
        }

        Commands::Path { action } => {
            let shim_dir = engine.layout().shim_dir();
            match action {
                PathAction::Register { rc_file } => {
                    let rc = match rc_file {
                        Some(rc) => rc,
                        None => default_rc_file()?,
                    };
                    pathenv::register(&rc, &shim_dir)?;
                    output::info(&format!("{} registered in {}", shim_dir.display(), rc.display()));
                }
                PathAction::Deregister { rc_file } => {
                    let rc = match rc_file {
                        Some(rc) => rc,
                        None => default_rc_file()?,
                    };
                    pathenv::deregister(&rc, &shim_dir)?;
                    output::info(&format!("{} removed from {}", shim_dir.display(), rc.display()));
                }
            }
        }
    }

    Ok(())
}
