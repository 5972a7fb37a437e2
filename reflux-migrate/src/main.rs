//! Reflux Migration CLI Tool
//!
//! Compiles a catalog snapshot into Sequelize migration files and
//! association blocks.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use reflux::writer::{write_all, FileWriter, MemoryWriter, WrittenFile};
use reflux::{
    compile_associations, Assembler, CompileOptions, CompilePool, CompiledTable, Dialect,
    MigrationCompiler, TableData,
};
use reflux_migrate::catalog_loader::load_snapshot;
use reflux_migrate::report::DiagnosticReport;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "reflux-migrate")]
#[command(about = "Generate reversible Sequelize migrations from database catalog snapshots")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (default: config/reflux.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write migration-create and migration-constraints files
    Generate {
        /// Snapshot file, or directory of snapshot/table files
        catalog: PathBuf,

        /// Output directory (overrides `output_dir`)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Dialect for table files that do not carry one
        #[arg(long)]
        dialect: Option<Dialect>,

        /// Dry run - list the files without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Compile association blocks
    Associations {
        catalog: PathBuf,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        dialect: Option<Dialect>,
    },

    /// Report unresolved types and malformed catalog rows
    Check {
        catalog: PathBuf,

        #[arg(long)]
        dialect: Option<Dialect>,
    },

    /// Print the resolved configuration as TOML
    Config,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    if cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let quiet = cli.quiet;
    match run(cli) {
        Ok(true) => {
            if !quiet {
                println!("{}", "✅ Success".green());
            }
            process::exit(0);
        }
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Run one command. `Ok(false)` means it completed but found problems.
fn run(cli: Cli) -> Result<bool> {
    let mut options = load_options(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            catalog,
            output_dir,
            dialect,
            dry_run,
        } => {
            if let Some(dir) = output_dir {
                options.output_dir = dir.to_string_lossy().into_owned();
            }
            apply_dialect(&mut options, dialect);
            handle_generate(&options, &catalog, dry_run, cli.quiet)
        }
        Commands::Associations {
            catalog,
            output,
            dialect,
        } => {
            apply_dialect(&mut options, dialect);
            handle_associations(&options, &catalog, output.as_deref())
        }
        Commands::Check { catalog, dialect } => {
            apply_dialect(&mut options, dialect);
            handle_check(&options, &catalog)
        }
        Commands::Config => handle_config(&options),
    }
}

fn load_options(path: Option<&Path>) -> Result<CompileOptions> {
    let options = match path {
        Some(path) => CompileOptions::load_from(path, true)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CompileOptions::load().context("Failed to load configuration")?,
    };
    Ok(options)
}

fn apply_dialect(options: &mut CompileOptions, dialect: Option<Dialect>) {
    if let Some(dialect) = dialect {
        options.dialect = dialect;
    }
}

fn assemble(options: &CompileOptions, catalog: &Path) -> Result<TableData> {
    let snapshot = load_snapshot(catalog, options.dialect)
        .with_context(|| format!("Failed to load catalog snapshot {}", catalog.display()))?;
    Ok(Assembler::from_options(options).assemble(&snapshot))
}

fn handle_generate(
    options: &CompileOptions,
    catalog: &Path,
    dry_run: bool,
    quiet: bool,
) -> Result<bool> {
    let data = assemble(options, catalog)?;
    let compiler = MigrationCompiler::new(options, data.dialect);

    let mut compiled: Vec<CompiledTable> = Vec::with_capacity(data.len());
    let mut failed = 0;
    for (table, result) in data
        .tables()
        .iter()
        .zip(CompilePool::from_options(options).compile_all(&compiler, &data))
    {
        match result {
            Ok(table) => compiled.push(table),
            Err(e) => {
                eprintln!("{} {}: {}", "❌".red(), table.name, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} tables failed to compile", failed, data.len());
    }

    let diagnostics = data.diagnostics.len()
        + compiled.iter().map(|t| t.diagnostics.len()).sum::<usize>();
    if diagnostics > 0 {
        println!(
            "{} {} diagnostics, run `reflux-migrate check` for details",
            "⚠️".yellow(),
            diagnostics
        );
    }

    let base = options.base_timestamp();
    if dry_run {
        let mut writer = MemoryWriter::new();
        let written = write_all(&mut writer, &compiled, base)?;
        println!(
            "Dry run: {} files would be written to {}",
            written.len(),
            options.output_dir
        );
        print_written(&written, quiet);
    } else {
        let mut writer = FileWriter::new(&options.output_dir);
        let written = write_all(&mut writer, &compiled, base)
            .with_context(|| format!("Failed to write migrations to {}", options.output_dir))?;
        println!("✅ Generated {} migration files", written.len());
        print_written(&written, quiet);
    }
    Ok(true)
}

fn print_written(written: &[WrittenFile], quiet: bool) {
    if quiet {
        return;
    }
    let cwd = std::env::current_dir().ok();
    for file in written {
        let shown = match (&file.path, &cwd) {
            (Some(path), Some(cwd)) => pathdiff::diff_paths(path, cwd)
                .unwrap_or_else(|| path.clone())
                .display()
                .to_string(),
            (Some(path), None) => path.display().to_string(),
            (None, _) => file.name.clone(),
        };
        println!("   {} {}", shown, file.checksum.dimmed());
    }
}

fn handle_associations(
    options: &CompileOptions,
    catalog: &Path,
    output: Option<&Path>,
) -> Result<bool> {
    let data = assemble(options, catalog)?;
    let text = compile_associations(&data, options)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, &text).with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "✅ Wrote associations for {} relations to {}",
                data.relations.len(),
                path.display()
            );
        }
        None => print!("{}", text),
    }
    Ok(true)
}

fn handle_check(options: &CompileOptions, catalog: &Path) -> Result<bool> {
    let data = assemble(options, catalog)?;
    let compiler = MigrationCompiler::new(options, data.dialect);
    let unresolved: Vec<_> = data.tables().iter().flat_map(|t| compiler.diagnose(t)).collect();

    let report = DiagnosticReport::new(data.diagnostics.iter().chain(unresolved.iter()));
    println!("Checked {} tables ({})", data.len(), data.dialect);
    if report.is_clean() {
        println!("{}", "✅ No problems found".green());
        return Ok(true);
    }

    for (table, diagnostics) in report.tables() {
        println!("{}", table.to_string().bold());
        for diagnostic in diagnostics {
            println!("   {} {}", "-".yellow(), diagnostic);
        }
    }
    println!(
        "{} {} unresolved types, {} malformed rows",
        "❌".red(),
        report.unresolved(),
        report.malformed()
    );
    Ok(false)
}

#[derive(Serialize)]
struct ConfigFile<'a> {
    compile: &'a CompileOptions,
}

fn handle_config(options: &CompileOptions) -> Result<bool> {
    let text = toml::to_string_pretty(&ConfigFile { compile: options })
        .context("Failed to render configuration")?;
    print!("{}", text);
    Ok(true)
}
