use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use devtools_patcher::catalog::builtin_patches;
use devtools_patcher::config::{discover_patch_files, load_from_path};
use devtools_patcher::{write_atomic, BuildMode, Category, PassReport, PatchRegistry};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "devtools-patcher")]
#[command(about = "Load-time text patching for versioned front-end bundles", long_about = None)]
#[command(version)]
struct Cli {
    /// Log each patch outcome (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PatchSetArgs {
    /// Extra patch set file or directory of *.toml files (repeatable)
    #[arg(short, long)]
    patches: Vec<PathBuf>,

    /// Skip the built-in catalog
    #[arg(long)]
    no_builtin: bool,

    /// Upstream front-end version, used to gate patch sets by version_range
    #[arg(long)]
    upstream_version: Option<String>,
}

#[derive(Args)]
struct PassArgs {
    /// Content category of the input (e.g. inspector-common-css)
    #[arg(short, long)]
    category: String,

    /// Input file (reads stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Render fragments with escaped newlines for serialized release bundles
    #[arg(short, long)]
    release: bool,

    #[command(flatten)]
    patch_set: PatchSetArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch a content blob and write the result
    Apply {
        #[command(flatten)]
        pass: PassArgs,

        /// Output file (writes stdout if not specified)
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Overwrite the input file
        #[arg(long, requires = "input")]
        in_place: bool,

        /// Show unified diff of changes on stderr
        #[arg(short, long)]
        diff: bool,
    },

    /// Report which patches still recognize their target (fresh or already
    /// patched); exits 1 on drift
    Check {
        #[command(flatten)]
        pass: PassArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered patches by category
    List {
        #[command(flatten)]
        patch_set: PatchSetArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            pass,
            output,
            in_place,
            diff,
        } => cmd_apply(pass, output, in_place, diff),

        Commands::Check { pass, json } => cmd_check(pass, json),

        Commands::List { patch_set } => cmd_list(patch_set),
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "devtools_patcher=warn",
        1 => "devtools_patcher=debug",
        _ => "devtools_patcher=trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Helper: Build the registry from the catalog plus any patch set files.
fn build_registry(args: &PatchSetArgs) -> Result<PatchRegistry> {
    let mut patches = if args.no_builtin {
        Vec::new()
    } else {
        builtin_patches()?
    };

    for path in &args.patches {
        for file in discover_patch_files(path)? {
            let config = load_from_path(&file)?;

            if let Some(version) = &args.upstream_version {
                if !config.applies_to(version)? {
                    eprintln!(
                        "{}",
                        format!(
                            "Skipping {}: upstream {} outside version_range {}",
                            file.display(),
                            version,
                            config.meta.version_range.as_deref().unwrap_or("")
                        )
                        .dimmed()
                    );
                    continue;
                }
            }

            patches.extend(
                config
                    .compile()
                    .with_context(|| format!("in patch set {}", file.display()))?,
            );
        }
    }

    Ok(PatchRegistry::new(patches)?)
}

/// Helper: Accept only categories that have registered patches.
fn resolve_category(registry: &PatchRegistry, name: &str) -> Result<Category> {
    let category = Category::new(name);
    if registry.contains_category(&category) {
        return Ok(category);
    }

    match registry.suggest_category(name) {
        Some(suggestion) => anyhow::bail!(
            "{} '{}'; did you mean '{}'?",
            "Unknown category".red(),
            name,
            suggestion
        ),
        None => anyhow::bail!(
            "{} '{}'; run `devtools-patcher list` to see registered categories",
            "Unknown category".red(),
            name
        ),
    }
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn run_pass(pass: &PassArgs) -> Result<(String, PassReport)> {
    let registry = build_registry(&pass.patch_set)?;
    let category = resolve_category(&registry, &pass.category)?;
    let original = read_input(pass.input.as_deref())?;
    let mode = BuildMode::from_release_flag(pass.release);

    let report = registry.apply_all(&category, original.clone(), mode);
    Ok((original, report))
}

/// Helper: Print per-patch outcomes on stderr.
fn print_outcomes(report: &PassReport) {
    for outcome in &report.outcomes {
        if outcome.matched {
            eprintln!(
                "{} {}: rewrote {} site(s)",
                "✓".green(),
                outcome.patch_id,
                outcome.sites
            );
        } else if outcome.already_applied > 0 {
            eprintln!(
                "{} {}: already applied ({} site(s))",
                "✓".green(),
                outcome.patch_id,
                outcome.already_applied
            );
        } else {
            eprintln!("{} {}: no match", "⊘".yellow(), outcome.patch_id);
        }
    }
}

/// Helper: Show unified diff between original and patched content
fn display_diff(label: &str, original: &str, modified: &str) {
    eprintln!("\n{}", format!("--- {label} (original)").dimmed());
    eprintln!("{}", format!("+++ {label} (patched)").dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        eprint!("{}", sign);
    }
}

fn cmd_apply(
    pass: PassArgs,
    output: Option<PathBuf>,
    in_place: bool,
    show_diff: bool,
) -> Result<()> {
    let (original, report) = run_pass(&pass)?;

    print_outcomes(&report);

    if show_diff && report.is_changed() {
        let label = pass
            .input
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string());
        display_diff(&label, &original, &report.content);
    }

    let target = if in_place { pass.input } else { output };
    match target {
        Some(path) => {
            write_atomic(&path, &report.content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", report.content),
    }

    eprintln!(
        "{} {} matched, {} already applied, {} unmatched",
        "Summary:".bold(),
        format!("{}", report.matched_count()).green(),
        format!("{}", report.already_applied_count()).green(),
        format!("{}", report.drifted().count()).yellow()
    );

    Ok(())
}

fn cmd_check(pass: PassArgs, json: bool) -> Result<()> {
    let (_, report) = run_pass(&pass)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Patch Drift Report".bold());
        println!("Category: {}", report.category);
        println!(
            "Fingerprint: {:016x} -> {:016x}",
            report.input_fingerprint, report.output_fingerprint
        );
        println!();
        for outcome in &report.outcomes {
            if outcome.is_drift() {
                println!("{} {}", "✗".red(), outcome);
            } else {
                println!("{} {}", "✓".green(), outcome);
            }
        }
    }

    if report.drifted().next().is_some() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list(patch_set: PatchSetArgs) -> Result<()> {
    let registry = build_registry(&patch_set)?;

    if registry.is_empty() {
        println!("{}", "No patches registered".yellow());
        return Ok(());
    }

    for category in registry.categories() {
        let patches = registry.patches(category);
        println!("{} ({} patches)", category.as_str().bold(), patches.len());
        for patch in patches {
            println!(
                "  - {} {}",
                patch.id(),
                patch.recognizer().source().dimmed()
            );
        }
        println!();
    }

    Ok(())
}
