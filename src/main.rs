use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use qt_porter::compile_db::{CompilationDatabase, FileLookup};
use qt_porter::config::{load_from_path, select_rule, GuardConfig, Preset, RuleConfig, RunConfig};
use qt_porter::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
use qt_porter::matches::{load_records, RuleFamily};
use qt_porter::{
    ApplyMode, EditApplier, ExportedEdit, FileRewrite, RequestScope, Session, SourceRootGuard,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qt-porter")]
#[command(about = "Rewrite Qt4 C++ sources for Qt5 from semantic match records", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one rule to the matched sources of a project
    Port(Box<PortArgs>),

    /// List rule families and presets
    Rules,
}

#[derive(Args)]
struct PortArgs {
    /// Project source root; only files below it are rewritten
    source_dir: PathBuf,

    /// Build directory containing compile_commands.json
    build_path: PathBuf,

    /// Source files or directories to port (default: every database entry)
    files: Vec<PathBuf>,

    /// Class whose method is renamed
    #[arg(long, value_name = "CLASS")]
    rename_class: Option<String>,

    /// Method or enumerator name to replace
    #[arg(long, value_name = "NAME")]
    rename_old: Option<String>,

    /// Replacement name
    #[arg(long, value_name = "NAME")]
    rename_new: Option<String>,

    /// Rename an enumerator of this scope instead of a method
    #[arg(long, value_name = "SCOPE")]
    rename_enum: Option<String>,

    /// QMetaMethod::signature() -> methodSignature()
    #[arg(long)]
    port_qmetamethod_signature: bool,

    /// Qt::escape(s) -> QString(s).toHtmlEscaped()
    #[arg(long)]
    port_qt_escape: bool,

    /// Implicit QAtomicInt/QAtomicPointer reads -> .load()
    #[arg(long)]
    port_atomics: bool,

    /// Drop the removed QImage::text() key argument
    #[arg(long)]
    port_qimage_text: bool,

    /// Add the roles parameter to dataChanged overrides
    #[arg(long)]
    port_qabstractitemview_datachanged: bool,

    /// Keep the Qt4 code in a version-guarded #if branch
    #[arg(long)]
    create_ifdefs: bool,

    /// Qt version the guard tests against
    #[arg(long, value_name = "VERSION")]
    guard_version: Option<String>,

    /// TOML rule file
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// JSON-lines match records ("-" reads stdin)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    matches: PathBuf,

    /// Write the edits as JSON instead of rewriting files
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Show what would change without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Refuse rewrites that introduce parse errors
    #[arg(long)]
    check_syntax: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Port(args) => {
            init_tracing(args.verbose);
            cmd_port(*args)
        }
        Commands::Rules => cmd_rules(),
    }
}

/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "qt_porter=warn",
        1 => "qt_porter=info",
        _ => "qt_porter=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Rules selected by command-line flags, in flag order.
fn flag_rules(args: &PortArgs) -> Vec<RuleConfig> {
    let mut rules = Vec::new();

    if let Some(scope) = &args.rename_enum {
        rules.push(RuleConfig::RenameEnum {
            scope: scope.clone(),
            old_name: args.rename_old.clone().unwrap_or_default(),
            new_name: args.rename_new.clone().unwrap_or_default(),
        });
    } else if args.rename_old.is_some() || args.rename_new.is_some() || args.rename_class.is_some()
    {
        rules.push(RuleConfig::RenameMethod {
            class: args.rename_class.clone().unwrap_or_default(),
            old_name: args.rename_old.clone().unwrap_or_default(),
            new_name: args.rename_new.clone().unwrap_or_default(),
        });
    }

    let presets = [
        (args.port_qmetamethod_signature, Preset::QMetaMethodSignature),
        (args.port_qt_escape, Preset::QtEscape),
        (args.port_atomics, Preset::Atomics),
        (args.port_qimage_text, Preset::QImageText),
        (
            args.port_qabstractitemview_datachanged,
            Preset::QAbstractItemViewDataChanged,
        ),
    ];
    rules.extend(
        presets
            .into_iter()
            .filter(|(selected, _)| *selected)
            .map(|(_, preset)| preset.rule()),
    );

    rules
}

/// Combine the rule file and flags into one validated run configuration.
fn run_config(args: &PortArgs) -> Result<RunConfig> {
    let mut candidates = Vec::new();
    let mut guard = GuardConfig::default();

    if let Some(path) = &args.rules {
        let file = load_from_path(path)?;
        candidates.push(
            file.selected_rule()
                .with_context(|| format!("invalid rule file {}", path.display()))?,
        );
        guard = file.guard;
    }
    candidates.extend(flag_rules(args));

    if args.create_ifdefs {
        guard.enabled = true;
    }
    if let Some(version) = &args.guard_version {
        guard.version = version.clone();
    }

    let rule = select_rule(candidates)?;
    let guard = guard.build()?;
    Ok(RunConfig { rule, guard })
}

/// Resolve FILES against the database. Unknown files become diagnostics.
fn resolve_requested(
    database: &CompilationDatabase,
    files: &[PathBuf],
    cwd: &Path,
    diagnostics: &Diagnostics,
) -> Vec<PathBuf> {
    if files.is_empty() {
        return database.files().map(Path::to_path_buf).collect();
    }

    let mut requested = Vec::new();
    for file in files {
        if file.is_dir() {
            let found = database.expand_directory(file);
            if found.is_empty() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::NotInCompileDatabase,
                        "directory contains no compile database entries",
                    )
                    .with_file(file),
                );
            }
            requested.extend(found);
            continue;
        }

        match database.lookup(file, cwd) {
            FileLookup::Found(path) => requested.push(path),
            FileLookup::Missing { suggestion } => {
                let message = match suggestion {
                    Some(s) => format!("not in the compile database (did you mean {}?)", s.display()),
                    None => "not in the compile database".to_string(),
                };
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::NotInCompileDatabase, message).with_file(file),
                );
            }
            FileLookup::Ambiguous(candidates) => {
                let names: Vec<String> =
                    candidates.iter().map(|c| c.display().to_string()).collect();
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::NotInCompileDatabase,
                        format!("ambiguous, matches {}", names.join(", ")),
                    )
                    .with_file(file),
                );
            }
        }
    }
    requested.sort();
    requested.dedup();
    requested
}

/// Helper: Show unified diff between original and ported content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (ported)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Note => "note".cyan(),
    };
    let location = match (&diagnostic.file, &diagnostic.range) {
        (Some(file), Some(range)) => format!("{}:{}..{}: ", file.display(), range.start, range.end),
        (Some(file), None) => format!("{}: ", file.display()),
        _ => String::new(),
    };
    eprintln!(
        "{}[{}] {}{}",
        label,
        diagnostic.kind.name(),
        location,
        diagnostic.message
    );
}

fn cmd_port(args: PortArgs) -> Result<()> {
    // 1. Rule selection, fatal on any problem
    let config = run_config(&args)?;

    let cwd = env::current_dir()?;
    let source_root = args
        .source_dir
        .canonicalize()
        .with_context(|| format!("source directory {}", args.source_dir.display()))?;
    let build_dir = args
        .build_path
        .canonicalize()
        .with_context(|| format!("build directory {}", args.build_path.display()))?;

    // 2. Compile database and requested files
    let database = CompilationDatabase::load_from_directory(&build_dir)?;
    let diagnostics = Diagnostics::new();
    let requested = resolve_requested(&database, &args.files, &cwd, &diagnostics);

    // 3. Match records
    let stream = load_records(&args.matches)?;
    for rejected in &stream.rejected {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::MalformedRecord,
                format!("line {}: {}", rejected.line, rejected.message),
            )
            .with_file(&args.matches),
        );
    }

    println!("Source root: {}", source_root.display());
    println!("Rule: {}", config.rule.family());
    if let Some(guard) = &config.guard {
        println!("Guard: #if {}", guard.condition());
    }
    println!(
        "Matches: {} records, {} requested files",
        stream.records.len(),
        requested.len()
    );
    println!();

    // 4. Scan
    let scope = RequestScope::new(requested, database.files().map(Path::to_path_buf));
    let session = Session::new(&config, &cwd)
        .with_source_root(&source_root)
        .with_scope(scope);
    let sources = session.load_sources(&stream.records, &diagnostics);
    let edits = session.scan(&stream.records, &sources, &diagnostics);

    // 5. Apply
    let mode = if args.export.is_some() {
        ApplyMode::Export
    } else if args.dry_run {
        ApplyMode::DryRun
    } else {
        ApplyMode::Write
    };
    if mode == ApplyMode::DryRun {
        println!("{}", "[DRY RUN - showing what would be applied]".cyan());
    }

    let applier = EditApplier::new(mode)
        .with_syntax_check(args.check_syntax)
        .with_guard(SourceRootGuard::new(&source_root)?.forbid(&build_dir));

    let mut rewritten = 0;
    let mut unchanged = 0;
    let mut failed = 0;
    let mut exported: Vec<ExportedEdit> = Vec::new();

    for result in applier.apply_all(edits.into_file_sets()) {
        match result {
            Ok(rewrite) => {
                report_rewrite(&rewrite, mode, args.diff);
                if rewrite.changed() {
                    rewritten += 1;
                } else {
                    unchanged += 1;
                }
                exported.extend(rewrite.exported());
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), e.file().display(), e);
                diagnostics.push(Diagnostic::failed_file(&e));
                failed += 1;
            }
        }
    }

    if let Some(path) = &args.export {
        let json = serde_json::to_string_pretty(&exported)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!(
            "{} {} edits exported to {}",
            "✓".green(),
            exported.len(),
            path.display()
        );
    }

    // 6. Diagnostics and summary
    let diagnostics = diagnostics.into_sorted();
    if !diagnostics.is_empty() {
        println!();
        for diagnostic in &diagnostics {
            print_diagnostic(diagnostic);
        }
    }

    let skipped = diagnostics
        .iter()
        .filter(|d| d.severity != Severity::Note)
        .count();
    println!();
    println!("{}", "Summary:".bold());
    let verb = if mode == ApplyMode::Write {
        "rewritten"
    } else {
        "would change"
    };
    println!("  {} {}", format!("{}", rewritten).green(), verb);
    println!("  {} unchanged", format!("{}", unchanged).yellow());
    println!("  {} diagnostics", format!("{}", skipped).cyan());
    println!("  {} failed", format!("{}", failed).red());

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn report_rewrite(rewrite: &FileRewrite, mode: ApplyMode, show_diff: bool) {
    if !rewrite.changed() {
        println!(
            "{} {}: no change",
            "⊙".yellow(),
            rewrite.file.display()
        );
        return;
    }

    let action = match mode {
        ApplyMode::Write => "Rewrote",
        ApplyMode::DryRun => "Would rewrite",
        ApplyMode::Export => "Exported",
    };
    println!(
        "{} {} {} ({} edits)",
        "✓".green(),
        action,
        rewrite.file.display(),
        rewrite.edits.len()
    );

    if show_diff {
        display_diff(&rewrite.file, &rewrite.original, &rewrite.rewritten);
    }
}

fn cmd_rules() -> Result<()> {
    println!("{}", "Rule families:".bold());
    for family in RuleFamily::ALL {
        println!("  {:<18} {}", family.name().cyan(), family.description());
        println!(
            "  {:<18} {}",
            "",
            format!("roles: {}", family.required_roles().join(", ")).dimmed()
        );
    }

    println!();
    println!("{}", "Presets:".bold());
    for preset in Preset::ALL {
        println!(
            "  {:<34} {}",
            format!("--port-{}", preset.name()).cyan(),
            preset.description()
        );
    }

    Ok(())
}
