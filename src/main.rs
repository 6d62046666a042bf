use actor_clippy::LintEngine;
use actor_clippy::cli::{Args, Command, LintArgs, OutputFormat};
use actor_clippy::config;
use actor_clippy::diagnostics::Diagnostic;
use actor_clippy::level::LintLevel;
use actor_clippy::lint::{LintRegistry, LintSettings};
use actor_clippy::semantic::ActorSettings;
use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

fn main() -> ExitCode {
    actor_clippy::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Some(Command::ListRules) => {
            list_rules();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Explain { rule }) => {
            explain_rule(&rule)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Lint(lint)) => lint_command(lint),
        None => lint_command(args.lint),
    }
}

fn list_rules() {
    let registry = LintRegistry::default_rules();
    let mut rules: Vec<_> = registry.descriptors().collect();
    rules.sort_by_key(|d| d.name);

    for d in rules {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            d.code,
            d.name,
            d.category.as_str(),
            d.default_level,
            d.description
        );
    }
}

fn explain_rule(rule: &str) -> anyhow::Result<()> {
    let Some(d) = LintRegistry::default_rules().find_descriptor(rule) else {
        anyhow::bail!("unknown lint: {rule}");
    };

    println!("name: {}", d.name);
    println!("code: {}", d.code);
    println!("category: {}", d.category.as_str());
    println!("default level: {}", d.default_level);
    println!("description: {}", d.description);
    println!();
    println!("{}", d.explanation);
    Ok(())
}

/// One linted input: its display name and findings.
struct FileReport {
    file: String,
    diagnostics: Vec<Diagnostic>,
}

fn lint_command(args: LintArgs) -> anyhow::Result<ExitCode> {
    let start_dir = infer_start_dir(&args)?;
    let loaded_cfg = config::load_config(args.config.as_deref(), &start_dir)?;

    let (disabled, settings, actors) = match loaded_cfg.as_ref() {
        Some((path, cfg)) => {
            debug!(config = %path.display(), "loaded config");
            (
                cfg.lints.disabled.clone(),
                cfg.lint_settings(),
                cfg.actor_settings(),
            )
        }
        None => (Vec::new(), LintSettings::default(), ActorSettings::default()),
    };

    let registry = LintRegistry::default_rules_filtered(&args.only, &args.skip, &disabled)?;
    let engine = LintEngine::new_with_settings(registry, settings).with_actor_settings(actors);

    let reports = if args.paths.is_empty() {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        vec![FileReport {
            file: "stdin".to_string(),
            diagnostics: engine.lint_source(&source)?,
        }]
    } else {
        let files = collect_cs_files(&args.paths)?;
        info!(files = files.len(), "linting");
        lint_files_parallel(&engine, &files, args.jobs)?
    };

    let mut total_diags = 0usize;
    let mut has_error = false;
    for report in &reports {
        total_diags += report.diagnostics.len();
        has_error |= report.diagnostics.iter().any(|d| d.level.is_error());
    }

    match args.format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Pretty => print_pretty(&reports),
        OutputFormat::Github => print_github(&reports, args.deny_warnings),
    }

    if has_error || (args.deny_warnings && total_diags > 0) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Lint `files` on scoped worker threads; reports come back in `files` order.
fn lint_files_parallel(
    engine: &LintEngine,
    files: &[PathBuf],
    jobs: Option<usize>,
) -> anyhow::Result<Vec<FileReport>> {
    let workers = jobs
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1)
        .clamp(1, files.len().max(1));
    let chunk_size = files.len().div_ceil(workers).max(1);

    let results: Vec<anyhow::Result<Vec<FileReport>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || -> anyhow::Result<Vec<FileReport>> {
                    chunk.iter().map(|p| lint_file(engine, p)).collect()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("lint worker panicked")))
            })
            .collect()
    });

    let mut reports = Vec::with_capacity(files.len());
    for chunk in results {
        reports.extend(chunk?);
    }
    Ok(reports)
}

fn lint_file(engine: &LintEngine, path: &Path) -> anyhow::Result<FileReport> {
    let diagnostics = engine
        .lint_file(path)
        .with_context(|| format!("failed to lint {}", path.display()))?;
    Ok(FileReport {
        file: path.display().to_string(),
        diagnostics,
    })
}

fn print_pretty(reports: &[FileReport]) {
    for report in reports {
        for diag in &report.diagnostics {
            println!(
                "{}:{}:{}: {}: {}[{}]: {}",
                report.file,
                diag.span.start.row,
                diag.span.start.column,
                diag.level.as_str(),
                diag.lint.name,
                diag.lint.code,
                diag.message
            );
            if let Some(help) = &diag.help {
                println!("  help: {help}");
            }
        }
        println!("{} diagnostics for {}", report.diagnostics.len(), report.file);
    }
}

fn print_github(reports: &[FileReport], deny_warnings: bool) {
    for report in reports {
        for diag in &report.diagnostics {
            let kind = if diag.level == LintLevel::Error
                || (deny_warnings && diag.level == LintLevel::Warn)
            {
                "error"
            } else {
                "warning"
            };

            println!(
                "::{} file={},line={},col={},endLine={},endColumn={},title={}::{}",
                kind,
                github_escape(&report.file),
                diag.span.start.row,
                diag.span.start.column,
                diag.span.end.row,
                diag.span.end.column,
                diag.lint.code,
                github_escape(&diag.message)
            );
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonDiagnostic {
    file: String,
    row: usize,
    column: usize,
    end_row: usize,
    end_column: usize,
    level: String,
    lint: String,
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

fn print_json(reports: &[FileReport]) -> anyhow::Result<()> {
    let mut out: Vec<JsonDiagnostic> = reports
        .iter()
        .flat_map(|r| {
            r.diagnostics.iter().map(|d| JsonDiagnostic {
                file: r.file.clone(),
                row: d.span.start.row,
                column: d.span.start.column,
                end_row: d.span.end.row,
                end_column: d.span.end.column,
                level: d.level.as_str().to_string(),
                lint: d.lint.name.to_string(),
                code: d.lint.code.to_string(),
                message: d.message.clone(),
                help: d.help.clone(),
            })
        })
        .collect();

    out.sort_by(|a, b| {
        (a.file.as_str(), a.row, a.column, a.lint.as_str())
            .cmp(&(b.file.as_str(), b.row, b.column, b.lint.as_str()))
    });

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn github_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn collect_cs_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        collect_from_path(path, &mut out)?;
    }

    out.sort();
    out.dedup();
    Ok(out)
}

fn collect_from_path(path: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let meta = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("cannot access {}: {e}", path.display()))?;
    if meta.is_dir() {
        collect_from_dir(path, out)
    } else {
        out.push(path.to_path_buf());
        Ok(())
    }
}

fn collect_from_dir(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            collect_from_dir(&path, out)?;
            continue;
        }

        if path.extension().and_then(|e| e.to_str()) == Some("cs") {
            out.push(path);
        }
    }

    Ok(())
}

fn should_skip_dir(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };

    matches!(name, ".git" | "target" | "bin" | "obj")
}

fn infer_start_dir(args: &LintArgs) -> anyhow::Result<PathBuf> {
    let base = if let Some(p) = args.paths.first() {
        p.clone()
    } else {
        std::env::current_dir()?
    };

    let base = if base.is_file() {
        base.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        base
    };

    Ok(base)
}
