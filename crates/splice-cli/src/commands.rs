use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use splice_diff::{extract, BoundaryTokens, LineSpan, LineTag};
use splice_merge::{DiffRegistry, MergeSession, ResolveStatus, SessionState, Side, SpliceConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Blocks(args) => cmd_blocks(config, args, format),
        Command::Diff(args) => cmd_diff(config, args, format),
        Command::Merge(args) => cmd_merge(config, args, format),
        Command::Config(_) => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SpliceConfig> {
    let Some(path) = path else {
        return Ok(SpliceConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    SpliceConfig::from_toml_str(&text).with_context(|| format!("loading config {}", path.display()))
}

fn apply_tokens(config: &mut SpliceConfig, args: &TokenArgs) {
    if !args.tokens.is_empty() {
        config.boundary_tokens = BoundaryTokens::new(args.tokens.iter().cloned());
    }
}

fn apply_source(mut config: SpliceConfig, args: &SourceArgs) -> anyhow::Result<SpliceConfig> {
    if let Some(order) = args.order {
        config.key_order = order.into();
    }
    apply_tokens(&mut config, &args.tokens);
    if args.no_hints {
        config.hints = false;
    }
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn span_label(span: Option<LineSpan>) -> String {
    match span {
        None => "-".to_string(),
        Some(span) => match span.last_line() {
            Some(last) => format!("{}-{}", span.first_line() + 1, last + 1),
            None => "empty".to_string(),
        },
    }
}

// ---------------------------------------------------------------
// blocks
// ---------------------------------------------------------------

fn cmd_blocks(mut config: SpliceConfig, args: BlocksArgs, format: OutputFormat) -> anyhow::Result<()> {
    apply_tokens(&mut config, &args.tokens);
    config.validate()?;
    let text = read(&args.file)?;
    print!("{}", render_blocks(&text, &config.boundary_tokens, format)?);
    Ok(())
}

pub fn render_blocks(text: &str, tokens: &BoundaryTokens, format: OutputFormat) -> anyhow::Result<String> {
    let blocks = extract(text, tokens);
    if format == OutputFormat::Json {
        let list: Vec<_> = blocks.iter().collect();
        return Ok(serde_json::to_string_pretty(&list)? + "\n");
    }

    let mut out = String::new();
    for block in &blocks {
        writeln!(
            out,
            "{:>9}  {}",
            span_label(Some(block.span)).dimmed(),
            block.key.bold()
        )?;
    }
    writeln!(out, "{} blocks", blocks.len())?;
    Ok(out)
}

// ---------------------------------------------------------------
// diff
// ---------------------------------------------------------------

fn cmd_diff(config: SpliceConfig, args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = apply_source(config, &args.source)?;
    let original = read(&args.source.original)?;
    let new = read(&args.source.new)?;
    let registry = DiffRegistry::from_texts(&original, &new, &config);
    print!("{}", render_diff(&registry, format)?);
    Ok(())
}

pub fn render_diff(registry: &DiffRegistry, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(registry.records())? + "\n");
    }

    let mut out = String::new();
    if registry.is_empty() {
        writeln!(out, "{} No conflicts.", "✓".green().bold())?;
        return Ok(out);
    }

    for (i, record) in registry.iter().enumerate() {
        writeln!(
            out,
            "{} {}  (original {}, new {})",
            format!("Conflict {}:", i + 1).yellow().bold(),
            record.label().bold(),
            span_label(record.original.as_ref().map(|b| b.span)),
            span_label(record.new.as_ref().map(|b| b.span)),
        )?;
        for line in &record.lines {
            let rendered = line.to_string();
            let rendered = match line.tag {
                LineTag::Context => rendered.normal(),
                LineTag::Removed => rendered.red(),
                LineTag::Added => rendered.green(),
                LineTag::Hint => rendered.dimmed(),
            };
            writeln!(out, "  {rendered}")?;
        }
    }
    let stats = registry.stats();
    writeln!(
        out,
        "{} conflicts, {} {}",
        registry.len(),
        format!("+{}", stats.additions).green(),
        format!("-{}", stats.deletions).red(),
    )?;
    Ok(out)
}

// ---------------------------------------------------------------
// merge
// ---------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MergeStep {
    pub conflict: Option<String>,
    pub side: Side,
    pub status: ResolveStatus,
}

#[derive(Debug, Serialize)]
pub struct MergeReport {
    pub conflicts: Vec<String>,
    pub steps: Vec<MergeStep>,
    pub state: SessionState,
    pub output: String,
}

/// Run a scripted merge: the sides in `take` first, then `default` until
/// every conflict is resolved.
pub fn merge_texts(
    config: SpliceConfig,
    original: &str,
    new: &str,
    take: &[Side],
    default: Side,
) -> anyhow::Result<MergeReport> {
    let mut session = MergeSession::new(config)?;
    session.compute(original, new);
    let conflicts = session.labels().into_iter().map(str::to_string).collect();

    let mut steps = Vec::new();
    let script = take.iter().copied().chain(std::iter::repeat(default));
    for side in script {
        if session.state() != SessionState::Resolving {
            break;
        }
        let conflict = session.current_target().map(|t| t.key);
        let outcome = session.resolve_side(side);
        tracing::debug!(?conflict, %side, status = ?outcome.status, "merge step");
        steps.push(MergeStep {
            conflict,
            side,
            status: outcome.status,
        });
    }

    Ok(MergeReport {
        conflicts,
        steps,
        state: session.state(),
        output: session.take_output(),
    })
}

fn cmd_merge(config: SpliceConfig, args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = apply_source(config, &args.source)?;
    let original = read(&args.source.original)?;
    let new = read(&args.source.new)?;
    let take: Vec<Side> = args.take.iter().copied().map(Side::from).collect();

    let report = merge_texts(config, &original, &new, &take, args.default.into())?;

    if let Some(path) = &args.output {
        fs::write(path, &report.output).with_context(|| format!("writing {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if args.output.is_none() {
                print!("{}", report.output);
            }
            eprint!("{}", render_merge_summary(&report)?);
            if let Some(path) = &args.output {
                eprintln!("Wrote {}", path.display().to_string().bold());
            }
        }
    }
    Ok(())
}

pub fn render_merge_summary(report: &MergeReport) -> anyhow::Result<String> {
    let mut out = String::new();
    for step in &report.steps {
        let status = match step.status {
            ResolveStatus::ConflictsRemaining => "conflicts remaining".yellow(),
            ResolveStatus::AllResolved => "all conflicts resolved".green(),
            ResolveStatus::NoMoreConflicts => "no more conflicts".dimmed(),
        };
        writeln!(
            out,
            "  {} {} → {}",
            step.side.to_string().cyan(),
            step.conflict.as_deref().unwrap_or("-"),
            status
        )?;
    }
    match report.state {
        SessionState::Done => writeln!(
            out,
            "{} Merged {} conflicts.",
            "✓".green().bold(),
            report.conflicts.len()
        )?,
        _ => writeln!(out, "{} Merge incomplete.", "!".yellow().bold())?,
    }
    Ok(out)
}

// ---------------------------------------------------------------
// config
// ---------------------------------------------------------------

fn cmd_config(config: &SpliceConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
