mod pipeline;
mod playlist;
mod policy;
mod quality;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::pipeline::{Options, Reduction, Summary};
use crate::policy::FilterRules;
use crate::quality::QualityTier;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reduce an IPTV playlist to the best entry per channel under a size budget"
)]
struct Cli {
    /// Input playlist file
    input: PathBuf,

    /// Output file (defaults to <input stem>_pruned.m3u, use - for stdout)
    output: Option<PathBuf>,

    /// Entries to keep per channel
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    keep: usize,

    /// Retain channels whose name carries no recognizable quality token
    #[arg(long, action = ArgAction::SetTrue)]
    keep_unclassified: bool,

    /// Byte budget for the output playlist, header included
    #[arg(long, default_value_t = 20 * 1024 * 1024, value_name = "BYTES")]
    max_size: usize,

    /// Filter rules file (JSON); falls back to the user config dir, then
    /// the built-in rules
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().filter_or("RUST_LOG", "info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let rules = load_rules(cli.rules.as_deref())?;

    let input = fs::read_to_string(&cli.input)
        .with_context(|| format!("Reading playlist {} failed", cli.input.display()))?;

    let options = Options {
        keep_count: cli.keep,
        keep_unclassified: cli.keep_unclassified,
        max_output_bytes: cli.max_size,
        rules,
    };

    let Reduction { output, summary } = pipeline::reduce(&input, &options)?;

    let destination = cli
        .output
        .unwrap_or_else(|| derive_output_path(&cli.input));

    if destination.as_os_str() == "-" {
        io::stdout()
            .write_all(output.as_bytes())
            .context("Writing playlist to stdout failed")?;
    } else {
        fs::write(&destination, &output)
            .with_context(|| format!("Writing playlist {} failed", destination.display()))?;
        info!("Wrote {} channels to {}", summary.emitted, destination.display());
    }

    report(&summary);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn load_rules(path: Option<&Path>) -> Result<FilterRules> {
    if let Some(path) = path {
        return read_rules(path);
    }

    if let Some(path) = dirs::config_dir()
        .map(|dir| dir.join("m3u-prune").join("rules.json"))
        .filter(|path| path.exists())
    {
        debug!("Loading rules from {}", path.display());
        return read_rules(&path);
    }

    Ok(FilterRules::builtin())
}

fn read_rules(path: &Path) -> Result<FilterRules> {
    let bytes = fs::read(path)
        .with_context(|| format!("Reading rules file {} failed", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Rules file {} is not valid JSON", path.display()))
}

fn derive_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "playlist".to_string());
    input.with_file_name(format!("{stem}_pruned.m3u"))
}

fn report(summary: &Summary) {
    if summary.parsed == 0 {
        info!("Input contained no channel entries");
        return;
    }

    info!(
        "Channels: {} parsed, {} rejected by policy ({} category, {} name, {} address)",
        summary.parsed,
        summary.rejected_category + summary.rejected_name + summary.rejected_address,
        summary.rejected_category,
        summary.rejected_name,
        summary.rejected_address,
    );
    if summary.unclassified_dropped > 0 {
        info!("Dropped {} channels with no quality token", summary.unclassified_dropped);
    }
    if summary.malformed > 0 {
        info!("Dropped {} malformed metadata lines", summary.malformed);
    }
    info!(
        "{} groups -> {} after dedup, {} cut by the byte budget",
        summary.groups, summary.kept_after_dedup, summary.cut_by_budget,
    );

    if summary.emitted == 0 {
        info!("All {} channels were excluded", summary.parsed);
        return;
    }

    let removed = summary.parsed - summary.emitted;
    info!(
        "Kept {} of {} channels ({:.1}% reduction), {} bytes",
        summary.emitted,
        summary.parsed,
        removed as f64 / summary.parsed as f64 * 100.0,
        summary.output_bytes,
    );

    let tiers = &summary.tiers;
    for (tier, count) in [
        (QualityTier::Uhd, tiers.uhd),
        (QualityTier::FullHd, tiers.fhd),
        (QualityTier::Hd, tiers.hd),
        (QualityTier::Sd, tiers.sd),
        (QualityTier::Unknown, tiers.unknown),
    ] {
        if count > 0 {
            info!("  {:<10} {count} channels", tier.label());
        }
    }
}
