use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tapestry", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a fetched trending payload into today's daily slice.
    Extract(ExtractArgs),
    /// Weave the daily slices into the SVG tapestry and splice the digest.
    Weave(WeaveArgs),
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Raw API response JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory holding one slice file per date.
    #[arg(long, default_value = "data/daily")]
    data_dir: PathBuf,

    /// Pointer file mirroring the newest slice.
    #[arg(long, default_value = "data/latest.json")]
    latest: PathBuf,
}

#[derive(Parser, Debug)]
struct WeaveArgs {
    /// Directory holding one slice file per date.
    #[arg(long, default_value = "data/daily")]
    data_dir: PathBuf,

    /// Output SVG path.
    #[arg(long, default_value = "tapestry.svg")]
    out: PathBuf,

    /// Host document carrying the digest sentinels.
    #[arg(long, default_value = "README.md")]
    readme: PathBuf,

    /// Weave the SVG only, leaving the host document alone.
    #[arg(long)]
    skip_readme: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Extract(args) => cmd_extract(args),
        Command::Weave(args) => cmd_weave(args),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tapestry=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read payload '{}'", args.in_path.display()))?;
    let payload: tapestry::TrendingPayload =
        serde_json::from_str(&raw).with_context(|| "parse payload JSON")?;

    match tapestry::run_extract(&payload, &args.data_dir, &args.latest) {
        Ok((slice, slice_path)) => {
            eprintln!("wrote {}", slice_path.display());
            eprintln!(
                "  {} repos for {}, dominant {} ({}), {} total stars",
                slice.top_repos.len(),
                slice.date,
                slice.metrics.dominant_language,
                slice.metrics.dominant_color,
                slice.metrics.total_stars,
            );
            Ok(())
        }
        Err(err @ tapestry::TapestryError::NoData(_)) => {
            // Diagnostic excerpt only; nothing was written.
            let excerpt: String = raw.chars().take(200).collect();
            eprintln!("payload excerpt: {excerpt}");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn cmd_weave(args: WeaveArgs) -> anyhow::Result<()> {
    let cfg = tapestry::WeaveConfig::default();
    let threads = tapestry::run_weave(&args.data_dir, &args.out, &cfg)?;
    eprintln!("wrote {} ({threads} threads)", args.out.display());

    if !args.skip_readme {
        let latest = tapestry::latest_slice(&args.data_dir)?;
        tapestry::run_splice(latest.as_ref(), &args.readme)?;
    }
    Ok(())
}
