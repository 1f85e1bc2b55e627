use std::{fs, fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::{
    error::{TapestryError, TapestryResult},
    model::DailySlice,
};

/// Canvas geometry and animation settings for the woven SVG.
#[derive(Clone, Debug)]
pub struct WeaveConfig {
    pub width: u32,
    pub thread_height: u32,
    /// History cap, newest first (~3 months).
    pub max_threads: usize,
    pub padding: u32,
    pub animation_duration: &'static str,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            width: 800,
            thread_height: 12,
            max_threads: 90,
            padding: 20,
            animation_duration: "8s",
        }
    }
}

/// Minimum canvas height even when there is nothing to weave.
const MIN_HEIGHT: u32 = 200;

/// Wave sample count is `WAVE_SEGMENTS + 1`, inclusive of both ends.
const WAVE_SEGMENTS: u32 = 50;

/// Load slices newest-first: filename sort descending over `*.json`,
/// truncated to the history cap. A missing directory is an empty tapestry,
/// not an error.
pub fn load_slices(data_dir: &Path, max_threads: usize) -> TapestryResult<Vec<DailySlice>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(data_dir)
        .with_context(|| format!("read data dir '{}'", data_dir.display()))?
    {
        let entry = entry.with_context(|| format!("read entry in '{}'", data_dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") {
            names.push(name);
        }
    }
    names.sort();
    names.reverse();
    names.truncate(max_threads);

    names
        .iter()
        .map(|name| read_slice(&data_dir.join(name)))
        .collect()
}

fn read_slice(path: &Path) -> TapestryResult<DailySlice> {
    let f = File::open(path).with_context(|| format!("open slice '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| TapestryError::serde(format!("parse slice '{}': {e}", path.display())))
}

/// Escape the five reserved XML characters. Every externally-sourced string
/// (dates, language names, colors) goes through here before it is embedded
/// in markup.
pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// One slice rendered as wave-path markup plus its gradient definition.
struct Thread {
    gradient: String,
    path: String,
    date: String,
}

/// Wave synthesis: amplitude follows the day's average score (capped at 4
/// units), frequency follows total stars (floored so calm days still
/// oscillate), phase desynchronizes adjacent threads. Identical slice data
/// always yields an identical path.
fn wave_path(baseline_y: f64, slice: &DailySlice, index: usize, cfg: &WeaveConfig) -> String {
    let amplitude = (slice.metrics.avg_score / 500.0).min(1.0) * 4.0;
    let frequency = (slice.metrics.total_stars as f64 / 1000.0).max(0.5);
    let phase = index as f64 * 0.5;

    let width = f64::from(cfg.width);
    let padding = f64::from(cfg.padding);

    let mut d = String::from("M ");
    for i in 0..=WAVE_SEGMENTS {
        let t = f64::from(i) / f64::from(WAVE_SEGMENTS);
        let x = padding + t * (width - padding * 2.0);
        let y = baseline_y + (t * std::f64::consts::PI * frequency * 4.0 + phase).sin() * amplitude;
        if i > 0 {
            d.push_str(" L ");
        }
        d.push_str(&format!("{x:.1},{y:.1}"));
    }
    d
}

/// Gradient stops: top 3 languages by frequency (stable sort keeps the
/// insertion-order tie-break), each resolved to the color of the first
/// top-repo entry carrying that language, padded to at least 2 stops with
/// the dominant color.
fn gradient_stops(slice: &DailySlice) -> Vec<String> {
    let mut ranked: Vec<(&str, u64)> = slice.metrics.language_distribution.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut colors: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|(lang, _)| {
            slice
                .top_repos
                .iter()
                .find(|r| r.language == *lang)
                .map_or_else(|| slice.metrics.dominant_color.clone(), |r| r.color.clone())
        })
        .collect();
    while colors.len() < 2 {
        colors.push(slice.metrics.dominant_color.clone());
    }
    colors
}

fn thread_markup(slice: &DailySlice, index: usize, total: usize, cfg: &WeaveConfig) -> Thread {
    let baseline_y = f64::from(cfg.padding) + index as f64 * f64::from(cfg.thread_height);
    let path_d = wave_path(baseline_y, slice, index, cfg);

    let stroke_width = (slice.metrics.total_stars as f64 / 500.0).clamp(2.0, 8.0);
    let opacity = 0.4 + (1.0 - index as f64 / total as f64) * 0.6;
    let delay = index as f64 * 0.1;

    let stops = gradient_stops(slice);
    let stop0 = escape_xml(&stops[0]);
    let stop1 = escape_xml(stops.get(1).unwrap_or(&stops[0]));
    let stop2 = escape_xml(stops.get(2).unwrap_or(&stops[0]));

    let mut gradient = format!(
        "    <linearGradient id=\"thread-{index}\" x1=\"0%\" y1=\"0%\" x2=\"100%\" y2=\"0%\">\n"
    );
    for (offset, stop) in [("0%", &stop0), ("50%", &stop1), ("100%", &stop2)] {
        gradient.push_str(&format!(
            "      <stop offset=\"{offset}\" stop-color=\"{stop}\" />\n"
        ));
    }
    gradient.push_str("    </linearGradient>");

    let languages: Vec<&str> = slice
        .metrics
        .language_distribution
        .iter()
        .map(|(lang, _)| lang)
        .collect();
    let title = escape_xml(&format!(
        "{}: {} stars, {}",
        slice.date,
        slice.metrics.total_stars,
        languages.join(", ")
    ));

    let path = format!(
        "    <path d=\"{path_d}\" stroke=\"url(#thread-{index})\" stroke-width=\"{stroke_width:.2}\" \
         stroke-linecap=\"round\" fill=\"none\" opacity=\"{opacity:.3}\" class=\"thread\" \
         style=\"animation-delay: {delay:.1}s\">\n      <title>{title}</title>\n    </path>"
    );

    Thread {
        gradient,
        path,
        date: slice.date.clone(),
    }
}

/// Compose the full SVG document from slices ordered newest-first.
/// Deterministic: the same ordered slices always produce identical bytes.
#[tracing::instrument(skip(slices, cfg), fields(threads = slices.len()))]
pub fn weave_tapestry(slices: &[DailySlice], cfg: &WeaveConfig) -> String {
    let width = cfg.width;
    let height = (cfg.padding * 2 + slices.len() as u32 * cfg.thread_height).max(MIN_HEIGHT);

    let threads: Vec<Thread> = slices
        .iter()
        .enumerate()
        .map(|(i, slice)| thread_markup(slice, i, slices.len(), cfg))
        .collect();

    let gradients: Vec<&str> = threads.iter().map(|t| t.gradient.as_str()).collect();
    let gradients = gradients.join("\n");

    let body = if threads.is_empty() {
        let x = width / 2;
        format!(
            "    <text x=\"{x}\" y=\"100\" class=\"empty-state\">The loom awaits its first thread...</text>\n    <text x=\"{x}\" y=\"120\" class=\"empty-state\">Check back tomorrow to see the tapestry begin.</text>"
        )
    } else {
        let paths: Vec<&str> = threads.iter().map(|t| t.path.as_str()).collect();
        paths.join("\n")
    };

    // Every 7th thread gets a month-day label in the right margin.
    let mut date_labels = String::new();
    for (ordinal, thread) in threads.iter().step_by(7).enumerate() {
        let y = cfg.padding + (ordinal as u32 * 7) * cfg.thread_height + 4;
        let label = escape_xml(thread.date.get(5..).unwrap_or(&thread.date));
        if !date_labels.is_empty() {
            date_labels.push('\n');
        }
        date_labels.push_str(&format!(
            "    <text x=\"{x}\" y=\"{y}\" class=\"date-label\">{label}</text>",
            x = width - cfg.padding + 5
        ));
    }

    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}">
  <title>The Data Tapestry - GitHub Trends Woven in Time</title>
  <desc>A living data art piece that weaves daily GitHub trending repositories into an evolving tapestry. Each thread represents one day of open source activity.</desc>

  <style>
    .thread {{
      animation: breathe {animation_duration} ease-in-out infinite alternate;
    }}

    @keyframes breathe {{
      0% {{
        opacity: var(--base-opacity, 0.7);
        stroke-width: var(--base-width, 4);
      }}
      100% {{
        opacity: calc(var(--base-opacity, 0.7) + 0.15);
        stroke-width: calc(var(--base-width, 4) + 0.5);
      }}
    }}

    .date-label {{
      font-family: ui-monospace, monospace;
      font-size: 8px;
      fill: #666;
    }}

    .empty-state {{
      font-family: system-ui, sans-serif;
      font-size: 12px;
      fill: #999;
      text-anchor: middle;
    }}
  </style>

  <defs>
{gradients}

    <pattern id="loom" patternUnits="userSpaceOnUse" width="20" height="20">
      <rect width="20" height="20" fill="#fafafa"/>
      <circle cx="10" cy="10" r="0.5" fill="#eee"/>
    </pattern>
  </defs>

  <rect width="100%" height="100%" fill="url(#loom)"/>

  <g id="tapestry">
{body}
  </g>

  <g id="dates">
{date_labels}
  </g>
</svg>
"##,
        animation_duration = cfg.animation_duration,
    )
}

/// Load, weave and write the tapestry. Returns the number of threads woven.
#[tracing::instrument]
pub fn run_weave(data_dir: &Path, out_path: &Path, cfg: &WeaveConfig) -> TapestryResult<usize> {
    let slices = load_slices(data_dir, cfg.max_threads)?;
    let svg = weave_tapestry(&slices, cfg);

    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    fs::write(out_path, &svg)
        .with_context(|| format!("write tapestry '{}'", out_path.display()))?;

    match slices.first() {
        Some(latest) => tracing::info!(
            threads = slices.len(),
            latest = %latest.date,
            dominant = %latest.metrics.dominant_language,
            "tapestry woven"
        ),
        None => tracing::info!("tapestry woven empty, awaiting first slice"),
    }
    Ok(slices.len())
}

/// The newest slice on disk, if any. Prefers the dated archive over the
/// `latest` pointer so the weaver stays a pure function of the data dir.
pub fn latest_slice(data_dir: &Path) -> TapestryResult<Option<DailySlice>> {
    Ok(load_slices(data_dir, 1)?.into_iter().next())
}
