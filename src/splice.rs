use std::{fs, path::Path};

use anyhow::Context as _;

use crate::{error::TapestryResult, model::DailySlice};

/// Sentinel lines delimiting the digest region in the host document.
/// Matched as whole trimmed lines, never as substrings.
pub const SPLICE_START: &str = "<!-- tapestry:start -->";
pub const SPLICE_END: &str = "<!-- tapestry:end -->";

/// How many repos the digest table shows.
const DIGEST_ROWS: usize = 5;

/// Render the latest slice as a markdown digest: a one-line summary and a
/// top-5 table. With no slice, a placeholder notice.
pub fn render_digest(latest: Option<&DailySlice>) -> String {
    let Some(slice) = latest else {
        return "_No trending data woven yet. Check back after the first daily run._\n".to_string();
    };

    let mut out = format!(
        "Updated `{}` — dominant language **{}**, {} total stars.\n\n\
         | # | Repository | Language | Stars |\n\
         |---|------------|----------|-------|\n",
        escape_md(&slice.date),
        escape_md(&slice.metrics.dominant_language),
        slice.metrics.total_stars,
    );

    for (rank, repo) in slice.top_repos.iter().take(DIGEST_ROWS).enumerate() {
        out.push_str(&format!(
            "| {} | [{}](https://github.com/{}) | ![{}]({}) | {} |\n",
            rank + 1,
            escape_md(&repo.name),
            repo.name,
            escape_md(&repo.language),
            badge_url(&repo.language, &repo.color),
            repo.stars,
        ));
    }
    out
}

/// Shields.io flat badge for a language in its slice color.
fn badge_url(language: &str, color: &str) -> String {
    format!(
        "https://img.shields.io/badge/{}-{}?style=flat-square",
        badge_label(language),
        color.trim_start_matches('#'),
    )
}

/// Shields badge labels use `--`/`__` for literal dash/underscore and
/// percent-encoding for everything else outside the unreserved set.
fn badge_label(language: &str) -> String {
    let mut out = String::with_capacity(language.len());
    for c in language.chars() {
        match c {
            '-' => out.push_str("--"),
            '_' => out.push_str("__"),
            c if c.is_ascii_alphanumeric() || c == '.' || c == '~' => out.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    out
}

/// Pipes would break the table; angle brackets would open raw HTML.
fn escape_md(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '|' => out.push_str("\\|"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace the content strictly between the sentinel lines. `None` when
/// either sentinel is missing, leaving the host untouched.
pub fn splice_into(host: &str, fragment: &str) -> Option<String> {
    let lines: Vec<&str> = host.lines().collect();
    let start = lines.iter().position(|l| l.trim() == SPLICE_START)?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.trim() == SPLICE_END)
        .map(|i| i + start + 1)?;

    let mut out = String::with_capacity(host.len() + fragment.len());
    for line in &lines[..=start] {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(fragment);
    if !fragment.ends_with('\n') {
        out.push('\n');
    }
    for line in &lines[end..] {
        out.push_str(line);
        out.push('\n');
    }
    Some(out)
}

/// Splice the digest into the host document. Returns whether a write
/// happened; a missing host or missing sentinels is a skip, not an error.
#[tracing::instrument(skip(latest))]
pub fn run_splice(latest: Option<&DailySlice>, host_path: &Path) -> TapestryResult<bool> {
    if !host_path.exists() {
        tracing::warn!(host = %host_path.display(), "host document missing, skipping splice");
        return Ok(false);
    }

    let host = fs::read_to_string(host_path)
        .with_context(|| format!("read host document '{}'", host_path.display()))?;
    let fragment = render_digest(latest);

    match splice_into(&host, &fragment) {
        Some(updated) => {
            fs::write(host_path, updated)
                .with_context(|| format!("write host document '{}'", host_path.display()))?;
            tracing::info!(host = %host_path.display(), "digest spliced");
            Ok(true)
        }
        None => {
            tracing::warn!(
                host = %host_path.display(),
                "sentinels not found, skipping splice"
            );
            Ok(false)
        }
    }
}
