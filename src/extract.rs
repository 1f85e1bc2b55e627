use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};

use crate::{
    error::{TapestryError, TapestryResult},
    model::{DailySlice, LanguageCounts, RawTrendingRow, SliceMetrics, TopRepoEntry, TrendingPayload},
    palette,
};

/// The upstream ranking already ordered the rows; we keep the first ten.
pub const TOP_REPO_LIMIT: usize = 10;

/// Label used when a row carries no primary language.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// The archive is keyed by the calendar date in a fixed +08:00 offset:
/// shift the UTC instant by eight hours and truncate to the date. Kept as a
/// fixed offset rather than a tzdb zone on purpose.
pub fn archive_date(now: DateTime<Utc>) -> String {
    (now + Duration::hours(8)).format("%Y-%m-%d").to_string()
}

/// Build one day's slice from a raw payload. Pure: the date is passed in so
/// callers (and tests) control the archive key.
pub fn build_slice(payload: &TrendingPayload, date: impl Into<String>) -> TapestryResult<DailySlice> {
    let rows = &payload.data.rows;
    if rows.is_empty() {
        return Err(TapestryError::no_data("payload has no trending rows"));
    }

    let top_repos: Vec<TopRepoEntry> = rows.iter().take(TOP_REPO_LIMIT).map(top_repo_entry).collect();

    let total_stars: u64 = top_repos.iter().map(|r| r.stars).sum();
    let avg_score = round2(top_repos.iter().map(|r| r.score).sum::<f64>() / top_repos.len() as f64);

    let mut language_distribution = LanguageCounts::new();
    for repo in &top_repos {
        language_distribution.record(&repo.language);
    }

    let dominant_language = language_distribution
        .dominant()
        .map_or_else(|| UNKNOWN_LANGUAGE.to_string(), |(lang, _)| lang.to_string());
    let dominant_color = palette::color_for(&dominant_language).to_string();

    let slice = DailySlice {
        date: date.into(),
        metrics: SliceMetrics {
            total_stars,
            avg_score,
            dominant_language,
            dominant_color,
            language_distribution,
        },
        top_repos,
    };
    slice.validate()?;
    Ok(slice)
}

fn top_repo_entry(row: &RawTrendingRow) -> TopRepoEntry {
    let language = match row.primary_language.as_deref() {
        Some(lang) if !lang.is_empty() => lang.to_string(),
        _ => UNKNOWN_LANGUAGE.to_string(),
    };
    TopRepoEntry {
        name: row.repo_name.clone(),
        color: palette::color_for(&language).to_string(),
        stars: row.stars.trim().parse().unwrap_or(0),
        score: row.total_score.trim().parse().unwrap_or(0.0),
        language,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Extract today's slice and persist it: one dated file in `data_dir` plus
/// the `latest` pointer, both from the same serialized bytes.
#[tracing::instrument(skip(payload))]
pub fn run_extract(
    payload: &TrendingPayload,
    data_dir: &Path,
    latest_path: &Path,
) -> TapestryResult<(DailySlice, PathBuf)> {
    let slice = build_slice(payload, archive_date(Utc::now()))?;
    let slice_path = write_slice(&slice, data_dir, latest_path)?;
    Ok((slice, slice_path))
}

pub fn write_slice(
    slice: &DailySlice,
    data_dir: &Path,
    latest_path: &Path,
) -> TapestryResult<PathBuf> {
    let json = serde_json::to_string_pretty(slice).map_err(|e| TapestryError::serde(e.to_string()))?;

    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir '{}'", data_dir.display()))?;
    let slice_path = data_dir.join(format!("{}.json", slice.date));
    fs::write(&slice_path, &json)
        .with_context(|| format!("write slice '{}'", slice_path.display()))?;

    if let Some(parent) = latest_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create latest dir '{}'", parent.display()))?;
    }
    fs::write(latest_path, &json)
        .with_context(|| format!("write latest pointer '{}'", latest_path.display()))?;

    tracing::info!(
        date = %slice.date,
        repos = slice.top_repos.len(),
        dominant = %slice.metrics.dominant_language,
        color = %slice.metrics.dominant_color,
        total_stars = slice.metrics.total_stars,
        "slice written"
    );
    Ok(slice_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PayloadData;

    fn row(name: &str, language: Option<&str>, stars: &str, score: &str) -> RawTrendingRow {
        RawTrendingRow {
            repo_name: name.to_string(),
            primary_language: language.map(str::to_string),
            stars: stars.to_string(),
            total_score: score.to_string(),
            ..RawTrendingRow::default()
        }
    }

    fn payload(rows: Vec<RawTrendingRow>) -> TrendingPayload {
        TrendingPayload {
            data: PayloadData { rows },
        }
    }

    #[test]
    fn empty_payload_is_no_data() {
        let err = build_slice(&payload(vec![]), "2025-06-01").unwrap_err();
        assert!(matches!(err, TapestryError::NoData(_)));
    }

    #[test]
    fn ten_identical_rust_rows_match_reference_metrics() {
        let rows = (0..10)
            .map(|i| row(&format!("r/{i}"), Some("Rust"), "2100", "87.5"))
            .collect();
        let slice = build_slice(&payload(rows), "2025-06-01").unwrap();
        assert_eq!(slice.metrics.total_stars, 21_000);
        assert_eq!(slice.metrics.avg_score, 87.5);
        assert_eq!(slice.metrics.dominant_language, "Rust");
        assert_eq!(slice.metrics.dominant_color, "#dea584");
        assert_eq!(slice.metrics.language_distribution.get("Rust"), Some(10));
    }

    #[test]
    fn truncates_to_top_ten_in_input_order() {
        let rows = (0..12)
            .map(|i| row(&format!("r/{i}"), Some("Go"), "1", "1"))
            .collect();
        let slice = build_slice(&payload(rows), "2025-06-01").unwrap();
        assert_eq!(slice.top_repos.len(), 10);
        assert_eq!(slice.top_repos[0].name, "r/0");
        assert_eq!(slice.top_repos[9].name, "r/9");
    }

    #[test]
    fn malformed_numerics_coerce_to_zero() {
        let rows = vec![
            row("a/a", Some("Rust"), "not-a-number", "nope"),
            row("b/b", Some("Rust"), "", "12.25"),
        ];
        let slice = build_slice(&payload(rows), "2025-06-01").unwrap();
        assert_eq!(slice.top_repos[0].stars, 0);
        assert_eq!(slice.top_repos[0].score, 0.0);
        assert_eq!(slice.metrics.total_stars, 0);
        assert_eq!(slice.metrics.avg_score, 6.13);
    }

    #[test]
    fn missing_and_empty_language_become_unknown_gray() {
        let rows = vec![row("a/a", None, "1", "1"), row("b/b", Some(""), "1", "1")];
        let slice = build_slice(&payload(rows), "2025-06-01").unwrap();
        for repo in &slice.top_repos {
            assert_eq!(repo.language, "Unknown");
            assert_eq!(repo.color, palette::DEFAULT_COLOR);
        }
        assert_eq!(slice.metrics.dominant_language, "Unknown");
        assert_eq!(slice.metrics.dominant_color, palette::DEFAULT_COLOR);
    }

    #[test]
    fn distribution_counts_sum_to_repo_count() {
        let rows = vec![
            row("a/a", Some("Rust"), "1", "1"),
            row("b/b", Some("Go"), "1", "1"),
            row("c/c", Some("Rust"), "1", "1"),
            row("d/d", None, "1", "1"),
        ];
        let slice = build_slice(&payload(rows), "2025-06-01").unwrap();
        let sum: u64 = slice.metrics.language_distribution.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, slice.top_repos.len() as u64);
        slice.validate().unwrap();
    }

    #[test]
    fn archive_date_shifts_into_utc_plus_eight() {
        let late_utc = DateTime::parse_from_rfc3339("2025-06-01T20:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(archive_date(late_utc), "2025-06-02");

        let morning_utc = DateTime::parse_from_rfc3339("2025-06-01T02:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(archive_date(morning_utc), "2025-06-01");
    }

    #[test]
    fn write_slice_is_idempotent_and_mirrors_latest() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("daily");
        let latest = dir.path().join("latest.json");

        let rows = vec![row("a/a", Some("Rust"), "10", "5")];
        let slice = build_slice(&payload(rows), "2025-06-01").unwrap();

        let p1 = write_slice(&slice, &data_dir, &latest).unwrap();
        let first = fs::read(&p1).unwrap();
        let p2 = write_slice(&slice, &data_dir, &latest).unwrap();
        assert_eq!(p1, p2);
        assert_eq!(first, fs::read(&p2).unwrap());
        assert_eq!(first, fs::read(&latest).unwrap());
    }
}
