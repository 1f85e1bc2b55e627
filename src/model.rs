use crate::error::{TapestryError, TapestryResult};

/// Raw OSSInsight-style trending payload: `{ "data": { "rows": [...] } }`.
///
/// Every field defaults so a payload with a missing or empty `data.rows`
/// deserializes cleanly and fails later with a `NoData` error instead of a
/// parse error.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct TrendingPayload {
    #[serde(default)]
    pub data: PayloadData,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct PayloadData {
    #[serde(default)]
    pub rows: Vec<RawTrendingRow>,
}

/// One repository row as the upstream API reports it. Numeric fields arrive
/// as strings and are untrusted; coercion happens at extraction time.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct RawTrendingRow {
    #[serde(default)]
    pub repo_id: String,
    #[serde(default)]
    pub repo_name: String,
    #[serde(default)]
    pub primary_language: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stars: String,
    #[serde(default)]
    pub forks: String,
    #[serde(default)]
    pub total_score: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TopRepoEntry {
    pub name: String,
    pub language: String,
    pub color: String,
    pub stars: u64,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceMetrics {
    pub total_stars: u64,
    pub avg_score: f64,
    pub dominant_language: String,
    pub dominant_color: String,
    pub language_distribution: LanguageCounts,
}

/// One day's persisted aggregate record. Keyed by `date`; a re-run for the
/// same date overwrites the whole slice.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySlice {
    pub date: String,
    pub metrics: SliceMetrics,
    pub top_repos: Vec<TopRepoEntry>,
}

impl DailySlice {
    pub fn validate(&self) -> TapestryResult<()> {
        let counted: u64 = self
            .metrics
            .language_distribution
            .iter()
            .map(|(_, n)| n)
            .sum();
        if counted != self.top_repos.len() as u64 {
            return Err(TapestryError::validation(format!(
                "language counts sum to {} but slice has {} repos",
                counted,
                self.top_repos.len()
            )));
        }
        if !self.metrics.language_distribution.is_empty()
            && self
                .metrics
                .language_distribution
                .get(&self.metrics.dominant_language)
                .is_none()
        {
            return Err(TapestryError::validation(format!(
                "dominant language '{}' is not in the distribution",
                self.metrics.dominant_language
            )));
        }
        Ok(())
    }
}

/// Insertion-ordered language frequency counter.
///
/// Iteration order is first-record order, which pins the dominant-language
/// tie-break: the first language to reach the maximum count wins. Serializes
/// as a JSON object with keys in that same order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LanguageCounts(Vec<(String, u64)>);

impl LanguageCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, language: &str) {
        if let Some(entry) = self.0.iter_mut().find(|(lang, _)| lang == language) {
            entry.1 += 1;
        } else {
            self.0.push((language.to_string(), 1));
        }
    }

    pub fn get(&self, language: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, n)| *n)
    }

    /// The first-encountered language carrying the maximum count.
    pub fn dominant(&self) -> Option<(&str, u64)> {
        let mut best: Option<(&str, u64)> = None;
        for (lang, count) in &self.0 {
            if best.is_none_or(|(_, n)| *count > n) {
                best = Some((lang.as_str(), *count));
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(lang, n)| (lang.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl serde::Serialize for LanguageCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap as _;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (lang, count) in &self.0 {
            map.serialize_entry(lang, count)?;
        }
        map.end()
    }
}

impl<'de> serde::Deserialize<'de> for LanguageCounts {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountsVisitor;

        impl<'de> serde::de::Visitor<'de> for CountsVisitor {
            type Value = LanguageCounts;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of language name to count")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<Self::Value, A::Error> {
                let mut counts = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, u64>()? {
                    counts.push(entry);
                }
                Ok(LanguageCounts(counts))
            }
        }

        deserializer.deserialize_map(CountsVisitor)
    }
}
