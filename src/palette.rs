/// Fallback for languages the table does not know (and for `Unknown`).
pub const DEFAULT_COLOR: &str = "#8b8b8b";

/// GitHub's published language colors for the languages that realistically
/// show up in trending data. Lookup is case-sensitive on the exact primary
/// language name the API reports.
const LANGUAGE_COLORS: &[(&str, &str)] = &[
    ("JavaScript", "#f1e05a"),
    ("TypeScript", "#3178c6"),
    ("Python", "#3572A5"),
    ("Java", "#b07219"),
    ("Go", "#00ADD8"),
    ("Rust", "#dea584"),
    ("C++", "#f34b7d"),
    ("C", "#555555"),
    ("Ruby", "#701516"),
    ("PHP", "#4F5D95"),
    ("Swift", "#F05138"),
    ("Kotlin", "#A97BFF"),
    ("Dart", "#00B4AB"),
    ("C#", "#178600"),
    ("Shell", "#89e051"),
    ("HTML", "#e34c26"),
    ("CSS", "#563d7c"),
    ("Vue", "#41b883"),
    ("Svelte", "#ff3e00"),
    ("Jupyter Notebook", "#DA5B0B"),
];

/// Total lookup: unmapped languages degrade to [`DEFAULT_COLOR`].
pub fn color_for(language: &str) -> &'static str {
    LANGUAGE_COLORS
        .iter()
        .find(|(name, _)| *name == language)
        .map_or(DEFAULT_COLOR, |(_, color)| color)
}
