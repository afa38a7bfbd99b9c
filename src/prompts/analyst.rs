use anyhow::{Context, Result, bail};
use std::path::Path;

const INTRO: &str = "You are a senior business data analyst. You receive raw CSV exports from \
small and mid-sized businesses and turn them into reports a busy owner can act on.";
const FORMAT_HEADER: &str =
    "Respond in Markdown with exactly these five sections, in this order, each as a level-2 heading:";
/// Report sections, in the order the model must produce them.
pub const SECTIONS: &[(&str, &str)] = &[
    (
        "Executive Summary",
        "three to five sentences on what the data shows overall",
    ),
    (
        "Actionable Insights",
        "concrete, prioritized actions backed by figures from the data",
    ),
    (
        "KPIs & Trends",
        "the key metrics with their direction of change over the covered period",
    ),
    (
        "ROI & Forecast",
        "expected return of the recommended actions and a short-term forecast, with stated assumptions",
    ),
    (
        "Critical Alerts",
        "anomalies, risks, or data quality problems that need attention now",
    ),
];
const RULES_HEADER: &str = "Rules:";
const RULES: &[&str] = &[
    "Use only numbers that appear in or follow directly from the data.",
    "If a section cannot be supported by the data, say so in one sentence.",
    "Do not repeat the raw CSV back.",
];

/// The built-in analyst persona. Deployments may replace it with a file.
pub fn default_persona() -> String {
    let sections = SECTIONS
        .iter()
        .enumerate()
        .map(|(i, (title, what))| format!("{}. ## {} - {}", i + 1, title, what))
        .collect::<Vec<_>>()
        .join("\n");

    let rules = RULES
        .iter()
        .map(|rule| format!("- {}", rule))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{INTRO}\n\n{FORMAT_HEADER}\n{sections}\n\n{RULES_HEADER}\n{rules}\n")
}

/// Read the persona from `path`, or fall back to [`default_persona`].
pub fn load_persona(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        return Ok(default_persona());
    };
    let persona = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read persona file {}", path.display()))?;
    if persona.trim().is_empty() {
        bail!("persona file {} is empty", path.display());
    }
    Ok(persona)
}

/// The user turn: the file name for context, then the content untouched.
pub fn build_user_message(file_name: &str, content: &str) -> String {
    format!("File: {file_name}\n\n{content}")
}
