use crate::models::analytics::METRIC_CATALOG;
use crate::models::journal::JournalExcerpt;

const INSTRUCTIONS: &str = "\
You analyze language patterns in personal journal writing.

Rules:
- Describe observable patterns in the wording only. Give no medical, clinical or therapeutic advice.
- Never use diagnostic vocabulary such as depression, anxiety, disorder, therapy, diagnosis, treatment, illness, disease or pathology.
- Never tell the writer what they should do.
- Keep every observation neutral and factual.
- Score each metric against the writer's own history in these entries, never against a population norm.

For each metric return:
- score: integer 0-100 for the pattern's strength relative to the writer's baseline
- trend: \"improving\", \"stable\" or \"declining\" compared with that baseline
- summary: one or two plain sentences describing what you observed
- relativeToBaseline: signed percentage change from the baseline

Respond with a single JSON object in exactly the structure below and nothing else.";

const METRIC_SHAPE: &str = r#"{"score": <0-100>, "trend": "<improving|stable|declining>", "summary": "<observation>", "relativeToBaseline": <percent>}"#;

/// JSON skeleton listing every category and metric key.
pub fn schema_outline() -> String {
    let categories: Vec<String> = METRIC_CATALOG
        .iter()
        .map(|(category, metrics)| {
            let fields: Vec<String> = metrics
                .iter()
                .map(|metric| format!("    \"{metric}\": {METRIC_SHAPE}"))
                .collect();
            format!("  \"{category}\": {{\n{}\n  }}", fields.join(",\n"))
        })
        .collect();

    format!("{{\n{}\n}}", categories.join(",\n"))
}

pub fn format_entries(entries: &[JournalExcerpt]) -> String {
    entries
        .iter()
        .map(|e| format!("Date: {}\nEntry: {}", e.date, e.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn build_prompt(entries: &[JournalExcerpt]) -> String {
    format!(
        "{INSTRUCTIONS}\n\n{}\n\nJournal entries:\n\n{}",
        schema_outline(),
        format_entries(entries)
    )
}
