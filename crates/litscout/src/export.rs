//! Output formatting for project records.
//!
//! Records are always presented in descending score order; anything fancier
//! than score ordering is out of scope.

use serde_json::{Value, json};

use crate::models::ArticleRecord;

/// Sort records by score, descending; ties broken by id for stable output.
#[must_use]
pub fn sorted_by_score(mut records: Vec<&ArticleRecord>) -> Vec<&ArticleRecord> {
    records.sort_by(|a, b| {
        b.evaluation.score.cmp(&a.evaluation.score).then_with(|| a.id().cmp(b.id()))
    });
    records
}

/// Compact JSON representation of one record.
#[must_use]
pub fn compact_record(record: &ArticleRecord, threshold: u8) -> Value {
    let mut obj = json!({
        "id": record.article.id,
        "title": record.article.title,
        "score": record.evaluation.score,
        "is_relevant": record.evaluation.is_relevant(threshold),
        "justification": record.evaluation.justification,
        "depth": record.depth,
        "url": record.article.url,
    });

    if let Some(year) = record.article.year {
        obj["year"] = json!(year);
    }
    if !record.article.authors.is_empty() {
        obj["authors"] = json!(record.article.author_line());
    }
    if !record.article.venue.is_empty() {
        obj["venue"] = json!(record.article.venue);
    }
    if let Some(ref parent) = record.parent {
        obj["parent"] = json!(parent);
    }
    if let Some(relation) = record.relation {
        obj["relation"] = json!(relation.label());
    }

    obj
}

/// Render records as pretty JSON, score-sorted.
pub fn format_records_json(records: &[&ArticleRecord], threshold: u8) -> serde_json::Result<String> {
    let values: Vec<Value> = sorted_by_score(records.to_vec())
        .iter()
        .map(|r| compact_record(r, threshold))
        .collect();
    serde_json::to_string_pretty(&values)
}

/// Render records as a markdown report, score-sorted.
#[must_use]
pub fn format_records_markdown(records: &[&ArticleRecord], threshold: u8) -> String {
    let sorted = sorted_by_score(records.to_vec());
    let relevant = sorted.iter().filter(|r| r.evaluation.is_relevant(threshold)).count();

    let mut output = format!(
        "# Discovered articles\n\n**Total**: {} | **Relevant (score >= {})**: {}\n\n",
        sorted.len(),
        threshold,
        relevant
    );

    for record in sorted {
        let marker = if record.evaluation.is_relevant(threshold) { "✅" } else { "—" };
        output.push_str(&format!(
            "## {} {} (score {})\n\n",
            marker,
            if record.article.title.is_empty() { "(untitled)" } else { &record.article.title },
            record.evaluation.score
        ));

        if !record.article.authors.is_empty() {
            output.push_str(&format!("*{}*", record.article.author_line()));
            if let Some(year) = record.article.year {
                output.push_str(&format!(" ({year})"));
            }
            output.push_str("\n\n");
        }

        output.push_str(&format!(
            "- PMID: [{}]({})\n- Depth: {}\n",
            record.article.id, record.article.url, record.depth
        ));
        if let Some(ref parent) = record.parent {
            let via = record.relation.map_or("", |r| r.label());
            output.push_str(&format!("- Found via: {parent} ({via})\n"));
        }
        output.push_str(&format!("- Reasoning: {}\n\n", record.evaluation.justification));
    }

    output
}

/// Render records as CSV with RFC 4180 quoting, score-sorted.
#[must_use]
pub fn format_records_csv(records: &[&ArticleRecord], threshold: u8) -> String {
    let mut output =
        String::from("pmid,title,year,authors,venue,score,is_relevant,depth,parent,relation,url\n");

    for record in sorted_by_score(records.to_vec()) {
        let fields = [
            record.article.id.clone(),
            record.article.title.clone(),
            record.article.year.map(|y| y.to_string()).unwrap_or_default(),
            record.article.author_line(),
            record.article.venue.clone(),
            record.evaluation.score.to_string(),
            record.evaluation.is_relevant(threshold).to_string(),
            record.depth.to_string(),
            record.parent.clone().unwrap_or_default(),
            record.relation.map(|r| r.label().to_string()).unwrap_or_default(),
            record.article.url.clone(),
        ];

        let row: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        output.push_str(&row.join(","));
        output.push('\n');
    }

    output
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
