//! Rendering of run reports for downstream tools and humans.

use serde::Serialize;
use std::io::Write;

use crate::constants::report::{ALL_SOURCES_LABEL, CSV_HEADER};
use crate::coordinator::{RunReport, SourceFailure, SourceSummary};
use crate::data::ClassificationKey;
use crate::errors::TallyError;
use crate::metrics::{ResultShares, result_shares, source_skew};
use crate::tally::Tally;

/// Output shape for a run report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned human-readable table.
    #[default]
    Text,
    /// One JSON object.
    Json,
    /// CSV with a header row, one row per source when requested, and an `ALL` row.
    Csv,
    /// One whitespace-delimited line: `total white_wins black_wins draws unknown`.
    Line,
}

/// Write `report` to `out` in `format`.
///
/// `per_source` adds per-source rows (text, CSV) or a `sources` object (JSON);
/// the delimited line format always carries only the merged tally.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &RunReport,
    format: OutputFormat,
    per_source: bool,
) -> Result<(), TallyError> {
    match format {
        OutputFormat::Line => {
            writeln!(out, "{}", delimited_line(&report.tally))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, &JsonReport::new(report, per_source))?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(out, report, per_source)?,
        OutputFormat::Text => write_text(out, report, per_source)?,
    }
    Ok(())
}

/// Render `total white_wins black_wins draws unknown` on one line.
pub fn delimited_line(tally: &Tally) -> String {
    let mut fields = vec![tally.total().to_string()];
    fields.extend(tally.iter().map(|(_, count)| count.to_string()));
    fields.join(" ")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    tally: &'a Tally,
    shares: ResultShares,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<Vec<JsonSource<'a>>>,
    failures: &'a [SourceFailure],
    cancelled: bool,
    started_at: String,
    finished_at: String,
}

#[derive(Serialize)]
struct JsonSource<'a> {
    source: &'a str,
    #[serde(flatten)]
    summary: &'a SourceSummary,
}

impl<'a> JsonReport<'a> {
    fn new(report: &'a RunReport, per_source: bool) -> Self {
        let sources = per_source.then(|| {
            report
                .per_source
                .iter()
                .map(|(source, summary)| JsonSource { source, summary })
                .collect()
        });
        Self {
            tally: &report.tally,
            shares: result_shares(&report.tally),
            sources,
            failures: &report.failures,
            cancelled: report.cancelled,
            started_at: report.started_at.to_rfc3339(),
            finished_at: report.finished_at.to_rfc3339(),
        }
    }
}

fn write_csv<W: Write>(out: &mut W, report: &RunReport, per_source: bool) -> Result<(), TallyError> {
    writeln!(out, "{CSV_HEADER}")?;
    if per_source {
        for (source, summary) in &report.per_source {
            writeln!(out, "{}", csv_row(source, &summary.tally))?;
        }
    }
    writeln!(out, "{}", csv_row(ALL_SOURCES_LABEL, &report.tally))?;
    Ok(())
}

fn csv_row(label: &str, tally: &Tally) -> String {
    let shares = result_shares(tally);
    format!(
        "{},{},{},{},{},{},{},{},{}",
        csv_field(label),
        tally.total(),
        tally.count(ClassificationKey::WhiteWins),
        tally.count(ClassificationKey::BlackWins),
        tally.count(ClassificationKey::Draw),
        tally.count(ClassificationKey::Unknown),
        shares.white_pct,
        shares.black_pct,
        shares.draw_pct,
    )
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_text<W: Write>(out: &mut W, report: &RunReport, per_source: bool) -> Result<(), TallyError> {
    write_tally_table(out, "All sources", &report.tally)?;
    if per_source {
        for (source, summary) in &report.per_source {
            writeln!(out)?;
            let title = format!("{source} ({} shard(s), {} bytes)", summary.shards, summary.bytes_read);
            write_tally_table(out, &title, &summary.tally)?;
        }
        if let Some(skew) = source_skew(&report.per_source)
            && skew.sources > 1
        {
            writeln!(out)?;
            writeln!(
                out,
                "Largest source holds {:.1}% of records (max/min ratio {:.2})",
                skew.max_share * 100.0,
                skew.ratio
            )?;
        }
    }
    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed sources ({}):", report.failures.len())?;
        for failure in &report.failures {
            writeln!(out, "  {}: {}", failure.source_id, failure.error)?;
        }
    }
    if report.cancelled {
        writeln!(out)?;
        writeln!(out, "Run was cancelled; counts cover completed sources only.")?;
    }
    Ok(())
}

fn write_tally_table<W: Write>(out: &mut W, title: &str, tally: &Tally) -> std::io::Result<()> {
    let shares = result_shares(tally);
    writeln!(out, "{title}")?;
    writeln!(out, "  {:<12} {:>10} {:>10}", "Metric", "Count", "Percent")?;
    writeln!(out, "  {:<12} {:>10} {:>10}", "Total games", tally.total(), "-")?;
    let rows = [
        ("White wins", ClassificationKey::WhiteWins, shares.white_pct),
        ("Black wins", ClassificationKey::BlackWins, shares.black_pct),
        ("Draws", ClassificationKey::Draw, shares.draw_pct),
        ("Unknown", ClassificationKey::Unknown, shares.unknown_pct),
    ];
    for (label, key, pct) in rows {
        writeln!(out, "  {:<12} {:>10} {:>9.1}%", label, tally.count(key), pct)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TallyError;
    use chrono::Utc;
    use indexmap::IndexMap;

    fn report() -> RunReport {
        let mut per_source = IndexMap::new();
        per_source.insert(
            "a.pgn".to_string(),
            SourceSummary {
                tally: Tally::from_counts(2, 1, 0, 0),
                shards: 1,
                bytes_read: 120,
                elapsed_ms: 1,
            },
        );
        per_source.insert(
            "b,c.pgn".to_string(),
            SourceSummary {
                tally: Tally::from_counts(0, 0, 1, 0),
                shards: 2,
                bytes_read: 40,
                elapsed_ms: 1,
            },
        );
        RunReport {
            tally: Tally::from_counts(2, 1, 1, 0),
            per_source,
            failures: vec![SourceFailure {
                source_id: "missing.pgn".into(),
                error: TallyError::SourceUnavailable {
                    source_id: "missing.pgn".into(),
                    reason: "not found".into(),
                },
                failed_shards: 1,
            }],
            cancelled: false,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    fn render(format: OutputFormat, per_source: bool) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, &report(), format, per_source).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn line_format_is_total_then_counts() {
        assert_eq!(render(OutputFormat::Line, true), "4 2 1 1 0\n");
    }

    #[test]
    fn csv_quotes_fields_and_ends_with_all_row() {
        let csv = render(OutputFormat::Csv, true);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "a.pgn,3,2,1,0,0,66.7,33.3,0");
        assert_eq!(lines[2], "\"b,c.pgn\",1,0,0,1,0,0,0,100");
        assert_eq!(lines[3], "ALL,4,2,1,1,0,50,25,25");
        assert_eq!(render(OutputFormat::Csv, false).lines().count(), 2);
    }

    #[test]
    fn json_format_flattens_tally_and_lists_failures() {
        let json: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json, true)).unwrap();
        assert_eq!(json["total"], 4);
        assert_eq!(json["white_wins"], 2);
        assert_eq!(json["shares"]["white_pct"], 50.0);
        assert_eq!(json["sources"][1]["source"], "b,c.pgn");
        assert_eq!(json["sources"][1]["shards"], 2);
        assert_eq!(json["failures"][0]["source_id"], "missing.pgn");
        assert_eq!(json["failures"][0]["kind"], "source_unavailable");

        let json: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json, false)).unwrap();
        assert!(json.get("sources").is_none());
    }

    #[test]
    fn text_format_lists_sources_and_failures() {
        let text = render(OutputFormat::Text, true);
        assert!(text.starts_with("All sources\n"));
        assert!(text.contains("Total games"));
        assert!(text.contains("a.pgn (1 shard(s), 120 bytes)"));
        assert!(text.contains("Failed sources (1):"));
        assert!(text.contains("missing.pgn: source 'missing.pgn' is unavailable: not found"));
    }
}
