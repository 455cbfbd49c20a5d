use indexmap::IndexMap;
use serde::Serialize;

use crate::coordinator::SourceSummary;
use crate::data::ClassificationKey;
use crate::tally::Tally;
use crate::types::SourceId;
use crate::utils::percent;

/// Outcome percentages of a tally, rounded to one decimal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ResultShares {
    /// Percentage of white wins.
    pub white_pct: f64,
    /// Percentage of black wins.
    pub black_pct: f64,
    /// Percentage of draws.
    pub draw_pct: f64,
    /// Percentage of records with no recognized result.
    pub unknown_pct: f64,
}

/// Compute outcome percentages over the tally's total.
/// All shares are zero for an empty tally.
pub fn result_shares(tally: &Tally) -> ResultShares {
    let total = tally.total();
    ResultShares {
        white_pct: percent(tally.count(ClassificationKey::WhiteWins), total),
        black_pct: percent(tally.count(ClassificationKey::BlackWins), total),
        draw_pct: percent(tally.count(ClassificationKey::Draw), total),
        unknown_pct: percent(tally.count(ClassificationKey::Unknown), total),
    }
}

/// Aggregate skew of record counts across sources.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceSkew {
    /// Records across all sources.
    pub total: u64,
    /// Number of sources considered.
    pub sources: usize,
    /// Smallest per-source record count.
    pub min: u64,
    /// Largest per-source record count.
    pub max: u64,
    /// Mean records per source.
    pub mean: f64,
    /// Largest source's fraction of `total`.
    pub max_share: f64,
    /// `max / min`; infinite when some source is empty.
    pub ratio: f64,
    /// Per-source shares, largest first.
    pub per_source: Vec<SourceShare>,
}

/// One source's share of all tallied records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceShare {
    /// Source identifier.
    pub source: SourceId,
    /// Records tallied from the source.
    pub records: u64,
    /// Fraction of all tallied records.
    pub share: f64,
}

/// Compute record-count skew across sources, largest first.
/// Returns `None` when no source completed.
pub fn source_skew(per_source: &IndexMap<SourceId, SourceSummary>) -> Option<SourceSkew> {
    if per_source.is_empty() {
        return None;
    }
    let counts: Vec<u64> = per_source
        .values()
        .map(|summary| summary.tally.total())
        .collect();
    let total: u64 = counts.iter().sum();
    let sources = counts.len();
    let min = counts.iter().copied().min().unwrap_or(0);
    let max = counts.iter().copied().max().unwrap_or(0);
    let mean = total as f64 / sources as f64;
    let max_share = if total == 0 {
        0.0
    } else {
        max as f64 / total as f64
    };
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let mut shares: Vec<SourceShare> = per_source
        .iter()
        .map(|(source, summary)| {
            let records = summary.tally.total();
            SourceShare {
                source: source.clone(),
                records,
                share: if total == 0 {
                    0.0
                } else {
                    records as f64 / total as f64
                },
            }
        })
        .collect();
    shares.sort_by(|a, b| {
        b.records
            .cmp(&a.records)
            .then_with(|| a.source.cmp(&b.source))
    });
    Some(SourceSkew {
        total,
        sources,
        min,
        max,
        mean,
        max_share,
        ratio,
        per_source: shares,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(tally: Tally) -> SourceSummary {
        SourceSummary {
            tally,
            shards: 1,
            ..SourceSummary::default()
        }
    }

    #[test]
    fn shares_round_to_one_decimal() {
        let shares = result_shares(&Tally::from_counts(1, 1, 1, 0));
        assert_eq!(shares.white_pct, 33.3);
        assert_eq!(shares.black_pct, 33.3);
        assert_eq!(shares.draw_pct, 33.3);
        assert_eq!(shares.unknown_pct, 0.0);
        assert_eq!(result_shares(&Tally::new()), ResultShares::default());
    }

    #[test]
    fn source_skew_reports_imbalance() {
        let mut per_source = IndexMap::new();
        per_source.insert("a.pgn".to_string(), summary(Tally::from_counts(2, 2, 0, 0)));
        per_source.insert("b.pgn".to_string(), summary(Tally::from_counts(1, 0, 1, 0)));
        per_source.insert("c.pgn".to_string(), summary(Tally::from_counts(0, 0, 0, 2)));
        let skew = source_skew(&per_source).expect("skew");
        assert_eq!(skew.total, 8);
        assert_eq!(skew.sources, 3);
        assert_eq!(skew.min, 2);
        assert_eq!(skew.max, 4);
        assert!((skew.max_share - 0.5).abs() < 1e-9);
        assert!((skew.ratio - 2.0).abs() < 1e-9);
        assert_eq!(skew.per_source[0].source, "a.pgn");
        assert_eq!(skew.per_source[1].source, "b.pgn");
    }

    #[test]
    fn source_skew_is_none_without_sources() {
        assert!(source_skew(&IndexMap::new()).is_none());
    }
}
