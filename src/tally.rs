use serde::{Deserialize, Serialize};
use std::iter::Sum;

use crate::data::ClassificationKey;

/// Per-key counts of classified records.
///
/// `total` is derived from the counts on every read, so it can never drift
/// from their sum. `merge` is a pure pointwise sum: associative, commutative,
/// and exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tally {
    counts: [u64; ClassificationKey::COUNT],
}

impl Tally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more record classified as `key`.
    pub fn observe(&mut self, key: ClassificationKey) {
        let slot = &mut self.counts[key.index()];
        *slot = slot.saturating_add(1);
    }

    /// Pointwise sum of `self` and `other`; neither input is changed.
    #[must_use]
    pub fn merge(&self, other: &Tally) -> Tally {
        let mut counts = self.counts;
        for (slot, add) in counts.iter_mut().zip(other.counts) {
            *slot = slot.saturating_add(add);
        }
        Tally { counts }
    }

    /// Reduce any number of tallies into one.
    pub fn merge_all<'a, I>(tallies: I) -> Tally
    where
        I: IntoIterator<Item = &'a Tally>,
    {
        tallies
            .into_iter()
            .fold(Tally::new(), |acc, tally| acc.merge(tally))
    }

    /// Count for a single key.
    pub fn count(&self, key: ClassificationKey) -> u64 {
        self.counts[key.index()]
    }

    /// Sum of all per-key counts.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }

    /// True when no record has been observed.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate `(key, count)` pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassificationKey, u64)> + '_ {
        ClassificationKey::ALL
            .iter()
            .map(move |key| (*key, self.count(*key)))
    }

    /// Build a tally directly from per-key counts.
    pub fn from_counts(white_wins: u64, black_wins: u64, draws: u64, unknown: u64) -> Self {
        Self {
            counts: [white_wins, black_wins, draws, unknown],
        }
    }
}

impl FromIterator<ClassificationKey> for Tally {
    fn from_iter<I: IntoIterator<Item = ClassificationKey>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for key in iter {
            tally.observe(key);
        }
        tally
    }
}

impl Sum for Tally {
    fn sum<I: Iterator<Item = Tally>>(iter: I) -> Self {
        iter.fold(Tally::new(), |acc, tally| acc.merge(&tally))
    }
}

impl<'a> Sum<&'a Tally> for Tally {
    fn sum<I: Iterator<Item = &'a Tally>>(iter: I) -> Self {
        Tally::merge_all(iter)
    }
}

/// Flat wire shape used for JSON output.
#[derive(Serialize, Deserialize)]
struct TallyRepr {
    white_wins: u64,
    black_wins: u64,
    draws: u64,
    unknown: u64,
    total: u64,
}

impl Serialize for Tally {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TallyRepr {
            white_wins: self.count(ClassificationKey::WhiteWins),
            black_wins: self.count(ClassificationKey::BlackWins),
            draws: self.count(ClassificationKey::Draw),
            unknown: self.count(ClassificationKey::Unknown),
            total: self.total(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tally {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TallyRepr::deserialize(deserializer)?;
        let tally = Tally::from_counts(repr.white_wins, repr.black_wins, repr.draws, repr.unknown);
        if tally.total() != repr.total {
            return Err(serde::de::Error::custom(format!(
                "tally total {} does not match sum of counts {}",
                repr.total,
                tally.total()
            )));
        }
        Ok(tally)
    }
}
