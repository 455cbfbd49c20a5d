use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pgn_tally::{ClassificationKey, Tally};

fn random_tally(rng: &mut StdRng) -> Tally {
    Tally::from_counts(
        rng.random_range(0..50),
        rng.random_range(0..50),
        rng.random_range(0..50),
        rng.random_range(0..50),
    )
}

fn permutations(items: &[Tally]) -> Vec<Vec<Tally>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for idx in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(idx);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// Fold right-to-left so grouping differs from the left fold.
fn fold_right(tallies: &[Tally]) -> Tally {
    tallies
        .iter()
        .rev()
        .fold(Tally::new(), |acc, tally| tally.merge(&acc))
}

#[test]
fn merge_order_and_grouping_never_change_the_result() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
        let tallies: Vec<Tally> = (0..4).map(|_| random_tally(&mut rng)).collect();
        let expected = Tally::merge_all(&tallies);
        for order in permutations(&tallies) {
            assert_eq!(order.len(), 4);
            assert_eq!(Tally::merge_all(&order), expected);
            assert_eq!(fold_right(&order), expected);
            let pairs = order[0].merge(&order[1]).merge(&order[2].merge(&order[3]));
            assert_eq!(pairs, expected);
        }
    }
}

#[test]
fn merge_identity_and_totals() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let a = random_tally(&mut rng);
        let b = random_tally(&mut rng);
        assert_eq!(a.merge(&Tally::new()), a);
        assert_eq!(Tally::new().merge(&a), a);
        let merged = a.merge(&b);
        assert_eq!(merged.total(), a.total() + b.total());
        for key in ClassificationKey::ALL {
            assert_eq!(merged.count(key), a.count(key) + b.count(key));
        }
    }
}

#[test]
fn merge_does_not_mutate_inputs() {
    let a = Tally::from_counts(1, 2, 3, 4);
    let b = Tally::from_counts(4, 3, 2, 1);
    let _ = a.merge(&b);
    assert_eq!(a, Tally::from_counts(1, 2, 3, 4));
    assert_eq!(b, Tally::from_counts(4, 3, 2, 1));
}
