//! Random choice of the images for one post.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::scan::Candidate;

/// Images attached to every post.
pub const BATCH_SIZE: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("only {available} unposted images left, {required} needed")]
    NotEnoughCandidates { available: usize, required: usize },
}

/// Draws [`BATCH_SIZE`] distinct candidates uniformly at random.
pub fn select_batch<R>(candidates: &[Candidate], rng: &mut R) -> Result<Vec<Candidate>, SelectError>
where
    R: Rng + ?Sized,
{
    if candidates.len() < BATCH_SIZE {
        return Err(SelectError::NotEnoughCandidates {
            available: candidates.len(),
            required: BATCH_SIZE,
        });
    }
    let batch: Vec<Candidate> = candidates
        .choose_multiple(rng, BATCH_SIZE)
        .cloned()
        .collect();
    info!(
        selected = ?batch.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        from = candidates.len(),
        "Selected batch"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn candidates(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| Candidate {
                path: PathBuf::from(format!("/pool/images/{i}.png")),
                id: format!("images/{i}.png"),
            })
            .collect()
    }

    #[test]
    fn exactly_four_candidates_are_all_selected() {
        let pool = candidates(4);
        let mut rng = StdRng::seed_from_u64(7);

        let batch = select_batch(&pool, &mut rng).unwrap();

        let chosen: HashSet<_> = batch.iter().map(|c| c.id.clone()).collect();
        let all: HashSet<_> = pool.iter().map(|c| c.id.clone()).collect();
        assert_eq!(chosen, all);
    }

    #[test]
    fn fewer_than_four_candidates_fail() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = select_batch(&candidates(3), &mut rng).unwrap_err();
        assert_eq!(
            err,
            SelectError::NotEnoughCandidates {
                available: 3,
                required: BATCH_SIZE
            }
        );
        assert!(err.to_string().contains("only 3 unposted images left"));
    }

    #[test]
    fn batch_is_distinct_and_drawn_from_pool() {
        let pool = candidates(20);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let batch = select_batch(&pool, &mut rng).unwrap();
            assert_eq!(batch.len(), BATCH_SIZE);
            let distinct: HashSet<_> = batch.iter().map(|c| &c.id).collect();
            assert_eq!(distinct.len(), BATCH_SIZE, "seed {seed} repeated a candidate");
            assert!(batch.iter().all(|c| pool.contains(c)));
        }
    }

    #[test]
    fn every_candidate_can_be_chosen() {
        let pool = candidates(6);
        let mut seen = HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            for c in select_batch(&pool, &mut rng).unwrap() {
                seen.insert(c.id);
            }
        }
        assert_eq!(seen.len(), pool.len());
    }
}
