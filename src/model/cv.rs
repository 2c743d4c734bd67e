//! K-fold cross-validation splits.

use crate::error::ModelError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// One train/test partition of a pool of sample positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct KFold {
    pub splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl KFold {
    pub fn new(splits: usize, shuffle: bool, seed: u64) -> Self {
        Self {
            splits,
            shuffle,
            seed,
        }
    }

    /// Partition positions `0..samples`. The first `samples % splits` test
    /// folds get one extra sample; positions within a fold stay sorted.
    pub fn split(&self, samples: usize) -> Result<Vec<Fold>, ModelError> {
        if self.splits < 2 || samples < self.splits {
            return Err(ModelError::InvalidFolds {
                folds: self.splits,
                samples,
            });
        }

        let mut order: Vec<usize> = (0..samples).collect();
        if self.shuffle {
            let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
            order.shuffle(&mut rng);
        }

        let base = samples / self.splits;
        let extra = samples % self.splits;
        let mut folds = Vec::with_capacity(self.splits);
        let mut start = 0;
        for k in 0..self.splits {
            let size = base + usize::from(k < extra);
            let mut in_test = vec![false; samples];
            for &i in &order[start..start + size] {
                in_test[i] = true;
            }
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..samples).partition(|&i| in_test[i]);
            folds.push(Fold { train, test });
            start += size;
        }
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_are_disjoint_and_cover_pool() {
        for shuffle in [false, true] {
            let folds = KFold::new(5, shuffle, 7).split(23).unwrap();
            assert_eq!(folds.len(), 5);
            let mut seen = vec![0usize; 23];
            for fold in &folds {
                assert_eq!(fold.train.len() + fold.test.len(), 23);
                for i in &fold.test {
                    assert!(!fold.train.contains(i));
                    seen[*i] += 1;
                }
            }
            // Each sample is held out exactly once.
            assert!(seen.iter().all(|&c| c == 1));
        }
    }

    #[test]
    fn sizes_match_remainder_rule() {
        let folds = KFold::new(4, false, 0).split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
        assert_eq!(folds[0].test, vec![0, 1, 2]);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let a = KFold::new(3, true, 11).split(30).unwrap();
        let b = KFold::new(3, true, 11).split(30).unwrap();
        let c = KFold::new(3, true, 12).split(30).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn too_few_samples_is_an_error() {
        assert_eq!(
            KFold::new(5, false, 0).split(3),
            Err(ModelError::InvalidFolds {
                folds: 5,
                samples: 3
            })
        );
        assert!(KFold::new(1, false, 0).split(10).is_err());
    }
}
