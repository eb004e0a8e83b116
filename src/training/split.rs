//! Stratified train/validation splitting

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Row indices of a train/validation partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

impl SplitIndices {
    /// Select the rows of `x` and `y` belonging to each partition
    pub fn apply<T: Clone>(
        &self,
        x: &Array2<f64>,
        y: &Array1<T>,
    ) -> (Array2<f64>, Array1<T>, Array2<f64>, Array1<T>) {
        (
            x.select(Axis(0), &self.train),
            y.select(Axis(0), &self.train),
            x.select(Axis(0), &self.validation),
            y.select(Axis(0), &self.validation),
        )
    }
}

/// Single stratified holdout split with a fixed seed.
///
/// The validation partition holds `ceil(test_size * n)` rows. Each class gets
/// a validation quota by largest-remainder apportionment of its exact share,
/// so every class is within one row of its proportional share.
#[derive(Debug, Clone)]
pub struct StratifiedSplitter {
    test_size: f64,
    random_state: u64,
}

impl StratifiedSplitter {
    /// Create a splitter; `test_size` must lie strictly between 0 and 1
    pub fn new(test_size: f64, random_state: u64) -> Result<Self> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PipelineError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        Ok(Self {
            test_size,
            random_state,
        })
    }

    /// Partition rows given their encoded class labels
    pub fn split(&self, y: &Array1<usize>) -> Result<SplitIndices> {
        let n_samples = y.len();

        let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            by_class.entry(label).or_default().push(i);
        }
        let n_classes = by_class.len();

        if let Some((class, members)) = by_class.iter().find(|(_, m)| m.len() < 2) {
            return Err(PipelineError::StratificationError(format!(
                "class {} has {} member(s); every class needs at least 2",
                class,
                members.len()
            )));
        }

        let n_val = (self.test_size * n_samples as f64).ceil() as usize;
        let n_train = n_samples - n_val.min(n_samples);
        if n_val < n_classes || n_train < n_classes {
            return Err(PipelineError::StratificationError(format!(
                "train size {} and validation size {} must both be at least the number of classes ({})",
                n_train, n_val, n_classes
            )));
        }

        let counts: Vec<usize> = by_class.values().map(|m| m.len()).collect();
        let quotas = apportion(&counts, n_val, n_samples);

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut train = Vec::with_capacity(n_train);
        let mut validation = Vec::with_capacity(n_val);

        for (members, &quota) in by_class.values().zip(quotas.iter()) {
            let mut members = members.clone();
            members.shuffle(&mut rng);
            validation.extend_from_slice(&members[..quota]);
            train.extend_from_slice(&members[quota..]);
        }

        train.shuffle(&mut rng);
        validation.shuffle(&mut rng);

        Ok(SplitIndices { train, validation })
    }
}

/// Largest-remainder apportionment of `total` seats among groups sized `counts`
/// out of `n`. Ties on the remainder go to the larger group, then the earlier one.
fn apportion(counts: &[usize], total: usize, n: usize) -> Vec<usize> {
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| total as f64 * c as f64 / n as f64)
        .collect();
    let mut quotas: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let assigned: usize = quotas.iter().sum();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
            .then_with(|| counts[b].cmp(&counts[a]))
            .then_with(|| a.cmp(&b))
    });

    for &i in order.iter().take(total.saturating_sub(assigned)) {
        quotas[i] += 1;
    }

    // every class keeps at least one training row
    let mut excess = 0;
    for (q, &c) in quotas.iter_mut().zip(counts) {
        if *q >= c {
            excess += *q + 1 - c;
            *q = c - 1;
        }
    }
    for &i in order.iter().cycle().take(order.len() * counts.len().max(1)) {
        if excess == 0 {
            break;
        }
        if quotas[i] + 1 < counts[i] {
            quotas[i] += 1;
            excess -= 1;
        }
    }
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(n0: usize, n1: usize) -> Array1<usize> {
        let mut v = vec![0; n0];
        v.extend(vec![1; n1]);
        Array1::from(v)
    }

    #[test]
    fn test_split_sizes_and_proportions() {
        let y = labels(70, 30);
        let split = StratifiedSplitter::new(0.2, 42).unwrap().split(&y).unwrap();

        assert_eq!(split.validation.len(), 20);
        assert_eq!(split.train.len(), 80);
        let val_pos = split.validation.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(val_pos, 6);
    }

    #[test]
    fn test_split_is_partition() {
        let y = labels(13, 8);
        let split = StratifiedSplitter::new(0.3, 7).unwrap().split(&y).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(split.validation.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..21).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_deterministic() {
        let y = labels(40, 25);
        let a = StratifiedSplitter::new(0.25, 3).unwrap().split(&y).unwrap();
        let b = StratifiedSplitter::new(0.25, 3).unwrap().split(&y).unwrap();
        let c = StratifiedSplitter::new(0.25, 4).unwrap().split(&y).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_singleton_class_rejected() {
        let y = array![0, 0, 0, 0, 1];
        let err = StratifiedSplitter::new(0.2, 0).unwrap().split(&y).unwrap_err();
        assert!(matches!(err, PipelineError::StratificationError(_)));
    }

    #[test]
    fn test_validation_smaller_than_class_count_rejected() {
        let y = array![0, 0, 1, 1, 2, 2];
        let err = StratifiedSplitter::new(0.1, 0).unwrap().split(&y).unwrap_err();
        assert!(matches!(err, PipelineError::StratificationError(_)));
    }

    #[test]
    fn test_invalid_test_size() {
        assert!(StratifiedSplitter::new(0.0, 0).is_err());
        assert!(StratifiedSplitter::new(1.0, 0).is_err());
    }

    #[test]
    fn test_apportion_largest_remainder() {
        assert_eq!(apportion(&[5, 5, 5], 4, 15), vec![2, 1, 1]);
        assert_eq!(apportion(&[70, 30], 20, 100), vec![14, 6]);
        assert_eq!(apportion(&[2, 3], 2, 5), vec![1, 1]);
    }

    #[test]
    fn test_apportion_leaves_a_training_row_per_class() {
        let quotas = apportion(&[2, 10], 10, 12);
        assert_eq!(quotas.iter().sum::<usize>(), 10);
        assert!(quotas[0] <= 1);
        assert!(quotas[1] <= 9);
    }

    #[test]
    fn test_apply_selects_rows() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0usize, 1, 0, 1];
        let split = SplitIndices {
            train: vec![0, 1],
            validation: vec![3, 2],
        };
        let (x_tr, y_tr, x_val, y_val) = split.apply(&x, &y);
        assert_eq!(x_tr, array![[0.0], [1.0]]);
        assert_eq!(y_tr, array![0, 1]);
        assert_eq!(x_val, array![[3.0], [2.0]]);
        assert_eq!(y_val, array![1, 0]);
    }
}
