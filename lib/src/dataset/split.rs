//! Stratified train/test split.

use crate::dataset::DatasetError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Row indices of the two halves of a split, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so each label keeps its share in both halves.
///
/// For every label, `round(count * test_fraction)` of its rows go to the test
/// half, chosen by a shuffle seeded with `seed`. The same labels and seed always
/// give the same split.
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, DatasetError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DatasetError::Split(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if labels.is_empty() {
        return Err(DatasetError::Empty);
    }

    let mut by_label: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for (label, mut indices) in by_label {
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * test_fraction).round() as usize;
        tracing::debug!(label, total = indices.len(), test = n_test, "stratum");
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(DatasetError::Split(format!(
            "{} rows are too few for a test fraction of {}",
            labels.len(),
            test_fraction
        )));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<u8> {
        // 80 negatives, 20 positives
        (0..100).map(|i| u8::from(i % 5 == 0)).collect()
    }

    #[test]
    fn test_split_preserves_class_ratio() {
        let labels = labels();
        let split = stratified_split(&labels, 0.25, 42).unwrap();

        assert_eq!(split.test.len(), 25);
        assert_eq!(split.train.len(), 75);
        let test_pos = split.test.iter().filter(|&&i| labels[i] == 1).count();
        let train_pos = split.train.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(test_pos, 5);
        assert_eq!(train_pos, 15);
    }

    #[test]
    fn test_split_is_partition() {
        let split = stratified_split(&labels(), 0.25, 42).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
        assert!(split.train.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = stratified_split(&labels(), 0.25, 42).unwrap();
        let b = stratified_split(&labels(), 0.25, 42).unwrap();
        assert_eq!(a, b);

        let c = stratified_split(&labels(), 0.25, 7).unwrap();
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn test_invalid_fraction() {
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                stratified_split(&labels(), fraction, 42),
                Err(DatasetError::Split(_))
            ));
        }
    }

    #[test]
    fn test_too_few_rows() {
        assert!(matches!(
            stratified_split(&[1], 0.25, 42),
            Err(DatasetError::Split(_))
        ));
        assert!(matches!(
            stratified_split(&[], 0.25, 42),
            Err(DatasetError::Empty)
        ));
    }
}
