use anyhow::{bail, Result};
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::collections::HashMap;

/// One fold of a k-fold split: the rows to train on and the held out rows to score, both in row order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fold {
	pub train_indexes: Vec<usize>,
	pub test_indexes: Vec<usize>,
}

/**
Split the rows into `n_folds` stratified folds, so each fold has about the same class proportions as the whole dataset.

Classes are numbered in order of first appearance. Each fold's share of each class comes from dealing the class-sorted rows to the folds round robin, and then the rows of each class are assigned to folds in row order. With a seed, the fold assignment within each class is shuffled instead.

It is an error when every class has fewer than `n_folds` rows. When only some classes do, a warning is logged and those classes are missing from some folds.
*/
pub fn stratified_k_fold(labels: &[usize], n_folds: usize, seed: Option<u64>) -> Result<Vec<Fold>> {
	if n_folds < 2 {
		bail!("the number of folds must be at least 2, got {}", n_folds);
	}
	if labels.len() < n_folds {
		bail!(
			"cannot split {} rows into {} folds",
			labels.len(),
			n_folds
		);
	}
	// Encode the classes by their order of first appearance.
	let mut class_codes: HashMap<usize, usize> = HashMap::new();
	let encoded: Vec<usize> = labels
		.iter()
		.map(|label| {
			let n_classes = class_codes.len();
			*class_codes.entry(*label).or_insert(n_classes)
		})
		.collect();
	let n_classes = class_codes.len();
	let mut class_counts = vec![0; n_classes];
	for code in encoded.iter() {
		class_counts[*code] += 1;
	}
	if class_counts.iter().all(|count| *count < n_folds) {
		bail!(
			"n_folds = {} cannot be greater than the number of members in each class",
			n_folds
		);
	}
	if class_counts.iter().any(|count| *count < n_folds) {
		tracing::warn!(
			n_folds,
			"the least populated class has only {} members, which is less than the number of folds",
			class_counts.iter().min().copied().unwrap_or(0)
		);
	}

	// Deal the sorted class codes to the folds round robin to get each fold's count of each class.
	let mut sorted = encoded.clone();
	sorted.sort_unstable();
	let mut allocation = vec![vec![0; n_classes]; n_folds];
	for (index, code) in sorted.iter().enumerate() {
		allocation[index % n_folds][*code] += 1;
	}

	let mut rng = seed.map(Xoshiro256Plus::seed_from_u64);
	let mut test_folds = vec![0; labels.len()];
	for code in 0..n_classes {
		let mut folds_for_class: Vec<usize> = (0..n_folds)
			.flat_map(|fold_index| std::iter::repeat(fold_index).take(allocation[fold_index][code]))
			.collect();
		if let Some(rng) = rng.as_mut() {
			folds_for_class.shuffle(rng);
		}
		let rows = encoded
			.iter()
			.enumerate()
			.filter(|(_, row_code)| **row_code == code)
			.map(|(row_index, _)| row_index);
		for (row_index, fold_index) in rows.zip(folds_for_class) {
			test_folds[row_index] = fold_index;
		}
	}

	let folds = (0..n_folds)
		.map(|fold_index| {
			let (test_indexes, train_indexes): (Vec<usize>, Vec<usize>) =
				(0..labels.len()).partition(|row_index| test_folds[*row_index] == fold_index);
			Fold {
				train_indexes,
				test_indexes,
			}
		})
		.collect();
	Ok(folds)
}

#[test]
fn test_stratified_k_fold_matches_round_robin_allocation() {
	let labels = vec![0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 0, 1];
	let folds = stratified_k_fold(&labels, 3, None).unwrap();
	let test_indexes: Vec<Vec<usize>> = folds.iter().map(|fold| fold.test_indexes.clone()).collect();
	assert_eq!(
		test_indexes,
		vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9, 10, 11]]
	);
	assert_eq!(folds[1].train_indexes, vec![0, 1, 2, 3, 8, 9, 10, 11]);
}

#[test]
fn test_stratified_k_fold_shuffle_is_seeded() {
	let labels: Vec<usize> = (0..50).map(|i| i % 2).collect();
	let a = stratified_k_fold(&labels, 5, Some(1)).unwrap();
	let b = stratified_k_fold(&labels, 5, Some(1)).unwrap();
	assert_eq!(a, b);
	for fold in a.iter() {
		assert_eq!(fold.test_indexes.len(), 10);
		let n_positive = fold.test_indexes.iter().filter(|i| labels[**i] == 1).count();
		assert_eq!(n_positive, 5);
	}
}

#[test]
fn test_stratified_k_fold_rejects_tiny_classes() {
	let labels = vec![0, 0, 1, 1, 0, 1];
	assert!(stratified_k_fold(&labels, 5, None).is_err());
	assert!(stratified_k_fold(&[0, 0, 0, 0, 0, 1], 5, None).is_ok());
}
