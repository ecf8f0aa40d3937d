use crate::TrainOptions;
use datadee_util::finite::Finite;
use itertools::Itertools;
use ndarray::prelude::*;
use rayon::prelude::*;
use std::{cmp::Ordering, collections::BTreeMap};

/*
This struct specifies how to bin a feature. Bin 0 is reserved for `NaN` values, and after that feature values are binned by comparing them with a set of thresholds. For example, given the thresholds `[0.5, 1.5, 2]`, the bins will be:
0. invalid values
1. (-infinity, 0.5]
2. (0.5, 1.5]
3. (1.5, 2]
4. (2, infinity)
*/
#[derive(Clone, Debug, PartialEq)]
pub struct BinningInstruction {
	/// Strictly increasing.
	pub thresholds: Vec<f32>,
}

impl BinningInstruction {
	pub fn n_bins(&self) -> usize {
		self.thresholds.len() + 2
	}

	pub fn bin(&self, value: f32) -> u8 {
		if value.is_nan() {
			0
		} else {
			(1 + self.thresholds.partition_point(|threshold| *threshold < value)) as u8
		}
	}
}

/// Compute the binning instructions for each column in `features`.
pub fn compute_binning_instructions(
	features: ArrayView2<f32>,
	train_options: &TrainOptions,
) -> Vec<BinningInstruction> {
	(0..features.ncols())
		.into_par_iter()
		.map(|feature_index| {
			compute_binning_instruction_for_feature(features.column(feature_index), train_options)
		})
		.collect()
}

fn compute_binning_instruction_for_feature(
	column: ArrayView1<f32>,
	train_options: &TrainOptions,
) -> BinningInstruction {
	// Create a histogram of values in the number feature.
	let mut histogram: BTreeMap<Finite<f32>, usize> = BTreeMap::new();
	let mut histogram_values_count = 0;
	let n_examples = column
		.len()
		.min(train_options.max_examples_for_computing_bin_thresholds);
	for value in column.iter().take(n_examples) {
		if let Ok(value) = Finite::new(*value) {
			*histogram.entry(value).or_insert(0) += 1;
			histogram_values_count += 1;
		}
	}
	let max_valid_bins = train_options.max_valid_bins_for_number_features as usize;
	// If the number of unique values is less than `max_valid_bins_for_number_features`, then create one bin per unique value. Otherwise, create bins at quantiles.
	let mut thresholds: Vec<f32> = if histogram.len() < max_valid_bins {
		histogram
			.keys()
			.tuple_windows()
			.map(|(a, b)| (a.get() + b.get()) / 2.0)
			.collect()
	} else {
		compute_thresholds_as_quantiles_from_histogram(
			&histogram,
			histogram_values_count,
			max_valid_bins,
		)
	};
	thresholds.dedup();
	BinningInstruction { thresholds }
}

/// Compute the thresholds for a feature as quantiles from the histogram of its values.
fn compute_thresholds_as_quantiles_from_histogram(
	histogram: &BTreeMap<Finite<f32>, usize>,
	histogram_values_count: usize,
	max_valid_bins: usize,
) -> Vec<f32> {
	let total_values_count = histogram_values_count as f32;
	let quantiles: Vec<f32> = (1..max_valid_bins)
		.map(|i| i as f32 / max_valid_bins as f32)
		.collect();
	let quantile_indexes: Vec<usize> = quantiles
		.iter()
		.map(|q| ((total_values_count - 1.0) * q).trunc() as usize)
		.collect();
	let quantile_fracts: Vec<f32> = quantiles
		.iter()
		.map(|q| ((total_values_count - 1.0) * q).fract())
		.collect();
	let mut quantiles: Vec<Option<f32>> = vec![None; quantiles.len()];
	let mut current_count: usize = 0;
	let mut iter = histogram.iter().peekable();
	while let Some((value, count)) = iter.next() {
		let value = value.get();
		current_count += count;
		let quantiles_iter = quantiles
			.iter_mut()
			.zip(quantile_indexes.iter().zip(quantile_fracts.iter()))
			.filter(|(q, (_, _))| q.is_none());
		for (quantile, (index, fract)) in quantiles_iter {
			match (current_count - 1).cmp(index) {
				Ordering::Equal => {
					if *fract > 0.0 {
						let next_value = iter.peek().map(|(next, _)| next.get()).unwrap_or(value);
						*quantile = Some(value * (1.0 - fract) + next_value * fract);
					} else {
						*quantile = Some(value);
					}
				}
				Ordering::Greater => *quantile = Some(value),
				Ordering::Less => {}
			}
		}
	}
	quantiles.into_iter().flatten().collect()
}

/// Compute the binned features column by column. The result is indexed by feature, then by example.
pub fn compute_binned_features(
	features: ArrayView2<f32>,
	binning_instructions: &[BinningInstruction],
) -> Vec<Vec<u8>> {
	binning_instructions
		.par_iter()
		.enumerate()
		.map(|(feature_index, binning_instruction)| {
			features
				.column(feature_index)
				.iter()
				.map(|value| binning_instruction.bin(*value))
				.collect()
		})
		.collect()
}

#[test]
fn test_binning_unique_values() {
	let features = array![[1.0], [2.0], [f32::NAN], [3.0], [2.0]];
	let binning_instructions =
		compute_binning_instructions(features.view(), &TrainOptions::default());
	assert_eq!(binning_instructions[0].thresholds, vec![1.5, 2.5]);
	assert_eq!(binning_instructions[0].n_bins(), 4);
	let binned_features = compute_binned_features(features.view(), &binning_instructions);
	assert_eq!(binned_features, vec![vec![1, 2, 0, 3, 2]]);
}

#[test]
fn test_binning_quantiles() {
	let features = Array::from_shape_fn((1000, 1), |(i, _)| i as f32);
	let options = TrainOptions {
		max_valid_bins_for_number_features: 4,
		..Default::default()
	};
	let binning_instructions = compute_binning_instructions(features.view(), &options);
	assert_eq!(binning_instructions[0].thresholds, vec![249.75, 499.5, 749.25]);
	let binned_features = compute_binned_features(features.view(), &binning_instructions);
	assert_eq!(binned_features[0][0], 1);
	assert_eq!(binned_features[0][999], 4);
}
