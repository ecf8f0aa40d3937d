use super::{
	bin_stats::{BinStats, BinStatsEntry},
	binning::BinningInstruction,
};
use crate::{SplitDirection, TrainOptions};
use rayon::prelude::*;

/// The sums over the examples in a node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeSums {
	pub sum_gradients: f64,
	pub sum_hessians: f64,
	pub n_examples: usize,
}

impl NodeSums {
	fn add(self, entry: &BinStatsEntry) -> NodeSums {
		NodeSums {
			sum_gradients: self.sum_gradients + entry.sum_gradients,
			sum_hessians: self.sum_hessians + entry.sum_hessians,
			n_examples: self.n_examples + entry.count,
		}
	}

	fn sub(self, other: NodeSums) -> NodeSums {
		NodeSums {
			sum_gradients: self.sum_gradients - other.sum_gradients,
			sum_hessians: self.sum_hessians - other.sum_hessians,
			n_examples: self.n_examples - other.n_examples,
		}
	}
}

#[derive(Clone, Debug)]
pub struct Split {
	pub feature_index: usize,
	/// Valid bins `1..=bin_index` go left.
	pub bin_index: u8,
	pub split_value: f32,
	pub invalid_values_direction: SplitDirection,
	pub gain: f32,
	pub left: NodeSums,
	pub right: NodeSums,
}

impl Split {
	pub fn direction(&self, bin: u8) -> SplitDirection {
		if bin == 0 {
			self.invalid_values_direction
		} else if bin <= self.bin_index {
			SplitDirection::Left
		} else {
			SplitDirection::Right
		}
	}
}

/// Find the split with the highest gain across all features. Ties go to the lowest feature index, then to the lowest bin.
pub fn choose_best_split(
	bin_stats: &BinStats,
	binning_instructions: &[BinningInstruction],
	node_sums: NodeSums,
	options: &TrainOptions,
) -> Option<Split> {
	let candidates: Vec<Option<Split>> = binning_instructions
		.par_iter()
		.zip(bin_stats.entries.par_iter())
		.enumerate()
		.map(|(feature_index, (binning_instruction, entries))| {
			choose_best_split_for_feature(
				feature_index,
				binning_instruction,
				entries,
				node_sums,
				options,
			)
		})
		.collect();
	let mut best: Option<Split> = None;
	for split in candidates.into_iter().flatten() {
		match &best {
			Some(best_split) if split.gain <= best_split.gain => {}
			_ => best = Some(split),
		}
	}
	best
}

fn choose_best_split_for_feature(
	feature_index: usize,
	binning_instruction: &BinningInstruction,
	entries: &[BinStatsEntry],
	node_sums: NodeSums,
	options: &TrainOptions,
) -> Option<Split> {
	let l2_regularization = options.l2_regularization as f64;
	let parent_score = score(node_sums, l2_regularization);
	let invalid = &entries[0];
	// With no invalid values in this node, there is only one candidate per bin, and unseen invalid values follow the larger child.
	let directions: &[Option<SplitDirection>] = if invalid.count == 0 {
		&[None]
	} else {
		&[Some(SplitDirection::Left), Some(SplitDirection::Right)]
	};
	let mut best: Option<Split> = None;
	let mut left_valid = NodeSums::default();
	for (bin_index, threshold) in binning_instruction.thresholds.iter().enumerate() {
		let bin_index = bin_index + 1;
		left_valid = left_valid.add(&entries[bin_index]);
		for direction in directions.iter() {
			let left = match direction {
				Some(SplitDirection::Left) => left_valid.add(invalid),
				_ => left_valid,
			};
			let right = node_sums.sub(left);
			if left.n_examples < options.min_examples_per_child
				|| right.n_examples < options.min_examples_per_child
				|| left.sum_hessians < options.min_sum_hessians_per_child as f64
				|| right.sum_hessians < options.min_sum_hessians_per_child as f64
			{
				continue;
			}
			let gain = score(left, l2_regularization) + score(right, l2_regularization)
				- parent_score;
			let gain = gain as f32;
			if gain <= options.min_gain_to_split {
				continue;
			}
			if best.as_ref().map(|best| gain > best.gain).unwrap_or(true) {
				let invalid_values_direction = direction.unwrap_or_else(|| {
					if left.n_examples >= right.n_examples {
						SplitDirection::Left
					} else {
						SplitDirection::Right
					}
				});
				best = Some(Split {
					feature_index,
					bin_index: bin_index as u8,
					split_value: *threshold,
					invalid_values_direction,
					gain,
					left,
					right,
				});
			}
		}
	}
	best
}

fn score(sums: NodeSums, l2_regularization: f64) -> f64 {
	sums.sum_gradients * sums.sum_gradients / (sums.sum_hessians + l2_regularization)
}

#[test]
fn test_choose_best_split() {
	let binning_instructions = vec![
		BinningInstruction {
			thresholds: vec![0.5],
		},
		BinningInstruction {
			thresholds: vec![1.5, 2.5],
		},
	];
	let entry = |sum_gradients: f64, count: usize| BinStatsEntry {
		sum_gradients,
		sum_hessians: count as f64 * 0.25,
		count,
	};
	// The first feature does not separate the gradients, the second one does between its first and second bins.
	let bin_stats = BinStats {
		entries: vec![
			vec![entry(0.0, 0), entry(0.0, 2), entry(0.0, 2)],
			vec![entry(0.0, 0), entry(-1.0, 2), entry(0.5, 1), entry(0.5, 1)],
		],
	};
	let node_sums = NodeSums {
		sum_gradients: 0.0,
		sum_hessians: 1.0,
		n_examples: 4,
	};
	let options = TrainOptions {
		min_examples_per_child: 1,
		..Default::default()
	};
	let split = choose_best_split(&bin_stats, &binning_instructions, node_sums, &options).unwrap();
	assert_eq!(split.feature_index, 1);
	assert_eq!(split.bin_index, 1);
	assert_eq!(split.split_value, 1.5);
	assert_eq!(split.invalid_values_direction, SplitDirection::Left);
	assert_eq!(split.left.n_examples, 2);
	assert!((split.gain - 4.0).abs() < 1e-6);
}
