use super::binning::BinningInstruction;
use rayon::prelude::*;

/// The sums of gradients and hessians and the example count in every bin of every feature, for the examples in one node.
#[derive(Clone, Debug)]
pub struct BinStats {
	pub entries: Vec<Vec<BinStatsEntry>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BinStatsEntry {
	pub sum_gradients: f64,
	pub sum_hessians: f64,
	pub count: usize,
}

impl BinStats {
	pub fn new(binning_instructions: &[BinningInstruction]) -> Self {
		let entries = binning_instructions
			.iter()
			.map(|binning_instruction| vec![BinStatsEntry::default(); binning_instruction.n_bins()])
			.collect();
		Self { entries }
	}

	/// Accumulate the bin stats of the examples in `examples_index`. Each feature is computed on its own rayon task.
	pub fn compute(
		binning_instructions: &[BinningInstruction],
		binned_features: &[Vec<u8>],
		gradients: &[f32],
		hessians: &[f32],
		examples_index: &[usize],
	) -> Self {
		let mut bin_stats = Self::new(binning_instructions);
		bin_stats
			.entries
			.par_iter_mut()
			.zip(binned_features.par_iter())
			.for_each(|(entries, binned_feature_values)| {
				for example_index in examples_index.iter() {
					let entry = &mut entries[binned_feature_values[*example_index] as usize];
					entry.sum_gradients += gradients[*example_index] as f64;
					entry.sum_hessians += hessians[*example_index] as f64;
					entry.count += 1;
				}
			});
		bin_stats
	}

	/// Compute the bin stats of a node's sibling from the bin stats of its parent, which is much cheaper than accumulating them again.
	pub fn subtract(parent: &BinStats, child: &BinStats) -> BinStats {
		let entries = parent
			.entries
			.par_iter()
			.zip(child.entries.par_iter())
			.map(|(parent_entries, child_entries)| {
				parent_entries
					.iter()
					.zip(child_entries.iter())
					.map(|(parent, child)| BinStatsEntry {
						sum_gradients: parent.sum_gradients - child.sum_gradients,
						sum_hessians: parent.sum_hessians - child.sum_hessians,
						count: parent.count - child.count,
					})
					.collect()
			})
			.collect();
		BinStats { entries }
	}
}

#[test]
fn test_bin_stats_subtraction() {
	let binning_instructions = vec![BinningInstruction {
		thresholds: vec![0.5],
	}];
	let binned_features = vec![vec![0, 1, 2, 2]];
	let gradients = vec![0.5, -1.0, 2.0, 1.0];
	let hessians = vec![0.25, 0.25, 0.25, 0.25];
	let parent = BinStats::compute(
		&binning_instructions,
		&binned_features,
		&gradients,
		&hessians,
		&[0, 1, 2, 3],
	);
	let left = BinStats::compute(
		&binning_instructions,
		&binned_features,
		&gradients,
		&hessians,
		&[0, 1],
	);
	let right = BinStats::compute(
		&binning_instructions,
		&binned_features,
		&gradients,
		&hessians,
		&[2, 3],
	);
	assert_eq!(BinStats::subtract(&parent, &left).entries, right.entries);
	assert_eq!(
		parent.entries[0][2],
		BinStatsEntry {
			sum_gradients: 3.0,
			sum_hessians: 0.5,
			count: 2,
		}
	);
}
