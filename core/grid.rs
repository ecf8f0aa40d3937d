use crate::config::Config;
use itertools::iproduct;

/// A `GridItem` is a description of a single entry in the hyperparameter grid: the tree options to train the classifier with.
#[derive(Clone, Debug, PartialEq)]
pub struct GridItem {
	pub num_leaves: usize,
	pub max_depth: usize,
	pub options: datadee_tree::TrainOptions,
}

pub const DEFAULT_NUM_LEAVES: &[usize] = &[31, 50, 70];
pub const DEFAULT_MAX_DEPTH: &[usize] = &[10, 20, 30];

impl std::fmt::Display for GridItem {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"num_leaves = {}, max_depth = {}",
			self.num_leaves, self.max_depth
		)
	}
}

/// Compute the hyperparameter grid. Parameters are enumerated in the order of their sorted names, so `max_depth` varies slowest and `num_leaves` fastest.
pub fn compute_hyperparameter_grid(config: &Config) -> Vec<GridItem> {
	let grid = config.grid.clone().unwrap_or_default();
	let num_leaves = grid
		.num_leaves
		.unwrap_or_else(|| DEFAULT_NUM_LEAVES.to_owned());
	let max_depth = grid
		.max_depth
		.unwrap_or_else(|| DEFAULT_MAX_DEPTH.to_owned());
	let base_options = config.tree_options();
	iproduct!(max_depth.iter(), num_leaves.iter())
		.map(|(max_depth, num_leaves)| GridItem {
			num_leaves: *num_leaves,
			max_depth: *max_depth,
			options: datadee_tree::TrainOptions {
				max_leaf_nodes: *num_leaves,
				max_depth: Some(*max_depth),
				..base_options.clone()
			},
		})
		.collect()
}

#[test]
fn test_default_grid() {
	let grid = compute_hyperparameter_grid(&Config::default());
	assert_eq!(grid.len(), 9);
	let pairs: Vec<(usize, usize)> = grid
		.iter()
		.map(|item| (item.max_depth, item.num_leaves))
		.collect();
	assert_eq!(
		pairs,
		vec![
			(10, 31),
			(10, 50),
			(10, 70),
			(20, 31),
			(20, 50),
			(20, 70),
			(30, 31),
			(30, 50),
			(30, 70),
		]
	);
	assert_eq!(grid[4].options.max_leaf_nodes, 50);
	assert_eq!(grid[4].options.max_depth, Some(20));
	assert_eq!(grid[0].to_string(), "num_leaves = 31, max_depth = 10");
}
