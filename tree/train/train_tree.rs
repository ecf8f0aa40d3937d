use super::{
	bin_stats::BinStats,
	binning::BinningInstruction,
	split::{choose_best_split, NodeSums, Split},
};
use crate::{BranchNode, BranchSplit, LeafNode, Node, SplitDirection, TrainOptions, Tree};
use std::{cmp::Ordering, collections::BinaryHeap, ops::Range};

/// The binned training data shared by every tree in a round.
pub struct TrainTreeData<'a> {
	pub binning_instructions: &'a [BinningInstruction],
	pub binned_features: &'a [Vec<u8>],
	pub gradients: &'a [f32],
	pub hessians: &'a [f32],
}

struct QueueItem {
	/// Items in the priority queue will be sorted by the gain of the split.
	gain: f32,
	split: Split,
	/// The queue item holds a reference to its parent so that it can update the parent's left or right child index if the queue item becomes a node added to the tree.
	parent: Option<(usize, SplitDirection)>,
	depth: usize,
	bin_stats: BinStats,
	/// The range of the examples index holding the examples in this node.
	examples_index_range: Range<usize>,
}

impl PartialEq for QueueItem {
	fn eq(&self, other: &Self) -> bool {
		self.gain == other.gain
	}
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for QueueItem {
	fn cmp(&self, other: &Self) -> Ordering {
		self.gain
			.partial_cmp(&other.gain)
			.unwrap_or(Ordering::Equal)
	}
}

/**
Train a tree leaf-wise: the leaf whose best split has the highest gain is split first, until `max_leaf_nodes` is reached or no leaf has a valid split.

`examples_index` is rearranged so that the examples in each leaf are contiguous. The returned ranges index into it and hold each leaf's value, so the caller can update its predictions without running every example through the tree.
*/
pub fn train_tree(
	data: &TrainTreeData,
	examples_index: &mut [usize],
	options: &TrainOptions,
) -> (Tree, Vec<(Range<usize>, f32)>) {
	let mut tree = Tree { nodes: Vec::new() };
	let mut leaf_values: Vec<(Range<usize>, f32)> = Vec::new();
	let mut queue: BinaryHeap<QueueItem> = BinaryHeap::new();
	let n_examples_total = examples_index.len();

	let root_sums = NodeSums {
		sum_gradients: data.gradients.iter().map(|v| *v as f64).sum(),
		sum_hessians: data.hessians.iter().map(|v| *v as f64).sum(),
		n_examples: n_examples_total,
	};
	let root_range = 0..n_examples_total;
	match find_split(data, examples_index, root_range.clone(), root_sums, 0, options) {
		Some((split, bin_stats)) => queue.push(QueueItem {
			gain: split.gain,
			split,
			parent: None,
			depth: 0,
			bin_stats,
			examples_index_range: root_range,
		}),
		None => {
			add_leaf(
				&mut tree,
				&mut leaf_values,
				None,
				root_sums,
				root_range,
				options,
			);
			return (tree, leaf_values);
		}
	}

	let mut n_leaves = 1;
	while let Some(item) = queue.pop() {
		let QueueItem {
			split,
			parent,
			depth,
			bin_stats,
			examples_index_range,
			..
		} = item;
		let node_sums = NodeSums {
			sum_gradients: split.left.sum_gradients + split.right.sum_gradients,
			sum_hessians: split.left.sum_hessians + split.right.sum_hessians,
			n_examples: split.left.n_examples + split.right.n_examples,
		};
		// Once the tree is full, every remaining candidate becomes a leaf.
		if n_leaves >= options.max_leaf_nodes {
			add_leaf(
				&mut tree,
				&mut leaf_values,
				parent,
				node_sums,
				examples_index_range,
				options,
			);
			continue;
		}
		n_leaves += 1;

		// The child indexes are filled in when the children are added.
		let node_index = tree.nodes.len();
		tree.nodes.push(Node::Branch(BranchNode {
			left_child_index: 0,
			right_child_index: 0,
			split: BranchSplit {
				feature_index: split.feature_index,
				split_value: split.split_value,
				invalid_values_direction: split.invalid_values_direction,
			},
		}));
		set_child_index(&mut tree, parent, node_index);

		let n_left = rearrange_examples_index(
			data.binned_features[split.feature_index].as_slice(),
			&split,
			&mut examples_index[examples_index_range.clone()],
		);
		let left_range = examples_index_range.start..examples_index_range.start + n_left;
		let right_range = examples_index_range.start + n_left..examples_index_range.end;

		// Compute the bin stats for the smaller child directly and get the larger child's by subtraction.
		let children_can_split = options.max_depth.map(|max_depth| depth + 1 < max_depth).unwrap_or(true);
		let (left_bin_stats, right_bin_stats) = if children_can_split {
			let (smaller_range, smaller_is_left) = if left_range.len() <= right_range.len() {
				(left_range.clone(), true)
			} else {
				(right_range.clone(), false)
			};
			let smaller_bin_stats = BinStats::compute(
				data.binning_instructions,
				data.binned_features,
				data.gradients,
				data.hessians,
				&examples_index[smaller_range],
			);
			let larger_bin_stats = BinStats::subtract(&bin_stats, &smaller_bin_stats);
			if smaller_is_left {
				(Some(smaller_bin_stats), Some(larger_bin_stats))
			} else {
				(Some(larger_bin_stats), Some(smaller_bin_stats))
			}
		} else {
			(None, None)
		};

		let children = vec![
			(SplitDirection::Left, split.left, left_range, left_bin_stats),
			(SplitDirection::Right, split.right, right_range, right_bin_stats),
		];
		for (direction, sums, range, child_bin_stats) in children {
			let child_split = child_bin_stats.and_then(|child_bin_stats| {
				if can_split(sums, options) {
					choose_best_split(&child_bin_stats, data.binning_instructions, sums, options)
						.map(|split| (split, child_bin_stats))
				} else {
					None
				}
			});
			match child_split {
				Some((child_split, child_bin_stats)) => queue.push(QueueItem {
					gain: child_split.gain,
					split: child_split,
					parent: Some((node_index, direction)),
					depth: depth + 1,
					bin_stats: child_bin_stats,
					examples_index_range: range,
				}),
				None => add_leaf(
					&mut tree,
					&mut leaf_values,
					Some((node_index, direction)),
					sums,
					range,
					options,
				),
			}
		}
	}

	(tree, leaf_values)
}

fn can_split(sums: NodeSums, options: &TrainOptions) -> bool {
	sums.n_examples >= 2 * options.min_examples_per_child
		&& sums.sum_hessians >= 2.0 * options.min_sum_hessians_per_child as f64
}

fn find_split(
	data: &TrainTreeData,
	examples_index: &[usize],
	range: Range<usize>,
	sums: NodeSums,
	depth: usize,
	options: &TrainOptions,
) -> Option<(Split, BinStats)> {
	let depth_allows_split = options.max_depth.map(|max_depth| depth < max_depth).unwrap_or(true);
	if !depth_allows_split || !can_split(sums, options) {
		return None;
	}
	let bin_stats = BinStats::compute(
		data.binning_instructions,
		data.binned_features,
		data.gradients,
		data.hessians,
		&examples_index[range],
	);
	choose_best_split(&bin_stats, data.binning_instructions, sums, options)
		.map(|split| (split, bin_stats))
}

fn add_leaf(
	tree: &mut Tree,
	leaf_values: &mut Vec<(Range<usize>, f32)>,
	parent: Option<(usize, SplitDirection)>,
	sums: NodeSums,
	range: Range<usize>,
	options: &TrainOptions,
) {
	let value = compute_leaf_value(sums, options);
	let node_index = tree.nodes.len();
	tree.nodes.push(Node::Leaf(LeafNode { value }));
	set_child_index(tree, parent, node_index);
	leaf_values.push((range, value));
}

fn set_child_index(tree: &mut Tree, parent: Option<(usize, SplitDirection)>, node_index: usize) {
	if let Some((parent_index, direction)) = parent {
		if let Node::Branch(parent) = &mut tree.nodes[parent_index] {
			match direction {
				SplitDirection::Left => parent.left_child_index = node_index,
				SplitDirection::Right => parent.right_child_index = node_index,
			}
		}
	}
}

/// The leaf value is the newton step `-G / (H + l2)`, scaled by the learning rate.
fn compute_leaf_value(sums: NodeSums, options: &TrainOptions) -> f32 {
	let denominator = sums.sum_hessians + options.l2_regularization as f64;
	if denominator <= 0.0 {
		return 0.0;
	}
	(-sums.sum_gradients / denominator * options.learning_rate as f64) as f32
}

/// Partition the examples so the ones sent left come first, keeping their relative order. Returns the number sent left.
fn rearrange_examples_index(
	binned_feature_values: &[u8],
	split: &Split,
	examples_index: &mut [usize],
) -> usize {
	let (left, right): (Vec<usize>, Vec<usize>) = examples_index.iter().partition(|example_index| {
		split.direction(binned_feature_values[**example_index]) == SplitDirection::Left
	});
	let n_left = left.len();
	examples_index[..n_left].copy_from_slice(&left);
	examples_index[n_left..].copy_from_slice(&right);
	n_left
}

#[test]
fn test_train_tree_respects_max_leaf_nodes() {
	use super::binning::{compute_binned_features, compute_binning_instructions};
	use ndarray::prelude::*;
	let features = Array::from_shape_fn((100, 1), |(i, _)| i as f32);
	let gradients: Vec<f32> = (0..100).map(|i| if i % 20 < 10 { -1.0 } else { 1.0 }).collect();
	let hessians = vec![0.25; 100];
	let options = TrainOptions {
		min_examples_per_child: 5,
		max_leaf_nodes: 3,
		..Default::default()
	};
	let binning_instructions = compute_binning_instructions(features.view(), &options);
	let binned_features = compute_binned_features(features.view(), &binning_instructions);
	let data = TrainTreeData {
		binning_instructions: &binning_instructions,
		binned_features: &binned_features,
		gradients: &gradients,
		hessians: &hessians,
	};
	let mut examples_index: Vec<usize> = (0..100).collect();
	let (tree, leaf_values) = train_tree(&data, &mut examples_index, &options);
	let n_leaves = tree
		.nodes
		.iter()
		.filter(|node| matches!(node, Node::Leaf(_)))
		.count();
	assert_eq!(n_leaves, 3);
	assert_eq!(leaf_values.len(), 3);
	let n_covered: usize = leaf_values.iter().map(|(range, _)| range.len()).sum();
	assert_eq!(n_covered, 100);
	// Every example's leaf value matches what the tree predicts for it.
	for (range, value) in leaf_values {
		for example_index in examples_index[range].iter() {
			let prediction = tree.predict(features.row(*example_index));
			assert!((prediction - value).abs() < f32::EPSILON);
		}
	}
}

#[test]
fn test_train_tree_single_leaf_when_too_few_examples() {
	let binning_instructions = vec![BinningInstruction {
		thresholds: vec![0.5],
	}];
	let binned_features = vec![vec![1, 2]];
	let data = TrainTreeData {
		binning_instructions: &binning_instructions,
		binned_features: &binned_features,
		gradients: &[1.0, 1.0],
		hessians: &[0.5, 0.5],
	};
	let mut examples_index = vec![0, 1];
	let (tree, leaf_values) = train_tree(&data, &mut examples_index, &TrainOptions::default());
	assert_eq!(tree.nodes.len(), 1);
	assert!((leaf_values[0].1 + 0.2).abs() < 1e-6);
}
