use self::{
	binning::{compute_binned_features, compute_binning_instructions},
	train_tree::{train_tree, TrainTreeData},
};
use crate::{BinaryClassifier, Node, TrainOptions, TrainProgress, Tree};
use anyhow::{bail, Result};
use datadee_metrics::{BinaryCrossEntropy, BinaryCrossEntropyInput, StreamingMetric};
use datadee_util::progress_counter::ProgressCounter;
use ndarray::prelude::*;
use num_traits::clamp;

mod bin_stats;
mod binning;
mod split;
mod train_tree;

/// Train a binary classifier on `features` of shape `(n_examples, n_features)` and labels that are 0 or 1.
pub fn train(
	features: ArrayView2<f32>,
	labels: &[usize],
	options: &TrainOptions,
	update_progress: &mut dyn FnMut(TrainProgress),
) -> Result<BinaryClassifier> {
	let n_examples = features.nrows();
	let n_features = features.ncols();
	if n_examples == 0 {
		bail!("cannot train a model with no examples");
	}
	if labels.len() != n_examples {
		bail!(
			"the number of labels ({}) does not match the number of examples ({})",
			labels.len(),
			n_examples
		);
	}
	if let Some(label) = labels.iter().find(|label| **label > 1) {
		bail!("labels must be 0 or 1, found {}", label);
	}

	// Compute the binning instructions and bin the features.
	let progress_counter = ProgressCounter::new(n_features as u64);
	update_progress(TrainProgress::Initializing(progress_counter.clone()));
	let binning_instructions = compute_binning_instructions(features, options);
	let binned_features = compute_binned_features(features, &binning_instructions);
	progress_counter.inc(n_features as u64);

	let bias = compute_bias(labels);
	let mut logits = vec![bias; n_examples];
	let mut gradients = vec![0.0; n_examples];
	let mut hessians = vec![0.0; n_examples];
	let mut examples_index: Vec<usize> = (0..n_examples).collect();
	let mut trees: Vec<Tree> = Vec::new();
	let mut losses: Option<Vec<f32>> = if options.compute_losses {
		Some(Vec::new())
	} else {
		None
	};

	let progress_counter = ProgressCounter::new(options.max_rounds as u64);
	update_progress(TrainProgress::Training(progress_counter.clone()));
	for round_index in 0..options.max_rounds {
		update_gradients_and_hessians(&mut gradients, &mut hessians, labels, &logits);
		for (i, example_index) in examples_index.iter_mut().enumerate() {
			*example_index = i;
		}
		let data = TrainTreeData {
			binning_instructions: &binning_instructions,
			binned_features: &binned_features,
			gradients: &gradients,
			hessians: &hessians,
		};
		let (tree, leaf_values) = train_tree(&data, &mut examples_index, options);
		// A tree with a single leaf means no leaf met the split requirements, and neither will later ones.
		if tree.nodes.len() == 1 {
			tracing::debug!(round_index, "stopped training because no leaf could be split");
			break;
		}
		for (range, value) in leaf_values {
			for example_index in examples_index[range].iter() {
				logits[*example_index] += value;
			}
		}
		trees.push(tree);
		if let Some(losses) = losses.as_mut() {
			losses.push(compute_loss(labels, &logits));
		}
		progress_counter.inc(1);
	}

	let feature_importances = compute_feature_importances(&trees, n_features);
	Ok(BinaryClassifier {
		bias,
		trees,
		feature_importances,
		losses,
	})
}

/// The bias is the log odds of the positive class. It is clamped so that a single class training set still produces a finite bias.
fn compute_bias(labels: &[usize]) -> f32 {
	let n_positive = labels.iter().filter(|label| **label == 1).count();
	let positive_rate = n_positive as f32 / labels.len() as f32;
	let positive_rate = clamp(positive_rate, std::f32::EPSILON, 1.0 - std::f32::EPSILON);
	(positive_rate / (1.0 - positive_rate)).ln()
}

/// Compute the gradients and hessians of the logistic loss for each example given the labels and logits.
fn update_gradients_and_hessians(
	gradients: &mut [f32],
	hessians: &mut [f32],
	labels: &[usize],
	logits: &[f32],
) {
	for (gradient, hessian, label, logit) in
		itertools::izip!(gradients.iter_mut(), hessians.iter_mut(), labels, logits)
	{
		let probability = clamp(sigmoid(*logit), std::f32::EPSILON, 1.0 - std::f32::EPSILON);
		*gradient = probability - *label as f32;
		*hessian = probability * (1.0 - probability);
	}
}

fn compute_loss(labels: &[usize], logits: &[f32]) -> f32 {
	let mut metric = BinaryCrossEntropy::default();
	for (label, logit) in labels.iter().zip(logits.iter()) {
		metric.update(BinaryCrossEntropyInput {
			probability: sigmoid(*logit),
			label: *label,
		});
	}
	metric.finalize().unwrap_or(std::f32::NAN)
}

pub(crate) fn sigmoid(value: f32) -> f32 {
	1.0 / ((-value).exp() + 1.0)
}

/// This function computes feature importances using the "split" method, where a feature's importance is proportional to the number of nodes that use it to split.
fn compute_feature_importances(trees: &[Tree], n_features: usize) -> Vec<f32> {
	let mut feature_importances = vec![0.0; n_features];
	for tree in trees.iter() {
		for node in tree.nodes.iter() {
			if let Node::Branch(branch) = node {
				feature_importances[branch.split.feature_index] += 1.0;
			}
		}
	}
	// Normalize the feature_importances.
	let total = feature_importances.iter().sum::<f32>();
	if total > 0.0 {
		for feature_importance in feature_importances.iter_mut() {
			*feature_importance /= total;
		}
	}
	feature_importances
}

#[test]
fn test_compute_bias() {
	assert!((compute_bias(&[0, 0, 0, 1]) - (1.0f32 / 3.0).ln()).abs() < 1e-6);
	assert!(compute_bias(&[1, 1]).is_finite());
	assert!(compute_bias(&[0, 0]).is_finite());
}
