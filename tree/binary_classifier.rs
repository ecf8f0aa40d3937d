use crate::{train::sigmoid, TrainOptions, TrainProgress, Tree};
use anyhow::Result;
use ndarray::prelude::*;

/// A binary classifier model is trained to predict binary target values, for example whether an applicant's loan is approved or not.
#[derive(Clone, Debug)]
pub struct BinaryClassifier {
	/// The initial prediction of the model given no trained trees. The bias is the log odds of the positive class in the training labels.
	pub bias: f32,
	/// The trees for this model.
	pub trees: Vec<Tree>,
	/// The importance of each feature as measured by the number of times the feature was used in a branch node.
	pub feature_importances: Vec<f32>,
	/// The training losses in each round of training this model.
	pub losses: Option<Vec<f32>>,
}

impl BinaryClassifier {
	/// Train a binary classifier. `labels` holds 0 for the negative class and 1 for the positive class.
	pub fn train(
		features: ArrayView2<f32>,
		labels: &[usize],
		options: &TrainOptions,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> Result<Self> {
		crate::train::train(features, labels, options, update_progress)
	}

	/// Make predictions. `probabilities` must have shape `(n_examples, 2)`. Column 0 receives the probability of the negative class and column 1 the probability of the positive class.
	pub fn predict(&self, features: ArrayView2<f32>, mut probabilities: ArrayViewMut2<f32>) {
		for (features, mut probabilities) in features
			.axis_iter(Axis(0))
			.zip(probabilities.axis_iter_mut(Axis(0)))
		{
			let mut logit = self.bias;
			for tree in self.trees.iter() {
				logit += tree.predict(features.view());
			}
			let probability = sigmoid(logit);
			probabilities[0] = 1.0 - probability;
			probabilities[1] = probability;
		}
	}

	/// Return the probability of the positive class for each example.
	pub fn predict_positive(&self, features: ArrayView2<f32>) -> Vec<f32> {
		let mut probabilities = Array::zeros((features.nrows(), 2));
		self.predict(features, probabilities.view_mut());
		probabilities.column(1).to_vec()
	}
}

#[cfg(test)]
fn separable_dataset() -> (Array2<f32>, Vec<usize>) {
	let n_examples = 200;
	let features = Array::from_shape_fn((n_examples, 2), |(i, j)| match j {
		0 => i as f32,
		_ => ((i * 7) % 13) as f32,
	});
	let labels = (0..n_examples).map(|i| if i >= 100 { 1 } else { 0 }).collect();
	(features, labels)
}

#[test]
fn test_binary_classifier_separates_linearly_separable_data() {
	let (features, labels) = separable_dataset();
	let model = BinaryClassifier::train(
		features.view(),
		&labels,
		&TrainOptions::default(),
		&mut |_| {},
	)
	.unwrap();
	let probabilities = model.predict_positive(features.view());
	assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
	let auc = datadee_metrics::auc_roc(&probabilities, &labels);
	assert!(auc > 0.95);
	assert!(model.feature_importances[0] > 0.0);
}

#[test]
fn test_binary_classifier_is_deterministic() {
	let (features, labels) = separable_dataset();
	let options = TrainOptions {
		max_rounds: 10,
		compute_losses: true,
		..Default::default()
	};
	let a = BinaryClassifier::train(features.view(), &labels, &options, &mut |_| {}).unwrap();
	let b = BinaryClassifier::train(features.view(), &labels, &options, &mut |_| {}).unwrap();
	assert_eq!(
		a.predict_positive(features.view()),
		b.predict_positive(features.view())
	);
	let losses = a.losses.unwrap();
	assert!(losses.last().unwrap() < losses.first().unwrap());
}

#[test]
fn test_binary_classifier_rejects_bad_labels() {
	let features = Array::zeros((2, 1));
	let result = BinaryClassifier::train(
		features.view(),
		&[0, 2],
		&TrainOptions::default(),
		&mut |_| {},
	);
	assert!(result.is_err());
}
