use anyhow::{bail, Result};
use itertools::izip;
use ndarray::prelude::*;

/// This struct describes a linear regressor model. You can train one by calling `Regressor::train`.
#[derive(Clone, Debug)]
pub struct Regressor {
	pub bias: f32,
	pub weights: Array1<f32>,
	/// These are the mean values of each feature in the training set.
	pub means: Vec<f32>,
}

impl Regressor {
	/**
	Train a linear regressor by ordinary least squares with an intercept.

	The features and labels are centered, then the normal equations `(XᵀX) w = Xᵀy` are solved in `f64` by gaussian elimination with partial pivoting. The intercept is recovered from the means. A singular `XᵀX`, for example from a constant or duplicated feature, is an error.
	*/
	pub fn train(features: ArrayView2<f32>, labels: &[f32]) -> Result<Self> {
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
		if features.iter().chain(labels.iter()).any(|value| !value.is_finite()) {
			bail!("features and labels must be finite numbers");
		}
		let features = features.mapv(|value| value as f64);
		let labels = ArrayView1::from(labels).mapv(|value| value as f64);
		let means = features
			.mean_axis(Axis(0))
			.unwrap_or_else(|| Array1::zeros(n_features));
		let label_mean = labels.mean().unwrap_or(0.0);
		let centered = &features - &means;
		let centered_labels = &labels - label_mean;
		let gram = centered.t().dot(&centered);
		let moments = centered.t().dot(&centered_labels);
		let weights = solve(gram, moments)?;
		let bias = label_mean - weights.dot(&means);
		Ok(Regressor {
			bias: bias as f32,
			weights: weights.mapv(|weight| weight as f32),
			means: means.iter().map(|mean| *mean as f32).collect(),
		})
	}

	/// Make predictions, one for each row of `features`.
	pub fn predict(&self, features: ArrayView2<f32>, mut predictions: ArrayViewMut1<f32>) {
		for (prediction, features) in izip!(predictions.iter_mut(), features.axis_iter(Axis(0))) {
			*prediction = features.dot(&self.weights) + self.bias;
		}
	}
}

/// Solve `a x = b` for a square `a`.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
	let n = b.len();
	let scale = a.iter().fold(0.0f64, |max, value| max.max(value.abs()));
	let tolerance = scale.max(1.0) * 1e-10;
	for column in 0..n {
		// Swap the row with the largest pivot into place.
		let pivot_row = (column..n)
			.max_by(|i, j| {
				a[[*i, column]]
					.abs()
					.partial_cmp(&a[[*j, column]].abs())
					.unwrap_or(std::cmp::Ordering::Equal)
			})
			.unwrap_or(column);
		if a[[pivot_row, column]].abs() < tolerance {
			bail!("the features are linearly dependent, so the least squares solution is not unique");
		}
		if pivot_row != column {
			for k in 0..n {
				a.swap([pivot_row, k], [column, k]);
			}
			b.swap(pivot_row, column);
		}
		for row in column + 1..n {
			let factor = a[[row, column]] / a[[column, column]];
			if factor == 0.0 {
				continue;
			}
			for k in column..n {
				a[[row, k]] -= factor * a[[column, k]];
			}
			b[row] -= factor * b[column];
		}
	}
	let mut x = Array1::zeros(n);
	for row in (0..n).rev() {
		let mut sum = b[row];
		for k in row + 1..n {
			sum -= a[[row, k]] * x[k];
		}
		x[row] = sum / a[[row, row]];
	}
	Ok(x)
}

#[test]
fn test_regressor_recovers_exact_coefficients() {
	let features = array![[1.0, 2.0], [2.0, 0.0], [3.0, 5.0], [4.0, 1.0], [0.0, 3.0]];
	let labels: Vec<f32> = features
		.axis_iter(Axis(0))
		.map(|row| 3.0 + 2.0 * row[0] - row[1])
		.collect();
	let model = Regressor::train(features.view(), &labels).unwrap();
	assert!((model.bias - 3.0).abs() < 1e-4);
	assert!((model.weights[0] - 2.0).abs() < 1e-4);
	assert!((model.weights[1] + 1.0).abs() < 1e-4);
	let mut predictions = Array1::zeros(1);
	model.predict(array![[10.0, 4.0]].view(), predictions.view_mut());
	assert!((predictions[0] - 19.0).abs() < 1e-3);
}

#[test]
fn test_regressor_rejects_singular_features() {
	let features = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
	assert!(Regressor::train(features.view(), &[1.0, 2.0, 3.0]).is_err());
	let features = array![[1.0], [2.0]];
	assert!(Regressor::train(features.view(), &[1.0]).is_err());
}
