//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm

use super::StreamingMetric;
use num_traits::ToPrimitive;

/// `MeanVariance` computes the mean and population variance of a stream of values. `NaN` values are skipped.
#[derive(Debug, Clone, Default)]
pub struct MeanVariance {
	n: u64,
	mean: f64,
	m2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanVarianceOutput {
	/// The number of non-`NaN` values seen.
	pub n: u64,
	pub mean: f32,
	pub variance: f32,
}

impl StreamingMetric<'_> for MeanVariance {
	type Input = f32;
	type Output = MeanVarianceOutput;

	fn update(&mut self, value: f32) {
		if value.is_nan() {
			return;
		}
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, 1, value as f64, 0.0);
		self.n += 1;
		self.mean = mean;
		self.m2 = m2;
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		let (mean, m2) = merge_mean_m2(self.n, self.mean, self.m2, other.n, other.mean, other.m2);
		self.n += other.n;
		self.mean = mean;
		self.m2 = m2;
	}

	fn finalize(self) -> MeanVarianceOutput {
		if self.n == 0 {
			return MeanVarianceOutput {
				n: 0,
				mean: f32::NAN,
				variance: f32::NAN,
			};
		}
		MeanVarianceOutput {
			n: self.n,
			mean: self.mean as f32,
			variance: m2_to_variance(self.m2, self.n),
		}
	}
}

/// combine two separate means and variances into a single mean and variance
/// useful in parallel algorithms
pub fn merge_mean_m2(
	n_a: u64,
	mean_a: f64,
	m2_a: f64,
	n_b: u64,
	mean_b: f64,
	m2_b: f64,
) -> (f64, f64) {
	let n_a = n_a.to_f64().unwrap_or(0.0);
	let n_b = n_b.to_f64().unwrap_or(0.0);
	if n_a + n_b == 0.0 {
		return (0.0, 0.0);
	}
	(
		(((n_a * mean_a) + (n_b * mean_b)) / (n_a + n_b)),
		m2_a + m2_b + (mean_b - mean_a) * (mean_b - mean_a) * (n_a * n_b / (n_a + n_b)),
	)
}

pub fn m2_to_variance(m2: f64, n: u64) -> f32 {
	(m2 / n.to_f64().unwrap_or(0.0)) as f32
}

#[test]
fn test_mean_variance_skips_nan() {
	let mut metric = MeanVariance::default();
	for value in [1.0, f32::NAN, 2.0, 3.0, 4.0].iter() {
		metric.update(*value);
	}
	let output = metric.finalize();
	assert_eq!(output.n, 4);
	assert!((output.mean - 2.5).abs() < 1e-6);
	assert!((output.variance - 1.25).abs() < 1e-6);
}

#[test]
fn test_mean_variance_merge_matches_single_pass() {
	let mut left = MeanVariance::default();
	let mut right = MeanVariance::default();
	left.update(1.0);
	left.update(2.0);
	right.update(3.0);
	right.update(4.0);
	left.merge(right);
	let output = left.finalize();
	assert!((output.mean - 2.5).abs() < 1e-6);
	assert!((output.variance - 1.25).abs() < 1e-6);
	assert!(MeanVariance::default().finalize().mean.is_nan());
}
