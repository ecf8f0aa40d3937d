use datadee_dataframe::NumberColumnView;
use datadee_metrics::{MeanVariance, StreamingMetric};
use itertools::izip;
use ndarray::prelude::*;

/**
A `NormalizedFeatureGroup` transforms a number column to zero mean and unit variance. [Learn more](https://en.wikipedia.org/wiki/Feature_scaling#Standardization_(Z-score_Normalization).

The mean and the population variance are computed from the training values, ignoring `NaN`s. A column with zero variance is only centered.

# Example

For the training values `[0.0, 5.2, 1.3, 10.0]`:

Mean: 4.125

Standard Deviation: 3.89799

`feature_value =  (value - mean) / std`

| dataframe value | feature value                       |
|-----------------|-------------------------------------|
| 0.0             | (0.0 - 4.125) / 3.89799  = -1.05824 |
| 5.2             | (5.2 - 4.125) / 3.89799  = 0.27578  |
| NaN             | NaN                                 |
*/
#[derive(Debug, Clone)]
pub struct NormalizedFeatureGroup {
	pub source_column_name: String,
	pub mean: f32,
	pub variance: f32,
}

impl NormalizedFeatureGroup {
	pub fn fit(column: NumberColumnView) -> NormalizedFeatureGroup {
		let mut mean_variance = MeanVariance::default();
		for value in column.data.iter() {
			mean_variance.update(*value);
		}
		let mean_variance = mean_variance.finalize();
		Self {
			source_column_name: column.name.to_owned(),
			mean: mean_variance.mean,
			variance: mean_variance.variance,
		}
	}

	/// The standard deviation used as the divisor. Zero and undefined variances scale by one.
	fn scale(&self) -> f32 {
		if self.variance > 0.0 {
			self.variance.sqrt()
		} else {
			1.0
		}
	}

	pub fn normalize(&self, value: f32) -> f32 {
		(value - self.mean) / self.scale()
	}

	pub fn compute_array_f32(&self, mut features: ArrayViewMut2<f32>, values: &[f32]) {
		for (feature, value) in izip!(features.column_mut(0).iter_mut(), values.iter()) {
			*feature = self.normalize(*value);
		}
	}
}

#[test]
fn test_normalized_ignores_nan_and_keeps_it() {
	let data = vec![1.0, f32::NAN, 3.0];
	let group = NormalizedFeatureGroup::fit(NumberColumnView {
		name: "amount",
		data: &data,
	});
	assert!((group.mean - 2.0).abs() < 1e-6);
	assert!((group.variance - 1.0).abs() < 1e-6);
	let mut features = Array2::zeros((3, 1));
	group.compute_array_f32(features.view_mut(), &data);
	assert!((features[[0, 0]] + 1.0).abs() < 1e-6);
	assert!(features[[1, 0]].is_nan());
	assert!((features[[2, 0]] - 1.0).abs() < 1e-6);
}

#[test]
fn test_normalized_constant_column_is_centered() {
	let data = vec![4.0, 4.0];
	let group = NormalizedFeatureGroup::fit(NumberColumnView {
		name: "constant",
		data: &data,
	});
	assert_eq!(group.normalize(4.0), 0.0);
	assert_eq!(group.normalize(6.0), 2.0);
}
