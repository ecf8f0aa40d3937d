use crate::NormalizedFeatureGroup;
use datadee_dataframe::NumberColumnView;
use ndarray::prelude::*;

/**
An `InteractionFeatureGroup` standardizes a small set of number columns and then multiplies every pair of them. The standardized values themselves come first, followed by one product for each pair `(i, j)` with `i < j`, in the order `(0, 1), (0, 2), ..., (1, 2), ...`. There are no squared terms and no bias feature.

# Example

For the columns `a` and `b`, the features are:

| feature | value               |
|---------|---------------------|
| a       | std(a)              |
| b       | std(b)              |
| a*b     | std(a) * std(b)     |
*/
#[derive(Debug, Clone)]
pub struct InteractionFeatureGroup {
	pub normalizers: Vec<NormalizedFeatureGroup>,
}

impl InteractionFeatureGroup {
	pub fn fit(columns: &[NumberColumnView]) -> InteractionFeatureGroup {
		let normalizers = columns
			.iter()
			.map(|column| NormalizedFeatureGroup::fit(column.clone()))
			.collect();
		Self { normalizers }
	}

	pub fn source_column_names(&self) -> impl Iterator<Item = &str> {
		self.normalizers
			.iter()
			.map(|normalizer| normalizer.source_column_name.as_str())
	}

	/// The number of pairwise product features.
	pub fn n_products(&self) -> usize {
		let k = self.normalizers.len();
		k * k.saturating_sub(1) / 2
	}

	pub fn n_features(&self) -> usize {
		self.normalizers.len() + self.n_products()
	}

	pub fn feature_names(&self) -> Vec<String> {
		let names: Vec<&str> = self.source_column_names().collect();
		let mut feature_names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
		for i in 0..names.len() {
			for j in i + 1..names.len() {
				feature_names.push(format!("{}*{}", names[i], names[j]));
			}
		}
		feature_names
	}

	pub fn compute_array_f32(&self, mut features: ArrayViewMut2<f32>, columns: &[NumberColumnView]) {
		let k = self.normalizers.len();
		let mut standardized = vec![0.0; k];
		for (example_index, mut features) in features.axis_iter_mut(Axis(0)).enumerate() {
			for (value, (normalizer, column)) in standardized
				.iter_mut()
				.zip(self.normalizers.iter().zip(columns.iter()))
			{
				*value = normalizer.normalize(column.data[example_index]);
			}
			let mut feature_index = 0;
			for value in standardized.iter() {
				features[feature_index] = *value;
				feature_index += 1;
			}
			for i in 0..k {
				for j in i + 1..k {
					features[feature_index] = standardized[i] * standardized[j];
					feature_index += 1;
				}
			}
		}
	}
}

#[test]
fn test_two_columns_produce_one_product() {
	let a = vec![1.0, 3.0];
	let b = vec![10.0, 20.0];
	let columns = vec![
		NumberColumnView {
			name: "a",
			data: &a,
		},
		NumberColumnView {
			name: "b",
			data: &b,
		},
	];
	let group = InteractionFeatureGroup::fit(&columns);
	assert_eq!(group.n_products(), 1);
	assert_eq!(group.n_features(), 3);
	assert_eq!(group.feature_names(), vec!["a", "b", "a*b"]);
	let mut features = Array2::zeros((2, 3));
	group.compute_array_f32(features.view_mut(), &columns);
	assert_eq!(
		features,
		array![[-1.0, -1.0, 1.0], [1.0, 1.0, 1.0]]
	);
}

#[test]
fn test_product_order() {
	let data = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
	let columns: Vec<NumberColumnView> = ["x", "y", "z"]
		.iter()
		.zip(data.iter())
		.map(|(name, data)| NumberColumnView {
			name: *name,
			data: data.as_slice(),
		})
		.collect();
	let group = InteractionFeatureGroup::fit(&columns);
	assert_eq!(
		group.feature_names(),
		vec!["x", "y", "z", "x*y", "x*z", "y*z"]
	);
	assert_eq!(InteractionFeatureGroup::fit(&columns[..1]).n_features(), 1);
	assert_eq!(InteractionFeatureGroup::fit(&[]).n_features(), 0);
}
