use datadee_dataframe::TextColumnView;
use itertools::izip;
use ndarray::prelude::*;
use std::collections::BTreeSet;

/**
A `OneHotEncodedFeatureGroup` creates one number feature for each category of a text column seen during training. For each example, all of the features will have the value 0.0, except the feature corresponding to the column's value, which will have the value 1.0. A value that was not seen during training produces all zeros.

# Example

For the training values `["red", "green", "blue"]`, the options are sorted to `["blue", "green", "red"]`.

| dataframe value | feature values |
|-----------------|----------------|
| "red"           | [0, 0, 1]      |
| "green"         | [0, 1, 0]      |
| "blue"          | [1, 0, 0]      |
| "purple"        | [0, 0, 0]      |
*/
#[derive(Debug, Clone)]
pub struct OneHotEncodedFeatureGroup {
	pub source_column_name: String,
	/// The categories seen in training, sorted.
	pub options: Vec<String>,
}

impl OneHotEncodedFeatureGroup {
	pub fn fit(column: TextColumnView) -> OneHotEncodedFeatureGroup {
		let options: BTreeSet<&str> = column.data.iter().map(|value| value.as_str()).collect();
		Self {
			source_column_name: column.name.to_owned(),
			options: options.into_iter().map(|option| option.to_owned()).collect(),
		}
	}

	pub fn feature_names(&self) -> Vec<String> {
		self.options
			.iter()
			.map(|option| format!("{}={}", self.source_column_name, option))
			.collect()
	}

	pub fn compute_array_f32(&self, mut features: ArrayViewMut2<f32>, values: &[String]) {
		// Fill the features with zeros.
		features.fill(0.0);
		// For each example, set the feature corresponding to the category to one.
		for (mut features, value) in izip!(features.axis_iter_mut(Axis(0)), values.iter()) {
			if let Ok(feature_index) = self
				.options
				.binary_search_by(|option| option.as_str().cmp(value.as_str()))
			{
				features[feature_index] = 1.0;
			}
		}
	}
}

#[test]
fn test_one_hot_unseen_category_is_all_zeros() {
	let train: Vec<String> = vec!["red", "green", "blue", "red"]
		.into_iter()
		.map(String::from)
		.collect();
	let group = OneHotEncodedFeatureGroup::fit(TextColumnView {
		name: "color",
		data: &train,
	});
	assert_eq!(group.options, vec!["blue", "green", "red"]);
	let values: Vec<String> = vec!["red", "purple"].into_iter().map(String::from).collect();
	let mut features = Array2::ones((2, 3));
	group.compute_array_f32(features.view_mut(), &values);
	assert_eq!(features, array![[0.0, 0.0, 1.0], [0.0, 0.0, 0.0]]);
}
