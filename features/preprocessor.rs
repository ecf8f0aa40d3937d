use crate::{
	number_column, text_column, FeatureGroup, FeatureSplit, InteractionFeatureGroup,
	NormalizedFeatureGroup, OneHotEncodedFeatureGroup,
};
use anyhow::Result;
use datadee_dataframe::DataFrameView;
use ndarray::prelude::*;

/// A `Preprocessor` is the fitted column transformer. Its feature groups are laid out in a fixed order: the interaction group, then one normalized group per remainder column, then one one-hot group per categorical column.
#[derive(Debug, Clone)]
pub struct Preprocessor {
	pub feature_groups: Vec<FeatureGroup>,
}

impl Preprocessor {
	pub fn fit(dataframe: &DataFrameView, split: &FeatureSplit) -> Result<Preprocessor> {
		let mut feature_groups = Vec::new();
		if !split.interaction.is_empty() {
			let columns = split
				.interaction
				.iter()
				.map(|name| number_column(dataframe, name))
				.collect::<Result<Vec<_>>>()?;
			feature_groups.push(FeatureGroup::Interaction(InteractionFeatureGroup::fit(
				&columns,
			)));
		}
		for name in split.remainder.iter() {
			let column = number_column(dataframe, name)?;
			feature_groups.push(FeatureGroup::Normalized(NormalizedFeatureGroup::fit(
				column,
			)));
		}
		for name in split.categorical.iter() {
			let column = text_column(dataframe, name)?;
			feature_groups.push(FeatureGroup::OneHotEncoded(
				OneHotEncodedFeatureGroup::fit(column),
			));
		}
		Ok(Preprocessor { feature_groups })
	}

	pub fn n_features(&self) -> usize {
		self.feature_groups
			.iter()
			.map(|feature_group| feature_group.n_features())
			.sum()
	}

	pub fn feature_names(&self) -> Vec<String> {
		self.feature_groups
			.iter()
			.flat_map(|feature_group| feature_group.feature_names())
			.collect()
	}

	/// Compute the `(n_rows, n_features)` feature matrix for `dataframe`. Extra columns are ignored. A fitted column that is missing or has a different type is an error.
	pub fn transform(&self, dataframe: &DataFrameView) -> Result<Array2<f32>> {
		let mut features = Array::zeros((dataframe.nrows(), self.n_features()));
		let mut feature_index = 0;
		for feature_group in self.feature_groups.iter() {
			let n_features = feature_group.n_features();
			let slice = s![.., feature_index..feature_index + n_features];
			feature_group.compute_array_f32(features.slice_mut(slice), dataframe)?;
			feature_index += n_features;
		}
		Ok(features)
	}
}

#[cfg(test)]
fn fit_loans() -> (datadee_dataframe::DataFrame, Preprocessor) {
	let csv = "id,person_age,loan_grade,loan_amnt,loan_int_rate,loan_status\n\
		0,37,B,6000,11.49,0\n\
		1,22,C,4000,13.35,1\n\
		2,29,A,9000,,0\n\
		3,30,B,3000,7.9,1\n";
	let dataframe =
		datadee_dataframe::DataFrame::from_bytes(csv.as_bytes(), Default::default()).unwrap();
	let split = FeatureSplit::compute(&dataframe.view(), "loan_status", "id", 2);
	let preprocessor = Preprocessor::fit(&dataframe.view(), &split).unwrap();
	(dataframe, preprocessor)
}

#[test]
fn test_preprocessor_layout() {
	let (dataframe, preprocessor) = fit_loans();
	assert_eq!(
		preprocessor.feature_names(),
		vec![
			"person_age",
			"loan_amnt",
			"person_age*loan_amnt",
			"loan_int_rate",
			"loan_grade=A",
			"loan_grade=B",
			"loan_grade=C",
		]
	);
	let features = preprocessor.transform(&dataframe.view()).unwrap();
	assert_eq!(features.dim(), (4, 7));
	assert!(features[[2, 3]].is_nan());
	assert_eq!(features.row(0).slice(s![4..]), array![0.0, 1.0, 0.0]);
}

#[test]
fn test_preprocessor_is_deterministic() {
	let (dataframe, preprocessor) = fit_loans();
	let first = preprocessor.transform(&dataframe.view()).unwrap();
	let second = preprocessor.transform(&dataframe.view()).unwrap();
	for (a, b) in first.iter().zip(second.iter()) {
		assert_eq!(a.to_bits(), b.to_bits());
	}
}

#[test]
fn test_preprocessor_unseen_category_and_missing_column() {
	let (_, preprocessor) = fit_loans();
	let csv = "id,person_age,loan_grade,loan_amnt,loan_int_rate\n9,41,G,5000,10.0\n";
	let test = datadee_dataframe::DataFrame::from_bytes(csv.as_bytes(), Default::default()).unwrap();
	let features = preprocessor.transform(&test.view()).unwrap();
	assert_eq!(features.row(0).slice(s![4..]), array![0.0, 0.0, 0.0]);
	let csv = "id,person_age,loan_grade\n9,41,G\n";
	let test = datadee_dataframe::DataFrame::from_bytes(csv.as_bytes(), Default::default()).unwrap();
	let error = preprocessor.transform(&test.view()).unwrap_err();
	assert_eq!(error.to_string(), "column \"loan_amnt\" is missing");
}
