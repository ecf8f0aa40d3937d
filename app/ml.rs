use anyhow::{bail, format_err, Result};
use datadee_dataframe::{Column, DataFrame};
use datadee_linear::Regressor;
use itertools::Itertools;
use ndarray::prelude::*;

/// A linear regressor together with the feature columns it was trained on, in order.
#[derive(Clone, Debug)]
pub struct TrainedModel {
	pub target_column_name: String,
	pub feature_names: Vec<String>,
	pub regressor: Regressor,
}

/// Train a linear regressor on every column of the csv except `target_column_name`.
pub fn train_model(csv: &[u8], target_column_name: &str) -> Result<TrainedModel> {
	let target_column_name = target_column_name.trim();
	if target_column_name.is_empty() {
		bail!("a target column name is required");
	}
	let dataframe = DataFrame::from_bytes(csv, Default::default())?;
	let target_column = dataframe.column(target_column_name).ok_or_else(|| {
		format_err!(
			"did not find target column \"{}\" among column names {}",
			target_column_name,
			format_names(&dataframe.column_names())
		)
	})?;
	let labels = number_values(target_column)?;
	let feature_columns: Vec<&Column> = dataframe
		.columns
		.iter()
		.filter(|column| column.name() != target_column_name)
		.collect();
	let features = features_array(&feature_columns, dataframe.nrows())?;
	let regressor = Regressor::train(features.view(), labels)?;
	Ok(TrainedModel {
		target_column_name: target_column_name.to_owned(),
		feature_names: feature_columns
			.iter()
			.map(|column| column.name().to_owned())
			.collect(),
		regressor,
	})
}

impl TrainedModel {
	/// Predict one value per row of the csv. Its columns must be exactly the training features, in the same order.
	pub fn predict(&self, csv: &[u8]) -> Result<Vec<f32>> {
		let dataframe = DataFrame::from_bytes(csv, Default::default())?;
		let column_names = dataframe.column_names();
		if column_names != self.feature_names {
			bail!(
				"the feature names should match those that were passed during training, expected {} but got {}",
				format_names(&self.feature_names),
				format_names(&column_names)
			);
		}
		let columns: Vec<&Column> = dataframe.columns.iter().collect();
		let features = features_array(&columns, dataframe.nrows())?;
		let mut predictions = Array::zeros(features.nrows());
		self.regressor.predict(features.view(), predictions.view_mut());
		Ok(predictions.to_vec())
	}
}

/// Format names as a list of quoted strings, `['a', 'b']`.
pub fn format_names<S: AsRef<str>>(names: &[S]) -> String {
	format!(
		"[{}]",
		names
			.iter()
			.map(|name| format!("'{}'", name.as_ref()))
			.join(", ")
	)
}

fn number_values(column: &Column) -> Result<&[f32]> {
	let column = column.as_number().ok_or_else(|| {
		format_err!(
			"column \"{}\" could not be converted to numbers",
			column.name()
		)
	})?;
	if column.data.iter().any(|value| !value.is_finite()) {
		bail!("column \"{}\" contains missing values", column.name);
	}
	Ok(&column.data)
}

fn features_array(columns: &[&Column], nrows: usize) -> Result<Array2<f32>> {
	let mut features = Array::zeros((nrows, columns.len()));
	for (mut feature_column, column) in features.axis_iter_mut(Axis(1)).zip(columns.iter()) {
		let values = number_values(column)?;
		for (feature, value) in feature_column.iter_mut().zip(values.iter()) {
			*feature = *value;
		}
	}
	Ok(features)
}

#[test]
fn test_train_and_predict() {
	let model = train_model(b"x,y\n1,2\n2,4\n3,6\n", "y").unwrap();
	assert_eq!(model.feature_names, vec!["x"]);
	let predictions = model.predict(b"x\n4\n5\n").unwrap();
	assert_eq!(format!("{:?}", predictions), "[8.0, 10.0]");
	assert_eq!(format_names(&model.feature_names), "['x']");
}

#[test]
fn test_train_errors() {
	let error = train_model(b"x,y\n1,2\n", "label").unwrap_err();
	assert_eq!(
		error.to_string(),
		"did not find target column \"label\" among column names ['x', 'y']"
	);
	let error = train_model(b"x,name,y\n1,a,2\n2,b,3\n3,c,5\n", "y").unwrap_err();
	assert_eq!(
		error.to_string(),
		"column \"name\" could not be converted to numbers"
	);
	let error = train_model(b"x,y\n1,2\n,3\n4,5\n", "y").unwrap_err();
	assert_eq!(error.to_string(), "column \"x\" contains missing values");
	assert!(train_model(b"x,y\n1,2\n2\n", "y").is_err());
}

#[test]
fn test_predict_requires_matching_columns() {
	let model = train_model(b"a,b,y\n1,0,1\n2,1,1\n3,0,2\n4,1,3\n", "y").unwrap();
	let error = model.predict(b"b,a\n1,2\n").unwrap_err();
	assert_eq!(
		error.to_string(),
		"the feature names should match those that were passed during training, expected ['a', 'b'] but got ['b', 'a']"
	);
	assert!(model.predict(b"a,b,y\n1,2,3\n").is_err());
	assert_eq!(model.predict(b"a,b\n1,0\n").unwrap().len(), 1);
}
