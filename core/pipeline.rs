use anyhow::Result;
use datadee_dataframe::DataFrameView;
use datadee_features::{FeatureSplit, Preprocessor};
use datadee_tree::{BinaryClassifier, TrainOptions, TrainProgress};
use ndarray::prelude::*;

/// A `FittedPipeline` is a preprocessor and a classifier fit together on the same training rows. Every prediction goes through the preprocessor fit during training, so test rows are transformed exactly like training rows.
#[derive(Clone, Debug)]
pub struct FittedPipeline {
	pub preprocessor: Preprocessor,
	pub model: BinaryClassifier,
}

impl FittedPipeline {
	pub fn fit(
		dataframe: &DataFrameView,
		labels: &[usize],
		split: &FeatureSplit,
		options: &TrainOptions,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> Result<FittedPipeline> {
		let preprocessor = Preprocessor::fit(dataframe, split)?;
		let features = preprocessor.transform(dataframe)?;
		let model = BinaryClassifier::train(features.view(), labels, options, update_progress)?;
		Ok(FittedPipeline {
			preprocessor,
			model,
		})
	}

	/// Compute the `(n_rows, 2)` class probabilities for `dataframe`.
	pub fn predict_proba(&self, dataframe: &DataFrameView) -> Result<Array2<f32>> {
		let features = self.preprocessor.transform(dataframe)?;
		let mut probabilities = Array::zeros((features.nrows(), 2));
		self.model.predict(features.view(), probabilities.view_mut());
		Ok(probabilities)
	}

	/// The probability of the positive class for each row of `dataframe`.
	pub fn predict_positive(&self, dataframe: &DataFrameView) -> Result<Vec<f32>> {
		Ok(self.predict_proba(dataframe)?.column(1).to_vec())
	}
}
