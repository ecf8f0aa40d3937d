/*!
This crate turns the columns of a [`DataFrame`](../datadee_dataframe/struct.DataFrame.html) into a dense matrix of `f32` features. [`FeatureSplit`](struct.FeatureSplit.html) decides which columns go to which [`FeatureGroup`](enum.FeatureGroup.html), and [`Preprocessor`](struct.Preprocessor.html) fits the groups once on training data and applies them to any later dataframe.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod interaction;
mod normalized;
mod one_hot_encoded;
mod preprocessor;
mod split;

pub use self::interaction::InteractionFeatureGroup;
pub use self::normalized::NormalizedFeatureGroup;
pub use self::one_hot_encoded::OneHotEncodedFeatureGroup;
pub use self::preprocessor::Preprocessor;
pub use self::split::FeatureSplit;

use anyhow::{format_err, Result};
use datadee_dataframe::{DataFrameView, NumberColumnView, TextColumnView};
use ndarray::prelude::*;

/// This enum describes how to transform one or more columns from the input dataframe to one or more columns in the output features.
#[derive(Debug, Clone)]
pub enum FeatureGroup {
	Interaction(InteractionFeatureGroup),
	Normalized(NormalizedFeatureGroup),
	OneHotEncoded(OneHotEncodedFeatureGroup),
}

impl FeatureGroup {
	/// Return the number of features this feature group will produce.
	pub fn n_features(&self) -> usize {
		match self {
			FeatureGroup::Interaction(s) => s.n_features(),
			FeatureGroup::Normalized(_) => 1,
			FeatureGroup::OneHotEncoded(s) => s.options.len(),
		}
	}

	pub fn feature_names(&self) -> Vec<String> {
		match self {
			FeatureGroup::Interaction(s) => s.feature_names(),
			FeatureGroup::Normalized(s) => vec![s.source_column_name.clone()],
			FeatureGroup::OneHotEncoded(s) => s.feature_names(),
		}
	}

	/// Write this group's features for every row of `dataframe` into `features`, which must have `n_features()` columns.
	pub fn compute_array_f32(
		&self,
		features: ArrayViewMut2<f32>,
		dataframe: &DataFrameView,
	) -> Result<()> {
		match self {
			FeatureGroup::Interaction(s) => {
				let columns = s
					.source_column_names()
					.map(|name| number_column(dataframe, name))
					.collect::<Result<Vec<_>>>()?;
				s.compute_array_f32(features, &columns);
			}
			FeatureGroup::Normalized(s) => {
				let column = number_column(dataframe, &s.source_column_name)?;
				s.compute_array_f32(features, column.data);
			}
			FeatureGroup::OneHotEncoded(s) => {
				let column = text_column(dataframe, &s.source_column_name)?;
				s.compute_array_f32(features, column.data);
			}
		}
		Ok(())
	}
}

pub(crate) fn number_column<'a>(
	dataframe: &DataFrameView<'a>,
	name: &str,
) -> Result<NumberColumnView<'a>> {
	dataframe
		.column(name)
		.ok_or_else(|| format_err!("column \"{}\" is missing", name))?
		.as_number()
		.ok_or_else(|| format_err!("column \"{}\" is expected to be a number column", name))
}

pub(crate) fn text_column<'a>(
	dataframe: &DataFrameView<'a>,
	name: &str,
) -> Result<TextColumnView<'a>> {
	dataframe
		.column(name)
		.ok_or_else(|| format_err!("column \"{}\" is missing", name))?
		.as_text()
		.ok_or_else(|| format_err!("column \"{}\" is expected to be a text column", name))
}
