use datadee_dataframe::{ColumnType, DataFrameView};

/// The partition of a dataframe's feature columns into the three groups the [`Preprocessor`](struct.Preprocessor.html) transforms differently. Every group keeps the columns in their original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSplit {
	/// The first numerical columns by position, which are expanded with pairwise products.
	pub interaction: Vec<String>,
	/// The numerical columns after the interaction prefix.
	pub remainder: Vec<String>,
	/// The text columns.
	pub categorical: Vec<String>,
}

impl FeatureSplit {
	/// Partition every column except `target_column_name` and `id_column_name`. When there are fewer than `n_interaction_features` numerical columns, all of them are interaction columns.
	pub fn compute(
		dataframe: &DataFrameView,
		target_column_name: &str,
		id_column_name: &str,
		n_interaction_features: usize,
	) -> FeatureSplit {
		let mut numerical = Vec::new();
		let mut categorical = Vec::new();
		for column in dataframe.columns.iter() {
			let name = column.name();
			if name == target_column_name || name == id_column_name {
				continue;
			}
			match column.column_type() {
				ColumnType::Text => categorical.push(name.to_owned()),
				ColumnType::Number => numerical.push(name.to_owned()),
			}
		}
		let remainder = numerical.split_off(n_interaction_features.min(numerical.len()));
		FeatureSplit {
			interaction: numerical,
			remainder,
			categorical,
		}
	}

	pub fn column_names(&self) -> impl Iterator<Item = &str> {
		self.interaction
			.iter()
			.chain(self.remainder.iter())
			.chain(self.categorical.iter())
			.map(|name| name.as_str())
	}
}

#[cfg(test)]
fn loan_dataframe() -> datadee_dataframe::DataFrame {
	let csv = "id,person_age,loan_grade,loan_amnt,loan_intent,loan_int_rate,loan_status\n\
		0,37,B,6000,EDUCATION,11.49,0\n\
		1,22,C,4000,MEDICAL,13.35,1\n";
	datadee_dataframe::DataFrame::from_bytes(csv.as_bytes(), Default::default()).unwrap()
}

#[test]
fn test_split_is_a_disjoint_cover() {
	let dataframe = loan_dataframe();
	let split = FeatureSplit::compute(&dataframe.view(), "loan_status", "id", 2);
	assert_eq!(split.interaction, vec!["person_age", "loan_amnt"]);
	assert_eq!(split.remainder, vec!["loan_int_rate"]);
	assert_eq!(split.categorical, vec!["loan_grade", "loan_intent"]);
	let mut names: Vec<&str> = split.column_names().collect();
	names.sort_unstable();
	let mut expected: Vec<&str> = dataframe
		.column_names()
		.into_iter()
		.filter(|name| *name != "loan_status" && *name != "id")
		.collect();
	expected.sort_unstable();
	assert_eq!(names, expected);
	let total = split.interaction.len() + split.remainder.len() + split.categorical.len();
	assert_eq!(total, expected.len());
}

#[test]
fn test_split_with_too_few_numerical_columns() {
	let dataframe = loan_dataframe();
	let split = FeatureSplit::compute(&dataframe.view(), "loan_status", "id", 5);
	assert_eq!(
		split.interaction,
		vec!["person_age", "loan_amnt", "loan_int_rate"]
	);
	assert!(split.remainder.is_empty());
}

#[test]
fn test_missing_tokens_keep_a_column_numerical() {
	let csv = "id,amt,age,rate,loan_status\n1,100,20,NA,0\n2,200,30,11.5,1\n3,300,40,None,0\n";
	let dataframe = datadee_dataframe::DataFrame::from_bytes(csv.as_bytes(), Default::default()).unwrap();
	let split = FeatureSplit::compute(&dataframe.view(), "loan_status", "id", 2);
	assert_eq!(split.interaction, vec!["amt", "age"]);
	assert_eq!(split.remainder, vec!["rate"]);
	assert!(split.categorical.is_empty());
}
