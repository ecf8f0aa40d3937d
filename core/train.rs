use crate::{
	config::Config,
	cross_validation::stratified_k_fold,
	grid::compute_hyperparameter_grid,
	pipeline::FittedPipeline,
	progress::Progress,
	search::{grid_search, SearchOutput},
	submission::write_submission_to_path,
};
use anyhow::{bail, format_err, Context, Result};
use datadee_dataframe::{ColumnType, DataFrame, DataFrameView, FromCsvOptions};
use datadee_features::FeatureSplit;
use datadee_metrics::auc_roc;
use datadee_util::progress_counter::ProgressCounter;
use std::{collections::BTreeMap, path::Path};

pub struct TrainArgs<'a> {
	pub file_path_train: &'a Path,
	pub file_path_test: &'a Path,
	pub target_column_name: &'a str,
	pub id_column_name: &'a str,
	pub output_path: &'a Path,
	pub config_path: Option<&'a Path>,
}

#[derive(Debug)]
pub struct TrainOutput {
	pub split: FeatureSplit,
	pub search: SearchOutput,
	pub pipeline: FittedPipeline,
	/// The AUC of the refit pipeline on its own training rows. It is optimistic and only informational.
	pub train_auc: f32,
	pub n_test_rows: usize,
}

/// Run the whole pipeline: cross validate the hyperparameter grid on the train file, refit the best grid item on all of it, and write the predictions for the test file to `output_path`.
pub fn train(args: TrainArgs, update_progress: &mut dyn FnMut(Progress)) -> Result<TrainOutput> {
	let config = match args.config_path {
		Some(config_path) => Config::from_path(config_path)?,
		None => Config::default(),
	};

	// The id column is always text so ids are written back exactly as they were read.
	let mut column_types = BTreeMap::new();
	column_types.insert(args.id_column_name.to_owned(), ColumnType::Text);
	let dataframe_train = load_dataframe(args.file_path_train, column_types, update_progress)?;
	tracing::info!(
		path = %args.file_path_train.display(),
		nrows = dataframe_train.nrows(),
		ncols = dataframe_train.ncols(),
		"loaded train file"
	);
	let labels = compute_labels(&dataframe_train.view(), args.target_column_name)?;

	let split = FeatureSplit::compute(
		&dataframe_train.view(),
		args.target_column_name,
		args.id_column_name,
		config.n_interaction_features(),
	);
	tracing::info!(
		interaction = ?split.interaction,
		remainder = ?split.remainder,
		categorical = ?split.categorical,
		"split the feature columns"
	);

	let grid = compute_hyperparameter_grid(&config);
	let folds = stratified_k_fold(&labels, config.n_folds(), config.shuffle_seed())?;
	let search = grid_search(
		&dataframe_train.view(),
		&labels,
		&split,
		&grid,
		&folds,
		update_progress,
	)?;
	let best = search.best();
	tracing::info!(
		grid_item = %best.grid_item,
		mean_auc = best.mean_score,
		"chose the best grid item"
	);

	let pipeline = FittedPipeline::fit(
		&dataframe_train.view(),
		&labels,
		&split,
		&best.grid_item.options,
		&mut |progress| update_progress(Progress::TrainingFinalModel(progress)),
	)?;
	let train_probabilities = pipeline.predict_positive(&dataframe_train.view())?;
	let train_auc = auc_roc(&train_probabilities, &labels);
	tracing::info!(train_auc, "computed the auc on the training data");

	let dataframe_test = load_dataframe(
		args.file_path_test,
		dataframe_train.column_types().into_iter().collect(),
		update_progress,
	)?;
	tracing::info!(
		path = %args.file_path_test.display(),
		nrows = dataframe_test.nrows(),
		"loaded test file"
	);
	update_progress(Progress::Predicting);
	let test_probabilities = pipeline.predict_positive(&dataframe_test.view())?;
	let ids = dataframe_test
		.column(args.id_column_name)
		.and_then(|column| column.as_text())
		.ok_or_else(|| {
			format_err!(
				"did not find id column \"{}\" in {}",
				args.id_column_name,
				args.file_path_test.display()
			)
		})?
		.data
		.clone();

	update_progress(Progress::Writing);
	write_submission_to_path(
		args.output_path,
		args.target_column_name,
		&ids,
		&test_probabilities,
	)?;
	tracing::info!(path = %args.output_path.display(), "wrote the submission");

	Ok(TrainOutput {
		split,
		search,
		pipeline,
		train_auc,
		n_test_rows: dataframe_test.nrows(),
	})
}

fn load_dataframe(
	file_path: &Path,
	column_types: BTreeMap<String, ColumnType>,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<DataFrame> {
	let len = std::fs::metadata(file_path)
		.with_context(|| format!("failed to read {}", file_path.display()))?
		.len();
	let progress_counter = ProgressCounter::new(len);
	update_progress(Progress::Loading(progress_counter.clone()));
	let options = FromCsvOptions {
		column_types: Some(column_types),
		..Default::default()
	};
	DataFrame::from_path(file_path, options, |byte| progress_counter.set(byte))
		.with_context(|| format!("failed to load {}", file_path.display()))
}

/// The target column must be a number column holding only 0 and 1.
fn compute_labels(dataframe: &DataFrameView, target_column_name: &str) -> Result<Vec<usize>> {
	let column = dataframe.column(target_column_name).ok_or_else(|| {
		format_err!(
			"did not find target column \"{}\" among column names \"{}\"",
			target_column_name,
			dataframe
				.columns
				.iter()
				.map(|column| column.name())
				.collect::<Vec<_>>()
				.join(", ")
		)
	})?;
	let column = match column.as_number() {
		Some(column) => column,
		None => bail!(
			"target column \"{}\" must be a number column with values 0 and 1",
			target_column_name
		),
	};
	column
		.data
		.iter()
		.map(|value| {
			if *value == 0.0 {
				Ok(0)
			} else if *value == 1.0 {
				Ok(1)
			} else {
				Err(format_err!(
					"target column \"{}\" has the value {}, but only 0 and 1 are allowed",
					target_column_name,
					value
				))
			}
		})
		.collect()
}

#[cfg(test)]
fn write_loan_files(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
	let mut train = String::from("id,amt,age,category,loan_status\n");
	for i in 0..100 {
		let label = if i % 4 == 0 { 1 } else { 0 };
		let category = if label == 1 && i % 8 == 0 { "RENT" } else { ["OWN", "MORTGAGE", "RENT"][i % 3] };
		let amt = if label == 1 { 9000 + i * 7 } else { 1000 + i * 31 };
		train.push_str(&format!("{},{},{},{},{}\n", i, amt, 20 + i % 23, category, label));
	}
	let test = "id,amt,age,category\n\
		100,9500,30,RENT\n\
		101,1200,,OWN\n\
		102,4000,41,SHARED\n";
	let train_path = dir.join("train.csv");
	let test_path = dir.join("test.csv");
	std::fs::write(&train_path, train).unwrap();
	std::fs::write(&test_path, test).unwrap();
	(train_path, test_path)
}

#[test]
fn test_train_writes_a_submission() {
	let dir = tempfile::tempdir().unwrap();
	let (train_path, test_path) = write_loan_files(dir.path());
	let config_path = dir.path().join("config.yaml");
	std::fs::write(
		&config_path,
		"
grid:
  num_leaves: [4, 8]
  max_depth: [2, 3]
n_folds: 4
tree:
  max_rounds: 10
  min_examples_per_child: 5
",
	)
	.unwrap();
	let output_path = dir.path().join("submission.csv");
	let mut n_cross_validation_updates = 0;
	let output = train(
		TrainArgs {
			file_path_train: &train_path,
			file_path_test: &test_path,
			target_column_name: "loan_status",
			id_column_name: "id",
			output_path: &output_path,
			config_path: Some(&config_path),
		},
		&mut |progress| {
			if let Progress::CrossValidating { .. } = progress {
				n_cross_validation_updates += 1;
			}
		},
	)
	.unwrap();
	assert_eq!(n_cross_validation_updates, 16);
	assert_eq!(output.search.scores.len(), 4);
	assert_eq!(output.n_test_rows, 3);
	assert!(output.train_auc > 0.9);
	assert_eq!(output.split.interaction, vec!["amt", "age"]);
	assert_eq!(output.split.categorical, vec!["category"]);

	let submission = std::fs::read_to_string(&output_path).unwrap();
	let lines: Vec<&str> = submission.lines().collect();
	assert_eq!(lines[0], "id,loan_status");
	assert_eq!(lines.len(), 4);
	let ids: Vec<&str> = lines[1..]
		.iter()
		.map(|line| line.split(',').next().unwrap())
		.collect();
	assert_eq!(ids, vec!["100", "101", "102"]);
	for line in lines[1..].iter() {
		let probability: f32 = line.split(',').nth(1).unwrap().parse().unwrap();
		assert!((0.0..=1.0).contains(&probability));
	}
}

#[test]
fn test_train_rejects_non_binary_labels() {
	let dir = tempfile::tempdir().unwrap();
	let train_path = dir.path().join("train.csv");
	std::fs::write(&train_path, "id,amt,loan_status\n0,1,0\n1,2,2\n").unwrap();
	let error = train(
		TrainArgs {
			file_path_train: &train_path,
			file_path_test: &train_path,
			target_column_name: "loan_status",
			id_column_name: "id",
			output_path: &dir.path().join("submission.csv"),
			config_path: None,
		},
		&mut |_| {},
	)
	.unwrap_err();
	assert_eq!(
		error.to_string(),
		"target column \"loan_status\" has the value 2, but only 0 and 1 are allowed"
	);
}

#[test]
fn test_train_reports_a_missing_file() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing.csv");
	let result = train(
		TrainArgs {
			file_path_train: &missing,
			file_path_test: &missing,
			target_column_name: "loan_status",
			id_column_name: "id",
			output_path: &dir.path().join("submission.csv"),
			config_path: None,
		},
		&mut |_| {},
	);
	assert!(result.is_err());
}
