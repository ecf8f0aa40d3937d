use crate::{cross_validation::Fold, grid::GridItem, pipeline::FittedPipeline, progress::Progress};
use anyhow::{bail, Result};
use datadee_dataframe::{DataFrame, DataFrameView};
use datadee_features::FeatureSplit;
use datadee_metrics::{AucRoc, AucRocInput, Metric};

#[derive(Clone, Debug)]
pub struct GridItemScore {
	pub grid_item: GridItem,
	/// The AUC on each held out fold.
	pub fold_scores: Vec<f32>,
	pub mean_score: f32,
}

#[derive(Clone, Debug)]
pub struct SearchOutput {
	pub scores: Vec<GridItemScore>,
	/// The index into `scores` of the chosen grid item.
	pub best_index: usize,
}

impl SearchOutput {
	pub fn best(&self) -> &GridItemScore {
		&self.scores[self.best_index]
	}
}

struct FoldData {
	train: DataFrame,
	train_labels: Vec<usize>,
	test: DataFrame,
	test_labels: Vec<usize>,
}

/// Score every grid item by its mean AUC over the folds. Each fold fits a fresh preprocessor and classifier on the fold's training rows only.
pub fn grid_search(
	dataframe: &DataFrameView,
	labels: &[usize],
	split: &FeatureSplit,
	grid: &[GridItem],
	folds: &[Fold],
	update_progress: &mut dyn FnMut(Progress),
) -> Result<SearchOutput> {
	if grid.is_empty() {
		bail!("the hyperparameter grid is empty");
	}
	let fold_data: Vec<FoldData> = folds
		.iter()
		.map(|fold| FoldData {
			train: dataframe.take_rows(&fold.train_indexes),
			train_labels: fold.train_indexes.iter().map(|i| labels[*i]).collect(),
			test: dataframe.take_rows(&fold.test_indexes),
			test_labels: fold.test_indexes.iter().map(|i| labels[*i]).collect(),
		})
		.collect();

	let mut scores = Vec::with_capacity(grid.len());
	for (grid_item_index, grid_item) in grid.iter().enumerate() {
		let mut fold_scores = Vec::with_capacity(fold_data.len());
		for (fold_index, fold) in fold_data.iter().enumerate() {
			update_progress(Progress::CrossValidating {
				grid_item_index,
				n_grid_items: grid.len(),
				fold_index,
				n_folds: fold_data.len(),
			});
			let pipeline = FittedPipeline::fit(
				&fold.train.view(),
				&fold.train_labels,
				split,
				&grid_item.options,
				&mut |_| {},
			)?;
			let probabilities = pipeline.predict_positive(&fold.test.view())?;
			fold_scores.push(AucRoc::compute(AucRocInput {
				probabilities: &probabilities,
				labels: &fold.test_labels,
			}));
		}
		let mean_score = fold_scores.iter().sum::<f32>() / fold_scores.len() as f32;
		tracing::info!(
			%grid_item,
			?fold_scores,
			mean_score,
			"cross validated grid item {} of {}",
			grid_item_index + 1,
			grid.len()
		);
		scores.push(GridItemScore {
			grid_item: grid_item.clone(),
			fold_scores,
			mean_score,
		});
	}

	let mean_scores: Vec<f32> = scores.iter().map(|score| score.mean_score).collect();
	let best_index = choose_best(&mean_scores).unwrap_or(0);
	Ok(SearchOutput { scores, best_index })
}

/// Return the index of the highest score. Ties go to the earliest index, and `NaN` is chosen only when every score is `NaN`.
pub fn choose_best(scores: &[f32]) -> Option<usize> {
	let mut best: Option<(usize, f32)> = None;
	for (index, score) in scores.iter().enumerate() {
		best = match best {
			None => Some((index, *score)),
			Some((_, best_score)) if best_score.is_nan() && !score.is_nan() => Some((index, *score)),
			Some((_, best_score)) if *score > best_score => Some((index, *score)),
			_ => best,
		};
	}
	best.map(|(index, _)| index)
}

#[test]
fn test_choose_best() {
	assert_eq!(choose_best(&[0.5, 0.7, 0.7, 0.6]), Some(1));
	assert_eq!(choose_best(&[f32::NAN, 0.1, f32::NAN]), Some(1));
	assert_eq!(choose_best(&[f32::NAN, f32::NAN]), Some(0));
	assert_eq!(choose_best(&[]), None);
}

#[test]
fn test_grid_search_is_deterministic_and_picks_the_max() {
	use crate::{config::Config, cross_validation::stratified_k_fold, grid::compute_hyperparameter_grid};
	let mut csv = String::from("amt,age,category,loan_status\n");
	for i in 0..80 {
		let label = if i % 3 == 0 { 1 } else { 0 };
		let category = ["A", "B", "C"][i % 3];
		csv.push_str(&format!("{},{},{},{}\n", i * 10 + label * 400, 20 + i % 17, category, label));
	}
	let dataframe = DataFrame::from_bytes(csv.as_bytes(), Default::default()).unwrap();
	let labels: Vec<usize> = dataframe.columns[3]
		.as_number()
		.unwrap()
		.data
		.iter()
		.map(|label| *label as usize)
		.collect();
	let split = FeatureSplit::compute(&dataframe.view(), "loan_status", "id", 2);
	let config: Config = serde_yaml::from_str(
		"
grid:
  num_leaves: [2, 4]
  max_depth: [1, 3]
tree:
  max_rounds: 5
  min_examples_per_child: 5
",
	)
	.unwrap();
	let grid = compute_hyperparameter_grid(&config);
	let folds = stratified_k_fold(&labels, 5, Some(3)).unwrap();
	let run = || {
		grid_search(&dataframe.view(), &labels, &split, &grid, &folds, &mut |_| {}).unwrap()
	};
	let first = run();
	let second = run();
	assert_eq!(first.best_index, second.best_index);
	assert_eq!(first.scores.len(), 4);
	let best_mean = first.best().mean_score;
	for score in first.scores.iter() {
		assert_eq!(score.fold_scores.len(), 5);
		assert!(score.mean_score <= best_mean);
	}
	let first_means: Vec<u32> = first.scores.iter().map(|s| s.mean_score.to_bits()).collect();
	let second_means: Vec<u32> = second.scores.iter().map(|s| s.mean_score.to_bits()).collect();
	assert_eq!(first_means, second_means);
}
