pub use datadee_tree::TrainProgress;
pub use datadee_util::progress_counter::ProgressCounter;

/// This enum reports the progress of [`train`](../train/fn.train.html).
#[derive(Debug)]
pub enum Progress {
	/// Reading a csv file. The counter counts bytes.
	Loading(ProgressCounter),
	CrossValidating {
		grid_item_index: usize,
		n_grid_items: usize,
		fold_index: usize,
		n_folds: usize,
	},
	TrainingFinalModel(TrainProgress),
	Predicting,
	Writing,
}
