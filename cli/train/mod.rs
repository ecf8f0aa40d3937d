use self::progress_logger::ProgressLogger;
use crate::TrainOptions;
use anyhow::{format_err, Result};
use backtrace::Backtrace;
use datadee_core::TrainArgs;
use once_cell::sync::Lazy;
use std::{panic::AssertUnwindSafe, sync::Mutex, time::Duration};

mod progress_logger;

pub fn train(options: TrainOptions) -> Result<()> {
	// A panic during training is reported like any other error. The hook stores the message and backtrace so they can be returned once `catch_unwind` gets back control.
	static PANIC_MESSAGE_AND_BACKTRACE: Lazy<Mutex<Option<(String, Backtrace)>>> =
		Lazy::new(|| Mutex::new(None));
	let hook = std::panic::take_hook();
	std::panic::set_hook(Box::new(|panic_info| {
		let value = (panic_info.to_string(), Backtrace::new());
		if let Ok(mut panic_message_and_backtrace) = PANIC_MESSAGE_AND_BACKTRACE.lock() {
			panic_message_and_backtrace.replace(value);
		}
	}));
	let file_path_train = options
		.file_train
		.clone()
		.unwrap_or_else(|| options.data_dir.join("train.csv"));
	let file_path_test = options
		.file_test
		.clone()
		.unwrap_or_else(|| options.data_dir.join("test.csv"));
	let progress_logger = ProgressLogger::start(Duration::from_secs(1));
	let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
		datadee_core::train(
			TrainArgs {
				file_path_train: &file_path_train,
				file_path_test: &file_path_test,
				target_column_name: &options.target,
				id_column_name: &options.id_column,
				output_path: &options.output,
				config_path: options.config.as_deref(),
			},
			&mut |progress| progress_logger.update(progress),
		)
	}));
	drop(progress_logger);
	std::panic::set_hook(hook);
	let output = match result {
		Ok(result) => result,
		Err(_) => {
			let panic_message_and_backtrace = PANIC_MESSAGE_AND_BACKTRACE
				.lock()
				.map_err(|_| format_err!("training panicked"))?;
			match panic_message_and_backtrace.as_ref() {
				Some((message, backtrace)) => Err(format_err!("{}\n{:?}", message, backtrace)),
				None => Err(format_err!("training panicked")),
			}
		}
	}?;

	let best = output.search.best();
	eprintln!(
		"Best parameters: {} with a mean cross validated AUC of {:.5}.",
		best.grid_item, best.mean_score
	);
	eprintln!("Training AUC: {:.5}", output.train_auc);
	eprintln!(
		"Your submission with {} predictions was written to {}.",
		output.n_test_rows,
		options.output.display()
	);
	Ok(())
}
