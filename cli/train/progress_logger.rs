use datadee_core::{Progress, ProgressCounter, TrainProgress};
use std::{
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc, Mutex,
	},
	thread::JoinHandle,
	time::Duration,
};

type Stage = Option<(&'static str, ProgressCounter)>;

/// A `ProgressLogger` watches the counter of the current stage from a background thread and logs how far along it is every `interval`.
pub struct ProgressLogger {
	stage: Arc<Mutex<Stage>>,
	done: Arc<AtomicBool>,
	thread: Option<JoinHandle<()>>,
}

impl ProgressLogger {
	pub fn start(interval: Duration) -> ProgressLogger {
		let stage: Arc<Mutex<Stage>> = Arc::new(Mutex::new(None));
		let done = Arc::new(AtomicBool::new(false));
		let thread = std::thread::spawn({
			let stage = stage.clone();
			let done = done.clone();
			move || loop {
				std::thread::park_timeout(interval);
				if done.load(Ordering::Relaxed) {
					break;
				}
				if let Ok(stage) = stage.lock() {
					if let Some((name, counter)) = stage.as_ref() {
						log_fraction(name, counter);
					}
				}
			}
		});
		ProgressLogger {
			stage,
			done,
			thread: Some(thread),
		}
	}

	pub fn update(&self, progress: Progress) {
		match progress {
			Progress::Loading(counter) => self.watch("loading csv", counter),
			Progress::CrossValidating {
				grid_item_index,
				n_grid_items,
				fold_index,
				n_folds,
			} => {
				self.finish();
				tracing::debug!(
					"training grid item {} of {} on fold {} of {}",
					grid_item_index + 1,
					n_grid_items,
					fold_index + 1,
					n_folds
				);
			}
			Progress::TrainingFinalModel(TrainProgress::Initializing(counter)) => {
				self.watch("computing bin thresholds", counter)
			}
			Progress::TrainingFinalModel(TrainProgress::Training(counter)) => {
				self.watch("training the final model", counter)
			}
			Progress::Predicting => {
				self.finish();
				tracing::info!("predicting the test file");
			}
			Progress::Writing => {
				self.finish();
				tracing::debug!("writing the submission");
			}
		}
	}

	/// Start watching `counter`. The previous stage is logged one last time.
	fn watch(&self, name: &'static str, counter: ProgressCounter) {
		let previous = match self.stage.lock() {
			Ok(mut stage) => stage.replace((name, counter)),
			Err(_) => None,
		};
		if let Some((name, counter)) = previous {
			log_fraction(name, &counter);
		}
	}

	fn finish(&self) {
		let previous = match self.stage.lock() {
			Ok(mut stage) => stage.take(),
			Err(_) => None,
		};
		if let Some((name, counter)) = previous {
			log_fraction(name, &counter);
		}
	}
}

impl Drop for ProgressLogger {
	fn drop(&mut self) {
		self.finish();
		self.done.store(true, Ordering::Relaxed);
		if let Some(thread) = self.thread.take() {
			thread.thread().unpark();
			thread.join().ok();
		}
	}
}

fn log_fraction(name: &str, counter: &ProgressCounter) {
	tracing::info!(
		current = counter.get(),
		total = counter.total(),
		"{} {:.0}%",
		name,
		counter.fraction() * 100.0
	);
}

#[test]
fn test_stages_replace_each_other() {
	let logger = ProgressLogger::start(Duration::from_millis(10));
	let counter = ProgressCounter::new(10);
	logger.update(Progress::Loading(counter.clone()));
	counter.set(5);
	std::thread::sleep(Duration::from_millis(30));
	assert_eq!(logger.stage.lock().unwrap().as_ref().unwrap().0, "loading csv");
	logger.update(Progress::TrainingFinalModel(TrainProgress::Training(
		ProgressCounter::new(3),
	)));
	assert_eq!(
		logger.stage.lock().unwrap().as_ref().unwrap().0,
		"training the final model"
	);
	logger.update(Progress::Predicting);
	assert!(logger.stage.lock().unwrap().is_none());
	drop(logger);
}
