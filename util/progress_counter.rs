use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A `ProgressCounter` is a cheaply cloneable counter that one thread increments while another reads it to report progress.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}

	pub fn set(&self, value: u64) {
		self.current.store(value, Ordering::Relaxed);
	}

	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}

	/// The fraction of the work completed, in `[0, 1]`. A counter with a total of zero is always complete.
	pub fn fraction(&self) -> f32 {
		if self.total == 0 {
			return 1.0;
		}
		(self.get() as f64 / self.total as f64).min(1.0) as f32
	}
}

#[test]
fn test_progress_counter_shares_state_between_clones() {
	let counter = ProgressCounter::new(4);
	let clone = counter.clone();
	clone.inc(1);
	counter.inc(1);
	assert_eq!(counter.get(), 2);
	assert!((clone.fraction() - 0.5).abs() < f32::EPSILON);
	assert!((ProgressCounter::new(0).fraction() - 1.0).abs() < f32::EPSILON);
}
