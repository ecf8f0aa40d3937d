use super::StreamingMetric;
use num_traits::clamp;

/// BinaryCrossEntropy is the loss function used for binary classification. [Learn more](https://en.wikipedia.org/wiki/Cross_entropy#Cross-entropy_loss_function_and_logistic_regression).
#[derive(Debug, Default)]
pub struct BinaryCrossEntropy {
	n: u64,
	sum: f64,
}

/// The input to [BinaryCrossEntropy](struct.BinaryCrossEntropy.html).
pub struct BinaryCrossEntropyInput {
	pub probability: f32,
	/// 0 for the negative class, 1 for the positive class.
	pub label: usize,
}

impl StreamingMetric<'_> for BinaryCrossEntropy {
	type Input = BinaryCrossEntropyInput;
	type Output = Option<f32>;

	fn update(&mut self, value: BinaryCrossEntropyInput) {
		let BinaryCrossEntropyInput { probability, label } = value;
		let label = if label == 1 { 1.0 } else { 0.0 };
		// Binary cross entropy is undefined when the probability = 0 or probability = 1.
		let probability_clamped = clamp(probability, std::f32::EPSILON, 1.0 - std::f32::EPSILON);
		let binary_cross_entropy = -1.0 * label * probability_clamped.ln()
			+ -1.0 * (1.0 - label) * (1.0 - probability_clamped).ln();
		self.n += 1;
		self.sum += binary_cross_entropy as f64;
	}

	fn merge(&mut self, other: Self) {
		self.n += other.n;
		self.sum += other.sum;
	}

	fn finalize(self) -> Option<f32> {
		if self.n == 0 {
			None
		} else {
			Some((self.sum / self.n as f64) as f32)
		}
	}
}

#[test]
fn test_binary_cross_entropy() {
	let mut metric = BinaryCrossEntropy::default();
	metric.update(BinaryCrossEntropyInput {
		probability: 0.5,
		label: 1,
	});
	metric.update(BinaryCrossEntropyInput {
		probability: 0.5,
		label: 0,
	});
	let loss = metric.finalize().unwrap();
	assert!((loss - std::f32::consts::LN_2).abs() < 1e-6);
	assert_eq!(BinaryCrossEntropy::default().finalize(), None);
}
