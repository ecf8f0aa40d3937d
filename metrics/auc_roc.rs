use super::Metric;

/// `AucRoc` computes the area under the receiver operating characteristic curve of binary classifier probabilities.
pub struct AucRoc;

pub struct AucRocInput<'a> {
	/// The predicted probability of the positive class for each example.
	pub probabilities: &'a [f32],
	/// The label of each example, 0 for the negative class and 1 for the positive class.
	pub labels: &'a [usize],
}

impl<'a> Metric<'a> for AucRoc {
	type Input = AucRocInput<'a>;
	type Output = f32;

	fn compute(input: AucRocInput<'a>) -> f32 {
		auc_roc(input.probabilities, input.labels)
	}
}

/// This function computes the area under the receiver operating characteristic curve using the trapezoid method. Examples with equal probabilities are grouped into a single point on the curve, so ties count as half. The result is `NaN` when the labels contain only one class.
pub fn auc_roc(probabilities: &[f32], labels: &[usize]) -> f32 {
	let roc_curve = compute_roc_curve(probabilities, labels);
	// compute the riemann sum of the auc_roc_curve
	roc_curve
		.windows(2)
		.map(|window| {
			let left = &window[0];
			let right = &window[1];
			let y_average = (left.true_positive_rate + right.true_positive_rate) / 2.0;
			let dx = right.false_positive_rate - left.false_positive_rate;
			y_average * dx
		})
		.sum()
}

#[derive(Debug, PartialEq)]
pub struct RocCurvePoint {
	/// The classification threshold.
	pub threshold: f32,
	/// The true positive rate for all predictions with probability >= threshold.
	pub true_positive_rate: f32,
	/// The false positive rate for all predictions with probability >= threshold.
	pub false_positive_rate: f32,
}

/// This function computes the ROC curve. The ROC curve plots the false positive rate on the x axis and the true positive rate on the y axis for various classification thresholds.
pub fn compute_roc_curve(probabilities: &[f32], labels: &[usize]) -> Vec<RocCurvePoint> {
	let mut tps_fps = compute_tps_fps_by_threshold(probabilities, labels);
	for i in 1..tps_fps.len() {
		tps_fps[i].true_positives += tps_fps[i - 1].true_positives;
		tps_fps[i].false_positives += tps_fps[i - 1].false_positives;
	}
	let count_positives = labels.iter().filter(|label| **label == 1).count();
	let count_negatives = labels.len() - count_positives;
	// add a point at (0,0) on the roc curve with a dummy threshold of 1.0
	let mut roc_curve = vec![RocCurvePoint {
		threshold: 1.0,
		true_positive_rate: 0.0,
		false_positive_rate: 0.0,
	}];
	for point in tps_fps.iter() {
		roc_curve.push(RocCurvePoint {
			threshold: point.threshold,
			true_positive_rate: point.true_positives as f32 / count_positives as f32,
			false_positive_rate: point.false_positives as f32 / count_negatives as f32,
		});
	}
	roc_curve
}

#[derive(Debug)]
struct TpsFpsPoint {
	threshold: f32,
	true_positives: usize,
	false_positives: usize,
}

/**
This function computes the counts of true positives and false positives at each classification threshold. Unlike the roc curve, each point contains just the count of true positives and false positives at this threshold instead of all values greater than or equal to this threshold.
*/
fn compute_tps_fps_by_threshold(probabilities: &[f32], labels: &[usize]) -> Vec<TpsFpsPoint> {
	let mut probabilities_labels: Vec<(f32, usize)> = probabilities
		.iter()
		.cloned()
		.zip(labels.iter().cloned())
		.collect();
	probabilities_labels.sort_by(|a, b| b.0.total_cmp(&a.0));
	let mut tps_fps: Vec<TpsFpsPoint> = Vec::new();
	for (probability, label) in probabilities_labels {
		let tp = if label == 1 { 1 } else { 0 };
		match tps_fps.last_mut() {
			// if probability is same as the last one, add to the previous bucket
			Some(last) if last.threshold == probability => {
				last.true_positives += tp;
				last.false_positives += 1 - tp;
			}
			_ => tps_fps.push(TpsFpsPoint {
				threshold: probability,
				true_positives: tp,
				false_positives: 1 - tp,
			}),
		}
	}
	tps_fps
}

#[test]
fn test_roc_curve() {
	let labels = vec![1, 1, 0, 0];
	let probabilities = vec![0.9, 0.4, 0.4, 0.2];
	let left = compute_roc_curve(probabilities.as_slice(), labels.as_slice());
	let right = vec![
		RocCurvePoint {
			threshold: 1.0,
			true_positive_rate: 0.0,
			false_positive_rate: 0.0,
		},
		RocCurvePoint {
			threshold: 0.9,
			true_positive_rate: 0.5,
			false_positive_rate: 0.0,
		},
		RocCurvePoint {
			threshold: 0.4,
			true_positive_rate: 1.0,
			false_positive_rate: 0.5,
		},
		RocCurvePoint {
			threshold: 0.2,
			true_positive_rate: 1.0,
			false_positive_rate: 1.0,
		},
	];
	assert_eq!(left, right);
	let auc = auc_roc(probabilities.as_slice(), labels.as_slice());
	assert!(f32::abs(auc - 0.875) < f32::EPSILON)
}

#[test]
fn test_auc_roc_perfect_and_single_class() {
	let auc = AucRoc::compute(AucRocInput {
		probabilities: &[0.1, 0.2, 0.8, 0.9],
		labels: &[0, 0, 1, 1],
	});
	assert!(f32::abs(auc - 1.0) < f32::EPSILON);
	assert!(auc_roc(&[0.1, 0.9], &[1, 1]).is_nan());
}
