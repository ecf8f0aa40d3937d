use anyhow::{bail, Context, Result};
use std::path::Path;

/// Write the submission csv with the header `id,<target_column_name>` and one row per id. Probabilities are written unthresholded.
pub fn write_submission<W: std::io::Write>(
	writer: W,
	target_column_name: &str,
	ids: &[String],
	probabilities: &[f32],
) -> Result<()> {
	if ids.len() != probabilities.len() {
		bail!(
			"there are {} ids but {} predictions",
			ids.len(),
			probabilities.len()
		);
	}
	let mut writer = csv::Writer::from_writer(writer);
	writer.write_record(&["id", target_column_name])?;
	for (id, probability) in ids.iter().zip(probabilities.iter()) {
		writer.write_record(&[id.as_str(), &probability.to_string()])?;
	}
	writer.flush()?;
	Ok(())
}

pub fn write_submission_to_path(
	path: &Path,
	target_column_name: &str,
	ids: &[String],
	probabilities: &[f32],
) -> Result<()> {
	let file = std::fs::File::create(path)
		.with_context(|| format!("failed to create {}", path.display()))?;
	write_submission(file, target_column_name, ids, probabilities)
}

#[test]
fn test_write_submission() {
	let mut bytes = Vec::new();
	let ids = vec!["58645".to_owned(), "58646".to_owned()];
	write_submission(&mut bytes, "loan_status", &ids, &[0.25, 0.9]).unwrap();
	insta::assert_snapshot!(String::from_utf8(bytes).unwrap(), @r###"
id,loan_status
58645,0.25
58646,0.9
"###);
}

#[test]
fn test_write_submission_length_mismatch() {
	let ids = vec!["1".to_owned()];
	assert!(write_submission(Vec::new(), "loan_status", &ids, &[]).is_err());
}
