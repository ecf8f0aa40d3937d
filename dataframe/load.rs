use super::*;
use anyhow::Result;
use std::{collections::BTreeMap, path::Path};

#[derive(Clone)]
pub struct FromCsvOptions<'a> {
	/// Columns whose type is given here skip inference. This is how a test file is loaded with the types inferred from its train file.
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub invalid_values: &'a [&'a str],
}

impl<'a> Default for FromCsvOptions<'a> {
	fn default() -> Self {
		Self {
			column_types: None,
			invalid_values: DEFAULT_INVALID_VALUES,
		}
	}
}

/// These values are the default values that are considered missing. They are the tokens pandas' `read_csv` treats as missing by default.
pub const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
	"<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions, progress: impl Fn(u64)) -> Result<Self> {
		Self::from_csv(&mut csv::Reader::from_path(path)?, options, progress)
	}

	pub fn from_bytes(bytes: &[u8], options: FromCsvOptions) -> Result<Self> {
		Self::from_csv(
			&mut csv::Reader::from_reader(std::io::Cursor::new(bytes)),
			options,
			|_| {},
		)
	}

	/// Load a dataframe from csv in two passes. The first pass infers the type of every column not given in `options.column_types`. The second pass parses the values. Missing values become `NaN` in number columns and the empty string in text columns, so every missing token is the same category.
	pub fn from_csv<R>(
		reader: &mut csv::Reader<R>,
		options: FromCsvOptions,
		progress: impl Fn(u64),
	) -> Result<Self>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let start_position = reader.position().clone();

		let mut column_types: Vec<Option<ColumnType>> = column_names
			.iter()
			.map(|column_name| {
				options
					.column_types
					.as_ref()
					.and_then(|column_types| column_types.get(column_name).cloned())
			})
			.collect();

		let mut n_rows = None;
		if column_types.iter().any(|column_type| column_type.is_none()) {
			let mut infer_stats: Vec<(usize, InferStats)> = column_types
				.iter()
				.enumerate()
				.filter(|(_, column_type)| column_type.is_none())
				.map(|(index, _)| (index, InferStats::new(options.invalid_values)))
				.collect();
			let mut record = csv::StringRecord::new();
			let mut n_rows_computed = 0;
			while reader.read_record(&mut record)? {
				n_rows_computed += 1;
				for (index, infer_stats) in infer_stats.iter_mut() {
					infer_stats.update(record.get(*index).unwrap_or(""));
				}
			}
			n_rows = Some(n_rows_computed);
			for (index, infer_stats) in infer_stats.into_iter() {
				column_types[index] = Some(infer_stats.finalize());
			}
			// After inference, return back to the beginning of the csv to load the values.
			reader.seek(start_position)?;
		}
		let column_types = column_types
			.into_iter()
			.map(|column_type| column_type.unwrap_or(ColumnType::Text))
			.collect();

		let mut dataframe = Self::new(column_names, column_types);
		if let Some(n_rows) = n_rows {
			for column in dataframe.columns.iter_mut() {
				match column {
					Column::Number(column) => column.data.reserve_exact(n_rows),
					Column::Text(column) => column.data.reserve_exact(n_rows),
				}
			}
		}
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			if let Some(position) = record.position() {
				progress(position.byte());
			}
			for (column, value) in dataframe.columns.iter_mut().zip(record.iter()) {
				match column {
					Column::Number(column) => {
						let value = match lexical::parse::<f32, _>(value) {
							Ok(value) if value.is_finite() => value,
							_ => std::f32::NAN,
						};
						column.data.push(value);
					}
					Column::Text(column) => {
						let value = std::str::from_utf8(value)?;
						let value = if options.invalid_values.contains(&value) {
							""
						} else {
							value
						};
						column.data.push(value.to_owned());
					}
				}
			}
		}
		Ok(dataframe)
	}
}

#[derive(Clone, Debug)]
pub struct InferStats<'a> {
	invalid_values: &'a [&'a str],
	column_type: InferColumnType,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Number,
	Text,
}

impl<'a> InferStats<'a> {
	pub fn new(invalid_values: &'a [&'a str]) -> Self {
		Self {
			invalid_values,
			column_type: InferColumnType::Unknown,
		}
	}

	pub fn update(&mut self, value: &str) {
		if self.invalid_values.contains(&value) {
			return;
		}
		match self.column_type {
			InferColumnType::Unknown | InferColumnType::Number => {
				if lexical::parse::<f32, _>(value)
					.map(|v| v.is_finite())
					.unwrap_or(false)
				{
					self.column_type = InferColumnType::Number;
				} else {
					self.column_type = InferColumnType::Text;
				}
			}
			InferColumnType::Text => {}
		}
	}

	/// A column where every value was missing has no evidence of being text, so it loads as an all `NaN` number column.
	pub fn finalize(self) -> ColumnType {
		match self.column_type {
			InferColumnType::Unknown | InferColumnType::Number => ColumnType::Number,
			InferColumnType::Text => ColumnType::Text,
		}
	}
}

#[test]
fn test_infer() {
	let csv = r#"number,text,missing
1,hello,
,world,NA
"#;
	let df = DataFrame::from_bytes(csv.as_bytes(), FromCsvOptions::default()).unwrap();
	insta::assert_debug_snapshot!(df, @r###"
DataFrame {
    columns: [
        Number(
            NumberColumn {
                name: "number",
                data: [
                    1.0,
                    NaN,
                ],
            },
        ),
        Text(
            TextColumn {
                name: "text",
                data: [
                    "hello",
                    "world",
                ],
            },
        ),
        Number(
            NumberColumn {
                name: "missing",
                data: [
                    NaN,
                    NaN,
                ],
            },
        ),
    ],
}
"###);
}

#[test]
fn test_column_types() {
	let csv = r#"id,grade
7,A
8,
"#;
	let mut column_types = BTreeMap::new();
	column_types.insert("id".to_owned(), ColumnType::Text);
	let df = DataFrame::from_bytes(
		csv.as_bytes(),
		FromCsvOptions {
			column_types: Some(column_types),
			..Default::default()
		},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
DataFrame {
    columns: [
        Text(
            TextColumn {
                name: "id",
                data: [
                    "7",
                    "8",
                ],
            },
        ),
        Text(
            TextColumn {
                name: "grade",
                data: [
                    "A",
                    "",
                ],
            },
        ),
    ],
}
"###);
}

#[test]
fn test_pandas_missing_tokens() {
	let csv = "rate,grade,flag\nNA,A,?\n11.5,None,1\nNone,#N/A,0\n<NA>,B,1\n";
	let df = DataFrame::from_bytes(csv.as_bytes(), FromCsvOptions::default()).unwrap();
	let rate = df.columns[0].as_number().unwrap();
	assert_eq!(rate.data[1], 11.5);
	assert!(rate.data[0].is_nan() && rate.data[2].is_nan() && rate.data[3].is_nan());
	let grade = df.columns[1].as_text().unwrap();
	assert_eq!(grade.data, vec!["A", "", "", "B"]);
	// `?` is an ordinary value, so its column is text.
	assert_eq!(df.columns[2].column_type(), ColumnType::Text);
}

#[test]
fn test_mixed_column_is_text() {
	let csv = "value\n1\nabc\n2\n";
	let df = DataFrame::from_bytes(csv.as_bytes(), FromCsvOptions::default()).unwrap();
	assert_eq!(df.columns[0].column_type(), ColumnType::Text);
	assert_eq!(df.nrows(), 3);
}

#[test]
fn test_ragged_rows_are_an_error() {
	let csv = "a,b\n1,2\n3\n";
	assert!(DataFrame::from_bytes(csv.as_bytes(), FromCsvOptions::default()).is_err());
}
