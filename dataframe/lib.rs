/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. It only implements what the datadee pipeline needs: number and text columns loaded from csv.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameView<'a> {
	pub columns: Vec<ColumnView<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Number(NumberColumn),
	Text(TextColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnView<'a> {
	Number(NumberColumnView<'a>),
	Text(TextColumnView<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [f32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [String],
}

/// The type of a column. Number columns hold `f32`s with `NaN` for missing values. Every column that is not entirely numeric is a text column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
	Number,
	Text,
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Text => Column::Text(TextColumn::new(column_name)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn view(&self) -> DataFrameView {
		let columns = self.columns.iter().map(|column| column.view()).collect();
		DataFrameView { columns }
	}

	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|column| column.name()).collect()
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	pub fn column_types(&self) -> Vec<(String, ColumnType)> {
		self.columns
			.iter()
			.map(|column| (column.name().to_owned(), column.column_type()))
			.collect()
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Number(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Self::Number(s) => s.data.is_empty(),
			Self::Text(s) => s.data.is_empty(),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Number(s) => s.name.as_str(),
			Self::Text(s) => s.name.as_str(),
		}
	}

	pub fn column_type(&self) -> ColumnType {
		match self {
			Self::Number(_) => ColumnType::Number,
			Self::Text(_) => ColumnType::Text,
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn view(&self) -> ColumnView {
		match self {
			Self::Number(column) => ColumnView::Number(column.view()),
			Self::Text(column) => ColumnView::Text(column.view()),
		}
	}
}

impl NumberColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> NumberColumnView {
		NumberColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl TextColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> TextColumnView {
		TextColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl<'a> DataFrameView<'a> {
	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn view(&self) -> Self {
		self.clone()
	}

	pub fn column(&self, name: &str) -> Option<&ColumnView<'a>> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Copy the rows at `indexes`, in the order given, into a new dataframe. This is used to materialize cross validation folds.
	pub fn take_rows(&self, indexes: &[usize]) -> DataFrame {
		let columns = self
			.columns
			.iter()
			.map(|column| match column {
				ColumnView::Number(column) => Column::Number(NumberColumn {
					name: column.name.to_owned(),
					data: indexes.iter().map(|index| column.data[*index]).collect(),
				}),
				ColumnView::Text(column) => Column::Text(TextColumn {
					name: column.name.to_owned(),
					data: indexes
						.iter()
						.map(|index| column.data[*index].clone())
						.collect(),
				}),
			})
			.collect();
		DataFrame { columns }
	}
}

impl<'a> ColumnView<'a> {
	pub fn len(&self) -> usize {
		match self {
			Self::Number(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Self::Number(s) => s.data.is_empty(),
			Self::Text(s) => s.data.is_empty(),
		}
	}

	pub fn name(&self) -> &'a str {
		match self {
			Self::Number(s) => s.name,
			Self::Text(s) => s.name,
		}
	}

	pub fn column_type(&self) -> ColumnType {
		match self {
			Self::Number(_) => ColumnType::Number,
			Self::Text(_) => ColumnType::Text,
		}
	}

	pub fn as_number(&self) -> Option<NumberColumnView<'a>> {
		match self {
			Self::Number(s) => Some(s.clone()),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<TextColumnView<'a>> {
		match self {
			Self::Text(s) => Some(s.clone()),
			_ => None,
		}
	}
}

#[test]
fn test_take_rows() {
	let mut dataframe = DataFrame::new(
		vec!["amount".to_owned(), "grade".to_owned()],
		vec![ColumnType::Number, ColumnType::Text],
	);
	if let Column::Number(column) = &mut dataframe.columns[0] {
		column.data = vec![1.0, 2.0, 3.0];
	}
	if let Column::Text(column) = &mut dataframe.columns[1] {
		column.data = vec!["A".to_owned(), "B".to_owned(), "C".to_owned()];
	}
	let subset = dataframe.view().take_rows(&[2, 0]);
	assert_eq!(subset.nrows(), 2);
	assert_eq!(subset.columns[0].as_number().unwrap().data, vec![3.0, 1.0]);
	assert_eq!(
		subset.columns[1].as_text().unwrap().data,
		vec!["C".to_owned(), "A".to_owned()]
	);
}
