//! In-memory tabular datasets loaded from CSV.
//!
//! A [`Dataset`] is a list of named, equally long columns. Each column is
//! either numeric or categorical; the type is inferred when loading: a column
//! is numeric when every non-missing cell parses as a floating point number.
//!
//! Missing cells are stored as `None`. The following cell contents count as
//! missing: the empty string, `NA`, `N/A`, `NaN`, `nan`, `null`, `NULL` and
//! `None`. In numeric columns, cells that parse to a non-finite number (`inf`,
//! `-Infinity`, `NAN`, ...) are missing as well.

use std::{
    collections::{BTreeSet, HashSet},
    fs::File,
    io,
    path::Path,
};

use serde::Serialize;

const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum DatasetError {
    #[display("failed to read CSV data")]
    #[from]
    Csv(csv::Error),
    #[display("CSV data has no header row")]
    MissingHeader,
    #[display("duplicate column name '{name}'")]
    DuplicateColumn { name: String },
}

/// Values of a single column.
#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(values) => values[row].is_none(),
            ColumnData::Categorical(values) => values[row].is_none(),
        }
    }

    fn display_cell(&self, row: usize) -> String {
        match self {
            ColumnData::Numeric(values) => values[row].map(|v| v.to_string()).unwrap_or_default(),
            ColumnData::Categorical(values) => values[row].clone().unwrap_or_default(),
        }
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        let mut keep = keep.iter().copied();
        match self {
            ColumnData::Numeric(values) => values.retain(|_| keep.next().unwrap_or(false)),
            ColumnData::Categorical(values) => values.retain(|_| keep.next().unwrap_or(false)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric<S>(name: S, values: Vec<Option<f64>>) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical<S, V>(name: S, values: V) -> Self
    where
        S: Into<String>,
        V: IntoIterator<Item = Option<String>>,
    {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values.into_iter().collect()),
        }
    }

    /// Distinct non-missing categories in order of first appearance.
    ///
    /// Returns `None` for numeric columns.
    #[must_use]
    pub fn categories(&self) -> Option<Vec<&str>> {
        let ColumnData::Categorical(values) = &self.data else {
            return None;
        };
        let mut seen = HashSet::new();
        Some(
            values
                .iter()
                .flatten()
                .map(String::as_str)
                .filter(|v| seen.insert(*v))
                .collect(),
        )
    }
}

/// Column names grouped by type, as needed to offer valid test configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    /// Categorical columns with exactly two distinct non-missing values.
    pub binary: Vec<String>,
}

/// Immutable tabular data: rows × named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Builds a dataset from columns.
    ///
    /// # Panics
    ///
    /// Panics if the columns have different lengths.
    #[must_use]
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map_or(0, |c| c.data.len());
        assert!(
            columns.iter().all(|c| c.data.len() == row_count),
            "all columns must have the same length"
        );
        Self { columns, row_count }
    }

    pub fn from_csv_path<P>(path: P) -> Result<Self, DatasetError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path.as_ref()).map_err(csv::Error::from)?;
        Self::from_csv_reader(io::BufReader::new(file))
    }

    pub fn from_csv_reader<R>(reader: R) -> Result<Self, DatasetError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(DatasetError::MissingHeader);
        }

        let mut seen = HashSet::new();
        for name in &headers {
            if !seen.insert(name) {
                return Err(DatasetError::DuplicateColumn {
                    name: name.to_owned(),
                });
            }
        }

        let mut cells = vec![Vec::<Option<String>>::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (column, cell) in cells.iter_mut().zip(&record) {
                column.push((!MISSING_MARKERS.contains(&cell)).then(|| cell.to_owned()));
            }
        }

        let columns = headers
            .iter()
            .zip(cells)
            .map(|(name, values)| infer_column(name, values))
            .collect();
        Ok(Self::from_columns(columns))
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of a numeric column, or `None` if the column is missing or categorical.
    #[must_use]
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Values of a categorical column, or `None` if the column is missing or numeric.
    #[must_use]
    pub fn categorical(&self, name: &str) -> Option<&[Option<String>]> {
        match &self.column(name)?.data {
            ColumnData::Categorical(values) => Some(values),
            ColumnData::Numeric(_) => None,
        }
    }

    #[must_use]
    pub fn column_summary(&self) -> ColumnSummary {
        let mut summary = ColumnSummary::default();
        for column in &self.columns {
            match column.categories() {
                None => summary.numeric.push(column.name.clone()),
                Some(categories) => {
                    if categories.len() == 2 {
                        summary.binary.push(column.name.clone());
                    }
                    summary.categorical.push(column.name.clone());
                }
            }
        }
        summary
    }

    /// First `n` rows rendered as strings; missing cells are empty.
    #[must_use]
    pub fn preview(&self, n: usize) -> Vec<Vec<String>> {
        (0..self.row_count.min(n))
            .map(|row| self.columns.iter().map(|c| c.data.display_cell(row)).collect())
            .collect()
    }

    /// Returns a copy without the rows that have a missing value in any column.
    #[must_use]
    pub fn drop_incomplete_rows(&self) -> Self {
        let keep = (0..self.row_count)
            .map(|row| self.columns.iter().all(|c| !c.data.is_missing(row)))
            .collect::<Vec<_>>();
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut column = column.clone();
                column.data.retain_rows(&keep);
                column
            })
            .collect();
        Self::from_columns(columns)
    }

    /// Replaces each categorical column with numeric 0/1 indicator columns
    /// named `<column>_<category>`, one per category in sorted order.
    ///
    /// With `drop_first`, the indicator of the first category is omitted.
    /// Rows where the category is missing get 0 in every indicator.
    #[must_use]
    pub fn one_hot_encode(&self, drop_first: bool) -> Self {
        let mut columns = Vec::new();
        for column in &self.columns {
            let ColumnData::Categorical(values) = &column.data else {
                columns.push(column.clone());
                continue;
            };
            let categories = values.iter().flatten().collect::<BTreeSet<_>>();
            for category in categories.into_iter().skip(usize::from(drop_first)) {
                let indicator = values
                    .iter()
                    .map(|v| Some(if v.as_ref() == Some(category) { 1.0 } else { 0.0 }))
                    .collect();
                columns.push(Column::numeric(
                    format!("{}_{category}", column.name),
                    indicator,
                ));
            }
        }
        Self {
            columns,
            row_count: self.row_count,
        }
    }

    /// Writes the dataset as CSV with a header row. Missing cells are written empty.
    pub fn write_csv<W>(&self, writer: W) -> Result<(), DatasetError>
    where
        W: io::Write,
    {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.column_names())?;
        for row in self.preview(self.row_count) {
            writer.write_record(&row)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

fn infer_column(name: &str, values: Vec<Option<String>>) -> Column {
    let parsed = values
        .iter()
        .map(|v| v.as_deref().map(str::parse::<f64>).transpose())
        .collect::<Result<Vec<_>, _>>();
    match parsed {
        Ok(numbers) => {
            let non_finite = numbers.iter().flatten().filter(|v| !v.is_finite()).count();
            if non_finite > 0 {
                log::warn!("Column '{name}': treating {non_finite} non-finite value(s) as missing");
            }
            let numbers = numbers
                .into_iter()
                .map(|v| v.filter(|v| v.is_finite()))
                .collect();
            Column::numeric(name, numbers)
        }
        Err(_) => Column::categorical(name, values),
    }
}
