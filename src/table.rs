//! A minimal string-celled frame: just enough tabular behaviour to
//! checkpoint posts as CSV and merge the checkpoints back together.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use crate::post::{cell_text, Post};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Rows shorter or longer than the header are padded or cut to fit.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// One row per post, columns are the union of the post fields in first seen order.
    pub fn from_posts(posts: &[Post]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for post in posts {
            for key in post.fields().keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = posts
            .iter()
            .map(|post| {
                columns
                    .iter()
                    .map(|col| post.get(col).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when there is no cell holding a value. An empty table counts as all null.
    pub fn is_all_null(&self) -> bool {
        self.rows.iter().flatten().all(|cell| cell.is_empty())
    }

    /// Worth keeping: at least one row and at least one non-null cell.
    pub fn is_usable(&self) -> bool {
        !self.is_empty() && !self.is_all_null()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Stacks tables on top of each other. Columns are unioned in first seen
    /// order and cells a table doesn't have are left null.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let tables: Vec<Table> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(tables.iter().map(Table::len).sum());
        for table in tables {
            let mapping: Vec<Option<usize>> = columns
                .iter()
                .map(|col| table.column_index(col))
                .collect();
            for row in table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map(|i| row[i].clone()).unwrap_or_default())
                        .collect(),
                );
            }
        }

        Table { columns, rows }
    }

    /// Keeps the first row seen for every distinct value of `column`.
    /// Null cells are equal to each other, so only the first null row survives.
    pub fn drop_duplicates(mut self, column: &str) -> Result<Table> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))?;

        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows.retain(|row| seen.insert(row[idx].clone()));
        Ok(self)
    }

    /// Stable ascending sort on `column`. Integer cells compare numerically and
    /// come before anything that doesn't parse, which compares as text.
    pub fn sort_by_column(mut self, column: &str) -> Result<Table> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))?;

        self.rows.sort_by(|a, b| compare_cells(&a[idx], &b[idx]));
        Ok(self)
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Table> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Table::new(columns, rows))
    }

    /// A table without columns produces an empty file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        if self.columns.is_empty() {
            return Ok(());
        }

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
