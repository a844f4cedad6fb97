//! A comma separated data table that supplies numeric training columns.
//!
//! Cells are kept as trimmed strings. A quoted field may contain commas, any
//! other double quotes are dropped, and any row with a `?` cell is treated as
//! missing data and discarded. A trailing comma does not start another cell.
//!
//! Non-numeric cells are converted through per-column aliases. The first time
//! a column's numeric values are requested, each distinct non-numeric value is
//! assigned the next integer starting from zero, in the order it is first
//! seen. Those aliases are remembered, and `set_alias` can assign or replace
//! one explicitly.

use crate::error::{Error, Result};

use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// The name given to a header cell that is blank.
const BLANK_COLUMN: &str = "<blank>";

/// Marks a missing value; rows containing one are discarded.
const MISSING_VALUE: &str = "?";

#[derive(Clone, Debug, Default)]
pub struct DataTable {
    column_names: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Numeric value of a non-numeric cell, keyed by column then cell text.
    aliases: Vec<HashMap<String, f64>>,
    /// The next automatic alias of each column.
    next_alias: Vec<f64>,
}

impl DataTable {
    /// Reads a table from CSV text. When `header` is set the first record
    /// holds the column names.
    pub fn from_reader<R: Read>(reader: R, header: bool) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(header)
            .flexible(true)
            .from_reader(reader);
        let mut table = DataTable::default();
        let mut num_cols = None;

        if header {
            // Only an empty header cell is blank; whitespace trims to "".
            let names: Vec<String> = fields(reader.headers()?)
                .into_iter()
                .map(|name| if name.is_empty() {
                    BLANK_COLUMN.to_string()
                } else {
                    clean(name)
                })
                .collect();
            num_cols = Some(names.len());
            table.column_names = names;
        }

        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let row: Vec<String> = fields(&record).into_iter().map(clean).collect();
            if row.iter().any(|cell| cell == MISSING_VALUE) {
                debug!("discarding line {} with missing values", line);
                continue;
            }
            match num_cols {
                Some(n) if n != row.len() => {
                    return Err(Error::Table(format!("line {} has {} columns, \
                                                     expected {}",
                                                    line,
                                                    row.len(),
                                                    n)));
                }
                Some(_) => {}
                None => num_cols = Some(row.len()),
            }
            table.rows.push(row);
        }

        let num_cols = num_cols.unwrap_or(0);
        table.aliases = vec![HashMap::new(); num_cols];
        table.next_alias = vec![0.0; num_cols];
        debug!("read data table with {} rows and {} columns",
               table.rows.len(),
               num_cols);
        Ok(table)
    }

    /// Reads a table from the CSV file at `path`.
    pub fn read_from_file<P: AsRef<Path>>(path: P, header: bool) -> Result<Self> {
        let file = File::open(path)?;
        DataTable::from_reader(file, header)
    }

    /// Reads a table from CSV text held in memory.
    pub fn parse(text: &str, header: bool) -> Result<Self> {
        DataTable::from_reader(text.as_bytes(), header)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.aliases.len()
    }

    /// Returns the column names, which are empty if the table had no header.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    /// Appends a row of cells. Fails if the row has the wrong number of cells.
    pub fn add_row(&mut self, row: Vec<String>) -> Result<()> {
        if self.aliases.is_empty() && self.rows.is_empty() {
            self.aliases = vec![HashMap::new(); row.len()];
            self.next_alias = vec![0.0; row.len()];
        }
        if row.len() != self.num_cols() {
            return Err(Error::Table(format!("cannot add a row of {} cells to a \
                                             table with {} columns",
                                            row.len(),
                                            self.num_cols())));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn raw_row(&self, row: usize) -> Result<&[String]> {
        match self.rows.get(row) {
            Some(cells) => Ok(cells),
            None => Err(Error::Table(format!("row {} is out of bounds, the table \
                                              has {} rows",
                                             row,
                                             self.num_rows()))),
        }
    }

    pub fn raw_column(&self, col: usize) -> Result<Vec<&str>> {
        self.check_column(col)?;
        Ok(self.rows.iter().map(|row| row[col].as_str()).collect())
    }

    /// Returns row `row` converted to numbers, assigning aliases to any
    /// non-numeric cells.
    pub fn numeric_row(&mut self, row: usize) -> Result<Vec<f64>> {
        let cells = self.raw_row(row)?.to_vec();
        Ok(cells.iter()
            .enumerate()
            .map(|(col, cell)| self.numeric_value(col, cell))
            .collect())
    }

    /// Returns column `col` converted to numbers, assigning aliases to any
    /// non-numeric cells.
    pub fn numeric_column(&mut self, col: usize) -> Result<Vec<f64>> {
        self.check_column(col)?;
        let mut values = Vec::with_capacity(self.rows.len());
        for row in 0..self.rows.len() {
            let cell = self.rows[row][col].clone();
            values.push(self.numeric_value(col, &cell));
        }
        Ok(values)
    }

    pub fn numeric_column_by_name(&mut self, name: &str) -> Result<Vec<f64>> {
        match self.column_index(name) {
            Some(col) => self.numeric_column(col),
            None => Err(Error::Table(format!("no column named {:?}", name))),
        }
    }

    /// Aliases `value` in column `col` to `alias`, replacing any existing
    /// alias.
    pub fn set_alias(&mut self, value: &str, alias: f64, col: usize) -> Result<()> {
        self.check_column(col)?;
        self.aliases[col].insert(value.to_string(), alias);
        Ok(())
    }

    /// Returns the alias of `value` in column `col`, if one has been assigned.
    pub fn alias(&self, value: &str, col: usize) -> Option<f64> {
        self.aliases.get(col).and_then(|aliases| aliases.get(value).cloned())
    }

    fn check_column(&self, col: usize) -> Result<()> {
        if col < self.num_cols() {
            Ok(())
        } else {
            Err(Error::Table(format!("column {} is out of bounds, the table has \
                                      {} columns",
                                     col,
                                     self.num_cols())))
        }
    }

    fn numeric_value(&mut self, col: usize, cell: &str) -> f64 {
        if let Some(&alias) = self.aliases[col].get(cell) {
            return alias;
        }
        if let Ok(value) = cell.parse::<f64>() {
            return value;
        }
        let alias = self.next_alias[col];
        self.next_alias[col] += 1.0;
        self.aliases[col].insert(cell.to_string(), alias);
        alias
    }
}

/// Returns the raw fields of a record, less the empty field left by a trailing
/// comma.
fn fields(record: &StringRecord) -> Vec<&str> {
    let mut fields: Vec<&str> = record.iter().collect();
    if fields.len() > 1 && fields.last() == Some(&"") {
        fields.pop();
    }
    fields
}

/// Drops any double quotes left in a field and trims it.
fn clean(field: &str) -> String {
    field.replace('"', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOURS: &str = "size, \"colour\",,weight\n\
                           1.5, red, a, 10\n\
                           2.5, blue, b, 20\n\
                           \n\
                           3.0, ?, c, 30\n\
                           4.0, red, b, 40\n";

    #[test]
    fn reads_header_and_rows() {
        let table = DataTable::parse(COLOURS, true).unwrap();
        assert_eq!(table.column_names(),
                   &["size", "colour", BLANK_COLUMN, "weight"]);
        assert_eq!(table.num_cols(), 4);
        // The blank line and the row with a missing value are skipped.
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.raw_row(1).unwrap(), &["2.5", "blue", "b", "20"]);
        assert_eq!(table.raw_column(3).unwrap(), vec!["10", "20", "40"]);
        assert_eq!(table.column_index("weight"), Some(3));
        assert_eq!(table.column_index("height"), None);
    }

    #[test]
    fn reads_without_header() {
        let table = DataTable::parse("1,2\n3,4\n", false).unwrap();
        assert!(table.column_names().is_empty());
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_cols(), 2);
    }

    #[test]
    fn quoted_fields_keep_their_commas() {
        let table = DataTable::parse("name,y\n\"Smith, John\",5\n", true).unwrap();
        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.raw_row(0).unwrap(), &["Smith, John", "5"]);
    }

    #[test]
    fn trailing_commas_and_blank_names() {
        let table = DataTable::parse("a, ,,b,\n1,2,3,4,\n", true).unwrap();
        assert_eq!(table.column_names(), &["a", "", BLANK_COLUMN, "b"]);
        assert_eq!(table.num_cols(), 4);
        assert_eq!(table.raw_row(0).unwrap(), &["1", "2", "3", "4"]);

        let table = DataTable::parse("x,\n,\n", false).unwrap();
        assert_eq!(table.num_cols(), 1);
        assert_eq!(table.raw_column(0).unwrap(), vec!["x", ""]);
    }

    #[test]
    fn inconsistent_rows_are_rejected() {
        match DataTable::parse("a,b\n1,2\n3\n", true) {
            Err(Error::Table(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_numeric_cells_are_aliased_per_column() {
        let mut table = DataTable::parse(COLOURS, true).unwrap();
        assert_eq!(table.numeric_column(0).unwrap(), vec![1.5, 2.5, 4.0]);
        assert_eq!(table.numeric_column(1).unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(table.numeric_column(2).unwrap(), vec![0.0, 1.0, 1.0]);
        // Aliases are remembered between calls.
        assert_eq!(table.numeric_column_by_name("colour").unwrap(),
                   vec![0.0, 1.0, 0.0]);
        assert_eq!(table.alias("blue", 1), Some(1.0));
        assert_eq!(table.alias("blue", 2), None);
        assert_eq!(table.numeric_row(2).unwrap(), vec![4.0, 0.0, 1.0, 40.0]);
    }

    #[test]
    fn explicit_aliases_take_precedence() {
        let mut table = DataTable::parse(COLOURS, true).unwrap();
        table.set_alias("red", 7.0, 1).unwrap();
        table.set_alias("40", -1.0, 3).unwrap();
        assert_eq!(table.numeric_column(1).unwrap(), vec![7.0, 0.0, 7.0]);
        assert_eq!(table.numeric_column(3).unwrap(), vec![10.0, 20.0, -1.0]);
        table.set_alias("blue", 3.0, 1).unwrap();
        assert_eq!(table.numeric_column(1).unwrap(), vec![7.0, 3.0, 7.0]);
        assert!(table.set_alias("red", 1.0, 9).is_err());
    }

    #[test]
    fn lookups_are_bounds_checked() {
        let mut table = DataTable::parse(COLOURS, true).unwrap();
        assert!(table.raw_row(3).is_err());
        assert!(table.raw_column(4).is_err());
        assert!(table.numeric_column(4).is_err());
        match table.numeric_column_by_name("height") {
            Err(Error::Table(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rows_can_be_added() {
        let mut table = DataTable::default();
        table.add_row(vec!["1".to_string(), "x".to_string()]).unwrap();
        table.add_row(vec!["2".to_string(), "y".to_string()]).unwrap();
        assert!(table.add_row(vec!["3".to_string()]).is_err());
        assert_eq!(table.numeric_column(1).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("nnfit-no-such-table.csv");
        match DataTable::read_from_file(&path, true) {
            Err(Error::Io(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
