use std::fmt::{self, Display, Formatter};

use crate::Function;

/// Size and utilization of the table built by [`Function`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    /// *t*, the number of rows and columns of the key matrix
    pub row_len: usize,
    /// number of distinct keys
    pub keys: usize,
    /// one plus the highest occupied table index
    pub extent: usize,
    /// `100 * keys / extent`, `NaN` for an empty table
    pub utilization: f64,
}

impl Summary {
    pub fn new(row_len: usize, keys: usize, extent: usize) -> Self {
        let utilization = if extent == 0 { f64::NAN } else { 100.0 * keys as f64 / extent as f64 };
        Self { row_len, keys, extent, utilization }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "t value          : {}", self.row_len)?;
        writeln!(f, "Number of keys   : {}", self.keys)?;
        writeln!(f, "Hash table size  : {}", self.extent)?;
        if self.utilization.is_nan() {
            write!(f, "Table utilization: unknown")
        } else {
            write!(f, "Table utilization: {:.6}%", self.utilization)
        }
    }
}

/// Verbose report of [`Function`]: summary, displacement of each row and the whole table.
///
/// Rows that hold no keys and empty table cells are shown as `-`.
pub struct Report<'f>(pub(crate) &'f Function);

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.0.summary())?;
        writeln!(f, "\nrow displacements")?;
        writeln!(f, "row offset")?;
        for (row, d) in self.0.displacements().iter().enumerate() {
            match d {
                Some(d) => writeln!(f, "{:2}  {:3}", row, d)?,
                None => writeln!(f, "{:2}  {:>3}", row, '-')?,
            }
        }
        writeln!(f, "\nhash table")?;
        for cell in self.0.table() {
            match cell {
                Some(key) => writeln!(f, "{}", key)?,
                None => writeln!(f, "-")?,
            }
        }
        Ok(())
    }
}
