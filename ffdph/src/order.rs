use crate::KeyMatrix;

/// Index of a matrix row paired with the number of keys it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowDescriptor {
    pub row: usize,
    pub occupancy: usize,
}

/// All rows of a [`KeyMatrix`] ordered by descending occupancy.
///
/// Rows with equal occupancy are ordered by ascending index.
/// Empty rows come last.
pub struct RowOrder(Box<[RowDescriptor]>);

impl RowOrder {
    pub fn new(matrix: &KeyMatrix) -> Self {
        let mut rows: Box<[_]> = (0..matrix.row_len())
            .map(|row| RowDescriptor { row, occupancy: matrix.occupancy(row) })
            .collect();
        rows.sort_by(|a, b| b.occupancy.cmp(&a.occupancy)); // stable, keeps ascending row indices among ties
        Self(rows)
    }

    /// Returns descriptors of all rows, including the empty ones.
    #[inline] pub fn rows(&self) -> &[RowDescriptor] { &self.0 }

    /// Returns descriptors of the rows that hold at least one key.
    pub fn non_empty(&self) -> impl Iterator<Item = &RowDescriptor> + '_ {
        self.0.iter().take_while(|d| d.occupancy > 0)
    }
}
