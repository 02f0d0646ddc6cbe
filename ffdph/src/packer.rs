use bitm::{BitAccess, ceiling_div};
use log::debug;

use crate::{BuildConf, BuildError, KeyMatrix, RowOrder, stats::BuildStatsCollector};

/// Greedily displaces matrix rows into a shared one-dimensional table.
///
/// Each row is placed at the lowest offset at which none of its keys
/// lands on a table cell occupied by a previously placed row (first-fit).
/// The table grows on demand but never beyond the configured capacity.
pub struct Packer {
    conf: BuildConf,
    /// Bitmap of occupied table cells.
    used: Vec<u64>,
    cells: Vec<Option<u64>>,
    displacements: Box<[Option<usize>]>,
}

impl Packer {
    pub fn new(conf: BuildConf) -> Self {
        Self {
            conf,
            used: Vec::new(),
            cells: Vec::new(),
            displacements: vec![None; conf.row_len()].into_boxed_slice(),
        }
    }

    #[inline] fn is_used(&self, index: usize) -> bool {
        index < self.used.len() * 64 && self.used.get_bit(index)
    }

    /// Returns `true` if none of the given `columns` collides with the table when displaced by `offset`.
    #[inline] pub fn fits(&self, columns: &[usize], offset: usize) -> bool {
        columns.iter().all(|c| !self.is_used(offset + c))
    }

    /// Returns the lowest collision-free offset for the given `columns`,
    /// or `None` if there is no such offset below [`BuildConf::offsets_end`].
    pub fn first_fit(&self, columns: &[usize]) -> Option<usize> {
        (0..self.conf.offsets_end()).find(|offset| self.fits(columns, *offset))
    }

    /// Places the given `row` of `matrix` at the first collision-free offset and returns that offset.
    pub fn place(&mut self, matrix: &KeyMatrix, row: usize) -> Result<usize, BuildError> {
        let columns: Vec<usize> = matrix.columns(row).collect();
        let offset = self.first_fit(&columns).ok_or(BuildError::CapacityExceeded { row })?;
        self.commit(row, offset, matrix.row(row).iter().copied().zip(columns));
        Ok(offset)
    }

    fn commit(&mut self, row: usize, offset: usize, keys: impl Iterator<Item = (u64, usize)>) {
        for (key, column) in keys {
            let index = offset + column;
            if index >= self.cells.len() {
                self.cells.resize(index + 1, None);
                self.used.resize(ceiling_div(index + 1, 64), 0);
            }
            self.used.set_bit(index);
            self.cells[index] = Some(key);
        }
        self.displacements[row] = Some(offset);
    }

    /// Places all non-empty rows of `matrix` in the given `order`, reporting each of them to `stats`.
    ///
    /// Aborts with [`BuildError::CapacityExceeded`] at the first row that cannot be placed.
    pub fn pack<BS>(&mut self, matrix: &KeyMatrix, order: &RowOrder, stats: &mut BS) -> Result<(), BuildError>
        where BS: BuildStatsCollector
    {
        for d in order.non_empty() {
            let offset = self.place(matrix, d.row)?;
            debug!("row {} with {} key(s) displaced by {}", d.row, d.occupancy, offset);
            stats.row(d.row, d.occupancy, offset);
        }
        Ok(())
    }

    /// Returns the table size needed, one plus the highest occupied index.
    #[inline] pub fn extent(&self) -> usize { self.cells.len() }

    /// Returns displacements of the rows (`None` for rows not placed) and the table cells up to the extent.
    pub fn finish(self) -> (Box<[Option<usize>]>, Box<[Option<u64>]>) {
        (self.displacements, self.cells.into_boxed_slice())
    }
}
