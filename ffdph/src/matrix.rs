use log::warn;

use crate::{BuildConf, BuildError};

/// Virtual `t × t` matrix of keys.
///
/// The key `k` occupies the cell `(k / t, k % t)`.
/// Only occupied cells are stored: each row keeps its keys in ascending order,
/// so the columns of a row are ascending as well.
pub struct KeyMatrix {
    conf: BuildConf,
    rows: Box<[Vec<u64>]>,
    len: usize,
    duplicates: usize,
}

impl KeyMatrix {
    /// Returns empty matrix of the size given by `conf`.
    pub fn new(conf: BuildConf) -> Self {
        Self {
            conf,
            rows: vec![Vec::new(); conf.row_len()].into_boxed_slice(),
            len: 0,
            duplicates: 0,
        }
    }

    /// Builds matrix that contains the given `keys`.
    pub fn from_keys<I: IntoIterator<Item = u64>>(keys: I, conf: BuildConf) -> Result<Self, BuildError> {
        let mut result = Self::new(conf);
        result.ingest(keys)?;
        Ok(result)
    }

    /// Puts the given `keys` into the matrix and returns the total number of distinct keys it contains.
    ///
    /// Stops at the first key whose row is not less than *t* and returns
    /// [`BuildError::KeyOutOfRange`]. The keys preceding it stay in the matrix
    /// and [`len`](Self::len) reports how many of them were ingested.
    ///
    /// A key that is already present is discarded and counted by [`duplicates`](Self::duplicates).
    pub fn ingest<I: IntoIterator<Item = u64>>(&mut self, keys: I) -> Result<usize, BuildError> {
        let result = keys.into_iter().try_for_each(|key| self.push(key));
        self.remove_duplicates();
        result.map(|()| self.len)
    }

    fn push(&mut self, key: u64) -> Result<(), BuildError> {
        let (row, _) = self.conf.cell_of(key).ok_or(BuildError::KeyOutOfRange { key })?;
        self.rows[row].push(key);
        self.len += 1;
        Ok(())
    }

    fn remove_duplicates(&mut self) {
        let mut removed = 0;
        for row in self.rows.iter_mut() {
            let before = row.len();
            row.sort_unstable();
            row.dedup();
            removed += before - row.len();
        }
        if removed != 0 {
            warn!("discarded {} duplicate key(s)", removed);
            self.len -= removed;
            self.duplicates += removed;
        }
    }

    /// Returns configuration of `self`.
    #[inline] pub fn conf(&self) -> &BuildConf { &self.conf }

    /// Returns *t*, the number of rows (and columns).
    #[inline] pub fn row_len(&self) -> usize { self.rows.len() }

    /// Returns the number of distinct keys in the matrix.
    #[inline] pub fn len(&self) -> usize { self.len }

    /// Returns `true` if the matrix contains no keys.
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Returns the number of discarded duplicate keys.
    #[inline] pub fn duplicates(&self) -> usize { self.duplicates }

    /// Returns the number of occupied cells in the given `row`.
    #[inline] pub fn occupancy(&self, row: usize) -> usize { self.rows[row].len() }

    /// Returns keys in the given `row`, in ascending order.
    #[inline] pub fn row(&self, row: usize) -> &[u64] { &self.rows[row] }

    /// Returns the occupied columns of the given `row`, in ascending order.
    pub fn columns(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        let t = self.row_len() as u64;
        self.rows[row].iter().map(move |k| (k % t) as usize)
    }

    /// Returns the key stored in the cell `(row, column)`, if any.
    pub fn get(&self, row: usize, column: usize) -> Option<u64> {
        if column >= self.row_len() { return None; }
        let keys = self.rows.get(row)?;
        let key = (row * self.row_len() + column) as u64;
        keys.binary_search(&key).ok().map(|_| key)
    }
}
