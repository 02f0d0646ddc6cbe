use std::fmt;

/// Build configuration that is accepted by [`Function`](crate::Function) constructors.
///
/// Keys are laid out in a virtual `t × t` matrix, where `t` is [`row_len`](BuildConf::row_len):
/// the key `k` occupies the cell `(k / t, k % t)`. Every key must satisfy `k < t*t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildConf {
    /// The number of rows and columns of the key matrix, *t*.
    pub(crate) row_len: usize,

    /// The upper bound on the size of the table into which the rows are displaced.
    ///
    /// The row displacements are searched in `0..capacity-t-1`.
    pub(crate) capacity: usize,
}

/// Error returned when [`BuildConf`] cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfError {
    /// `t` equals `0`, so no key can be decomposed.
    ZeroRowLen,
    /// `t*t` exceeds the range of 64-bit keys.
    RowLenTooLarge(usize),
}

impl fmt::Display for ConfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfError::ZeroRowLen => write!(f, "t must be positive"),
            ConfError::RowLenTooLarge(t) => write!(f, "t={} is too large, t*t must fit in 64 bits", t),
        }
    }
}

impl std::error::Error for ConfError {}

impl BuildConf {
    /// Returns configuration with given `row_len` (*t*) and table `capacity`.
    pub fn new(row_len: usize, capacity: usize) -> Result<Self, ConfError> {
        if row_len == 0 { return Err(ConfError::ZeroRowLen); }
        let t = u64::try_from(row_len).map_err(|_| ConfError::RowLenTooLarge(row_len))?;
        if t.checked_mul(t).is_none() { return Err(ConfError::RowLenTooLarge(row_len)); }
        Ok(Self { row_len, capacity })
    }

    /// Returns configuration with given `row_len` (*t*) and the capacity
    /// large enough to place every row without failing, i.e. `t*t + t + 1`.
    pub fn sufficient(row_len: usize) -> Result<Self, ConfError> {
        let capacity = row_len.checked_mul(row_len)
            .and_then(|c| c.checked_add(row_len + 1))
            .ok_or(ConfError::RowLenTooLarge(row_len))?;
        Self::new(row_len, capacity)
    }

    /// Returns *t*, the number of rows and columns of the key matrix.
    #[inline] pub fn row_len(&self) -> usize { self.row_len }

    /// Returns the upper bound on the table size.
    #[inline] pub fn capacity(&self) -> usize { self.capacity }

    /// Returns the (exclusive) end of the range of row displacements tried by the packer.
    #[inline] pub fn offsets_end(&self) -> usize {
        self.capacity.saturating_sub(self.row_len + 1)
    }

    /// Returns the (row, column) cell of `key`, or `None` if the key does not fit in the matrix.
    #[inline] pub fn cell_of(&self, key: u64) -> Option<(usize, usize)> {
        let t = self.row_len as u64;
        let row = key / t;
        (row < t).then(|| (row as usize, (key % t) as usize))
    }
}
