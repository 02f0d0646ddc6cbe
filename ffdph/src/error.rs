use std::fmt;

/// The reasons for which the construction of [`Function`](crate::Function) can fail.
///
/// Both are unrecoverable within a single run.
/// The construction must be repeated with larger *t* and/or capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// The row of `key` (`key / t`) is not less than *t*.
    KeyOutOfRange { key: u64 },
    /// No collision-free displacement of `row` exists below the capacity bound.
    CapacityExceeded { row: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::KeyOutOfRange { key } =>
                write!(f, "key {} is out of range, t*t must exceed the maximum key", key),
            BuildError::CapacityExceeded { row } =>
                write!(f, "failed to fit row {} into the hash table, try increasing the hash table size", row),
        }
    }
}

impl std::error::Error for BuildError {}
