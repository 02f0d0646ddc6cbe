use std::io;

use binout::{AsIs, Serializer, VByte};
use bitm::{BitAccess, BitVec, ceiling_div};
use dyn_size_of::GetSize;
use log::info;

use crate::{BuildConf, BuildError, KeyMatrix, Packer, Report, RowOrder, Summary, stats::BuildStatsCollector};

/// Perfect hash function of a static set of integer keys, built with the first-fit decreasing method.
///
/// The key `k` is stored in the table at index `displacement(k / t) + k % t`,
/// so a lookup takes constant time and involves no collision handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    row_len: usize,
    len: usize,
    displacements: Box<[Option<usize>]>,
    cells: Box<[Option<u64>]>,
}

impl GetSize for Function {
    fn size_bytes_dyn(&self) -> usize {
        std::mem::size_of_val(&self.displacements[..]) + std::mem::size_of_val(&self.cells[..])
    }
    fn size_bytes_content_dyn(&self) -> usize { self.size_bytes_dyn() }
    const USES_DYN_MEM: bool = true;
}

impl Function {
    /// Builds [`Function`] for given `keys`, using the build configuration `conf`
    /// and reporting construction events to `stats`.
    ///
    /// Duplicate keys are discarded.
    /// Fails if some key does not fit in the `t × t` matrix
    /// or some row cannot be displaced within the capacity given by `conf`.
    pub fn try_with_conf_stats<I, BS>(keys: I, conf: BuildConf, stats: &mut BS) -> Result<Self, BuildError>
        where I: IntoIterator<Item = u64>, BS: BuildStatsCollector
    {
        let matrix = KeyMatrix::from_keys(keys, conf)?;
        stats.ingested(matrix.len(), matrix.duplicates());
        let order = RowOrder::new(&matrix);
        let mut packer = Packer::new(conf);
        packer.pack(&matrix, &order, stats)?;
        stats.end(packer.extent());
        let (displacements, cells) = packer.finish();
        let result = Self { row_len: conf.row_len(), len: matrix.len(), displacements, cells };
        info!("built table of size {} for {} keys with t={}", result.extent(), result.len, result.row_len);
        Ok(result)
    }

    /// Builds [`Function`] for given `keys`, using the build configuration `conf`.
    pub fn try_with_conf<I: IntoIterator<Item = u64>>(keys: I, conf: BuildConf) -> Result<Self, BuildError> {
        Self::try_with_conf_stats(keys, conf, &mut ())
    }

    /// Returns the table index of `key`, or `None` if `key` is not in the input set.
    #[inline]
    pub fn get(&self, key: u64) -> Option<usize> {
        let t = self.row_len as u64;
        let row = key / t;
        if row >= t { return None; }
        let index = (*self.displacements.get(row as usize)?)?.checked_add((key % t) as usize)?;
        (*self.cells.get(index)? == Some(key)).then_some(index)
    }

    /// Returns `true` if `key` is in the input set.
    #[inline] pub fn contains(&self, key: u64) -> bool { self.get(key).is_some() }

    /// Returns *t*, the number of rows and columns of the key matrix.
    #[inline] pub fn row_len(&self) -> usize { self.row_len }

    /// Returns the number of keys stored.
    #[inline] pub fn len(&self) -> usize { self.len }

    /// Returns `true` if no key is stored.
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Returns the table size, one plus the highest occupied index.
    #[inline] pub fn extent(&self) -> usize { self.cells.len() }

    /// Returns the displacement of `row`, `None` for rows that hold no keys.
    #[inline] pub fn displacement(&self, row: usize) -> Option<usize> {
        self.displacements.get(row).copied().flatten()
    }

    /// Returns displacements of all *t* rows.
    #[inline] pub fn displacements(&self) -> &[Option<usize>] { &self.displacements }

    /// Returns the table cells up to the extent.
    #[inline] pub fn table(&self) -> &[Option<u64>] { &self.cells }

    /// Returns *t*, the number of keys, the table extent and its utilization.
    pub fn summary(&self) -> Summary {
        Summary::new(self.row_len, self.len, self.extent())
    }

    /// Returns verbose report which can be displayed.
    pub fn report(&self) -> Report<'_> { Report(self) }

    fn encoded_displacements(&self) -> Box<[u64]> {
        self.displacements.iter().map(|d| d.map_or(0, |d| d as u64 + 1)).collect()
    }

    fn occupancy_bitmap(&self) -> Box<[u64]> {
        let mut bitmap = Box::<[u64]>::with_zeroed_bits(self.cells.len());
        for (index, _) in self.cells.iter().enumerate().filter(|(_, c)| c.is_some()) {
            bitmap.set_bit(index);
        }
        bitmap
    }

    fn keys(&self) -> Vec<u64> {
        self.cells.iter().filter_map(|c| *c).collect()
    }

    /// Returns number of bytes which `write` will write.
    pub fn write_bytes(&self) -> usize {
        VByte::size(self.row_len) + VByte::size(self.cells.len())
            + VByte::array_size(&self.encoded_displacements())
            + AsIs::array_content_size(&self.occupancy_bitmap())
            + AsIs::array_content_size(&self.keys())
    }

    /// Writes `self` to the `output`.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        VByte::write(output, self.row_len)?;
        VByte::write(output, self.cells.len())?;
        VByte::write_array(output, &self.encoded_displacements())?;
        AsIs::write_all(output, self.occupancy_bitmap().iter())?;
        AsIs::write_all(output, self.keys().iter())
    }

    /// Reads `Self` from the `input`.
    ///
    /// Checks that every key read is placed where its row displacement says,
    /// that only rows holding keys have displacements, and that the extent is exact.
    pub fn read(input: &mut dyn io::Read) -> io::Result<Self> {
        let row_len: usize = VByte::read(input)?;
        let extent: usize = VByte::read(input)?;
        let conf = BuildConf::new(row_len, extent).map_err(invalid_data)?;
        let encoded: Box<[u64]> = VByte::read_array(input)?;
        if encoded.len() != row_len {
            return Err(invalid_data("number of displacements differs from t"));
        }
        let displacements = encoded.iter()
            .map(|d| match d.checked_sub(1) {
                None => Ok(None),
                Some(d) => usize::try_from(d).ok()
                    .filter(|d| d.checked_add(row_len - 1).is_some())
                    .map(Some)
                    .ok_or_else(|| invalid_data(format!("displacement {} is too large", d))),
            })
            .collect::<io::Result<Box<[Option<usize>]>>>()?;
        // a truncated stream must fail before `extent` cells are allocated
        let mut bitmap: Vec<u64> = Vec::new();
        for _ in 0..ceiling_div(extent, 64) {
            bitmap.push(AsIs::read(input)?);
        }
        let bitmap = bitmap.into_boxed_slice();
        if (extent..bitmap.len() * 64).any(|i| bitmap.get_bit(i)) {
            return Err(invalid_data("occupied cell beyond the table extent"));
        }
        let len: usize = bitmap.iter().map(|w: &u64| w.count_ones() as usize).sum();
        let keys: Box<[u64]> = AsIs::read_n(input, len)?;
        let mut cells = vec![None; extent].into_boxed_slice();
        let mut placed_rows = Box::<[u64]>::with_zeroed_bits(row_len);
        for (index, &key) in (0..extent).filter(|i| bitmap.get_bit(*i)).zip(keys.iter()) {
            let (row, column) = conf.cell_of(key).ok_or_else(|| invalid_data(BuildError::KeyOutOfRange { key }))?;
            if displacements[row].map(|d| d + column) != Some(index) {
                return Err(invalid_data(format!("key {} is misplaced", key)));
            }
            placed_rows.set_bit(row);
            cells[index] = Some(key);
        }
        if cells.last() == Some(&None) {
            return Err(invalid_data("table extent exceeds the highest occupied index"));
        }
        if let Some(row) = (0..row_len).find(|r| displacements[*r].is_some() && !placed_rows.get_bit(*r)) {
            return Err(invalid_data(format!("row {} has displacement but no keys", row)));
        }
        Ok(Self { row_len, len, displacements, cells })
    }
}

fn invalid_data<E>(err: E) -> io::Error
where E: Into<Box<dyn std::error::Error + Send + Sync>> {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::stats::BuildStatsPrinter;

    /// Checks that `f` places each of `keys` at its row displacement plus column, without collisions.
    pub fn test_function(keys: &[u64], f: &Function) {
        let t = f.row_len() as u64;
        let mut seen = Box::<[u64]>::with_zeroed_bits(f.extent());
        for &key in keys {
            let index = f.get(key);
            assert!(index.is_some(), "function does not contain the key {} which is in the input", key);
            let index = index.unwrap();
            assert_eq!(Some(index), f.displacement((key / t) as usize).map(|d| d + (key % t) as usize));
            assert!(index < f.extent(), "key {} placed at {} beyond extent {}", key, index, f.extent());
            assert_eq!(f.table()[index], Some(key));
            assert!(!seen.get_bit(index), "function assigns {} to {} and some other key included in the input", index, key);
            seen.set_bit(index);
        }
        assert!(f.extent() >= f.len());
        assert_eq!(f.len(), seen.iter().map(|w| w.count_ones() as usize).sum::<usize>());
    }

    fn test_read_write(f: &Function) {
        let mut buff = Vec::new();
        f.write(&mut buff).unwrap();
        assert_eq!(buff.len(), f.write_bytes());
        let read = Function::read(&mut &buff[..]).unwrap();
        assert_eq!(f, &read);
    }

    fn test_with_input(keys: &[u64], conf: BuildConf) -> Function {
        let f = Function::try_with_conf(keys.iter().copied(), conf).unwrap();
        test_function(keys, &f);
        test_read_write(&f);
        f
    }

    #[test]
    fn single_key() {
        let f = test_with_input(&[5], BuildConf::new(3, 1000).unwrap());
        assert_eq!(f.displacement(1), Some(0));
        assert_eq!(f.displacement(0), None);
        assert_eq!(f.table(), &[None, None, Some(5)]);
        let s = f.summary();
        assert_eq!((s.row_len, s.keys, s.extent), (3, 1, 3));
        assert!((s.utilization - 100.0 / 3.0).abs() < 1e-9);
        assert!(!f.contains(2));
        assert!(!f.contains(8));
        assert!(!f.contains(9));
    }

    #[test]
    fn key_out_of_range() {
        assert_eq!(Function::try_with_conf([100], BuildConf::new(5, 1000).unwrap()),
                   Err(BuildError::KeyOutOfRange { key: 100 }));
    }

    #[test]
    fn capacity_exceeded() {
        assert_eq!(Function::try_with_conf(0..100, BuildConf::new(10, 50).unwrap()),
                   Err(BuildError::CapacityExceeded { row: 4 }));
    }

    #[test]
    fn small() {
        test_with_input(&[1, 2, 5], BuildConf::sufficient(3).unwrap());
        test_with_input(&(0..100).collect::<Vec<_>>(), BuildConf::sufficient(10).unwrap());
        test_with_input(&(0..1000).step_by(7).collect::<Vec<_>>(), BuildConf::sufficient(32).unwrap());
        test_with_input(&[17, 138, 173, 294, 306, 472, 540, 551, 618, 650, 728], BuildConf::new(30, 1000).unwrap());
    }

    #[test]
    fn empty() {
        let f = test_with_input(&[], BuildConf::sufficient(4).unwrap());
        assert!(f.is_empty());
        assert_eq!(f.extent(), 0);
        assert!(f.summary().utilization.is_nan());
        assert!(!f.contains(0));
    }

    #[test]
    fn duplicates() {
        let f = Function::try_with_conf([7, 3, 7, 7], BuildConf::sufficient(3).unwrap()).unwrap();
        test_function(&[3, 7], &f);
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn deterministic() {
        let keys: Vec<u64> = (0..5000u64).map(|k| k.wrapping_mul(2654435761) % 10_000).collect();
        let conf = BuildConf::sufficient(100).unwrap();
        let a = Function::try_with_conf(keys.iter().copied(), conf).unwrap();
        let b = Function::try_with_conf(keys.iter().rev().copied(), conf).unwrap();
        assert_eq!(a, b);
        test_function(&keys, &a);
    }

    #[test]
    fn stats() {
        let mut printer = BuildStatsPrinter::new(Vec::new());
        Function::try_with_conf_stats([5, 4, 1], BuildConf::new(3, 1000).unwrap(), &mut printer).unwrap();
        assert_eq!(String::from_utf8(printer.into_inner().unwrap()).unwrap(), "keys 3 duplicates 0\nrow 1 2 0\nrow 0 1 2\nextent 4\n");
    }

    #[test]
    fn report() {
        let f = Function::try_with_conf([5], BuildConf::new(3, 1000).unwrap()).unwrap();
        assert_eq!(f.report().to_string(),
            "t value          : 3\nNumber of keys   : 1\nHash table size  : 3\nTable utilization: 33.333333%\n\
             \nrow displacements\nrow offset\n 0    -\n 1    0\n 2    -\n\nhash table\n-\n-\n5\n");
    }

    #[test]
    fn read_rejects_misplaced_key() {
        let f = Function::try_with_conf([5], BuildConf::new(3, 1000).unwrap()).unwrap();
        let mut buff = Vec::new();
        f.write(&mut buff).unwrap();
        *buff.last_mut().unwrap() ^= 1;
        assert_eq!(Function::read(&mut &buff[..]).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    fn stream(row_len: usize, extent: usize, displacements: &[u64], bitmap: &[u64], keys: &[u64]) -> Vec<u8> {
        let mut buff = Vec::new();
        VByte::write(&mut buff, row_len).unwrap();
        VByte::write(&mut buff, extent).unwrap();
        VByte::write_array(&mut buff, displacements).unwrap();
        AsIs::write_all(&mut buff, bitmap.iter()).unwrap();
        AsIs::write_all(&mut buff, keys.iter()).unwrap();
        buff
    }

    fn read_error(buff: &[u8]) -> io::ErrorKind {
        Function::read(&mut &buff[..]).unwrap_err().kind()
    }

    #[test]
    fn read_hand_written() {
        let f = Function::read(&mut &stream(3, 3, &[0, 1, 0], &[0b100], &[5])[..]).unwrap();
        assert_eq!(f, Function::try_with_conf([5], BuildConf::new(3, 1000).unwrap()).unwrap());
    }

    #[test]
    fn read_rejects_cells_beyond_extent() {
        assert_eq!(read_error(&stream(1, 1, &[1], &[0b11], &[0, 99])), io::ErrorKind::InvalidData);
        assert_eq!(read_error(&stream(1, 1, &[0], &[0], &[])), io::ErrorKind::InvalidData);
        assert_eq!(read_error(&stream(3, 4, &[0, 1, 0], &[0b100], &[5])), io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_rejects_unused_displacements() {
        assert_eq!(read_error(&stream(3, 1, &[1, u64::MAX, 0], &[0b1], &[0])), io::ErrorKind::InvalidData);
        assert_eq!(read_error(&stream(3, 1, &[1, 5, 0], &[0b1], &[0])), io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_rejects_truncated_bitmap() {
        let mut buff = Vec::new();
        VByte::write(&mut buff, 3usize).unwrap();
        VByte::write(&mut buff, 1usize << 60).unwrap();
        VByte::write_array(&mut buff, &[0u64, 1, 0]).unwrap();
        AsIs::write(&mut buff, 0b100u64).unwrap();
        assert!(Function::read(&mut &buff[..]).is_err());
    }

    #[test]
    fn size() {
        let f = Function::try_with_conf(0..100, BuildConf::sufficient(10).unwrap()).unwrap();
        assert!(f.size_bytes() >= std::mem::size_of::<Function>() + 100 * std::mem::size_of::<Option<u64>>());
    }
}
