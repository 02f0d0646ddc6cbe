use std::io::Write;

/// Trait for collecting (and summarizing or reporting) events during construction of [`Function`](crate::Function).
pub trait BuildStatsCollector {
    /// Called once all keys are in the matrix: `keys` distinct keys, `duplicates` repeated ones discarded.
    #[inline(always)] fn ingested(&mut self, _keys: usize, _duplicates: usize) {}

    /// Called after `row` holding `occupancy` keys has been committed at `offset`.
    #[inline(always)] fn row(&mut self, _row: usize, _occupancy: usize, _offset: usize) {}

    /// Called when the construction succeeds, with the resulting table extent.
    #[inline(always)] fn end(&mut self, _extent: usize) {}
}

impl BuildStatsCollector for () {}

/// Counts committed rows.
impl BuildStatsCollector for usize {
    #[inline(always)] fn row(&mut self, _row: usize, _occupancy: usize, _offset: usize) { *self += 1; }
}

/// Writes one line per construction event to the given writer.
///
/// The first write error is kept and stops further writing.
pub struct BuildStatsPrinter<W: Write = std::io::Stdout> {
    writer: W,
    error: Option<std::io::Error>,
}

impl BuildStatsPrinter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> BuildStatsPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, error: None }
    }

    /// Returns the writer, or the first error that occurred while writing to it.
    pub fn into_inner(self) -> std::io::Result<W> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.writer),
        }
    }

    fn print(&mut self, line: std::fmt::Arguments<'_>) {
        if self.error.is_none() {
            self.error = writeln!(self.writer, "{}", line).err();
        }
    }
}

impl<W: Write> BuildStatsCollector for BuildStatsPrinter<W> {
    fn ingested(&mut self, keys: usize, duplicates: usize) {
        self.print(format_args!("keys {} duplicates {}", keys, duplicates));
    }

    fn row(&mut self, row: usize, occupancy: usize, offset: usize) {
        self.print(format_args!("row {} {} {}", row, occupancy, offset));
    }

    fn end(&mut self, extent: usize) {
        self.print(format_args!("extent {}", extent));
    }
}
