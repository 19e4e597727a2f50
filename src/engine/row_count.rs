use std::fmt;

/// Total number of data rows (header excluded), as far as it is known.
///
/// The count only ever grows. It becomes `Known` exactly once, the first time
/// the end of the file is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCountState {
    Known(usize),
    LowerBound(usize),
}

impl Default for RowCountState {
    fn default() -> Self {
        RowCountState::LowerBound(0)
    }
}

impl RowCountState {
    pub fn value(&self) -> usize {
        match *self {
            RowCountState::Known(n) | RowCountState::LowerBound(n) => n,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, RowCountState::Known(_))
    }

    /// Record that at least `rows` data rows exist.
    pub fn raise(&mut self, rows: usize) {
        if let RowCountState::LowerBound(n) = self {
            *n = (*n).max(rows);
        }
    }

    /// Record that the end of the file was reached after `rows` data rows.
    ///
    /// Returns true on the `LowerBound -> Known` transition; later calls are ignored.
    pub fn finalize(&mut self, rows: usize) -> bool {
        match *self {
            RowCountState::Known(_) => false,
            RowCountState::LowerBound(n) => {
                *self = RowCountState::Known(n.max(rows));
                true
            }
        }
    }
}

impl fmt::Display for RowCountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCountState::Known(n) => write!(f, "{n}"),
            RowCountState::LowerBound(n) => write!(f, "{n}+"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_monotonic() {
        let mut rows = RowCountState::default();
        rows.raise(10);
        rows.raise(4);
        assert_eq!(rows, RowCountState::LowerBound(10));
    }

    #[test]
    fn test_finalize_once() {
        let mut rows = RowCountState::LowerBound(10);
        assert!(rows.finalize(12));
        assert_eq!(rows, RowCountState::Known(12));
        assert!(!rows.finalize(20));
        rows.raise(30);
        assert_eq!(rows, RowCountState::Known(12));
    }

    #[test]
    fn test_finalize_never_decreases() {
        let mut rows = RowCountState::LowerBound(10);
        rows.finalize(3);
        assert_eq!(rows.value(), 10);
        assert!(rows.is_known());
    }

    #[test]
    fn test_display() {
        assert_eq!(RowCountState::Known(5).to_string(), "5");
        assert_eq!(RowCountState::LowerBound(512).to_string(), "512+");
    }
}
