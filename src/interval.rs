//! A 1-based, fully-closed interval on a circular sequence.
//!
//! Plastid genomes are circular, so an annotated region may run past the last
//! position of the sequence and continue at the first position. Such an
//! interval is represented with an end position that is _less_ than its start
//! position.
//!
//! ```text
//! ================ seq0 (n = 9) ========
//!
//! | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 |
//! -------------------------------------
//! |   |   | X | X | X | X | X |   |   |  <= 3..7
//! | X | X |   |   |   |   |   | X | X |  <= 8..2 (wraps)
//! ```

use std::num::ParseIntError;
use std::str::FromStr;

/// The delimiter between the start and end of a serialized interval.
pub const DELIMITER: &str = "..";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing an interval.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The delimiter was missing.
    MissingDelimiter(String),

    /// An invalid start position.
    InvalidStart(ParseIntError),

    /// An invalid end position.
    InvalidEnd(ParseIntError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingDelimiter(value) => {
                write!(f, "missing \"{DELIMITER}\" delimiter in \"{value}\"")
            }
            ParseError::InvalidStart(err) => write!(f, "invalid start position: {err}"),
            ParseError::InvalidEnd(err) => write!(f, "invalid end position: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to an [`Interval`].
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// A position of zero was provided (positions are 1-based).
    ZeroPosition,

    /// A position lies beyond the end of the sequence.
    OutOfBounds(usize, usize),

    /// A parse error.
    Parse(ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ZeroPosition => write!(f, "positions are 1-based and cannot be zero"),
            Error::OutOfBounds(position, length) => write!(
                f,
                "position {position} exceeds the sequence length ({length})"
            ),
            Error::Parse(err) => write!(f, "parse error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Interval
////////////////////////////////////////////////////////////////////////////////////////

/// A 1-based, fully-closed interval that may wrap around the origin of a
/// circular sequence.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Interval {
    /// The start position.
    start: usize,

    /// The end position.
    end: usize,
}

impl Interval {
    /// Attempts to create a new [`Interval`].
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::Interval;
    ///
    /// let interval = Interval::try_new(3, 7)?;
    /// assert_eq!(interval.start(), 3);
    /// assert_eq!(interval.end(), 7);
    /// assert!(!interval.wraps());
    ///
    /// assert!(Interval::try_new(0, 7).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(start: usize, end: usize) -> Result<Self> {
        if start == 0 || end == 0 {
            return Err(Error::ZeroPosition);
        }

        Ok(Self { start, end })
    }

    /// Gets the start position.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Gets the end position.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns whether the interval runs past the end of the sequence and
    /// continues at its first position.
    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    /// Gets the length of the interval on a sequence of `sequence_length`
    /// positions.
    ///
    /// A non-wrapping interval has length `end - start + 1`. A wrapping
    /// interval has length `(sequence_length - start) + end`, which is one
    /// less than the number of bases [`Interval::extract`] returns for it.
    /// The length is the one reported for an inverted repeat, so it need not
    /// match the length of the exported sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::Interval;
    ///
    /// assert_eq!(Interval::try_new(1, 25_000)?.len(160_000)?, 25_000);
    /// assert_eq!(Interval::try_new(150_000, 500)?.len(151_000)?, 1_500);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn len(&self, sequence_length: usize) -> Result<usize> {
        self.check_bounds(sequence_length)?;

        if self.wraps() {
            Ok((sequence_length - self.start) + self.end)
        } else {
            Ok(self.end - self.start + 1)
        }
    }

    /// Ensures both positions fall within a sequence of `sequence_length`
    /// positions.
    pub fn check_bounds(&self, sequence_length: usize) -> Result<()> {
        for position in [self.start, self.end] {
            if position > sequence_length {
                return Err(Error::OutOfBounds(position, sequence_length));
            }
        }

        Ok(())
    }

    /// Splits the interval into its non-wrapping pieces.
    pub fn segments(&self, sequence_length: usize) -> Vec<(usize, usize)> {
        if self.wraps() {
            vec![(self.start, sequence_length), (1, self.end)]
        } else {
            vec![(self.start, self.end)]
        }
    }

    /// Returns whether the interval contains `position`.
    pub fn contains(&self, position: usize) -> bool {
        if self.wraps() {
            position >= self.start || position <= self.end
        } else {
            position >= self.start && position <= self.end
        }
    }

    /// Returns whether the two intervals share at least one position.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::Interval;
    ///
    /// let a = Interval::try_new(10, 20)?;
    /// let b = Interval::try_new(20, 30)?;
    /// let c = Interval::try_new(95, 5)?;
    ///
    /// assert!(a.overlaps(&b, 100));
    /// assert!(!a.overlaps(&c, 100));
    /// assert!(c.overlaps(&Interval::try_new(1, 2)?, 100));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn overlaps(&self, other: &Interval, sequence_length: usize) -> bool {
        self.segments(sequence_length).iter().any(|(a, b)| {
            other
                .segments(sequence_length)
                .iter()
                .any(|(c, d)| a <= d && c <= b)
        })
    }

    /// Gets the region strictly after `self` and strictly before `next` when
    /// walking forward around a circular sequence.
    ///
    /// [`None`] is returned if the two intervals are adjacent.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::Interval;
    ///
    /// let lsc = Interval::try_new(1, 80)?;
    /// let ssc = Interval::try_new(91, 95)?;
    ///
    /// assert_eq!(lsc.gap_until(&ssc, 100), Some(Interval::try_new(81, 90)?));
    /// assert_eq!(ssc.gap_until(&lsc, 100), Some(Interval::try_new(96, 100)?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn gap_until(&self, next: &Interval, sequence_length: usize) -> Option<Interval> {
        if sequence_length == 0 {
            return None;
        }

        let start = self.end % sequence_length + 1;
        if start == next.start {
            return None;
        }

        let end = if next.start == 1 {
            sequence_length
        } else {
            next.start - 1
        };

        Interval::try_new(start, end).ok()
    }

    /// Extracts the bases covered by the interval from `sequence`.
    ///
    /// Wrapping intervals are stitched together from the end and the start of
    /// the sequence.
    pub fn extract(&self, sequence: &[u8]) -> Result<Vec<u8>> {
        self.check_bounds(sequence.len())?;

        let mut bases = Vec::new();
        for (start, end) in self.segments(sequence.len()) {
            bases.extend_from_slice(&sequence[start - 1..end]);
        }

        Ok(bases)
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once(DELIMITER)
            .ok_or_else(|| Error::Parse(ParseError::MissingDelimiter(s.into())))?;

        let start = start
            .parse()
            .map_err(|err| Error::Parse(ParseError::InvalidStart(err)))?;
        let end = end
            .parse()
            .map_err(|err| Error::Parse(ParseError::InvalidEnd(err)))?;

        Interval::try_new(start, end)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.start, DELIMITER, self.end)
    }
}
