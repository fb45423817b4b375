//! Self-alignment hits in BLAST tabular format.
//!
//! Both `-outfmt 6` (no comments) and `-outfmt 7` (with comment lines) are
//! supported. When a `# Fields:` comment is present, the columns are mapped by
//! their names; otherwise, the standard twelve column layout is assumed:
//!
//! ```text
//! qaccver saccver pident length mismatch gapopen qstart qend sstart send evalue bitscore
//! ```

use std::io::BufRead;
use std::io::{self};
use std::iter;
use std::num::ParseFloatError;
use std::num::ParseIntError;

use omics::coordinate::Strand;

use crate::Interval;

/// The delimiter between columns.
const DELIMITER: char = '\t';

/// The prefix of comment lines.
const COMMENT_PREFIX: char = '#';

/// The prefix of the comment line that names the columns.
const FIELDS_PREFIX: &str = "# Fields:";

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

////////////////////////////////////////////////////////////////////////////////////////
// Fields
////////////////////////////////////////////////////////////////////////////////////////

/// A column of the tabular output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Field {
    /// The query identifier.
    QueryId,

    /// The subject identifier.
    SubjectId,

    /// The percent identity.
    Identity,

    /// The alignment length.
    AlignmentLength,

    /// The number of mismatches.
    Mismatches,

    /// The number of gap openings.
    GapOpens,

    /// The start of the alignment in the query.
    QueryStart,

    /// The end of the alignment in the query.
    QueryEnd,

    /// The start of the alignment in the subject.
    SubjectStart,

    /// The end of the alignment in the subject.
    SubjectEnd,

    /// The expect value.
    Evalue,

    /// The bit score.
    BitScore,

    /// The query length.
    QueryLength,

    /// Any other column.
    Other(String),
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        match value.trim() {
            "query id" | "query acc." | "query acc.ver" | "query gi" => Field::QueryId,
            "subject id" | "subject acc." | "subject acc.ver" | "subject gi" => Field::SubjectId,
            "% identity" => Field::Identity,
            "alignment length" => Field::AlignmentLength,
            "mismatches" => Field::Mismatches,
            "gap opens" => Field::GapOpens,
            "q. start" => Field::QueryStart,
            "q. end" => Field::QueryEnd,
            "s. start" => Field::SubjectStart,
            "s. end" => Field::SubjectEnd,
            "evalue" => Field::Evalue,
            "bit score" => Field::BitScore,
            "query length" => Field::QueryLength,
            other => Field::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::QueryId => write!(f, "query id"),
            Field::SubjectId => write!(f, "subject id"),
            Field::Identity => write!(f, "% identity"),
            Field::AlignmentLength => write!(f, "alignment length"),
            Field::Mismatches => write!(f, "mismatches"),
            Field::GapOpens => write!(f, "gap opens"),
            Field::QueryStart => write!(f, "q. start"),
            Field::QueryEnd => write!(f, "q. end"),
            Field::SubjectStart => write!(f, "s. start"),
            Field::SubjectEnd => write!(f, "s. end"),
            Field::Evalue => write!(f, "evalue"),
            Field::BitScore => write!(f, "bit score"),
            Field::QueryLength => write!(f, "query length"),
            Field::Other(name) => write!(f, "{name}"),
        }
    }
}

/// The order of the columns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Layout(Vec<Field>);

impl Layout {
    /// Parses the layout from a `# Fields:` comment line.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::alignment::Field;
    /// use plastome_ir::alignment::Layout;
    ///
    /// let layout = Layout::from_comment("# Fields: query length, % identity, q. start").unwrap();
    /// assert_eq!(layout.position(&Field::Identity), Some(1));
    ///
    /// assert!(Layout::from_comment("# BLASTN 2.12.0+").is_none());
    /// ```
    pub fn from_comment(line: &str) -> Option<Self> {
        let names = line.strip_prefix(FIELDS_PREFIX)?;
        Some(Self(names.split(',').map(Field::from).collect()))
    }

    /// Gets the column index of a field.
    pub fn position(&self, field: &Field) -> Option<usize> {
        self.0.iter().position(|f| f == field)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self(vec![
            Field::QueryId,
            Field::SubjectId,
            Field::Identity,
            Field::AlignmentLength,
            Field::Mismatches,
            Field::GapOpens,
            Field::QueryStart,
            Field::QueryEnd,
            Field::SubjectStart,
            Field::SubjectEnd,
            Field::Evalue,
            Field::BitScore,
        ])
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a hit.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// A required column is missing from the layout or the line.
    MissingField(Field),

    /// An invalid integer value.
    InvalidInteger(Field, ParseIntError),

    /// An invalid floating point value.
    InvalidFloat(Field, ParseFloatError),

    /// A coordinate of zero.
    ZeroCoordinate(Field),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingField(field) => write!(f, "missing field: {field}"),
            ParseError::InvalidInteger(field, err) => write!(f, "invalid {field}: {err}"),
            ParseError::InvalidFloat(field, err) => write!(f, "invalid {field}: {err}"),
            ParseError::ZeroCoordinate(field) => write!(f, "{field} cannot be zero"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to a [`Reader`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A parse error on a (1-based) line.
    Parse(usize, ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Parse(line, err) => write!(f, "parse error on line {line}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Hit
////////////////////////////////////////////////////////////////////////////////////////

/// A single alignment hit.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    /// The percent identity.
    identity: f64,

    /// The alignment length.
    alignment_length: usize,

    /// The number of mismatches.
    mismatches: Option<usize>,

    /// The number of gap openings.
    gap_opens: Option<usize>,

    /// The start of the alignment in the query.
    query_start: usize,

    /// The end of the alignment in the query.
    query_end: usize,

    /// The start of the alignment in the subject.
    subject_start: usize,

    /// The end of the alignment in the subject.
    subject_end: usize,

    /// The query length.
    query_length: Option<usize>,
}

impl Hit {
    /// Parses a hit from a line laid out as described by `layout`.
    ///
    /// # Examples
    ///
    /// ```
    /// use omics::coordinate::Strand;
    /// use plastome_ir::alignment::Hit;
    /// use plastome_ir::alignment::Layout;
    ///
    /// let line = "NC_000001\tNC_000001\t99.99\t24998\t2\t0\t1\t24998\t155000\t130003\t0.0\t46150";
    /// let hit = Hit::parse(line, &Layout::default())?;
    ///
    /// assert_eq!(hit.alignment_length(), 24_998);
    /// assert_eq!(hit.identity(), 99.99);
    /// assert_eq!(hit.strand(), Strand::Negative);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn parse(line: &str, layout: &Layout) -> std::result::Result<Self, ParseError> {
        let values = line.split(DELIMITER).collect::<Vec<_>>();

        let value = |field: Field| -> std::result::Result<Option<&str>, ParseError> {
            match layout.position(&field) {
                Some(i) => values
                    .get(i)
                    .map(|value| Some(value.trim()))
                    .ok_or(ParseError::MissingField(field)),
                None => Ok(None),
            }
        };

        let integer = |field: Field| -> std::result::Result<Option<usize>, ParseError> {
            value(field.clone())?
                .map(|value| {
                    value
                        .parse::<usize>()
                        .map_err(|err| ParseError::InvalidInteger(field.clone(), err))
                })
                .transpose()
        };

        let required = |field: Field| -> std::result::Result<usize, ParseError> {
            integer(field.clone())?.ok_or(ParseError::MissingField(field))
        };

        let coordinate = |field: Field| -> std::result::Result<usize, ParseError> {
            match required(field.clone())? {
                0 => Err(ParseError::ZeroCoordinate(field)),
                value => Ok(value),
            }
        };

        let identity = value(Field::Identity)?
            .ok_or(ParseError::MissingField(Field::Identity))?
            .parse::<f64>()
            .map_err(|err| ParseError::InvalidFloat(Field::Identity, err))?;

        Ok(Self {
            identity,
            alignment_length: required(Field::AlignmentLength)?,
            mismatches: integer(Field::Mismatches)?,
            gap_opens: integer(Field::GapOpens)?,
            query_start: coordinate(Field::QueryStart)?,
            query_end: coordinate(Field::QueryEnd)?,
            subject_start: coordinate(Field::SubjectStart)?,
            subject_end: coordinate(Field::SubjectEnd)?,
            query_length: integer(Field::QueryLength)?,
        })
    }

    /// Gets the percent identity.
    pub fn identity(&self) -> f64 {
        self.identity
    }

    /// Gets the alignment length.
    pub fn alignment_length(&self) -> usize {
        self.alignment_length
    }

    /// Gets the number of mismatches, if reported.
    pub fn mismatches(&self) -> Option<usize> {
        self.mismatches
    }

    /// Gets the number of gap openings, if reported.
    pub fn gap_opens(&self) -> Option<usize> {
        self.gap_opens
    }

    /// Gets the query length, if reported.
    pub fn query_length(&self) -> Option<usize> {
        self.query_length
    }

    /// Gets the strand the subject aligns on.
    ///
    /// BLAST reports alignments to the reverse strand with a subject start
    /// greater than the subject end.
    pub fn strand(&self) -> Strand {
        if self.subject_start > self.subject_end {
            Strand::Negative
        } else {
            Strand::Positive
        }
    }

    /// Gets the aligned region of the query.
    pub fn query(&self) -> Interval {
        ordered(self.query_start, self.query_end)
    }

    /// Gets the aligned region of the subject (in forward orientation).
    pub fn subject(&self) -> Interval {
        ordered(self.subject_start, self.subject_end)
    }
}

/// Creates an interval from two non-zero positions given in any order.
fn ordered(a: usize, b: usize) -> Interval {
    Interval::try_new(a.min(b), a.max(b))
        .unwrap_or_else(|_| unreachable!("coordinates are checked to be non-zero"))
}

////////////////////////////////////////////////////////////////////////////////////////
// Reader
////////////////////////////////////////////////////////////////////////////////////////

/// A reader of BLAST tabular output.
#[derive(Clone, Debug)]
pub struct Reader<T>
where
    T: BufRead,
{
    /// The inner reader.
    inner: T,

    /// The current column layout.
    layout: Layout,

    /// The number of lines read so far.
    line_number: usize,
}

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates a reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"# Fields: % identity, alignment length, q. start, q. end, s. start, s. end\n";
    /// let reader = plastome_ir::alignment::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            layout: Layout::default(),
            line_number: 0,
        }
    }

    /// Gets the current column layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Reads the next hit, skipping blank and comment lines.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"# BLASTN 2.12.0+\n# Fields: % identity, alignment length, q. start, q. end, s. start, s. end\n100.00\t25000\t1\t25000\t155000\t130001\n";
    /// let mut reader = plastome_ir::alignment::Reader::new(&data[..]);
    ///
    /// let hit = reader.read_hit()?.unwrap();
    /// assert_eq!(hit.alignment_length(), 25_000);
    /// assert!(reader.read_hit()?.is_none());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_hit(&mut self) -> Result<Option<Hit>> {
        let mut buffer = String::new();

        loop {
            if read_line(&mut self.inner, &mut buffer).map_err(Error::Io)? == 0 {
                return Ok(None);
            }

            self.line_number += 1;

            if buffer.trim().is_empty() {
                continue;
            }

            if buffer.starts_with(COMMENT_PREFIX) {
                if let Some(layout) = Layout::from_comment(&buffer) {
                    self.layout = layout;
                }

                continue;
            }

            return Hit::parse(&buffer, &self.layout)
                .map(Some)
                .map_err(|err| Error::Parse(self.line_number, err));
        }
    }

    /// Returns an iterator over the hits in the underlying reader.
    pub fn hits(&mut self) -> impl Iterator<Item = Result<Hit>> + '_ {
        iter::from_fn(move || self.read_hit().transpose())
    }
}

/// Reads a line from a buffered reader without its line ending.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    let n = reader.read_line(buffer)?;

    if buffer.ends_with(NEW_LINE) {
        buffer.pop();

        if buffer.ends_with(CARRIAGE_RETURN) {
            buffer.pop();
        }
    }

    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD: &str = "NC_000001\tNC_000001\t100.000\t160000\t0\t0\t1\t160000\t1\t160000\t0.0\t295000\n\
         NC_000001\tNC_000001\t99.992\t24998\t2\t0\t130003\t155000\t24998\t1\t0.0\t46150\n";

    #[test]
    fn standard_layout() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut reader = Reader::new(STANDARD.as_bytes());
        let hits = reader.hits().collect::<Result<Vec<_>>>()?;

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].strand(), Strand::Positive);

        let hit = &hits[1];
        assert_eq!(hit.strand(), Strand::Negative);
        assert_eq!(hit.alignment_length(), 24_998);
        assert_eq!(hit.mismatches(), Some(2));
        assert_eq!(hit.gap_opens(), Some(0));
        assert_eq!(hit.query(), Interval::try_new(130_003, 155_000)?);
        assert_eq!(hit.subject(), Interval::try_new(1, 24_998)?);
        assert_eq!(hit.query_length(), None);
        Ok(())
    }

    #[test]
    fn fields_comment() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let data = "# BLASTN 2.12.0+\n\
             # Query: NC_000001\n\
             # Fields: query length, % identity, alignment length, q. start, q. end, s. start, s. end\n\
             # 1 hits found\n\
             \n\
             160000\t99.5\t25000\t1\t25000\t155000\t130001\r\n";

        let mut reader = Reader::new(data.as_bytes());
        let hit = reader.read_hit()?.unwrap();

        assert_eq!(hit.query_length(), Some(160_000));
        assert_eq!(hit.identity(), 99.5);
        assert_eq!(hit.mismatches(), None);
        assert_eq!(hit.subject(), Interval::try_new(130_001, 155_000)?);
        assert_eq!(reader.layout().position(&Field::QueryLength), Some(0));
        Ok(())
    }

    #[test]
    fn invalid_lines() {
        let data = "# Fields: % identity, alignment length, q. start, q. end, s. start, s. end\n\
             99.5\tlong\t1\t25000\t155000\t130001\n";
        let mut reader = Reader::new(data.as_bytes());
        let err = reader.read_hit().unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error on line 2: invalid alignment length: invalid digit found in string"
        );

        let data = "99.5\t25000\t1\n";
        let mut reader = Reader::new(data.as_bytes());
        let err = reader.read_hit().unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(1, ParseError::MissingField(Field::AlignmentLength))
        ));

        let data = "a\tb\t99.5\t25000\t0\t0\t0\t25000\t155000\t130001\t0.0\t1\n";
        let mut reader = Reader::new(data.as_bytes());
        let err = reader.read_hit().unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(1, ParseError::ZeroCoordinate(Field::QueryStart))
        ));
    }
}
