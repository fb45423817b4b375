//! The table of reported inverted repeats.
//!
//! One row is written per accession. Absent values are written as `n.a.` and
//! the presence of each repeat is flagged with `yes` or `no`:
//!
//! ```text
//! ACCESSION  IRa_REPORTED  IRa_REPORTED_START  IRa_REPORTED_END  IRa_REPORTED_LENGTH  IRb_REPORTED  ...
//! NC_000001  yes           130001              155000            25000                yes           ...
//! ```

use std::io::BufRead;
use std::io::Write;
use std::io::{self};
use std::num::ParseIntError;
use std::str::FromStr;

use crate::extract;
use crate::extract::Extraction;
use crate::extract::InvertedRepeat;
use crate::Interval;

/// The header of an IR table.
pub const HEADER: [&str; 9] = [
    "ACCESSION",
    "IRa_REPORTED",
    "IRa_REPORTED_START",
    "IRa_REPORTED_END",
    "IRa_REPORTED_LENGTH",
    "IRb_REPORTED",
    "IRb_REPORTED_START",
    "IRb_REPORTED_END",
    "IRb_REPORTED_LENGTH",
];

/// The delimiter between columns.
const DELIMITER: &str = "\t";

/// The placeholder for an absent value.
pub const NOT_AVAILABLE: &str = "n.a.";

/// The flag for a present repeat.
const YES: &str = "yes";

/// The flag for an absent repeat.
const NO: &str = "no";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a row.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An incorrect number of fields.
    IncorrectNumberOfFields(usize),

    /// A presence flag other than `yes` or `no`.
    InvalidFlag(String),

    /// An invalid number in the named column.
    InvalidNumber(&'static str, ParseIntError),

    /// A position of zero in the named column.
    ZeroPosition(&'static str),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(n) => write!(
                f,
                "invalid number of fields: expected {} fields, found {n} fields",
                HEADER.len()
            ),
            ParseError::InvalidFlag(flag) => {
                write!(f, "invalid flag \"{flag}\": expected \"{YES}\" or \"{NO}\"")
            }
            ParseError::InvalidNumber(column, err) => write!(f, "invalid {column}: {err}"),
            ParseError::ZeroPosition(column) => write!(f, "{column} cannot be zero"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to reading or writing an IR table.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// The header is missing or does not match.
    InvalidHeader(String),

    /// A parse error on a (1-based) line.
    Parse(usize, ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::InvalidHeader(header) => write!(f, "invalid header: \"{header}\""),
            Error::Parse(line, err) => write!(f, "parse error on line {line}: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Row
////////////////////////////////////////////////////////////////////////////////////////

/// A reported inverted repeat as written to the table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Reported {
    /// The interval.
    interval: Interval,

    /// The length.
    length: usize,
}

impl Reported {
    /// Creates a new reported inverted repeat.
    pub fn new(interval: Interval, length: usize) -> Self {
        Self { interval, length }
    }

    /// Gets the interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Gets the length.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl From<&InvertedRepeat> for Reported {
    fn from(repeat: &InvertedRepeat) -> Self {
        Self::new(*repeat.interval(), repeat.length())
    }
}

/// A row of the IR table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    /// The accession.
    accession: String,

    /// IRa, if reported.
    ira: Option<Reported>,

    /// IRb, if reported.
    irb: Option<Reported>,
}

impl Row {
    /// Creates a new row.
    pub fn new(accession: impl Into<String>, ira: Option<Reported>, irb: Option<Reported>) -> Self {
        Self {
            accession: accession.into(),
            ira,
            irb,
        }
    }

    /// Creates a row from an extraction.
    pub fn from_extraction(accession: impl Into<String>, extraction: &Extraction) -> Self {
        Self::new(
            accession,
            extraction.ira().map(Reported::from),
            extraction.irb().map(Reported::from),
        )
    }

    /// Creates a row for an accession without reported inverted repeats.
    pub fn empty(accession: impl Into<String>) -> Self {
        Self::new(accession, None, None)
    }

    /// Gets the accession.
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// Gets IRa, if reported.
    pub fn ira(&self) -> Option<&Reported> {
        self.ira.as_ref()
    }

    /// Gets IRb, if reported.
    pub fn irb(&self) -> Option<&Reported> {
        self.irb.as_ref()
    }

    /// Gets the reported length of the pair when both repeats are reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::report::Row;
    ///
    /// let row = "NC_000001\tyes\t130001\t155000\t25000\tyes\t1\t25001\t25001".parse::<Row>()?;
    /// assert_eq!(row.reported_length(), Some(25_001));
    ///
    /// let row = "NC_000002\tno\tn.a.\tn.a.\tn.a.\tyes\t1\t25000\t25000".parse::<Row>()?;
    /// assert_eq!(row.reported_length(), None);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn reported_length(&self) -> Option<usize> {
        Some(extract::mean_length(self.ira?.length, self.irb?.length))
    }
}

/// Parses the four columns describing one reported repeat.
fn parse_reported(
    fields: &[&str],
    columns: [&'static str; 3],
) -> std::result::Result<Option<Reported>, ParseError> {
    match fields[0] {
        YES => {}
        NO => return Ok(None),
        flag => return Err(ParseError::InvalidFlag(flag.to_string())),
    }

    let number = |value: &str, column: &'static str| {
        value
            .parse::<usize>()
            .map_err(|err| ParseError::InvalidNumber(column, err))
    };

    let start = number(fields[1], columns[0])?;
    let end = number(fields[2], columns[1])?;
    let length = number(fields[3], columns[2])?;

    let interval = Interval::try_new(start, end).map_err(|_| {
        ParseError::ZeroPosition(if start == 0 { columns[0] } else { columns[1] })
    })?;

    Ok(Some(Reported::new(interval, length)))
}

/// Formats the four columns describing one reported repeat.
fn format_reported(reported: Option<&Reported>) -> String {
    match reported {
        Some(reported) => [
            YES.to_string(),
            reported.interval.start().to_string(),
            reported.interval.end().to_string(),
            reported.length.to_string(),
        ]
        .join(DELIMITER),
        None => [NO, NOT_AVAILABLE, NOT_AVAILABLE, NOT_AVAILABLE].join(DELIMITER),
    }
}

impl FromStr for Row {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let fields = s.split(DELIMITER).collect::<Vec<_>>();

        if fields.len() != HEADER.len() {
            return Err(ParseError::IncorrectNumberOfFields(fields.len()));
        }

        let ira = parse_reported(&fields[1..5], [HEADER[2], HEADER[3], HEADER[4]])?;
        let irb = parse_reported(&fields[5..9], [HEADER[6], HEADER[7], HEADER[8]])?;

        Ok(Self::new(fields[0], ira, irb))
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.accession,
            format_reported(self.ira()),
            format_reported(self.irb())
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Table
////////////////////////////////////////////////////////////////////////////////////////

/// An append-only table of reported inverted repeats.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IrTable(Vec<Row>);

impl IrTable {
    /// Adds a row to the table.
    pub fn push(mut self, row: Row) -> Self {
        self.0.push(row);
        self
    }

    /// Gets the rows.
    pub fn rows(&self) -> &[Row] {
        &self.0
    }

    /// Gets the row of an accession.
    pub fn get(&self, accession: &str) -> Option<&Row> {
        self.0.iter().find(|row| row.accession == accession)
    }

    /// Gets the mean reported length over all rows with both repeats.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::report::IrTable;
    ///
    /// let data = b"ACCESSION\tIRa_REPORTED\tIRa_REPORTED_START\tIRa_REPORTED_END\tIRa_REPORTED_LENGTH\tIRb_REPORTED\tIRb_REPORTED_START\tIRb_REPORTED_END\tIRb_REPORTED_LENGTH\n\
    /// A\tyes\t130001\t155000\t25000\tyes\t1\t25000\t25000\n\
    /// B\tyes\t130001\t156000\t26000\tyes\t1\t26000\t26000\n\
    /// C\tno\tn.a.\tn.a.\tn.a.\tno\tn.a.\tn.a.\tn.a.\n";
    ///
    /// let table = IrTable::read(&data[..])?;
    /// assert_eq!(table.rows().len(), 3);
    /// assert_eq!(table.mean_reported_length(), Some(25_500));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn mean_reported_length(&self) -> Option<usize> {
        let lengths = self
            .0
            .iter()
            .filter_map(Row::reported_length)
            .collect::<Vec<_>>();

        if lengths.is_empty() {
            return None;
        }

        let total = lengths.iter().sum::<usize>();
        Some((total + lengths.len() / 2) / lengths.len())
    }

    /// Reads a table (including its header).
    pub fn read<R>(reader: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut table = Self::default();
        let mut lines = reader.lines();

        match lines.next() {
            Some(line) => {
                let line = line.map_err(Error::Io)?;
                if line.trim_end() != HEADER.join(DELIMITER) {
                    return Err(Error::InvalidHeader(line));
                }
            }
            None => return Err(Error::InvalidHeader(String::new())),
        }

        for (i, line) in lines.enumerate() {
            let line = line.map_err(Error::Io)?;
            let line = line.trim_end_matches('\r');

            if line.is_empty() {
                continue;
            }

            let row = line.parse().map_err(|err| Error::Parse(i + 2, err))?;
            table = table.push(row);
        }

        Ok(table)
    }

    /// Writes the table (including its header).
    pub fn write<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        writeln!(writer, "{}", HEADER.join(DELIMITER))?;

        for row in &self.0 {
            writeln!(writer, "{row}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_round_trips_absent_values() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let line = "NC_000002\tno\tn.a.\tn.a.\tn.a.\tyes\t150000\t500\t1500";
        let row = line.parse::<Row>()?;

        assert!(row.ira().is_none());
        assert_eq!(row.irb().unwrap().interval(), &Interval::try_new(150_000, 500)?);
        assert_eq!(row.irb().unwrap().length(), 1_500);
        assert_eq!(row.to_string(), line);
        Ok(())
    }

    #[test]
    fn it_fails_on_invalid_rows() {
        let err = "NC_000001\tyes".parse::<Row>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields: expected 9 fields, found 2 fields"
        );

        let err = "NC_000001\tmaybe\t1\t2\t2\tno\tn.a.\tn.a.\tn.a."
            .parse::<Row>()
            .unwrap_err();
        assert_eq!(err, ParseError::InvalidFlag(String::from("maybe")));

        let err = "NC_000001\tyes\tn.a.\t2\t2\tno\tn.a.\tn.a.\tn.a."
            .parse::<Row>()
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidNumber("IRa_REPORTED_START", _)
        ));
    }

    #[test]
    fn it_fails_on_a_missing_header() {
        let data = "NC_000001\tno\tn.a.\tn.a.\tn.a.\tno\tn.a.\tn.a.\tn.a.\n";
        let err = IrTable::read(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn write_then_read() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let table = IrTable::default()
            .push(Row::new(
                "NC_000001",
                Some(Reported::new(Interval::try_new(130_001, 155_000)?, 25_000)),
                Some(Reported::new(Interval::try_new(1, 25_000)?, 25_000)),
            ))
            .push(Row::empty("NC_000002"));

        let mut buffer = Vec::new();
        table.write(&mut buffer)?;

        let text = String::from_utf8(buffer.clone())?;
        assert!(text.ends_with("NC_000002\tno\tn.a.\tn.a.\tn.a.\tno\tn.a.\tn.a.\tn.a.\n"));

        let read = IrTable::read(&buffer[..])?;
        assert_eq!(read, table);
        assert_eq!(read.get("NC_000001").unwrap().reported_length(), Some(25_000));
        assert_eq!(read.mean_reported_length(), Some(25_000));
        Ok(())
    }
}
