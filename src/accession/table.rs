//! The availability table and the lists used to filter it.

use std::collections::HashSet;
use std::io::BufRead;
use std::io::Write;
use std::io::{self};

use crate::accession::DELIMITER;
use crate::accession::HEADER;
use crate::accession::ParseError;
use crate::accession::Record;

/// The prefix of a comment line in a blacklist.
const COMMENT_PREFIX: char = '#';

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to reading an availability table or one of its lists.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// The header is missing or does not match.
    InvalidHeader(String),

    /// A parse error on a (1-based) line.
    Parse(usize, ParseError),

    /// A duplicates line without both a RefSeq and a duplicate accession.
    InvalidDuplicate(usize, String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::InvalidHeader(header) => write!(f, "invalid header: \"{header}\""),
            Error::Parse(line, err) => write!(f, "parse error on line {line}: {err}"),
            Error::InvalidDuplicate(line, value) => {
                write!(f, "invalid duplicate on line {line}: \"{value}\"")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Table
////////////////////////////////////////////////////////////////////////////////////////

/// An availability table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table(Vec<Record>);

impl Table {
    /// Adds a record to the table.
    pub fn push(mut self, record: Record) -> Self {
        self.0.push(record);
        self
    }

    /// Gets the records.
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    /// Gets the number of records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets the UIDs that are already in the table.
    pub fn uids(&self) -> HashSet<u64> {
        self.0.iter().map(Record::uid).collect()
    }

    /// Removes the records whose genus is blacklisted.
    ///
    /// Returns the filtered table along with the number of removed records.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::accession::table::Blacklist;
    /// use plastome_ir::accession::Builder;
    /// use plastome_ir::accession::Table;
    ///
    /// let record = |uid: u64, taxonomy: &str| {
    ///     Builder::default()
    ///         .uid(uid)
    ///         .accession(format!("NC_00000{uid}"))
    ///         .sequence_length(160_000)
    ///         .taxonomy(taxonomy)
    ///         .try_build()
    /// };
    ///
    /// let table = Table::default()
    ///     .push(record(1, "Viridiplantae; Cuscuta")?)
    ///     .push(record(2, "Viridiplantae; Nicotiana")?);
    ///
    /// let blacklist = Blacklist::read(&b"# parasitic\nCuscuta\n"[..])?;
    /// let (table, removed) = table.remove_blacklisted(&blacklist);
    ///
    /// assert_eq!(removed, 1);
    /// assert_eq!(table.records()[0].accession(), "NC_000002");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn remove_blacklisted(mut self, blacklist: &Blacklist) -> (Self, usize) {
        let before = self.0.len();

        self.0.retain(|record| {
            record
                .genus()
                .map(|genus| !blacklist.contains(genus))
                .unwrap_or(true)
        });

        let removed = before - self.0.len();
        (self, removed)
    }

    /// Removes the records whose accession is a known duplicate of a RefSeq
    /// record.
    ///
    /// Returns the filtered table along with the number of removed records.
    pub fn remove_duplicates(mut self, duplicates: &Duplicates) -> (Self, usize) {
        let before = self.0.len();
        self.0
            .retain(|record| !duplicates.is_duplicate(record.accession()));

        let removed = before - self.0.len();
        (self, removed)
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

            let record = line.parse().map_err(|err| Error::Parse(i + 2, err))?;
            table = table.push(record);
        }

        Ok(table)
    }

    /// Writes the table (including its header).
    pub fn write<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        writeln!(writer, "{}", HEADER.join(DELIMITER))?;

        for record in &self.0 {
            writeln!(writer, "{record}")?;
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Blacklist
////////////////////////////////////////////////////////////////////////////////////////

/// A set of genera to exclude.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Blacklist(HashSet<String>);

impl Blacklist {
    /// Reads a blacklist: one genus per line, with `#` starting a comment
    /// line.
    pub fn read<R>(reader: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut genera = HashSet::new();

        for line in reader.lines() {
            let line = line.map_err(Error::Io)?;
            let genus = line.trim();

            if genus.is_empty() || genus.starts_with(COMMENT_PREFIX) {
                continue;
            }

            genera.insert(genus.to_string());
        }

        Ok(Self(genera))
    }

    /// Returns whether a genus is blacklisted.
    pub fn contains(&self, genus: &str) -> bool {
        self.0.contains(genus)
    }

    /// Gets the number of blacklisted genera.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the blacklist is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Duplicates
////////////////////////////////////////////////////////////////////////////////////////

/// A RefSeq accession and the accession of the record it copies.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Duplicate {
    /// The RefSeq accession.
    refseq: String,

    /// The accession of the identical record.
    duplicate: String,
}

impl Duplicate {
    /// Creates a new duplicate pair.
    pub fn new(refseq: impl Into<String>, duplicate: impl Into<String>) -> Self {
        Self {
            refseq: refseq.into(),
            duplicate: duplicate.into(),
        }
    }

    /// Gets the RefSeq accession.
    pub fn refseq(&self) -> &str {
        &self.refseq
    }

    /// Gets the accession of the identical record.
    pub fn duplicate(&self) -> &str {
        &self.duplicate
    }
}

impl std::fmt::Display for Duplicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.refseq, self.duplicate)
    }
}

/// The known duplicate pairs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Duplicates(Vec<Duplicate>);

impl Duplicates {
    /// Adds a pair unless it is already known.
    pub fn push(mut self, duplicate: Duplicate) -> Self {
        if !self.0.contains(&duplicate) {
            self.0.push(duplicate);
        }

        self
    }

    /// Gets the pairs.
    pub fn pairs(&self) -> &[Duplicate] {
        &self.0
    }

    /// Returns whether an accession is the duplicate side of any pair.
    pub fn is_duplicate(&self, accession: &str) -> bool {
        self.0.iter().any(|pair| pair.duplicate == accession)
    }

    /// Reads the pairs: one tab-separated `REFSEQ DUPLICATE` pair per line.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::accession::table::Duplicates;
    ///
    /// let duplicates = Duplicates::read(&b"NC_000001\tMN000001\n"[..])?;
    ///
    /// assert!(duplicates.is_duplicate("MN000001"));
    /// assert!(!duplicates.is_duplicate("NC_000001"));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read<R>(reader: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut duplicates = Self::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(Error::Io)?;
            let line = line.trim_end_matches('\r');

            if line.trim().is_empty() {
                continue;
            }

            match line.split_once(DELIMITER) {
                Some((refseq, duplicate)) if !refseq.is_empty() && !duplicate.is_empty() => {
                    duplicates = duplicates.push(Duplicate::new(refseq, duplicate));
                }
                _ => return Err(Error::InvalidDuplicate(i + 1, line.to_string())),
            }
        }

        Ok(duplicates)
    }

    /// Writes the pairs.
    pub fn write<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        for pair in &self.0 {
            writeln!(writer, "{pair}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::BufReader;

    use tempdir::TempDir;

    use super::*;
    use crate::accession::Builder;

    fn record(uid: u64, accession: &str, taxonomy: &str) -> Record {
        Builder::default()
            .uid(uid)
            .accession(accession)
            .sequence_length(150_000)
            .create_date("2020-02-01")
            .taxonomy(taxonomy)
            .try_build()
            .unwrap()
    }

    #[test]
    fn write_then_read() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("plastome-ir")?;
        let path = dir.path().join("availability.tsv");

        let table = Table::default()
            .push(record(1, "NC_000001.1", "Viridiplantae; Nicotiana"))
            .push(record(2, "MN000002.3", "Viridiplantae; Oryza."));
        table.write(File::create(&path)?)?;

        let read = Table::read(BufReader::new(File::open(&path)?))?;
        assert_eq!(read, table);
        assert_eq!(read.uids(), HashSet::from([1, 2]));
        assert_eq!(read.records()[1].genus(), Some("Oryza"));
        Ok(())
    }

    #[test]
    fn it_fails_to_read_a_table_with_an_invalid_header() {
        let err = Table::read(&b"UID\tACCESSION\n"[..]).unwrap_err();
        assert_eq!(err.to_string(), "invalid header: \"UID\tACCESSION\"");

        let err = Table::read(&b""[..]).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn it_fails_to_read_an_invalid_row() {
        let data = format!("{}\nnot-a-uid\n", HEADER.join(DELIMITER));
        let err = Table::read(data.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error on line 2: invalid number of fields: expected 11 fields, found 1 fields"
        );
    }

    #[test]
    fn filters() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let table = Table::default()
            .push(record(1, "NC_000001", "Viridiplantae; Cuscuta."))
            .push(record(2, "MN000002", "Viridiplantae; Nicotiana"))
            .push(record(3, "NC_000003", "Viridiplantae; Nicotiana"))
            .push(record(4, "MN000004", ""));

        let blacklist = Blacklist::read(&b"# holoparasites\nCuscuta\n\n"[..])?;
        assert_eq!(blacklist.len(), 1);

        let (table, removed) = table.remove_blacklisted(&blacklist);
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 3);

        let duplicates = Duplicates::default()
            .push(Duplicate::new("NC_000003", "MN000002"))
            .push(Duplicate::new("NC_000003", "MN000002"));
        assert_eq!(duplicates.pairs().len(), 1);

        let (table, removed) = table.remove_duplicates(&duplicates);
        assert_eq!(removed, 1);

        let accessions = table
            .records()
            .iter()
            .map(Record::accession)
            .collect::<Vec<_>>();
        assert_eq!(accessions, ["NC_000003", "MN000004"]);
        Ok(())
    }

    #[test]
    fn duplicates_round_trip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let duplicates = Duplicates::default().push(Duplicate::new("NC_000001", "MN000001"));

        let mut buffer = Vec::new();
        duplicates.write(&mut buffer)?;
        assert_eq!(buffer, b"NC_000001\tMN000001\n");

        let err = Duplicates::read(&b"NC_000001\n"[..]).unwrap_err();
        assert_eq!(err.to_string(), "invalid duplicate on line 1: \"NC_000001\"");
        Ok(())
    }
}
