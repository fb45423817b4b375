//! A builder for a record of the availability table.

use crate::accession::Record;
use crate::accession::sanitize;

/// An error that occurs when a required field was never provided to the
/// [`Builder`].
#[derive(Debug)]
pub enum MissingError {
    /// No UID was provided to the [`Builder`].
    Uid,

    /// No accession was provided to the [`Builder`].
    Accession,

    /// No sequence length was provided to the [`Builder`].
    SequenceLength,
}

impl std::fmt::Display for MissingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingError::Uid => write!(f, "uid"),
            MissingError::Accession => write!(f, "accession"),
            MissingError::SequenceLength => write!(f, "sequence length"),
        }
    }
}

impl std::error::Error for MissingError {}

/// An error related to a [`Builder`].
#[derive(Debug)]
pub enum Error {
    /// An error where a required field was never provided to the [`Builder`].
    Missing(MissingError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Missing(err) => write!(f, "missing required field: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A builder for a [`Record`].
///
/// Free-text values are stripped of tabs and line breaks as they are set so
/// that the built record always fits on one row.
#[derive(Debug, Default)]
pub struct Builder {
    /// The UID.
    uid: Option<u64>,

    /// The accession.
    accession: Option<String>,

    /// The accession version.
    version: String,

    /// The organism.
    organism: String,

    /// The sequence length.
    sequence_length: Option<usize>,

    /// The creation date.
    create_date: String,

    /// The authors.
    authors: String,

    /// The title.
    title: String,

    /// The journal citation.
    reference: String,

    /// The note.
    note: String,

    /// The taxonomy.
    taxonomy: String,
}

impl Builder {
    /// Sets the UID.
    pub fn uid(mut self, uid: u64) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Sets the accession.
    ///
    /// A trailing version (`.1`) is split off into the version field.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::accession::Builder;
    ///
    /// let record = Builder::default()
    ///     .uid(1)
    ///     .accession("NC_000001.2")
    ///     .sequence_length(160_000)
    ///     .try_build()?;
    ///
    /// assert_eq!(record.accession(), "NC_000001");
    /// assert_eq!(record.version(), "2");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn accession(mut self, accession: impl AsRef<str>) -> Self {
        let accession = sanitize(accession.as_ref());

        match accession.split_once('.') {
            Some((accession, version)) => {
                self.accession = Some(accession.to_string());
                self.version = version.to_string();
            }
            None => self.accession = Some(accession),
        }

        self
    }

    /// Sets the accession version.
    pub fn version(mut self, version: impl AsRef<str>) -> Self {
        self.version = sanitize(version.as_ref());
        self
    }

    /// Sets the organism.
    pub fn organism(mut self, organism: impl AsRef<str>) -> Self {
        self.organism = sanitize(organism.as_ref());
        self
    }

    /// Sets the sequence length.
    pub fn sequence_length(mut self, sequence_length: usize) -> Self {
        self.sequence_length = Some(sequence_length);
        self
    }

    /// Sets the creation date.
    pub fn create_date(mut self, create_date: impl AsRef<str>) -> Self {
        self.create_date = sanitize(create_date.as_ref());
        self
    }

    /// Sets the authors.
    pub fn authors(mut self, authors: impl AsRef<str>) -> Self {
        self.authors = sanitize(authors.as_ref());
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl AsRef<str>) -> Self {
        self.title = sanitize(title.as_ref());
        self
    }

    /// Sets the journal citation.
    pub fn reference(mut self, reference: impl AsRef<str>) -> Self {
        self.reference = sanitize(reference.as_ref());
        self
    }

    /// Sets the note.
    pub fn note(mut self, note: impl AsRef<str>) -> Self {
        self.note = sanitize(note.as_ref());
        self
    }

    /// Sets the taxonomy.
    pub fn taxonomy(mut self, taxonomy: impl AsRef<str>) -> Self {
        self.taxonomy = sanitize(taxonomy.as_ref());
        self
    }

    /// Consumes `self` to attempt to build a [`Record`].
    pub fn try_build(self) -> Result<Record> {
        let uid = self.uid.ok_or(Error::Missing(MissingError::Uid))?;
        let accession = self
            .accession
            .ok_or(Error::Missing(MissingError::Accession))?;
        let sequence_length = self
            .sequence_length
            .ok_or(Error::Missing(MissingError::SequenceLength))?;

        Ok(Record {
            uid,
            accession,
            version: self.version,
            organism: self.organism,
            sequence_length,
            create_date: self.create_date,
            authors: self.authors,
            title: self.title,
            reference: self.reference,
            note: self.note,
            taxonomy: self.taxonomy,
        })
    }
}
