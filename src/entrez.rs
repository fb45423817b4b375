//! A minimal blocking client for the NCBI Entrez E-utilities.
//!
//! Only the three calls needed to build an availability table and fill the
//! record store are covered: `esearch` for UIDs, `efetch` of the GBSeq XML
//! for a record summary, and `efetch` of the GenBank flat file.

use std::thread;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;

use crate::accession;
use crate::accession::Builder;
use crate::accession::table::Duplicate;

/// The default base URL of the E-utilities.
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// The database that is queried.
const DATABASE: &str = "nucleotide";

/// The name this client reports to NCBI.
const TOOL: &str = "plastome-ir";

/// The largest number of UIDs returned by one search.
const MAX_UIDS: usize = 100_000;

/// The default number of attempts per request.
pub const DEFAULT_ATTEMPTS: usize = 3;

/// The default delay before the first retry; each further retry waits one
/// more multiple of it.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// The spacing between requests without an API key (3 requests per second).
const DELAY_WITHOUT_KEY: Duration = Duration::from_millis(340);

/// The spacing between requests with an API key (10 requests per second).
const DELAY_WITH_KEY: Duration = Duration::from_millis(100);

/// Comment fragments of RefSeq records that copy another record.
const IDENTICAL_MARKERS: [&str; 2] = [
    "PROVISIONAL REFSEQ: This record has not yet been subject to final NCBI review",
    "The reference sequence is identical to",
];

/// The prefix of RefSeq chromosome accessions.
const REFSEQ_PREFIX: &str = "NC_";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with interpreting an E-utilities response.
#[derive(Debug)]
pub enum ParseError {
    /// Malformed XML.
    Xml(quick_xml::DeError),

    /// A response without a `GBSeq` element.
    Empty,

    /// A required element that is absent.
    MissingElement(&'static str),

    /// A UID that is not a number.
    InvalidUid(String),

    /// An invalid creation date.
    Date(accession::ParseError),

    /// A summary that cannot be turned into a record.
    Record(accession::builder::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Xml(err) => write!(f, "malformed XML: {err}"),
            ParseError::Empty => write!(f, "no GBSeq element found"),
            ParseError::MissingElement(element) => write!(f, "missing element: {element}"),
            ParseError::InvalidUid(uid) => write!(f, "invalid uid: \"{uid}\""),
            ParseError::Date(err) => write!(f, "{err}"),
            ParseError::Record(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to the E-utilities.
#[derive(Debug)]
pub enum Error {
    /// An HTTP error.
    Http(reqwest::Error),

    /// A response with an unsuccessful status.
    Status(reqwest::StatusCode, String),

    /// A successful response with an empty body.
    EmptyBody(String),

    /// A parse error.
    Parse(ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(err) => write!(f, "http error: {err}"),
            Error::Status(status, endpoint) => write!(f, "{endpoint} returned {status}"),
            Error::EmptyBody(endpoint) => write!(f, "{endpoint} returned an empty body"),
            Error::Parse(err) => write!(f, "parse error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Responses
////////////////////////////////////////////////////////////////////////////////////////

/// An `eSearchResult` document.
#[derive(Debug, Deserialize)]
#[serde(rename = "eSearchResult")]
struct SearchResultXml {
    #[serde(rename = "IdList")]
    id_list: Option<IdListXml>,
}

/// The UIDs of an `eSearchResult`.
#[derive(Debug, Deserialize)]
struct IdListXml {
    #[serde(rename = "Id", default)]
    ids: Vec<String>,
}

/// Parses the UIDs out of an `esearch` XML response, in the order given.
///
/// # Examples
///
/// ```
/// use plastome_ir::entrez::parse_uids;
///
/// let xml = "<eSearchResult><Count>2</Count><IdList><Id>20</Id><Id>10</Id></IdList></eSearchResult>";
/// assert_eq!(parse_uids(xml)?, vec![20, 10]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_uids(xml: &str) -> std::result::Result<Vec<u64>, ParseError> {
    let result: SearchResultXml = quick_xml::de::from_str(xml).map_err(ParseError::Xml)?;

    result
        .id_list
        .map(|list| list.ids)
        .unwrap_or_default()
        .into_iter()
        .map(|uid| {
            uid.trim()
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidUid(uid))
        })
        .collect()
}

/// A `GBSet` document.
#[derive(Debug, Deserialize)]
#[serde(rename = "GBSet")]
struct GbSetXml {
    #[serde(rename = "GBSeq", default)]
    sequences: Vec<GbSeqXml>,
}

/// One sequence of a `GBSet`.
#[derive(Debug, Deserialize)]
struct GbSeqXml {
    #[serde(rename = "GBSeq_primary-accession")]
    primary_accession: Option<String>,
    #[serde(rename = "GBSeq_accession-version")]
    accession_version: Option<String>,
    #[serde(rename = "GBSeq_organism")]
    organism: Option<String>,
    #[serde(rename = "GBSeq_length")]
    length: Option<usize>,
    #[serde(rename = "GBSeq_taxonomy")]
    taxonomy: Option<String>,
    #[serde(rename = "GBSeq_create-date")]
    create_date: Option<String>,
    #[serde(rename = "GBSeq_comment")]
    comment: Option<String>,
    #[serde(rename = "GBSeq_references")]
    references: Option<GbReferencesXml>,
}

/// The references of a sequence.
#[derive(Debug, Deserialize)]
struct GbReferencesXml {
    #[serde(rename = "GBReference", default)]
    references: Vec<GbReferenceXml>,
}

/// One reference.
#[derive(Debug, Deserialize)]
struct GbReferenceXml {
    #[serde(rename = "GBReference_authors")]
    authors: Option<GbAuthorsXml>,
    #[serde(rename = "GBReference_title")]
    title: Option<String>,
    #[serde(rename = "GBReference_journal")]
    journal: Option<String>,
}

/// The authors of a reference.
#[derive(Debug, Deserialize)]
struct GbAuthorsXml {
    #[serde(rename = "GBAuthor", default)]
    authors: Vec<String>,
}

////////////////////////////////////////////////////////////////////////////////////////
// Summary
////////////////////////////////////////////////////////////////////////////////////////

/// The availability record of one UID, along with the record it duplicates
/// (for RefSeq copies).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Summary {
    /// The availability record.
    record: accession::Record,

    /// The duplicate pair, if the record is a RefSeq copy.
    duplicate: Option<Duplicate>,
}

impl Summary {
    /// Parses a summary from a `GBSet` XML document.
    ///
    /// Only the first `GBSeq` element is read. The authors, title, and
    /// journal come from the first reference that lists any authors.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::entrez::Summary;
    ///
    /// let xml = "<GBSet><GBSeq>\
    ///     <GBSeq_length>155943</GBSeq_length>\
    ///     <GBSeq_create-date>15-JAN-2019</GBSeq_create-date>\
    ///     <GBSeq_primary-accession>MN000001</GBSeq_primary-accession>\
    ///     <GBSeq_accession-version>MN000001.1</GBSeq_accession-version>\
    ///     <GBSeq_organism>Nicotiana tabacum</GBSeq_organism>\
    ///     <GBSeq_taxonomy>Eukaryota; Viridiplantae; Nicotiana</GBSeq_taxonomy>\
    ///     </GBSeq></GBSet>";
    ///
    /// let summary = Summary::from_xml(42, xml)?;
    /// assert_eq!(summary.record().accession(), "MN000001");
    /// assert_eq!(summary.record().create_date(), "2019-01-15");
    /// assert!(summary.duplicate().is_none());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_xml(uid: u64, xml: &str) -> std::result::Result<Self, ParseError> {
        let set: GbSetXml = quick_xml::de::from_str(xml).map_err(ParseError::Xml)?;
        let seq = set.sequences.into_iter().next().ok_or(ParseError::Empty)?;

        let accession = seq
            .primary_accession
            .ok_or(ParseError::MissingElement("GBSeq_primary-accession"))?;
        let length = seq
            .length
            .ok_or(ParseError::MissingElement("GBSeq_length"))?;

        let version = seq
            .accession_version
            .as_deref()
            .and_then(|value| value.split_once('.'))
            .map(|(_, version)| version.to_string())
            .unwrap_or_default();

        let create_date = match seq.create_date.as_deref() {
            Some(date) => accession::normalize_date(date).map_err(ParseError::Date)?,
            None => String::new(),
        };

        let reference = seq
            .references
            .map(|references| references.references)
            .unwrap_or_default()
            .into_iter()
            .find(|reference| {
                reference
                    .authors
                    .as_ref()
                    .is_some_and(|authors| !authors.authors.is_empty())
            });

        let (authors, title, journal) = match reference {
            Some(reference) => (
                reference
                    .authors
                    .map(|authors| authors.authors.join(","))
                    .unwrap_or_default(),
                reference.title.unwrap_or_default(),
                reference.journal.unwrap_or_default(),
            ),
            None => Default::default(),
        };

        let duplicate = if accession.starts_with(REFSEQ_PREFIX) {
            seq.comment
                .as_deref()
                .and_then(identical_accession)
                .map(|duplicate| Duplicate::new(accession.clone(), duplicate))
        } else {
            None
        };

        let note = duplicate
            .as_ref()
            .map(|pair| {
                format!(
                    "The REFSEQ accession '{}' is identical to accession '{}'.",
                    pair.refseq(),
                    pair.duplicate()
                )
            })
            .unwrap_or_default();

        let record = Builder::default()
            .uid(uid)
            .accession(&accession)
            .version(version)
            .organism(seq.organism.unwrap_or_default())
            .sequence_length(length)
            .create_date(create_date)
            .authors(authors)
            .title(title)
            .reference(journal)
            .note(note)
            .taxonomy(seq.taxonomy.unwrap_or_default())
            .try_build()
            .map_err(ParseError::Record)?;

        Ok(Self { record, duplicate })
    }

    /// Gets the availability record.
    pub fn record(&self) -> &accession::Record {
        &self.record
    }

    /// Gets the duplicate pair, if any.
    pub fn duplicate(&self) -> Option<&Duplicate> {
        self.duplicate.as_ref()
    }

    /// Consumes `self` to return the record and the duplicate pair.
    pub fn into_parts(self) -> (accession::Record, Option<Duplicate>) {
        (self.record, self.duplicate)
    }
}

/// Finds the accession that a RefSeq comment declares identical.
fn identical_accession(comment: &str) -> Option<String> {
    comment
        .split(';')
        .filter(|part| IDENTICAL_MARKERS.iter().any(|marker| part.contains(marker)))
        .filter_map(|part| part.split_whitespace().last())
        .map(|word| word.trim_end_matches(['.', ',']).to_string())
        .filter(|word| !word.is_empty())
        .last()
}

////////////////////////////////////////////////////////////////////////////////////////
// Client
////////////////////////////////////////////////////////////////////////////////////////

/// A builder for a [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    /// The base URL.
    base_url: String,

    /// The API key.
    api_key: Option<String>,

    /// The contact e-mail address.
    email: Option<String>,

    /// The number of attempts per request.
    attempts: usize,

    /// The delay before the first retry.
    backoff: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            email: None,
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl ClientBuilder {
    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    /// Sets the contact e-mail address.
    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the number of attempts per request (at least one).
    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the delay before the first retry.
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Consumes `self` to attempt to build a [`Client`].
    pub fn try_build(self) -> Result<Client> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(TOOL)
            .build()
            .map_err(Error::Http)?;

        let delay = if self.api_key.is_some() {
            DELAY_WITH_KEY
        } else {
            DELAY_WITHOUT_KEY
        };

        Ok(Client {
            http,
            base_url: self.base_url,
            api_key: self.api_key,
            email: self.email,
            attempts: self.attempts,
            backoff: self.backoff,
            delay,
            last_request: None,
        })
    }
}

/// A blocking E-utilities client that honours the NCBI request rate.
#[derive(Debug)]
pub struct Client {
    /// The HTTP client.
    http: reqwest::blocking::Client,

    /// The base URL.
    base_url: String,

    /// The API key.
    api_key: Option<String>,

    /// The contact e-mail address.
    email: Option<String>,

    /// The number of attempts per request.
    attempts: usize,

    /// The delay before the first retry.
    backoff: Duration,

    /// The spacing between requests.
    delay: Duration,

    /// When the last request was sent.
    last_request: Option<Instant>,
}

impl Client {
    /// Gets a builder with the default settings.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Searches the nucleotide database and returns the matching UIDs.
    ///
    /// Results are sorted by release date with the oldest record first.
    /// `min_date` (`YYYY/MM/DD`) limits the search to records published on
    /// or after that date.
    pub fn esearch(&mut self, term: &str, min_date: Option<&str>) -> Result<Vec<u64>> {
        let mut params = vec![
            ("db", DATABASE.to_string()),
            ("term", term.to_string()),
            ("sort", String::from("Date Released")),
            ("retmax", MAX_UIDS.to_string()),
            ("retmode", String::from("xml")),
        ];

        if let Some(min_date) = min_date {
            params.push(("datetype", String::from("pdat")));
            params.push(("mindate", min_date.to_string()));
            params.push(("maxdate", String::from("3000")));
        }

        let body = self.get("esearch.fcgi", &params)?;
        let mut uids = parse_uids(&body).map_err(Error::Parse)?;

        // Newest first from NCBI.
        uids.reverse();
        Ok(uids)
    }

    /// Fetches the summary of one UID.
    pub fn summary(&mut self, uid: u64) -> Result<Summary> {
        let body = self.efetch(&uid.to_string(), "xml")?;
        Summary::from_xml(uid, &body).map_err(Error::Parse)
    }

    /// Fetches the GenBank flat file of an accession.
    pub fn genbank(&mut self, accession: &str) -> Result<String> {
        self.efetch(accession, "text")
    }

    /// Calls `efetch` for one identifier in GenBank format.
    fn efetch(&mut self, id: &str, mode: &str) -> Result<String> {
        let params = vec![
            ("db", DATABASE.to_string()),
            ("id", id.to_string()),
            ("rettype", String::from("gb")),
            ("retmode", mode.to_string()),
        ];

        self.get("efetch.fcgi", &params)
    }

    /// Sends a GET request, retrying with a linear backoff.
    fn get(&mut self, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut params = params.to_vec();
        params.push(("tool", TOOL.to_string()));
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        if let Some(api_key) = &self.api_key {
            params.push(("api_key", api_key.clone()));
        }

        let mut attempt = 1;
        loop {
            self.throttle();

            match self.send(&url, endpoint, &params) {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.attempts && is_transient(&err) => {
                    thread::sleep(self.backoff * attempt as u32);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Sends one request.
    fn send(&self, url: &str, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .map_err(Error::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status, endpoint.to_string()));
        }

        let body = response.text().map_err(Error::Http)?;
        if body.trim().is_empty() {
            return Err(Error::EmptyBody(endpoint.to_string()));
        }

        Ok(body)
    }

    /// Waits until the next request is allowed.
    fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }

        self.last_request = Some(Instant::now());
    }
}

/// Returns whether a failed request is worth retrying.
fn is_transient(err: &Error) -> bool {
    match err {
        Error::Http(_) | Error::EmptyBody(_) => true,
        Error::Status(status, _) => {
            status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        }
        Error::Parse(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFSEQ: &str = "<?xml version=\"1.0\"?>
<GBSet>
  <GBSeq>
    <GBSeq_locus>NC_000001</GBSeq_locus>
    <GBSeq_length>160000</GBSeq_length>
    <GBSeq_create-date>03-MAR-2020</GBSeq_create-date>
    <GBSeq_definition>Test plastid, complete genome.</GBSeq_definition>
    <GBSeq_primary-accession>NC_000001</GBSeq_primary-accession>
    <GBSeq_accession-version>NC_000001.2</GBSeq_accession-version>
    <GBSeq_organism>Test plastid</GBSeq_organism>
    <GBSeq_taxonomy>Eukaryota; Viridiplantae; Testia</GBSeq_taxonomy>
    <GBSeq_references>
      <GBReference>
        <GBReference_reference>1</GBReference_reference>
        <GBReference_title>Direct Submission</GBReference_title>
        <GBReference_journal>Unpublished</GBReference_journal>
      </GBReference>
      <GBReference>
        <GBReference_reference>2</GBReference_reference>
        <GBReference_authors>
          <GBAuthor>Doe,J.</GBAuthor>
          <GBAuthor>Roe,R.</GBAuthor>
        </GBReference_authors>
        <GBReference_title>The plastid genome of Testia</GBReference_title>
        <GBReference_journal>J. Plastids 1, 1-10 (2020)</GBReference_journal>
      </GBReference>
    </GBSeq_references>
    <GBSeq_comment>PROVISIONAL REFSEQ: This record has not yet been subject to final NCBI review. The reference sequence is identical to MN000001.</GBSeq_comment>
  </GBSeq>
</GBSet>";

    #[test]
    fn refseq_summary() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let summary = Summary::from_xml(7, REFSEQ)?;
        let record = summary.record();

        assert_eq!(record.uid(), 7);
        assert_eq!(record.accession(), "NC_000001");
        assert_eq!(record.version(), "2");
        assert_eq!(record.sequence_length(), 160_000);
        assert_eq!(record.create_date(), "2020-03-03");
        assert_eq!(record.authors(), "Doe,J.,Roe,R.");
        assert_eq!(record.title(), "The plastid genome of Testia");
        assert_eq!(record.reference(), "J. Plastids 1, 1-10 (2020)");
        assert_eq!(record.genus(), Some("Testia"));
        assert_eq!(
            record.note(),
            "The REFSEQ accession 'NC_000001' is identical to accession 'MN000001'."
        );
        assert_eq!(
            summary.duplicate(),
            Some(&Duplicate::new("NC_000001", "MN000001"))
        );
        Ok(())
    }

    #[test]
    fn it_ignores_comments_of_non_refseq_records() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let xml = REFSEQ.replace("NC_000001", "MN000002");
        let summary = Summary::from_xml(7, &xml)?;

        assert!(summary.duplicate().is_none());
        assert_eq!(summary.record().note(), "");
        Ok(())
    }

    #[test]
    fn it_fails_to_parse_incomplete_summaries() {
        let err = Summary::from_xml(1, "<GBSet></GBSet>").unwrap_err();
        assert_eq!(err.to_string(), "no GBSeq element found");

        let err = Summary::from_xml(1, "<GBSet><GBSeq><GBSeq_length>5</GBSeq_length></GBSeq></GBSet>")
            .unwrap_err();
        assert_eq!(err.to_string(), "missing element: GBSeq_primary-accession");
    }

    #[test]
    fn uids() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>
<!DOCTYPE eSearchResult PUBLIC \"-//NLM//DTD esearch 20060628//EN\" \"https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd\">
<eSearchResult><Count>0</Count><RetMax>0</RetMax><RetStart>0</RetStart><IdList/></eSearchResult>";
        assert_eq!(parse_uids(xml).unwrap(), Vec::<u64>::new());

        let err = parse_uids("<eSearchResult><IdList><Id>x</Id></IdList></eSearchResult>").unwrap_err();
        assert_eq!(err.to_string(), "invalid uid: \"x\"");
    }

    #[test]
    fn identical_accessions() {
        assert_eq!(
            identical_accession("some text; The reference sequence is identical to KX000003."),
            Some(String::from("KX000003"))
        );
        assert_eq!(identical_accession("COMPLETENESS: full length."), None);
    }
}
