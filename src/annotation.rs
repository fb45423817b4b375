//! Typed feature annotations.
//!
//! GenBank features are loosely-typed bags of qualifiers. Before any inverted
//! repeat heuristics run, each feature is converted into an [`Annotation`]:
//! a [`Kind`] tag, an [`Interval`], a [`Strand`], and the handful of
//! [`Qualifiers`] that matter for locating inverted repeats.

use gb_io::seq::Feature;
use gb_io::seq::Location;
use omics::coordinate::Strand;

use crate::interval;
use crate::Interval;

/// The feature key for repeat regions.
pub const REPEAT_REGION: &str = "repeat_region";

/// The feature key for miscellaneous features.
pub const MISC_FEATURE: &str = "misc_feature";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to converting a feature into an [`Annotation`].
#[derive(Debug)]
pub enum Error {
    /// The location kind cannot be expressed as a single interval.
    UnsupportedLocation(String),

    /// The location contained no ranges.
    EmptyLocation,

    /// A negative coordinate was encountered.
    NegativeCoordinate(i64),

    /// An invalid interval.
    Interval(interval::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedLocation(kind) => write!(f, "unsupported location: {kind}"),
            Error::EmptyLocation => write!(f, "location contains no ranges"),
            Error::NegativeCoordinate(value) => write!(f, "negative coordinate: {value}"),
            Error::Interval(err) => write!(f, "interval error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Kinds and qualifiers
////////////////////////////////////////////////////////////////////////////////////////

/// The kind of an annotation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Kind {
    /// A `repeat_region` feature.
    RepeatRegion,

    /// A `misc_feature` feature.
    MiscFeature,

    /// Any other feature key.
    Other(String),
}

impl From<&str> for Kind {
    fn from(value: &str) -> Self {
        match value {
            REPEAT_REGION => Kind::RepeatRegion,
            MISC_FEATURE => Kind::MiscFeature,
            other => Kind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::RepeatRegion => write!(f, "{REPEAT_REGION}"),
            Kind::MiscFeature => write!(f, "{MISC_FEATURE}"),
            Kind::Other(key) => write!(f, "{key}"),
        }
    }
}

/// The value of an `rpt_type` qualifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RepeatType {
    /// `rpt_type=inverted`.
    Inverted,

    /// Any other repeat type.
    Other(String),
}

impl From<&str> for RepeatType {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("inverted") {
            RepeatType::Inverted
        } else {
            RepeatType::Other(value.to_string())
        }
    }
}

/// The qualifiers of an annotation that are consulted when locating inverted
/// repeats.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Qualifiers {
    /// The first `note` qualifier.
    note: Option<String>,

    /// The first `rpt_type` qualifier.
    rpt_type: Option<RepeatType>,

    /// The first `standard_name` qualifier.
    standard_name: Option<String>,

    /// Whether the feature is flagged as `pseudo` or `pseudogene`.
    pseudo: bool,
}

impl Qualifiers {
    /// Sets the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets the repeat type.
    pub fn with_rpt_type(mut self, rpt_type: RepeatType) -> Self {
        self.rpt_type = Some(rpt_type);
        self
    }

    /// Sets the standard name.
    pub fn with_standard_name(mut self, standard_name: impl Into<String>) -> Self {
        self.standard_name = Some(standard_name.into());
        self
    }

    /// Sets the pseudo flag.
    pub fn with_pseudo(mut self, pseudo: bool) -> Self {
        self.pseudo = pseudo;
        self
    }

    /// Gets the note.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Gets the repeat type.
    pub fn rpt_type(&self) -> Option<&RepeatType> {
        self.rpt_type.as_ref()
    }

    /// Gets the standard name.
    pub fn standard_name(&self) -> Option<&str> {
        self.standard_name.as_deref()
    }

    /// Whether the feature is a pseudo feature.
    pub fn is_pseudo(&self) -> bool {
        self.pseudo
    }

    /// Collects the qualifiers from a GenBank feature.
    fn from_feature(feature: &Feature) -> Self {
        let first = |key: &str| {
            feature
                .qualifier_values(key.into())
                .next()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let pseudo = feature.qualifiers.iter().any(|(key, _)| {
            let key = key.to_string();
            key == "pseudo" || key == "pseudogene"
        });

        Self {
            note: first("note"),
            rpt_type: first("rpt_type").map(|value| RepeatType::from(value.as_str())),
            standard_name: first("standard_name"),
            pseudo,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Annotation
////////////////////////////////////////////////////////////////////////////////////////

/// A typed feature annotation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Annotation {
    /// The kind.
    kind: Kind,

    /// The interval covered by the feature.
    interval: Interval,

    /// The strand.
    strand: Strand,

    /// The qualifiers.
    qualifiers: Qualifiers,
}

impl Annotation {
    /// Creates a new annotation.
    ///
    /// # Examples
    ///
    /// ```
    /// use omics::coordinate::Strand;
    /// use plastome_ir::annotation::Annotation;
    /// use plastome_ir::annotation::Kind;
    /// use plastome_ir::annotation::Qualifiers;
    /// use plastome_ir::Interval;
    ///
    /// let annotation = Annotation::new(
    ///     Kind::RepeatRegion,
    ///     Interval::try_new(1, 25_000)?,
    ///     Strand::Positive,
    ///     Qualifiers::default().with_note("inverted repeat B"),
    /// );
    ///
    /// assert_eq!(annotation.kind(), &Kind::RepeatRegion);
    /// assert_eq!(annotation.qualifiers().note(), Some("inverted repeat B"));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(kind: Kind, interval: Interval, strand: Strand, qualifiers: Qualifiers) -> Self {
        Self {
            kind,
            interval,
            strand,
            qualifiers,
        }
    }

    /// Attempts to convert a GenBank feature into an annotation.
    pub fn try_from_feature(feature: &Feature) -> Result<Self> {
        let (interval, strand) = resolve_location(&feature.location)?;

        Ok(Self {
            kind: Kind::from(feature.kind.to_string().as_str()),
            interval,
            strand,
            qualifiers: Qualifiers::from_feature(feature),
        })
    }

    /// Gets the kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Gets the interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the qualifiers.
    pub fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    /// Gets the lowercased note, if one exists.
    pub fn note_lowercase(&self) -> Option<String> {
        self.qualifiers.note().map(|note| note.to_lowercase())
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Locations
////////////////////////////////////////////////////////////////////////////////////////

/// A single 1-based, fully-closed range and the strand it lies on.
type Piece = (usize, usize, Strand);

/// Converts a 0-based coordinate from `gb-io` into a 1-based position.
fn one_based(value: i64) -> Result<usize> {
    usize::try_from(value)
        .map(|value| value + 1)
        .map_err(|_| Error::NegativeCoordinate(value))
}

/// Collects the ranges of a location in the order they are listed.
fn collect_pieces(location: &Location, strand: Strand, pieces: &mut Vec<Piece>) -> Result<()> {
    match location {
        Location::Range((from, _), (to, _)) => {
            // `gb-io` ranges are half-open, so the exclusive end is already
            // the 1-based, inclusive end.
            let start = one_based(*from)?;
            let end = usize::try_from(*to).map_err(|_| Error::NegativeCoordinate(*to))?;
            pieces.push((start, end.max(start), strand));
        }
        Location::Between(from, to) => {
            pieces.push((one_based(*from)?, one_based(*to)?, strand));
        }
        Location::Complement(inner) => {
            let strand = match strand {
                Strand::Positive => Strand::Negative,
                Strand::Negative => Strand::Positive,
            };
            collect_pieces(inner, strand, pieces)?;
        }
        Location::Join(parts) | Location::Order(parts) => {
            for part in parts {
                collect_pieces(part, strand, pieces)?;
            }
        }
        Location::OneOf(parts) => match parts.first() {
            Some(part) => collect_pieces(part, strand, pieces)?,
            None => return Err(Error::EmptyLocation),
        },
        Location::Bond(_) => return Err(Error::UnsupportedLocation(String::from("bond"))),
        Location::External(accession, _) => {
            return Err(Error::UnsupportedLocation(format!(
                "external reference to {accession}"
            )))
        }
        Location::Gap(_) => return Err(Error::UnsupportedLocation(String::from("gap"))),
    }

    Ok(())
}

/// Resolves a location into a single (possibly wrapping) interval.
///
/// The interval runs from the start of the first listed range to the end of
/// the last listed range. A join such as `join(150001..151000,1..500)` thus
/// becomes the wrapping interval `150001..500`. Ranges on the negative strand
/// are listed from the highest to the lowest position, so their order is
/// reversed first.
fn resolve_location(location: &Location) -> Result<(Interval, Strand)> {
    let mut pieces = Vec::new();
    collect_pieces(location, Strand::Positive, &mut pieces)?;

    let negative = pieces
        .iter()
        .all(|(_, _, strand)| *strand == Strand::Negative);
    if negative {
        pieces.reverse();
    }

    let (start, _, _) = pieces.first().ok_or(Error::EmptyLocation)?;
    let (_, end, _) = pieces.last().ok_or(Error::EmptyLocation)?;

    let strand = if negative {
        Strand::Negative
    } else {
        Strand::Positive
    };

    let interval = Interval::try_new(*start, *end).map_err(Error::Interval)?;
    Ok((interval, strand))
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use gb_io::seq::After;
    use gb_io::seq::Before;

    use super::*;

    fn feature(kind: &str, location: Location, qualifiers: &[(&str, Option<&str>)]) -> Feature {
        Feature {
            kind: Cow::from(kind.to_string()),
            location,
            qualifiers: qualifiers
                .iter()
                .map(|(key, value)| {
                    (
                        Cow::from(key.to_string()),
                        value.map(|v| v.to_string()),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn simple_range() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let feature = feature(
            "repeat_region",
            Location::simple_range(0, 25_000),
            &[("rpt_type", Some("inverted")), ("note", Some("IRb"))],
        );

        let annotation = Annotation::try_from_feature(&feature)?;
        assert_eq!(annotation.kind(), &Kind::RepeatRegion);
        assert_eq!(annotation.interval(), &Interval::try_new(1, 25_000)?);
        assert_eq!(annotation.strand(), Strand::Positive);
        assert_eq!(
            annotation.qualifiers().rpt_type(),
            Some(&RepeatType::Inverted)
        );
        assert_eq!(annotation.qualifiers().note(), Some("IRb"));
        assert!(!annotation.qualifiers().is_pseudo());
        Ok(())
    }

    #[test]
    fn wrapping_join() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let location = Location::Join(vec![
            Location::simple_range(150_000, 151_000),
            Location::simple_range(0, 500),
        ]);
        let feature = feature("misc_feature", location, &[("note", Some("IRa"))]);

        let annotation = Annotation::try_from_feature(&feature)?;
        assert_eq!(annotation.kind(), &Kind::MiscFeature);
        assert_eq!(annotation.interval(), &Interval::try_new(150_001, 500)?);
        assert!(annotation.interval().wraps());
        Ok(())
    }

    #[test]
    fn complement_join() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let location = Location::Join(vec![
            Location::Complement(Box::new(Location::simple_range(100, 200))),
            Location::Complement(Box::new(Location::simple_range(0, 50))),
        ]);
        let feature = feature("repeat_region", location, &[("pseudo", None)]);

        let annotation = Annotation::try_from_feature(&feature)?;
        assert_eq!(annotation.interval(), &Interval::try_new(1, 200)?);
        assert_eq!(annotation.strand(), Strand::Negative);
        assert!(annotation.qualifiers().is_pseudo());
        Ok(())
    }

    #[test]
    fn partial_range() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let location = Location::Range((9, Before(true)), (20, After(true)));
        let feature = feature("gene", location, &[]);

        let annotation = Annotation::try_from_feature(&feature)?;
        assert_eq!(annotation.kind(), &Kind::Other(String::from("gene")));
        assert_eq!(annotation.interval(), &Interval::try_new(10, 20)?);
        Ok(())
    }

    #[test]
    fn unsupported_location() {
        let location = Location::External(String::from("J00194.1"), None);
        let feature = feature("misc_feature", location, &[]);

        let err = Annotation::try_from_feature(&feature).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported location: external reference to J00194.1"
        );
    }
}
