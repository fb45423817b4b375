//! Extraction of the reported inverted repeats from a record's annotations.
//!
//! Annotators mark the inverted repeats of a plastid genome in many different
//! ways. The [`Extractor`] tries the following sources in order, each step only
//! filling the roles (IRa and/or IRb) that are still missing:
//!
//! 1. `repeat_region` features with `rpt_type=inverted`.
//! 2. `repeat_region` features without an `rpt_type` whose note names an IR.
//! 3. `misc_feature` features (excluding pseudo features) whose note names an
//!    IR.
//! 4. The [junctions](junction) between the repeats and the single-copy
//!    regions.
//! 5. The complement of the large and small single-copy regions.
//!
//! Extraction never fails. Anything noteworthy along the way is reported as a
//! [`Finding`] on the resulting [`Extraction`].

use std::sync::LazyLock;

use regex::Regex;

use crate::annotation::Annotation;
use crate::annotation::Kind;
use crate::annotation::RepeatType;
use crate::genbank::Record;
use crate::Interval;

pub mod junction;

use junction::Junctions;

/// The default minimum length of an inverted repeat.
pub const DEFAULT_MIN_LENGTH: usize = 1_000;

/// Features whose notes name an IR must be longer than this to be considered.
const MIN_NAMED_FEATURE_LENGTH: usize = 100;

/// Note identifiers for IRa.
static IRA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ira|inverted repeat a").expect("regex to compile"));

/// Note identifiers for IRb.
static IRB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"irb|inverted repeat b").expect("regex to compile"));

/// Note identifiers for either inverted repeat. Matched against the note as
/// written, so `IR` must be upper case.
static ANY_IR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:inverted.*repeat|repeat.*inverted)|IR").expect("regex to compile")
});

/// Note identifiers for junction features.
static JUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"jlb|jsb|jsa|jla|junction").expect("regex to compile"));

/// Note identifiers for the large single-copy region.
static LSC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lsc|large single copy").expect("regex to compile"));

/// Note identifiers for the small single-copy region.
static SSC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ssc|small single copy").expect("regex to compile"));

////////////////////////////////////////////////////////////////////////////////////////
// Configuration
////////////////////////////////////////////////////////////////////////////////////////

/// Configuration for an [`Extractor`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The minimum length of an inverted repeat.
    min_length: usize,
}

impl Config {
    /// Sets the minimum length of an inverted repeat.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Gets the minimum length of an inverted repeat.
    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Results
////////////////////////////////////////////////////////////////////////////////////////

/// The role of an inverted repeat.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Role {
    /// Inverted repeat A (between the small and the large single-copy region).
    IRa,

    /// Inverted repeat B (between the large and the small single-copy region).
    IRb,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::IRa => write!(f, "IRa"),
            Role::IRb => write!(f, "IRb"),
        }
    }
}

/// Where the coordinates of an inverted repeat came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    /// A `repeat_region` feature.
    RepeatRegion,

    /// A `misc_feature` feature.
    MiscFeature,

    /// The junctions between the repeats and the single-copy regions.
    Junctions,

    /// The complement of the single-copy regions.
    SingleCopyComplement,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::RepeatRegion => write!(f, "repeat_region"),
            Source::MiscFeature => write!(f, "misc_feature"),
            Source::Junctions => write!(f, "junctions"),
            Source::SingleCopyComplement => write!(f, "single-copy complement"),
        }
    }
}

/// A reported inverted repeat.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvertedRepeat {
    /// The interval.
    interval: Interval,

    /// The length.
    length: usize,

    /// The source.
    source: Source,
}

impl InvertedRepeat {
    /// Creates a new inverted repeat.
    pub fn new(interval: Interval, length: usize, source: Source) -> Self {
        Self {
            interval,
            length,
            source,
        }
    }

    /// Gets the interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Gets the length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Gets the source.
    pub fn source(&self) -> Source {
        self.source
    }
}

/// A pair of reported inverted repeats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IrPair {
    /// IRa.
    ira: InvertedRepeat,

    /// IRb.
    irb: InvertedRepeat,
}

impl IrPair {
    /// Creates a new pair.
    pub fn new(ira: InvertedRepeat, irb: InvertedRepeat) -> Self {
        Self { ira, irb }
    }

    /// Gets IRa.
    pub fn ira(&self) -> &InvertedRepeat {
        &self.ira
    }

    /// Gets IRb.
    pub fn irb(&self) -> &InvertedRepeat {
        &self.irb
    }

    /// Gets the reported length of the pair: the mean of both lengths, rounded
    /// half up.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::extract::InvertedRepeat;
    /// use plastome_ir::extract::IrPair;
    /// use plastome_ir::extract::Source;
    /// use plastome_ir::Interval;
    ///
    /// let ira = InvertedRepeat::new(Interval::try_new(1, 25_000)?, 25_000, Source::RepeatRegion);
    /// let irb = InvertedRepeat::new(Interval::try_new(1, 25_001)?, 25_001, Source::RepeatRegion);
    ///
    /// assert_eq!(IrPair::new(ira, irb).length(), 25_001);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn length(&self) -> usize {
        mean_length(self.ira.length, self.irb.length)
    }
}

/// Gets the mean of two lengths, rounded half up.
pub fn mean_length(a: usize, b: usize) -> usize {
    (a + b).div_ceil(2)
}

/// Something noteworthy that happened during extraction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Finding {
    /// No inverted repeat could be located.
    MissingAnnotation(String),

    /// More than two candidate repeat features were found. The two of most
    /// similar length were kept.
    AmbiguousAnnotation {
        /// The number of candidates.
        candidates: usize,

        /// The intervals of the kept candidates.
        kept: (Interval, Interval),
    },

    /// An inverted repeat was shorter than the minimum length and discarded.
    DiscardedShortRepeat {
        /// The role.
        role: Role,

        /// The interval.
        interval: Interval,

        /// The length.
        length: usize,
    },

    /// A feature lies outside of the sequence and was ignored.
    OutOfBounds(Interval),

    /// A junction feature whose type could not be determined.
    AmbiguousJunction(Interval),

    /// Features whose locations could not be read.
    UnreadableFeatures(usize),
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::MissingAnnotation(reason) => write!(f, "missing annotation: {reason}"),
            Finding::AmbiguousAnnotation { candidates, kept } => write!(
                f,
                "ambiguous annotation: {candidates} candidate repeats, kept {} and {}",
                kept.0, kept.1
            ),
            Finding::DiscardedShortRepeat {
                role,
                interval,
                length,
            } => write!(
                f,
                "discarded {role} at {interval}: too short ({length} bp)"
            ),
            Finding::OutOfBounds(interval) => {
                write!(f, "feature at {interval} lies outside of the sequence")
            }
            Finding::AmbiguousJunction(interval) => {
                write!(f, "junction at {interval} could not be typed")
            }
            Finding::UnreadableFeatures(count) => {
                write!(f, "{count} feature(s) with unreadable locations were skipped")
            }
        }
    }
}

/// The result of extracting the inverted repeats from a record.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Extraction {
    /// IRa, if found.
    ira: Option<InvertedRepeat>,

    /// IRb, if found.
    irb: Option<InvertedRepeat>,

    /// The findings.
    findings: Vec<Finding>,
}

impl Extraction {
    /// Gets IRa, if found.
    pub fn ira(&self) -> Option<&InvertedRepeat> {
        self.ira.as_ref()
    }

    /// Gets IRb, if found.
    pub fn irb(&self) -> Option<&InvertedRepeat> {
        self.irb.as_ref()
    }

    /// Gets the findings.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Gets both inverted repeats if both were found.
    pub fn pair(&self) -> Option<IrPair> {
        Some(IrPair::new(self.ira?, self.irb?))
    }

    /// Gets the inverted repeat with the given role.
    pub fn get(&self, role: Role) -> Option<&InvertedRepeat> {
        match role {
            Role::IRa => self.ira(),
            Role::IRb => self.irb(),
        }
    }

    /// Returns whether both roles are filled.
    fn is_complete(&self) -> bool {
        self.ira.is_some() && self.irb.is_some()
    }

    /// Fills a role if it is still empty.
    fn fill(&mut self, role: Role, repeat: InvertedRepeat) -> bool {
        let slot = match role {
            Role::IRa => &mut self.ira,
            Role::IRb => &mut self.irb,
        };

        if slot.is_some() {
            return false;
        }

        *slot = Some(repeat);
        true
    }

    /// Fills the first empty role, IRb first.
    fn fill_next(&mut self, repeat: InvertedRepeat) -> bool {
        self.fill(Role::IRb, repeat) || self.fill(Role::IRa, repeat)
    }

    /// Discards every inverted repeat shorter than `min_length`.
    fn discard_short(&mut self, min_length: usize) {
        for role in [Role::IRa, Role::IRb] {
            let slot = match role {
                Role::IRa => &mut self.ira,
                Role::IRb => &mut self.irb,
            };

            if let Some(repeat) = slot.take_if(|repeat| repeat.length < min_length) {
                self.findings.push(Finding::DiscardedShortRepeat {
                    role,
                    interval: repeat.interval,
                    length: repeat.length,
                });
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Extractor
////////////////////////////////////////////////////////////////////////////////////////

/// A candidate feature together with its length.
type Candidate<'a> = (&'a Annotation, usize);

/// Extracts the reported inverted repeats from records.
#[derive(Clone, Debug, Default)]
pub struct Extractor {
    /// The configuration.
    config: Config,
}

impl Extractor {
    /// Creates a new extractor.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extracts the inverted repeats from a record.
    ///
    /// # Examples
    ///
    /// ```
    /// use omics::coordinate::Strand;
    /// use plastome_ir::annotation::Annotation;
    /// use plastome_ir::annotation::Kind;
    /// use plastome_ir::annotation::Qualifiers;
    /// use plastome_ir::annotation::RepeatType;
    /// use plastome_ir::extract::Extractor;
    /// use plastome_ir::genbank::Record;
    /// use plastome_ir::genbank::Topology;
    /// use plastome_ir::Interval;
    ///
    /// let repeat = |start, end| -> Result<Annotation, Box<dyn std::error::Error>> {
    ///     Ok(Annotation::new(
    ///         Kind::RepeatRegion,
    ///         Interval::try_new(start, end)?,
    ///         Strand::Positive,
    ///         Qualifiers::default().with_rpt_type(RepeatType::Inverted),
    ///     ))
    /// };
    ///
    /// let record = Record::new(
    ///     "NC_000001",
    ///     160_000,
    ///     Topology::Circular,
    ///     vec![repeat(1, 25_000)?, repeat(130_001, 155_000)?],
    /// );
    ///
    /// let extraction = Extractor::default().extract(&record);
    /// let pair = extraction.pair().unwrap();
    ///
    /// assert_eq!(pair.irb().interval(), &Interval::try_new(1, 25_000)?);
    /// assert_eq!(pair.ira().interval(), &Interval::try_new(130_001, 155_000)?);
    /// assert_eq!(pair.length(), 25_000);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn extract(&self, record: &Record) -> Extraction {
        let mut extraction = Extraction::default();

        if record.skipped_features() > 0 {
            extraction
                .findings
                .push(Finding::UnreadableFeatures(record.skipped_features()));
        }

        let length = record.length();
        let repeat_regions = measure(
            record.annotations_of(Kind::RepeatRegion),
            length,
            &mut extraction,
        );
        let misc_features = measure(
            record.annotations_of(Kind::MiscFeature),
            length,
            &mut extraction,
        );

        if repeat_regions.is_empty() && misc_features.is_empty() {
            extraction.findings.push(Finding::MissingAnnotation(String::from(
                "record has no repeat_region or misc_feature features",
            )));
            return extraction;
        }

        let misc_features_no_pseudo = misc_features
            .iter()
            .filter(|(annotation, _)| !annotation.qualifiers().is_pseudo())
            .copied()
            .collect::<Vec<_>>();

        self.from_inverted_repeat_regions(&repeat_regions, &mut extraction);

        if !extraction.is_complete() {
            from_named_repeat_regions(&repeat_regions, &mut extraction);
        }
        extraction.discard_short(self.config.min_length);

        if !extraction.is_complete() {
            from_named_misc_features(&misc_features_no_pseudo, &mut extraction);
            extraction.discard_short(self.config.min_length);
        }

        if !extraction.is_complete() {
            from_junctions(&misc_features, length, &mut extraction);
            extraction.discard_short(self.config.min_length);
        }

        if !extraction.is_complete() {
            from_single_copy_regions(&misc_features_no_pseudo, length, &mut extraction);
            extraction.discard_short(self.config.min_length);
        }

        if extraction.ira.is_none() && extraction.irb.is_none() {
            extraction.findings.push(Finding::MissingAnnotation(String::from(
                "annotations are insufficient to locate either inverted repeat",
            )));
        }

        extraction
    }

    /// Fills roles from `repeat_region` features with `rpt_type=inverted`.
    fn from_inverted_repeat_regions(
        &self,
        repeat_regions: &[Candidate<'_>],
        extraction: &mut Extraction,
    ) {
        let mut candidates = repeat_regions
            .iter()
            .filter(|(annotation, length)| {
                annotation.qualifiers().rpt_type() == Some(&RepeatType::Inverted)
                    && *length > self.config.min_length
            })
            .copied()
            .collect::<Vec<_>>();

        disambiguate(&mut candidates, extraction);

        let mut unlabelled = Vec::new();

        for (annotation, length) in candidates {
            let repeat = InvertedRepeat::new(*annotation.interval(), length, Source::RepeatRegion);

            let filled = match label(annotation) {
                Some(role) => extraction.fill(role, repeat),
                None => false,
            };

            if !filled {
                unlabelled.push(repeat);
            }
        }

        for repeat in unlabelled {
            extraction.fill_next(repeat);
        }
    }
}

/// Measures each annotation and sorts them by position.
///
/// Annotations that do not fit on the sequence are reported and dropped.
fn measure<'a>(
    annotations: impl Iterator<Item = &'a Annotation>,
    sequence_length: usize,
    extraction: &mut Extraction,
) -> Vec<Candidate<'a>> {
    let mut candidates = Vec::new();

    for annotation in annotations {
        match annotation.interval().len(sequence_length) {
            Ok(length) => candidates.push((annotation, length)),
            Err(_) => extraction
                .findings
                .push(Finding::OutOfBounds(*annotation.interval())),
        }
    }

    candidates.sort_by_key(|(annotation, _)| *annotation.interval());
    candidates
}

/// Determines the role named explicitly by an annotation's note.
fn label(annotation: &Annotation) -> Option<Role> {
    let note = annotation.note_lowercase()?;

    if IRA.is_match(&note) {
        Some(Role::IRa)
    } else if IRB.is_match(&note) {
        Some(Role::IRb)
    } else {
        None
    }
}

/// Returns whether an annotation's note names an inverted repeat without
/// saying which.
fn names_any_ir(annotation: &Annotation) -> bool {
    annotation
        .qualifiers()
        .note()
        .map(|note| ANY_IR.is_match(note))
        .unwrap_or(false)
}

/// Returns whether an annotation's note mentions a junction.
fn names_junction(annotation: &Annotation) -> bool {
    annotation
        .note_lowercase()
        .map(|note| JUNCTION.is_match(&note))
        .unwrap_or(false)
}

/// Selects the two candidates whose lengths are closest to each other.
///
/// Ties are broken by the earliest start of the pair. The candidates are
/// expected to be sorted by position, and the pair is returned in that order.
fn closest_pair<'a>(candidates: &[Candidate<'a>]) -> Vec<Candidate<'a>> {
    let mut best: Option<(usize, usize, usize)> = None;

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let difference = candidates[i].1.abs_diff(candidates[j].1);

            if best.map(|(d, _, _)| difference < d).unwrap_or(true) {
                best = Some((difference, i, j));
            }
        }
    }

    match best {
        Some((_, i, j)) => vec![candidates[i], candidates[j]],
        None => candidates.to_vec(),
    }
}

/// Narrows more than two candidates down to the pair with the closest
/// lengths and records the ambiguity.
fn disambiguate(candidates: &mut Vec<Candidate<'_>>, extraction: &mut Extraction) {
    if candidates.len() <= 2 {
        return;
    }

    let total = candidates.len();
    *candidates = closest_pair(candidates);

    if let [(a, _), (b, _)] = candidates.as_slice() {
        extraction.findings.push(Finding::AmbiguousAnnotation {
            candidates: total,
            kept: (*a.interval(), *b.interval()),
        });
    }
}

/// Returns whether an annotation's note names an inverted repeat, with or
/// without its role.
fn names_ir(annotation: &Annotation) -> bool {
    label(annotation).is_some() || names_any_ir(annotation)
}

/// Fills roles from `repeat_region` features without an `rpt_type` whose
/// note names an IR.
fn from_named_repeat_regions(repeat_regions: &[Candidate<'_>], extraction: &mut Extraction) {
    let mut named = repeat_regions
        .iter()
        .filter(|(annotation, _)| {
            annotation.qualifiers().rpt_type().is_none() && names_ir(annotation)
        })
        .copied()
        .collect::<Vec<_>>();

    disambiguate(&mut named, extraction);

    for (annotation, length) in named {
        let repeat = InvertedRepeat::new(*annotation.interval(), length, Source::RepeatRegion);

        match label(annotation) {
            Some(role) => {
                extraction.fill(role, repeat);
            }
            None => {
                extraction.fill_next(repeat);
            }
        }
    }
}

/// Fills roles from `misc_feature` features whose note names an IR.
///
/// Features that mention a junction are never considered. Explicit IRa/IRb
/// identifiers are checked across all features before the generic ones.
fn from_named_misc_features(misc_features: &[Candidate<'_>], extraction: &mut Extraction) {
    let mut named = misc_features
        .iter()
        .filter(|(annotation, length)| {
            !names_junction(annotation)
                && *length > MIN_NAMED_FEATURE_LENGTH
                && names_ir(annotation)
        })
        .copied()
        .collect::<Vec<_>>();

    disambiguate(&mut named, extraction);

    let mut used = Vec::new();

    for (index, (annotation, length)) in named.iter().enumerate() {
        if let Some(role) = label(annotation) {
            let repeat = InvertedRepeat::new(*annotation.interval(), *length, Source::MiscFeature);

            if extraction.fill(role, repeat) {
                used.push(index);
            }
        }
    }

    for (index, (annotation, length)) in named.iter().enumerate() {
        if extraction.is_complete() {
            break;
        }

        if used.contains(&index) || !names_any_ir(annotation) {
            continue;
        }

        let repeat = InvertedRepeat::new(*annotation.interval(), *length, Source::MiscFeature);
        extraction.fill_next(repeat);
    }
}

/// Fills roles from the junctions between the repeats and the single-copy
/// regions.
fn from_junctions(
    misc_features: &[Candidate<'_>],
    sequence_length: usize,
    extraction: &mut Extraction,
) {
    let junctions = Junctions::collect(
        misc_features.iter().map(|(annotation, _)| *annotation),
        sequence_length,
    );

    for interval in junctions.ambiguous() {
        extraction
            .findings
            .push(Finding::AmbiguousJunction(*interval));
    }

    let inferred = [
        (Role::IRb, junctions.irb()),
        (Role::IRa, junctions.ira(sequence_length)),
    ];

    for (role, interval) in inferred {
        if let Some(interval) = interval {
            if let Ok(length) = interval.len(sequence_length) {
                extraction.fill(role, InvertedRepeat::new(interval, length, Source::Junctions));
            }
        }
    }
}

/// Fills roles with the complement of the large and small single-copy
/// regions.
///
/// When the LSC precedes the SSC, the region from the LSC to the SSC is IRb
/// and the region from the SSC back around to the LSC is IRa. Otherwise, the
/// roles are swapped.
fn from_single_copy_regions(
    misc_features: &[Candidate<'_>],
    sequence_length: usize,
    extraction: &mut Extraction,
) {
    let mut lsc = None;
    let mut ssc = None;

    for (annotation, _) in misc_features {
        let note = match annotation.note_lowercase() {
            Some(note) => note,
            None => continue,
        };

        if JUNCTION.is_match(&note) {
            continue;
        }

        if SSC.is_match(&note) {
            ssc = Some(*annotation.interval());
        }

        if LSC.is_match(&note) {
            lsc = Some(*annotation.interval());
        }
    }

    let (lsc, ssc) = match (lsc, ssc) {
        (Some(lsc), Some(ssc)) => (lsc, ssc),
        _ => return,
    };

    let (after_lsc, after_ssc) = if lsc.start() < ssc.start() {
        (Role::IRb, Role::IRa)
    } else {
        (Role::IRa, Role::IRb)
    };

    let gaps = [
        (after_lsc, lsc.gap_until(&ssc, sequence_length)),
        (after_ssc, ssc.gap_until(&lsc, sequence_length)),
    ];

    for (role, gap) in gaps {
        if let Some(interval) = gap {
            if let Ok(length) = interval.len(sequence_length) {
                extraction.fill(
                    role,
                    InvertedRepeat::new(interval, length, Source::SingleCopyComplement),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use omics::coordinate::Strand;

    use super::*;
    use crate::annotation::Qualifiers;
    use crate::genbank::Topology;

    fn annotation(kind: Kind, start: usize, end: usize, qualifiers: Qualifiers) -> Annotation {
        Annotation::new(
            kind,
            Interval::try_new(start, end).unwrap(),
            Strand::Positive,
            qualifiers,
        )
    }

    fn inverted(start: usize, end: usize) -> Annotation {
        annotation(
            Kind::RepeatRegion,
            start,
            end,
            Qualifiers::default().with_rpt_type(RepeatType::Inverted),
        )
    }

    fn misc(start: usize, end: usize, note: &str) -> Annotation {
        annotation(
            Kind::MiscFeature,
            start,
            end,
            Qualifiers::default().with_note(note),
        )
    }

    fn record(length: usize, annotations: Vec<Annotation>) -> Record {
        Record::new("NC_000001", length, Topology::Circular, annotations)
    }

    #[test]
    fn inverted_repeat_regions_by_position() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            160_000,
            vec![inverted(130_001, 155_000), inverted(1, 25_000)],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(1, 25_000)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(130_001, 155_000)?);
        assert_eq!(pair.ira().length(), 25_000);
        assert_eq!(pair.irb().length(), 25_000);
        assert_eq!(pair.ira().source(), Source::RepeatRegion);
        assert!(extraction.findings().is_empty());
        Ok(())
    }

    #[test]
    fn inverted_repeat_regions_by_note() -> Result<(), Box<dyn std::error::Error>> {
        let ira = annotation(
            Kind::RepeatRegion,
            1,
            25_000,
            Qualifiers::default()
                .with_rpt_type(RepeatType::Inverted)
                .with_note("inverted repeat A"),
        );
        let record = record(160_000, vec![ira, inverted(130_001, 155_000)]);

        let extraction = Extractor::default().extract(&record);
        assert_eq!(
            extraction.ira().unwrap().interval(),
            &Interval::try_new(1, 25_000)?
        );
        assert_eq!(
            extraction.irb().unwrap().interval(),
            &Interval::try_new(130_001, 155_000)?
        );
        Ok(())
    }

    #[test]
    fn more_than_two_candidates() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            160_000,
            vec![
                inverted(1, 25_000),
                inverted(40_001, 42_000),
                inverted(130_001, 155_010),
            ],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(1, 25_000)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(130_001, 155_010)?);
        assert_eq!(
            extraction.findings(),
            &[Finding::AmbiguousAnnotation {
                candidates: 3,
                kept: (
                    Interval::try_new(1, 25_000)?,
                    Interval::try_new(130_001, 155_010)?
                ),
            }]
        );
        Ok(())
    }

    #[test]
    fn more_than_two_named_repeat_regions() -> Result<(), Box<dyn std::error::Error>> {
        let named = |start, end| {
            annotation(
                Kind::RepeatRegion,
                start,
                end,
                Qualifiers::default().with_note("IR"),
            )
        };
        let record = record(
            160_000,
            vec![
                named(1, 25_000),
                named(40_001, 45_000),
                named(130_001, 155_000),
            ],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(1, 25_000)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(130_001, 155_000)?);
        assert_eq!(pair.length(), 25_000);
        assert_eq!(
            extraction.findings(),
            &[Finding::AmbiguousAnnotation {
                candidates: 3,
                kept: (
                    Interval::try_new(1, 25_000)?,
                    Interval::try_new(130_001, 155_000)?
                ),
            }]
        );
        Ok(())
    }

    #[test]
    fn more_than_two_named_misc_features() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            160_000,
            vec![
                misc(1, 25_000, "IR"),
                misc(40_001, 45_000, "IR"),
                misc(130_001, 155_010, "IR"),
            ],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(1, 25_000)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(130_001, 155_010)?);
        assert!(matches!(
            extraction.findings(),
            [Finding::AmbiguousAnnotation { candidates: 3, .. }]
        ));
        Ok(())
    }

    #[test]
    fn short_repeats_are_ignored() {
        let record = record(160_000, vec![inverted(1, 900), inverted(2_001, 2_900)]);

        let extraction = Extractor::default().extract(&record);
        assert!(extraction.pair().is_none());
        assert!(matches!(
            extraction.findings(),
            [Finding::MissingAnnotation(_)]
        ));
    }

    #[test]
    fn named_misc_features() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            150_000,
            vec![
                misc(84_001, 110_000, "inverted repeat B"),
                misc(110_001, 110_002, "junction IRb/SSC"),
                misc(128_001, 150_000, "IRa"),
            ],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(84_001, 110_000)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(128_001, 150_000)?);
        assert_eq!(pair.ira().source(), Source::MiscFeature);
        Ok(())
    }

    #[test]
    fn pseudo_misc_features_are_skipped() {
        let pseudo = annotation(
            Kind::MiscFeature,
            84_001,
            110_000,
            Qualifiers::default()
                .with_note("IRb")
                .with_pseudo(true),
        );
        let record = record(150_000, vec![pseudo]);

        let extraction = Extractor::default().extract(&record);
        assert!(extraction.irb().is_none());
    }

    #[test]
    fn junctions() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            154_000,
            vec![
                misc(84_000, 84_001, "JLB"),
                misc(110_000, 110_001, "JSB"),
                misc(128_000, 128_001, "JSA"),
            ],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(84_001, 110_000)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(128_001, 154_000)?);
        assert_eq!(pair.irb().source(), Source::Junctions);
        Ok(())
    }

    #[test]
    fn single_copy_complement() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            150_000,
            vec![
                misc(1, 84_000, "large single copy region (LSC)"),
                misc(110_001, 128_000, "SSC"),
            ],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(84_001, 110_000)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(128_001, 150_000)?);
        assert_eq!(pair.ira().source(), Source::SingleCopyComplement);
        Ok(())
    }

    #[test]
    fn steps_only_fill_missing_roles() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            150_000,
            vec![
                inverted(84_001, 110_000),
                misc(1, 84_000, "LSC"),
                misc(110_001, 128_000, "SSC"),
            ],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().source(), Source::RepeatRegion);
        assert_eq!(pair.ira().source(), Source::SingleCopyComplement);
        assert_eq!(pair.ira().interval(), &Interval::try_new(128_001, 150_000)?);
        Ok(())
    }

    #[test]
    fn wrapping_repeat() -> Result<(), Box<dyn std::error::Error>> {
        let record = record(
            151_000,
            vec![inverted(150_000, 500), inverted(60_001, 61_500)],
        );

        let extraction = Extractor::default().extract(&record);
        let pair = extraction.pair().unwrap();

        assert_eq!(pair.irb().interval(), &Interval::try_new(60_001, 61_500)?);
        assert_eq!(pair.ira().interval(), &Interval::try_new(150_000, 500)?);
        assert_eq!(pair.ira().length(), 1_500);
        Ok(())
    }

    #[test]
    fn no_features() {
        let record = record(150_000, Vec::new());

        let extraction = Extractor::default().extract(&record);
        assert!(extraction.ira().is_none());
        assert!(extraction.irb().is_none());
        assert_eq!(
            extraction.findings(),
            &[Finding::MissingAnnotation(String::from(
                "record has no repeat_region or misc_feature features"
            ))]
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let record = record(
            160_000,
            vec![inverted(1, 25_000), inverted(130_001, 155_000)],
        );

        let extractor = Extractor::new(Config::default().with_min_length(500));
        assert_eq!(extractor.extract(&record), extractor.extract(&record));
    }
}
