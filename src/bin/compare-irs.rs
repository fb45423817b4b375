//! A binary that compares the reported inverted repeat lengths of an IR table
//! against the lengths inferred from self-alignments.
//!
//! ```shell
//! cargo run --release --bin=compare-irs --features=binaries -- \
//!     ir_table.tsv alignments --extension blast --output discrepancies.tsv
//! ```
//!
//! Each accession is expected to have one BLAST tabular file
//! (`-outfmt 6` or `-outfmt 7`) named `<ACCESSION>.<EXTENSION>` in the
//! alignments directory, produced by aligning the complete sequence against
//! itself.

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use plastome_ir::alignment;
use plastome_ir::alignment::Hit;
use plastome_ir::infer::Inferrer;
use plastome_ir::infer::Window;
use plastome_ir::reconcile::Discrepancy;
use plastome_ir::reconcile::Report;
use plastome_ir::reconcile::Tolerance;
use plastome_ir::report::IrTable;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::debug;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// The statuses a discrepancy can have, in the order they are summarized.
const STATUSES: [&str; 5] = [
    "no mismatch",
    "mismatch",
    "not inferred",
    "not reported",
    "no IR evidence",
];

/// Compares reported against inferred inverted repeat lengths.
#[derive(Parser)]
struct Args {
    /// The IR table written by `extract-irs`.
    ir_table: PathBuf,

    /// The directory of self-alignment files.
    alignments: PathBuf,

    /// The extension of the self-alignment files.
    #[arg(short, long, default_value = "tsv")]
    extension: String,

    /// The discrepancy table to write.
    #[arg(short, long, default_value = "discrepancies.tsv")]
    output: PathBuf,

    /// The exclusive lower bound of a plausible alignment length.
    #[arg(long, default_value_t = plastome_ir::infer::DEFAULT_MIN_ALIGNMENT_LENGTH)]
    min_alignment_length: usize,

    /// The exclusive upper bound of a plausible alignment length.
    #[arg(long, default_value_t = plastome_ir::infer::DEFAULT_MAX_ALIGNMENT_LENGTH)]
    max_alignment_length: usize,

    /// The largest tolerated difference, as a fraction of the reported length.
    #[arg(short, long, default_value_t = plastome_ir::reconcile::DEFAULT_TOLERANCE)]
    tolerance: f64,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Reads the self-alignment hits of an accession.
///
/// [`None`] is returned when there is no alignment file for the accession.
fn read_hits(path: &Path) -> Result<Option<Vec<Hit>>> {
    if !path.is_file() {
        return Ok(None);
    }

    let file = File::open(path)
        .with_context(|| format!("opening self-alignment: {}", path.display()))?;
    let mut reader = alignment::Reader::new(BufReader::new(file));

    let hits = reader
        .hits()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading self-alignment: {}", path.display()))?;

    Ok(Some(hits))
}

fn run(args: Args) -> Result<()> {
    if args.min_alignment_length >= args.max_alignment_length {
        bail!(
            "the minimum alignment length ({}) must be smaller than the maximum ({})",
            args.min_alignment_length,
            args.max_alignment_length
        );
    }

    if !(0.0..1.0).contains(&args.tolerance) {
        bail!("the tolerance must lie in [0, 1): {}", args.tolerance);
    }

    let file = File::open(&args.ir_table)
        .with_context(|| format!("opening IR table: {}", args.ir_table.display()))?;
    let ir_table = IrTable::read(BufReader::new(file))
        .with_context(|| format!("reading IR table: {}", args.ir_table.display()))?;

    let expected_length = ir_table.mean_reported_length();
    match expected_length {
        Some(length) => info!("mean reported IR length: {length}"),
        None => info!("no reported IR lengths; ties go to the longest alignment"),
    }

    let inferrer = Inferrer::new(Window::new(
        args.min_alignment_length,
        args.max_alignment_length,
    ))
    .with_expected_length(expected_length);
    let tolerance = Tolerance::new(args.tolerance);

    let mut report = Report::default();

    for row in ir_table.rows() {
        let accession = row.accession();
        let path = args
            .alignments
            .join(format!("{accession}.{}", args.extension));

        let inferred = match read_hits(&path) {
            Ok(Some(hits)) => {
                debug!("{accession}: {} hits", hits.len());
                inferrer.infer(hits)
            }
            Ok(None) => {
                warn!("{accession}: no self-alignment at {}", path.display());
                None
            }
            Err(err) => {
                warn!("{accession}: {err:#}");
                None
            }
        };

        let discrepancy = Discrepancy::from_lengths(
            accession,
            row.reported_length(),
            inferred.as_ref().map(|pair| pair.alignment_length()),
            tolerance,
        );

        if discrepancy.is_mismatch() {
            warn!("{accession}: {}", discrepancy.status());
        }

        report = report.push(discrepancy);
    }

    let file = File::create(&args.output)
        .with_context(|| format!("creating discrepancy table: {}", args.output.display()))?;
    report
        .write(BufWriter::new(file))
        .context("writing discrepancy table")?;

    let mut builder = Builder::default();
    builder.push_record(["Status", "Accessions"]);
    for status in STATUSES {
        builder.push_record([status, &report.count(status).to_string()]);
    }

    println!("{}", builder.build().with(Style::rounded()));

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    run(args)
}
