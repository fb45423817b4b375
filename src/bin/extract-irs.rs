//! A binary that retrieves the GenBank record of every accession in an
//! availability table, extracts the annotated inverted repeats, and writes the
//! IR table.
//!
//! ```shell
//! cargo run --release --bin=extract-irs --features=binaries -- \
//!     availability.tsv --output ir_table.tsv --records records --data data
//! ```
//!
//! Records are kept gzip-compressed in the records directory and re-used on
//! later runs. Accessions that already have a row in the output table are
//! skipped, so an interrupted run can simply be restarted.

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use plastome_ir::accession::Table;
use plastome_ir::entrez::Client;
use plastome_ir::extract::Config;
use plastome_ir::extract::Extraction;
use plastome_ir::extract::Extractor;
use plastome_ir::extract::Finding;
use plastome_ir::genbank;
use plastome_ir::report::IrTable;
use plastome_ir::report::Row;
use plastome_ir::store::Exporter;
use plastome_ir::store::RecordStore;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::debug;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// The environment variable holding an NCBI API key.
const API_KEY_VARIABLE: &str = "NCBI_API_KEY";

/// Extracts the annotated inverted repeats of every record in an availability
/// table.
#[derive(Parser)]
struct Args {
    /// The availability table.
    table: PathBuf,

    /// The IR table to create or extend.
    #[arg(short, long, default_value = "ir_table.tsv")]
    output: PathBuf,

    /// The directory of stored GenBank records.
    #[arg(short, long, default_value = "records")]
    records: PathBuf,

    /// The directory that receives the FASTA exports.
    #[arg(short, long, default_value = "data")]
    data: PathBuf,

    /// The minimum length of an inverted repeat.
    #[arg(long, default_value_t = plastome_ir::extract::DEFAULT_MIN_LENGTH)]
    min_length: usize,

    /// Never download; only use records that are already stored.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// An NCBI API key (falls back to the `NCBI_API_KEY` environment
    /// variable).
    #[arg(long)]
    api_key: Option<String>,

    /// A contact e-mail address sent along with each request.
    #[arg(long)]
    email: Option<String>,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Counts of what happened during a run.
#[derive(Debug, Default)]
struct Tally {
    /// Accessions that already had a row.
    present: usize,

    /// Records with both inverted repeats.
    both: usize,

    /// Records with only one inverted repeat.
    one: usize,

    /// Records without inverted repeats.
    none: usize,

    /// Accessions that could not be processed.
    failed: usize,
}

impl Tally {
    /// Counts an extraction.
    fn count(&mut self, extraction: &Extraction) {
        match (extraction.ira(), extraction.irb()) {
            (Some(_), Some(_)) => self.both += 1,
            (None, None) => self.none += 1,
            _ => self.one += 1,
        }
    }
}

/// Reads the existing IR table, if there is one.
fn read_ir_table(path: &Path) -> Result<IrTable> {
    if !path.exists() {
        return Ok(IrTable::default());
    }

    let file =
        File::open(path).with_context(|| format!("opening IR table: {}", path.display()))?;

    IrTable::read(BufReader::new(file))
        .with_context(|| format!("reading IR table: {}", path.display()))
}

/// Gets the record of an accession from the store, downloading it first when
/// needed.
fn retrieve(
    accession: &str,
    store: &RecordStore,
    client: Option<&mut Client>,
) -> Result<genbank::Record> {
    if !store.contains(accession) {
        let client = client.ok_or_else(|| anyhow!("record is not stored (offline)"))?;

        debug!("{accession}: downloading");
        let data = client
            .genbank(accession)
            .context("downloading GenBank record")?;
        store
            .write(accession, data.as_bytes())
            .context("storing GenBank record")?;
    }

    store.read(accession).context("reading GenBank record")
}

fn run(args: Args) -> Result<()> {
    let file = File::open(&args.table)
        .with_context(|| format!("opening availability table: {}", args.table.display()))?;
    let table = Table::read(BufReader::new(file))
        .with_context(|| format!("reading availability table: {}", args.table.display()))?;
    info!("availability table: {} records", table.len());

    let mut ir_table = read_ir_table(&args.output)?;

    let mut client = if args.offline {
        None
    } else {
        let api_key = args
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_VARIABLE).ok());

        Some(
            Client::builder()
                .api_key(api_key)
                .email(args.email.clone())
                .try_build()
                .context("creating Entrez client")?,
        )
    };

    let store = RecordStore::new(&args.records);
    let exporter = Exporter::new(&args.data);
    let extractor = Extractor::new(Config::default().with_min_length(args.min_length));

    let mut tally = Tally::default();

    for entry in table.records() {
        let accession = entry.accession();

        if ir_table.get(accession).is_some() {
            debug!("{accession}: already in the IR table");
            tally.present += 1;
            continue;
        }

        let record = match retrieve(accession, &store, client.as_mut()) {
            Ok(record) => record,
            Err(err) => {
                warn!("{accession}: skipping: {err:#}");
                tally.failed += 1;

                // Malformed records are recorded as having no reported IRs.
                if store.contains(accession) {
                    ir_table = ir_table.push(Row::empty(accession));
                }

                continue;
            }
        };

        if record.accession() != accession {
            warn!(
                "{accession}: skipping: the retrieved record is {}",
                record.accession()
            );
            tally.failed += 1;
            continue;
        }

        let extraction = extractor.extract(&record);
        for finding in extraction.findings() {
            match finding {
                Finding::MissingAnnotation(_) => info!("{accession}: {finding}"),
                _ => warn!("{accession}: {finding}"),
            }
        }

        match exporter.export(&record, &extraction) {
            Ok(exported) => {
                if let Some(orientation) = exported.orientation() {
                    debug!("{accession}: IRb exported as {orientation}");
                }
            }
            Err(err) => warn!("{accession}: exporting sequences: {err}"),
        }

        tally.count(&extraction);
        ir_table = ir_table.push(Row::from_extraction(accession, &extraction));
    }

    let file = File::create(&args.output)
        .with_context(|| format!("creating IR table: {}", args.output.display()))?;
    ir_table
        .write(BufWriter::new(file))
        .context("writing IR table")?;

    let mut builder = Builder::default();
    builder.push_record(["Already present", &tally.present.to_string()]);
    builder.push_record(["Both IRs", &tally.both.to_string()]);
    builder.push_record(["One IR", &tally.one.to_string()]);
    builder.push_record(["No IR", &tally.none.to_string()]);
    builder.push_record(["Failed", &tally.failed.to_string()]);
    builder.push_record([
        "Mean reported IR length",
        &ir_table
            .mean_reported_length()
            .map(|length| length.to_string())
            .unwrap_or(String::from("n.a.")),
    ]);

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
