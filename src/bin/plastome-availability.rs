//! A binary that builds (or extends) the availability table of plastid genome
//! records matching an NCBI nucleotide query.
//!
//! ```shell
//! cargo run --release --bin=plastome-availability --features=binaries -- \
//!     'complete genome[TITLE] AND (chloroplast[TITLE] OR plastid[TITLE])' \
//!     --output availability.tsv --blacklist blacklist.txt
//! ```
//!
//! UIDs that are already present in the output table are not fetched again,
//! so the binary can be rerun with a recent `--min-date` to pick up newly
//! released records.

use std::collections::HashSet;
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
use plastome_ir::accession::Table;
use plastome_ir::accession::table::Blacklist;
use plastome_ir::accession::table::Duplicates;
use plastome_ir::entrez::Client;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::debug;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// The environment variable holding an NCBI API key.
const API_KEY_VARIABLE: &str = "NCBI_API_KEY";

/// Builds the availability table of plastid genome records.
#[derive(Parser)]
struct Args {
    /// The Entrez query against the nucleotide database.
    query: String,

    /// The availability table to create or extend.
    #[arg(short, long, default_value = "availability.tsv")]
    output: PathBuf,

    /// Only search records published on or after this date (`YYYY/MM/DD`).
    #[arg(long)]
    min_date: Option<String>,

    /// A file of genera to exclude (one per line, `#` for comments).
    #[arg(short, long)]
    blacklist: Option<PathBuf>,

    /// A file of RefSeq duplicates (`REFSEQ<TAB>DUPLICATE`), read if present
    /// and extended with newly found pairs.
    #[arg(short, long)]
    duplicates: Option<PathBuf>,

    /// An NCBI API key (falls back to the `NCBI_API_KEY` environment
    /// variable).
    #[arg(long)]
    api_key: Option<String>,

    /// A contact e-mail address sent along with each request.
    #[arg(long)]
    email: Option<String>,

    /// The number of attempts per request.
    #[arg(long, default_value_t = plastome_ir::entrez::DEFAULT_ATTEMPTS)]
    attempts: usize,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Counts of what happened during a run.
#[derive(Debug, Default)]
struct Tally {
    /// UIDs returned by the search.
    found: usize,

    /// UIDs already present in the table.
    present: usize,

    /// Records added to the table.
    added: usize,

    /// UIDs whose summary could not be retrieved.
    failed: usize,

    /// Records removed because of their genus.
    blacklisted: usize,

    /// Records removed as RefSeq duplicates.
    duplicates: usize,
}

/// Reads the existing availability table, if there is one.
fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Ok(Table::default());
    }

    let file = File::open(path)
        .with_context(|| format!("opening availability table: {}", path.display()))?;

    Table::read(BufReader::new(file))
        .with_context(|| format!("reading availability table: {}", path.display()))
}

/// Reads the duplicates file, if there is one.
fn read_duplicates(path: Option<&Path>) -> Result<Duplicates> {
    match path {
        Some(path) if path.exists() => {
            let file = File::open(path)
                .with_context(|| format!("opening duplicates file: {}", path.display()))?;

            Duplicates::read(BufReader::new(file))
                .with_context(|| format!("reading duplicates file: {}", path.display()))
        }
        _ => Ok(Duplicates::default()),
    }
}

fn run(args: Args) -> Result<()> {
    if let Some(date) = &args.min_date {
        if date.split('/').count() != 3 {
            bail!("invalid minimum date: {date} (expected YYYY/MM/DD)");
        }
    }

    let mut table = read_table(&args.output)?;
    let mut duplicates = read_duplicates(args.duplicates.as_deref())?;
    let present = table.uids();
    info!("availability table: {} existing records", table.len());

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var(API_KEY_VARIABLE).ok());

    let mut client = Client::builder()
        .api_key(api_key)
        .email(args.email.clone())
        .attempts(args.attempts)
        .try_build()
        .context("creating Entrez client")?;

    info!("esearch: {}", args.query);
    let uids = client
        .esearch(&args.query, args.min_date.as_deref())
        .context("searching the nucleotide database")?;

    let mut tally = Tally {
        found: uids.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    for uid in uids {
        if present.contains(&uid) || !seen.insert(uid) {
            tally.present += 1;
            continue;
        }

        debug!("fetching summary of uid {uid}");
        match client.summary(uid) {
            Ok(summary) => {
                let (record, duplicate) = summary.into_parts();
                info!("uid {uid}: {} ({})", record.accession(), record.organism());

                if let Some(duplicate) = duplicate {
                    info!(
                        "{} is identical to {}",
                        duplicate.refseq(),
                        duplicate.duplicate()
                    );
                    duplicates = duplicates.push(duplicate);
                }

                table = table.push(record);
                tally.added += 1;
            }
            Err(err) => {
                warn!("uid {uid}: skipping: {err}");
                tally.failed += 1;
            }
        }
    }

    if let Some(path) = &args.blacklist {
        let file =
            File::open(path).with_context(|| format!("opening blacklist: {}", path.display()))?;
        let blacklist = Blacklist::read(BufReader::new(file))
            .with_context(|| format!("reading blacklist: {}", path.display()))?;

        let (filtered, removed) = table.remove_blacklisted(&blacklist);
        table = filtered;
        tally.blacklisted = removed;
    }

    let (filtered, removed) = table.remove_duplicates(&duplicates);
    table = filtered;
    tally.duplicates = removed;

    let file = File::create(&args.output)
        .with_context(|| format!("creating availability table: {}", args.output.display()))?;
    table
        .write(BufWriter::new(file))
        .context("writing availability table")?;

    if let Some(path) = &args.duplicates {
        let file = File::create(path)
            .with_context(|| format!("creating duplicates file: {}", path.display()))?;
        duplicates
            .write(BufWriter::new(file))
            .context("writing duplicates file")?;
    }

    let mut builder = Builder::default();
    builder.push_record(["UIDs found", &tally.found.to_string()]);
    builder.push_record(["Already present", &tally.present.to_string()]);
    builder.push_record(["Added", &tally.added.to_string()]);
    builder.push_record(["Failed", &tally.failed.to_string()]);
    builder.push_record(["Removed (blacklisted)", &tally.blacklisted.to_string()]);
    builder.push_record(["Removed (duplicates)", &tally.duplicates.to_string()]);
    builder.push_record(["Records in table", &table.len().to_string()]);

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
