//! This example prints the repeat and miscellaneous features of a GenBank
//! record along with the inverted repeats that are extracted from them. If a
//! self-alignment is given as well, the inferred pair and the reconciliation
//! of the two are printed too. You can call the program like so:
//!
//! ```
//! cargo run --release --example ir_view <GENBANK[.gz]> [SELF_ALIGNMENT]
//! ```

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;

use flate2::read::GzDecoder;
use plastome_ir::alignment;
use plastome_ir::annotation::Kind;
use plastome_ir::extract::Extractor;
use plastome_ir::extract::Role;
use plastome_ir::genbank;
use plastome_ir::infer::Inferrer;
use plastome_ir::reconcile::Discrepancy;
use plastome_ir::reconcile::Tolerance;
use tabled::builder::Builder;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tabled::settings::object::Rows;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let src = env::args().nth(1).expect("missing GenBank record");
    let self_alignment = env::args().nth(2);

    let file = File::open(&src)?;
    let inner: Box<dyn Read> = if src.ends_with(".gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let record = genbank::Reader::new(BufReader::new(inner)).read_first()?;

    println!(
        "{} ({} bp, {:?}, {} unreadable features)",
        record.accession(),
        record.length(),
        record.topology(),
        record.skipped_features()
    );

    let mut builder = Builder::default();
    builder.push_record(["Kind", "Interval", "Strand", "Length", "Note"]);

    for annotation in record
        .annotations()
        .iter()
        .filter(|annotation| !matches!(annotation.kind(), Kind::Other(_)))
    {
        builder.push_record([
            annotation.kind().to_string(),
            annotation.interval().to_string(),
            annotation.strand().to_string(),
            annotation
                .interval()
                .len(record.length())
                .map(|length| length.to_string())
                .unwrap_or(String::from("<out of bounds>")),
            annotation
                .qualifiers()
                .note()
                .unwrap_or_default()
                .to_string(),
        ]);
    }

    let table = builder
        .build()
        .with(Style::rounded())
        .modify(Rows::new(1..), Alignment::left())
        .to_string();

    println!("{}", table);

    let extraction = Extractor::default().extract(&record);

    let mut builder = Builder::default();
    builder.push_record(["Role", "Interval", "Length", "Source"]);

    for role in [Role::IRa, Role::IRb] {
        match extraction.get(role) {
            Some(repeat) => builder.push_record([
                role.to_string(),
                repeat.interval().to_string(),
                repeat.length().to_string(),
                repeat.source().to_string(),
            ]),
            None => builder.push_record([
                role.to_string(),
                String::from("<None>"),
                String::from("<None>"),
                String::from("<None>"),
            ]),
        }
    }

    println!("{}", builder.build().with(Style::rounded()));

    for finding in extraction.findings() {
        println!("finding: {finding}");
    }

    if let Some(path) = self_alignment {
        let mut reader = alignment::Reader::new(BufReader::new(File::open(path)?));
        let hits = reader.hits().collect::<Result<Vec<_>, _>>()?;

        let reported = extraction.pair();
        let inferrer =
            Inferrer::default().with_expected_length(reported.as_ref().map(|pair| pair.length()));
        let inferred = inferrer.infer(hits);

        if let Some(pair) = &inferred {
            println!(
                "inferred: IRb {} / IRa {} ({} bp at {}% identity)",
                pair.irb(),
                pair.ira(),
                pair.alignment_length(),
                pair.identity()
            );
        }

        let discrepancy = Discrepancy::new(
            record.accession(),
            reported.as_ref(),
            inferred.as_ref(),
            Tolerance::default(),
        );

        println!("{discrepancy}");
    }

    Ok(())
}
