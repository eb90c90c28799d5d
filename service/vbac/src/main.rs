use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use serde_json::{json, Value as JsonValue};
use vbac_features::{FieldBinding, OfflineEncoder, RawTable};
use vbac_model::{train, ClassifierKind, ModelArtifact};
use vbac_schema::{FieldKind, SchemaRegistry};

pub mod config;

const DEFAULT_ARTIFACT: &str = "models/vbac_model.json";

/// Input, configuration or IO problems
const EXIT_USAGE: i32 = 2;
/// Encoding, training or prediction failures
const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Parser)]
#[command(
    name = "vbac",
    version,
    about = "Train, inspect and query VBAC success prediction models",
    long_about = "vbac drives the VBAC feature pipeline.\n\n\
        Commands:\n  \
        train    Encode a cleaned natality CSV and fit a model artifact\n  \
        inspect  Show an artifact's metadata, evaluation and feature manifest\n  \
        predict  Score one JSON record against an artifact\n  \
        schema   List registry fields and request vocabularies"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode a batch and train a model artifact
    Train(TrainArgs),
    /// Describe a model artifact
    Inspect(InspectArgs),
    /// Predict VBAC success for one record
    Predict(PredictArgs),
    /// Print the schema registry
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
struct TrainArgs {
    /// Cleaned natality CSV; headers must match registry field names
    input: PathBuf,

    /// Pipeline configuration (defaults to ./vbac.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the artifact
    #[arg(short, long, default_value = DEFAULT_ARTIFACT)]
    out: PathBuf,

    /// Override the configured classifier (logistic or mlp)
    #[arg(long)]
    classifier: Option<ClassifierKind>,
}

#[derive(Debug, Args)]
struct InspectArgs {
    artifact: PathBuf,
}

#[derive(Debug, Args)]
struct PredictArgs {
    artifact: PathBuf,

    /// JSON record; read from stdin when omitted
    record: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Emit the registry as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = match SchemaRegistry::natality() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: invalid built-in schema registry: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };
    let rc = match cli.command {
        Command::Train(args) => run_train(&registry, &args),
        Command::Inspect(args) => run_inspect(&args),
        Command::Predict(args) => run_predict(&registry, &args),
        Command::Schema(args) => run_schema(&registry, &args),
    };
    std::process::exit(rc);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run_train(registry: &SchemaRegistry, args: &TrainArgs) -> i32 {
    let mut cfg = match config::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_USAGE;
        }
    };
    if let Some(kind) = args.classifier {
        cfg.training.classifier = kind;
    }

    let table = match RawTable::from_csv_path(&args.input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read '{}': {e}", args.input.display());
            return EXIT_USAGE;
        }
    };
    println!("Read {} rows from {}", table.len(), args.input.display());

    let design = match OfflineEncoder::new(registry, cfg.encoder.clone()).encode(&table) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: encoding failed: {e}");
            return EXIT_FAILURE;
        }
    };
    let report = &design.report;
    println!(
        "Encoded {} rows ({} dropped for outcome, {} for unmapped codes) into {} features",
        report.rows_kept,
        report.rows_dropped_outcome,
        report.rows_dropped_unmapped,
        design.n_features()
    );
    if !report.degenerate_columns.is_empty() {
        println!("  degenerate: {}", report.degenerate_columns.join(", "));
    }
    for drop in &report.correlated_columns {
        println!(
            "  correlated: dropped {} (r = {:.3} with {})",
            drop.dropped, drop.correlation, drop.kept
        );
    }

    let outcome = match train(&design, &cfg.training) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: training failed: {e}");
            return EXIT_FAILURE;
        }
    };
    let eval = &outcome.evaluation;
    println!(
        "Held-out: AUROC {:.4}, Brier {:.4}, accuracy {:.4} on {} rows",
        eval.auroc, eval.brier, eval.accuracy, eval.test_rows
    );

    if let Err(e) = outcome.artifact.save(&args.out) {
        eprintln!("error: failed to write '{}': {e}", args.out.display());
        return EXIT_USAGE;
    }
    println!("✓ Wrote {}", args.out.display());
    0
}

fn run_inspect(args: &InspectArgs) -> i32 {
    let artifact = match ModelArtifact::load(&args.artifact) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_FAILURE;
        }
    };
    let meta = artifact.metadata();
    let manifest = artifact.manifest();
    println!("classifier:     {}", meta.classifier);
    println!("created:        {}", meta.created_at);
    println!("schema version: {}", manifest.schema_version());
    println!("training rows:  {}", meta.training_rows);
    println!(
        "evaluation:     AUROC {:.4}, Brier {:.4}, accuracy {:.4} ({} train / {} test)",
        meta.evaluation.auroc,
        meta.evaluation.brier,
        meta.evaluation.accuracy,
        meta.evaluation.train_rows,
        meta.evaluation.test_rows
    );

    println!("\ncolumns ({}):", manifest.len());
    for (i, column) in manifest.columns().iter().enumerate() {
        println!("  {i:>3}  {column}");
    }

    println!("\nbindings:");
    for (field, binding) in manifest.bindings() {
        println!("  {field}: {}", describe_binding(binding));
    }
    0
}

fn describe_binding(binding: &FieldBinding) -> String {
    match binding {
        FieldBinding::Numeric { column: Some(c), .. } => format!("numeric -> {c}"),
        FieldBinding::Numeric { column: None, .. } => "numeric (pruned)".to_string(),
        FieldBinding::Flag { columns, .. } if columns.is_empty() => "flag (pruned)".to_string(),
        FieldBinding::Flag { columns, .. } => format!("flag -> {columns:?}"),
        FieldBinding::Categorical {
            reference,
            indicators,
            pruned,
        } => {
            let bound: Vec<String> = indicators
                .iter()
                .map(|(label, c)| format!("{label}={c}"))
                .collect();
            let mut s = format!("categorical (reference {reference}) -> [{}]", bound.join(", "));
            if !pruned.is_empty() {
                s.push_str(&format!(", pruned [{}]", pruned.join(", ")));
            }
            s
        }
    }
}

fn read_record(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run_predict(registry: &SchemaRegistry, args: &PredictArgs) -> i32 {
    let artifact = match ModelArtifact::load_validated(&args.artifact, registry) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_FAILURE;
        }
    };
    let text = match read_record(args.record.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read record: {e}");
            return EXIT_USAGE;
        }
    };
    let record: JsonValue = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: record is not valid JSON: {e}");
            return EXIT_USAGE;
        }
    };

    let encoded = match artifact.encoder().encode_json(&record) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_USAGE;
        }
    };
    let prediction = match artifact.assess(&encoded.vector) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: prediction failed: {e}");
            return EXIT_FAILURE;
        }
    };
    let out = json!({
        "success": true,
        "prediction": prediction,
        "diagnostics": encoded.diagnostics,
        "absent": encoded.absent,
    });
    match serde_json::to_string_pretty(&out) {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_FAILURE
        }
    }
}

fn run_schema(registry: &SchemaRegistry, args: &SchemaArgs) -> i32 {
    if args.json {
        let out = json!({
            "version": registry.version(),
            "outcome": registry.outcome(),
            "fields": registry.fields(),
        });
        return match serde_json::to_string_pretty(&out) {
            Ok(s) => {
                println!("{s}");
                0
            }
            Err(e) => {
                eprintln!("error: {e}");
                EXIT_FAILURE
            }
        };
    }

    println!("schema {}", registry.version());
    for field in registry.fields() {
        let detail = match &field.kind {
            FieldKind::Numeric(spec) if spec.sentinels.is_empty() => String::new(),
            FieldKind::Numeric(spec) => format!("unknown codes: {}", spec.sentinels.join(", ")),
            FieldKind::BinaryFlag(spec) => {
                format!("values: {} | {}", spec.true_label, spec.false_label)
            }
            FieldKind::CategoricalCode(spec) => format!(
                "values: {} (reference {})",
                spec.labels().join(" | "),
                spec.reference
            ),
        };
        println!("  {:<34} {:<12} {detail}", field.name, field.tag().to_string());
    }
    let outcome = registry.outcome();
    println!(
        "outcome: {} ({} = VBAC, {} = repeat cesarean)",
        outcome.name,
        outcome.positive_code,
        outcome.negative_codes.join("/")
    );
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_verbose_flag() {
        let cli = Cli::try_parse_from(["vbac", "-vvv", "schema"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn cli_parses_train_overrides() {
        let cli = Cli::try_parse_from([
            "vbac",
            "train",
            "data.csv",
            "--classifier",
            "mlp",
            "-o",
            "out.json",
        ])
        .unwrap();
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.input, PathBuf::from("data.csv"));
                assert_eq!(args.out, PathBuf::from("out.json"));
                assert_eq!(args.classifier, Some(ClassifierKind::Mlp));
                assert_eq!(args.config, None);
            }
            _ => panic!("expected Train command"),
        }
    }

    #[test]
    fn train_output_defaults() {
        let cli = Cli::try_parse_from(["vbac", "train", "data.csv"]).unwrap();
        match cli.command {
            Command::Train(args) => assert_eq!(args.out, PathBuf::from(DEFAULT_ARTIFACT)),
            _ => panic!("expected Train command"),
        }
    }

    #[test]
    fn predict_record_is_optional() {
        let cli = Cli::try_parse_from(["vbac", "predict", "model.json"]).unwrap();
        match cli.command {
            Command::Predict(args) => assert!(args.record.is_none()),
            _ => panic!("expected Predict command"),
        }
    }

    #[test]
    fn binding_descriptions() {
        assert_eq!(
            describe_binding(&FieldBinding::Numeric {
                column: None,
                sentinels: vec![],
            }),
            "numeric (pruned)"
        );
        let b = FieldBinding::Categorical {
            reference: "Other".into(),
            indicators: vec![("White".into(), 4)],
            pruned: vec!["NHOPI".into()],
        };
        assert_eq!(
            describe_binding(&b),
            "categorical (reference Other) -> [White=4], pruned [NHOPI]"
        );
    }
}
