use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nova_rest_config::{init_tracing, ProcessorConfig, PROCESSOR_TARGET};
use nova_rest_index::MemoryIndex;
use nova_rest_processor::{
    AdditionalWriter, BuildError, ConverterSupplier, EndpointIndexer, GeneratedUnit,
    IndexerContext, OutputRecord, RecordingSink, ReflectiveClass, TransformRequest,
};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "nova-rest",
    version,
    about = "Quarkus REST build step (parameter converters, multipart binding)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve converters and multipart classes against a class index
    Generate(GenerateArgs),
    /// Print the effective processor config
    Config(ConfigArgs),
    /// Print the JSON schema of the processor config
    Schema,
}

#[derive(Args)]
struct GenerateArgs {
    /// Class index exported by the build (JSON)
    #[arg(long)]
    index: PathBuf,
    /// Processor config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Parameter type that needs a converter (repeatable)
    #[arg(long = "converter", value_name = "TYPE")]
    converters: Vec<String>,
    /// Multipart request body class (repeatable)
    #[arg(long = "input", value_name = "CLASS")]
    inputs: Vec<String>,
    /// Multipart response body class (repeatable)
    #[arg(long = "output", value_name = "CLASS")]
    outputs: Vec<String>,
    /// Package prefix of application classes (repeatable)
    #[arg(long = "application-package", value_name = "PREFIX")]
    application_packages: Vec<String>,
    /// Defer every converter to deployment time
    #[arg(long)]
    runtime_delegation: bool,
    /// Directory to write generated Java sources into
    #[arg(long)]
    out: Option<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConfigArgs {
    /// Processor config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            if err.downcast_ref::<BuildError>().is_some() {
                1
            } else {
                2
            }
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Generate(args) => {
            let config = load_config(args.config.as_deref())?;
            init_tracing(&config.logging);
            let report = generate(&args, config)?;
            print_report(&report, args.json)?;
            Ok(0)
        }
        Command::Config(args) => {
            let config = load_config(args.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(0)
        }
        Command::Schema => {
            let schema = nova_rest_config::json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ProcessorConfig> {
    match path {
        Some(path) => ProcessorConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(ProcessorConfig::default()),
    }
}

#[derive(Serialize)]
struct UnitSummary {
    name: String,
    kind: &'static str,
    application_class: bool,
    fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

#[derive(Serialize)]
struct GenerateReport {
    converters: BTreeMap<String, ConverterSupplier>,
    /// Generated converter per resolved type; `null` when none could be made.
    converter_units: BTreeMap<String, Option<String>>,
    populators: BTreeMap<String, String>,
    outputs: BTreeMap<String, OutputRecord>,
    units: Vec<UnitSummary>,
    transforms: Vec<TransformRequest>,
    reflective: Vec<ReflectiveClass>,
    additional_writers: Vec<AdditionalWriter>,
}

fn generate(args: &GenerateArgs, mut config: ProcessorConfig) -> Result<GenerateReport> {
    let index = MemoryIndex::load_from_path(&args.index)
        .with_context(|| format!("loading class index {}", args.index.display()))?;
    tracing::info!(
        target: PROCESSOR_TARGET,
        classes = index.len(),
        "loaded class index"
    );
    if args.runtime_delegation {
        config.converters.runtime_delegation = true;
    }

    let sink = Arc::new(RecordingSink::new());
    let packages = args.application_packages.clone();
    let indexer = EndpointIndexer::new(IndexerContext {
        config,
        index: Some(Arc::new(index)),
        units: Some(sink.clone()),
        transforms: Some(sink.clone()),
        reflective: Some(sink.clone()),
        init_converters: Some(sink.clone()),
        is_application_class: Some(Arc::new(move |name: &str| {
            packages.iter().any(|prefix| name.starts_with(prefix.as_str()))
        })),
        ..IndexerContext::default()
    })?;

    let mut converters = BTreeMap::new();
    for element_type in &args.converters {
        let supplier = indexer.extract_converter(element_type, "command line")?;
        converters.insert(element_type.clone(), supplier);
    }
    for class in &args.inputs {
        indexer.bind_multipart_class(class)?;
    }
    for class in &args.outputs {
        indexer.check_output_compatible(class)?;
    }

    let mut units = Vec::new();
    for unit in sink.units() {
        let path = match &args.out {
            Some(dir) => Some(write_unit(dir, &unit)?),
            None => None,
        };
        units.push(UnitSummary {
            name: unit.name().to_owned(),
            kind: unit_kind(&unit),
            application_class: unit.application_class(),
            fingerprint: unit.fingerprint(),
            path,
        });
    }

    Ok(GenerateReport {
        converters,
        converter_units: indexer.converter_cache(),
        populators: indexer.populators(),
        outputs: indexer.output_records(),
        units,
        transforms: sink.transforms(),
        reflective: sink.reflective(),
        additional_writers: indexer.additional_writers(),
    })
}

fn unit_kind(unit: &GeneratedUnit) -> &'static str {
    match unit {
        GeneratedUnit::Converter(_) => "converter",
        GeneratedUnit::Populator(_) => "populator",
        GeneratedUnit::Mapper(_) => "mapper",
    }
}

/// Writes `unit` to `<dir>/<package path>/<simple name>.java`.
fn write_unit(dir: &Path, unit: &GeneratedUnit) -> Result<PathBuf> {
    let mut path = dir.to_path_buf();
    path.extend(unit.name().split('.'));
    path.set_extension("java");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&path, unit.render())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn print_report(report: &GenerateReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for (element_type, supplier) in &report.converters {
        match supplier.class_name() {
            Some(class) if !supplier.is_runtime_resolved() => {
                println!("converter: {element_type} -> {class}")
            }
            Some(class) => println!("converter: {element_type} -> runtime ({class})"),
            None => println!("converter: {element_type} -> runtime"),
        }
    }
    for (class, populator) in &report.populators {
        println!("populator: {class} -> {populator}");
    }
    for (class, record) in &report.outputs {
        match &record.mapper {
            Some(mapper) => println!("output: {class} -> {mapper}"),
            None => println!("output: {class} -> incompatible"),
        }
    }
    println!(
        "summary: {} units, {} transforms, {} reflective classes",
        report.units.len(),
        report.transforms.len(),
        report.reflective.len()
    );
    Ok(())
}
