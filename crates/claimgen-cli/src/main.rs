mod config;
mod logging;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use claimgen_core::{validate_claim_application, validate_employee, validate_employer};
use claimgen_generate::{
    ClaimGenerator, ClaimGeneratorOptions, ClaimPool, DataDirectory, DocumentConfig,
    EmployeePool, EmployerPool, FormDocumentGenerator, GeneratedClaim, GenerationError,
    seeded_rng,
};
use config::{GeneratorSettings, load_or_create_config};
use logging::{LogFormat, init_logging};
use thiserror::Error;

const CONFIG_FILE: &str = "claimgen.toml";

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("{0} invalid records found")]
    InvalidRecords(usize),
}

#[derive(Parser, Debug)]
#[command(name = "claimgen", version, about = "Synthetic claim fixture generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the corpora in a data directory, generating whatever is missing.
    Generate(GenerateArgs),
    /// Summarize the corpora in a data directory.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Data directory holding the NDJSON corpora and documents.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Config file; defaults to claimgen.toml inside the data directory.
    #[arg(long)]
    config: Option<PathBuf>,
    /// RNG seed; overrides the config seed.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
    /// Append JSON logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Run record validation over every corpus.
    #[arg(long, default_value_t = false)]
    validate: bool,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Inspect(args) => {
            init_logging(LogFormat::Pretty, None)?;
            run_inspect(args)
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    init_logging(args.log_format, args.log_file.as_deref())?;

    let data = DataDirectory::new(&args.data_dir);
    data.prepare()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| data.dir.join(CONFIG_FILE));
    let settings = load_or_create_config(&config_path)?;
    let seed = args.seed.or(settings.seed);
    let mut rng = seeded_rng(seed);
    let timer = Instant::now();

    tracing::info!(
        event = "generate_started",
        data_dir = %data.dir.display(),
        config = %config_path.display(),
        seed = ?seed
    );

    let mut employers = EmployerPool::load(&data.employers).or_generate_and_save(|| {
        let batch = &settings.employers;
        let mut pool = EmployerPool::from_employers(Vec::new()).with_weights(batch.weights);
        pool.generate_more(batch.count, &batch.spec, &mut rng)?;
        Ok(pool)
    })?;

    let mut employees = EmployeePool::load(&data.employees, &data.used_employees)
        .or_generate_and_save(|| {
            let mut pool = EmployeePool::from_employees(Vec::new());
            for batch in &settings.employees {
                pool.generate_more(batch.count, &mut employers, &batch.spec, &mut rng)?;
            }
            Ok(pool)
        })?;

    let claims = ClaimPool::load(&data.claims, Some(&data.documents)).or_generate_and_save(|| {
        let generator = claim_generator(&settings, &config_path);
        let mut claims = Vec::new();
        for batch in &settings.scenarios {
            claims.extend(generator.generate_many(
                &mut employees,
                &batch.scenario,
                batch.count,
                &mut rng,
            )?);
        }
        Ok(ClaimPool::from_claims(claims))
    })?;
    let claim_count = claims.count();

    employees.save(&data.employees, &data.used_employees)?;

    tracing::info!(
        event = "generate_finished",
        employers = employers.len(),
        employees = employees.len(),
        available_employees = employees.available(),
        claims = claim_count,
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn claim_generator(
    settings: &GeneratorSettings,
    config_path: &std::path::Path,
) -> ClaimGenerator<FormDocumentGenerator> {
    let mut documents = FormDocumentGenerator::new(DocumentConfig {
        service_pack: settings.service_pack,
    });
    if let Some(dir) = settings.resolved_templates_dir(config_path) {
        documents = documents.with_templates_dir(dir);
    }
    ClaimGenerator::new(documents, ClaimGeneratorOptions::default())
}

fn run_inspect(args: InspectArgs) -> Result<(), CliError> {
    let data = DataDirectory::new(&args.data_dir);
    let mut invalid = 0usize;

    let employers = EmployerPool::load(&data.employers).into_result()?;
    if args.validate {
        invalid += count_invalid("employer", employers.iter(), |e| {
            validate_employer(e).map_err(|err| (e.fein.clone(), err))
        });
    }

    let employees = EmployeePool::load(&data.employees, &data.used_employees).into_result()?;
    if args.validate {
        invalid += count_invalid("employee", employees.iter(), |e| {
            validate_employee(e).map_err(|err| (e.ssn.clone(), err))
        });
    }

    let mut claims = 0usize;
    let mut documents = 0usize;
    let mut missing_documents = 0usize;
    for claim in ClaimPool::load(&data.claims, Some(&data.documents)).into_result()? {
        let claim: GeneratedClaim = claim?;
        claims += 1;
        documents += claim.documents.len();
        missing_documents += claim
            .documents
            .iter()
            .filter(|doc| doc.path().is_some_and(|path| !path.is_file()))
            .count();
        if args.validate
            && let Err(err) = validate_claim_application(&claim.claim)
        {
            tracing::warn!(entity = "claim", id = claim.id.as_str(), error = %err, "invalid record");
            invalid += 1;
        }
    }

    println!("data directory: {}", data.dir.display());
    println!("employers:      {}", employers.len());
    println!(
        "employees:      {} ({} available)",
        employees.len(),
        employees.available()
    );
    println!("claims:         {claims}");
    println!("documents:      {documents} ({missing_documents} missing)");

    if invalid + missing_documents > 0 && args.validate {
        return Err(CliError::InvalidRecords(invalid + missing_documents));
    }
    Ok(())
}

fn count_invalid<'a, T: 'a>(
    entity: &'static str,
    records: impl Iterator<Item = &'a T>,
    check: impl Fn(&T) -> Result<(), (String, claimgen_core::Error)>,
) -> usize {
    records
        .filter_map(|record| check(record).err())
        .inspect(|(id, err)| {
            tracing::warn!(entity, id = id.as_str(), error = %err, "invalid record");
        })
        .count()
}
