//! Survey CLI - Command-line interface for Survey Score
//!
//! Commands:
//! - score: Score responses against a form and configuration (batch mode)
//! - ranges: Print the theoretical range of every domain and dimension
//! - validate: Check a configuration against a form

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use survey_score::adapters::{FormAdapter, TypeformAdapter};
use survey_score::config::{ConfigIssue, FormConfig};
use survey_score::form::Form;
use survey_score::pipeline::SurveyProcessor;
use survey_score::types::{DomainRange, ScoreReport};
use survey_score::{ScoringError, SCORE_VERSION};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "SURVEY_LOG";

/// Survey - hierarchical scoring of questionnaire responses
#[derive(Parser)]
#[command(name = "survey")]
#[command(author = "Synheart AI Inc")]
#[command(version = SCORE_VERSION)]
#[command(about = "Score questionnaire responses into dimensions and domains", long_about = None)]
struct Cli {
    /// Log level or filter, used when SURVEY_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score responses (batch mode)
    Score {
        /// Form definition file
        #[arg(short, long)]
        form: PathBuf,

        /// Scoring configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Responses file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Skip responses that cannot be scored instead of aborting
        #[arg(long)]
        keep_going: bool,
    },

    /// Print theoretical ranges of every domain and dimension
    Ranges {
        /// Form definition file
        #[arg(short, long)]
        form: PathBuf,

        /// Scoring configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check every configured item against the form
    Validate {
        /// Form definition file
        #[arg(short, long)]
        form: PathBuf,

        /// Scoring configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one response per line)
    Ndjson,
    /// JSON array of responses, or a page with an items array
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{}", render_error(e));
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", render_error(e));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) -> Result<(), SurveyCliError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| SurveyCliError::Logging(format!("invalid log level '{level}': {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .map_err(|e| SurveyCliError::Logging(e.to_string()))
}

fn run(cli: Cli) -> Result<(), SurveyCliError> {
    match cli.command {
        Commands::Score {
            form,
            config,
            input,
            output,
            input_format,
            output_format,
            keep_going,
        } => cmd_score(
            &form,
            &config,
            &input,
            &output,
            input_format,
            output_format,
            keep_going,
        ),

        Commands::Ranges { form, config, json } => cmd_ranges(&form, &config, json),

        Commands::Validate { form, config, json } => cmd_validate(&form, &config, json),
    }
}

fn cmd_score(
    form: &Path,
    config: &Path,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    keep_going: bool,
) -> Result<(), SurveyCliError> {
    let processor = load_processor(form, config)?;

    let input_data = read_input(input)?;
    let responses = match input_format {
        InputFormat::Ndjson => TypeformAdapter.parse_responses_ndjson(&input_data)?,
        InputFormat::Json => TypeformAdapter.parse_responses_array(&input_data)?,
    };

    if responses.is_empty() {
        return Err(SurveyCliError::NoResponses);
    }
    info!(responses = responses.len(), "scoring responses");

    let (reports, failures) = collect_reports(processor.process_batch(&responses), keep_going)?;
    if failures > 0 {
        info!(failures, scored = reports.len(), "finished with skipped responses");
    }

    let output_data = format_output(&reports, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

/// Split batch results into reports and a failure count
///
/// Without `keep_going` the first failure aborts the run.
fn collect_reports(
    results: Vec<Result<ScoreReport, ScoringError>>,
    keep_going: bool,
) -> Result<(Vec<ScoreReport>, usize), SurveyCliError> {
    let mut reports = Vec::with_capacity(results.len());
    let mut failures = 0usize;

    // Failures are already logged per response by the processor
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(_) if keep_going => failures += 1,
            Err(e) => return Err(e.into()),
        }
    }

    Ok((reports, failures))
}

fn cmd_ranges(form: &Path, config: &Path, json: bool) -> Result<(), SurveyCliError> {
    let processor = load_processor(form, config)?;
    let ranges = processor.ranges()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ranges)?);
    } else {
        print_ranges(&ranges);
    }

    Ok(())
}

fn print_ranges(ranges: &[DomainRange]) {
    println!("Score Ranges");
    println!("============");
    for domain in ranges {
        println!(
            "{} ({}): [{}, {}]",
            domain.name,
            domain.aggregation.as_str(),
            domain.range.min,
            domain.range.max
        );
        for dimension in &domain.dimensions {
            println!(
                "  - {} ({}): [{}, {}]",
                dimension.name,
                dimension.aggregation.as_str(),
                dimension.range.min,
                dimension.range.max
            );
        }
    }
}

fn cmd_validate(form: &Path, config: &Path, json: bool) -> Result<(), SurveyCliError> {
    let form = TypeformAdapter.parse_form(&fs::read_to_string(form)?)?;
    let config = load_config(config)?;
    let report = ValidationReport::new(&form, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Form:    {}", report.form_id.as_deref().unwrap_or("unknown"));
        println!("Domains: {}", report.domains);
        println!("Items:   {}", report.items);
        println!("Issues:  {}", report.issues.len());

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!(
                    "  - {}/{} item {}: {}",
                    issue.domain, issue.dimension, issue.reference, issue.message
                );
            }
        }
    }

    report.outcome()
}

// Helper functions

fn load_processor(form: &Path, config: &Path) -> Result<SurveyProcessor, SurveyCliError> {
    let form = TypeformAdapter.parse_form(&fs::read_to_string(form)?)?;
    let config = load_config(config)?;
    Ok(SurveyProcessor::new(Arc::new(form), Arc::new(config)))
}

fn load_config(path: &Path) -> Result<FormConfig, SurveyCliError> {
    FormConfig::load(path).map_err(SurveyCliError::Config)
}

fn read_input(input: &Path) -> Result<String, SurveyCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("reading responses from an interactive terminal");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_output(reports: &[ScoreReport], format: &OutputFormat) -> Result<String, SurveyCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut output = String::new();
            for report in reports {
                output.push_str(&serde_json::to_string(report)?);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string(reports)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(reports)?),
    }
}

fn render_error(e: SurveyCliError) -> String {
    serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
}

// Error types

#[derive(Debug)]
enum SurveyCliError {
    Io(io::Error),
    Scoring(ScoringError),
    Config(ScoringError),
    Json(serde_json::Error),
    Logging(String),
    NoResponses,
    ValidationFailed(usize),
}

impl From<io::Error> for SurveyCliError {
    fn from(e: io::Error) -> Self {
        SurveyCliError::Io(e)
    }
}

impl From<ScoringError> for SurveyCliError {
    fn from(e: ScoringError) -> Self {
        SurveyCliError::Scoring(e)
    }
}

impl From<serde_json::Error> for SurveyCliError {
    fn from(e: serde_json::Error) -> Self {
        SurveyCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SurveyCliError> for CliError {
    fn from(e: SurveyCliError) -> Self {
        match e {
            SurveyCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SurveyCliError::Scoring(e) => {
                let (code, hint) = match &e {
                    ScoringError::FieldNotFound { .. } | ScoringError::UnscaledField { .. } => (
                        "CONFIG_MISMATCH",
                        "Run 'survey validate' to check the configuration against the form",
                    ),
                    ScoringError::AnswerNotFound { .. } | ScoringError::NoAnsweredItems { .. } => (
                        "MISSING_ANSWER",
                        "Set \"missing\": \"exclude\" on the dimension or pass --keep-going",
                    ),
                    ScoringError::UnsupportedAnswerType { .. } => (
                        "UNSUPPORTED_ANSWER",
                        "Only numeric answers can be scored",
                    ),
                    ScoringError::AnswerOutOfRange { .. } => (
                        "ANSWER_OUT_OF_RANGE",
                        "Check that responses were collected with this form definition",
                    ),
                    ScoringError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Check the scoring configuration file")
                    }
                    _ => ("PARSE_ERROR", "Ensure input matches the Typeform response format"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            SurveyCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(
                    "Check the scoring configuration: domains, dimensions, items and their keys"
                        .to_string(),
                ),
            },
            SurveyCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SurveyCliError::Logging(message) => CliError {
                code: "LOGGING_ERROR".to_string(),
                message,
                hint: Some(format!("Check the {LOG_ENV} filter or --log-level")),
            },
            SurveyCliError::NoResponses => CliError {
                code: "NO_RESPONSES".to_string(),
                message: "No responses found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SurveyCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} configured items cannot be scored", count),
                hint: Some("Fix the reported refs and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    form_id: Option<String>,
    domains: usize,
    items: usize,
    issues: Vec<ConfigIssue>,
}

impl ValidationReport {
    fn new(form: &Form, config: &FormConfig) -> Self {
        Self {
            form_id: form.id().map(str::to_string),
            domains: config.domains().len(),
            items: config
                .domains()
                .iter()
                .flat_map(|d| d.dimensions())
                .map(|d| d.items().len())
                .sum(),
            issues: config.check_against(form),
        }
    }

    /// Any issue makes the command fail
    fn outcome(&self) -> Result<(), SurveyCliError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(SurveyCliError::ValidationFailed(self.issues.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use survey_score::form::{Field, FieldType};
    use survey_score::response::Response;

    const CONFIG_JSON: &str = r#"{"domains": [{"name": "stress", "aggregation": "sum",
        "dimensions": [{"name": "pair", "aggregation": "sum",
            "items": ["upset", {"ref": "confident", "reverse": true}]}]}]}"#;

    fn make_form() -> Form {
        Form::builder()
            .id("pss")
            .field(Field::scale("upset", FieldType::OpinionScale, 5, false).unwrap())
            .field(Field::scale("confident", FieldType::OpinionScale, 5, false).unwrap())
            .build()
            .unwrap()
    }

    fn make_processor() -> SurveyProcessor {
        let config = FormConfig::from_json(CONFIG_JSON).unwrap();
        SurveyProcessor::new(Arc::new(make_form()), Arc::new(config))
    }

    fn make_responses() -> Vec<Response> {
        let complete = |id: &str| {
            Response::builder(id)
                .number("upset", 3.0)
                .number("confident", 1.0)
                .build()
                .unwrap()
        };
        let partial = Response::builder("partial")
            .number("upset", 2.0)
            .build()
            .unwrap();
        vec![complete("first"), partial, complete("last")]
    }

    #[test]
    fn test_first_failure_aborts_by_default() {
        let processor = make_processor();
        let results = processor.process_batch(&make_responses());

        let err = collect_reports(results, false).unwrap_err();
        assert!(matches!(
            err,
            SurveyCliError::Scoring(ScoringError::AnswerNotFound { ref reference })
                if reference == "confident"
        ));
        assert_eq!(CliError::from(err).code, "MISSING_ANSWER");
    }

    #[test]
    fn test_keep_going_skips_failures() {
        let processor = make_processor();
        let results = processor.process_batch(&make_responses());

        let (reports, failures) = collect_reports(results, true).unwrap();
        assert_eq!(failures, 1);
        let ids: Vec<&str> = reports
            .iter()
            .map(|r| r.provenance.response_id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "last"]);
        // 3 + (0 + 4 - 1)
        assert_eq!(reports[0].domain("stress").unwrap().value, 6.0);
    }

    #[test]
    fn test_keep_going_with_every_response_failing() {
        let processor = make_processor();
        let responses = vec![Response::builder("empty").build().unwrap()];

        let (reports, failures) =
            collect_reports(processor.process_batch(&responses), true).unwrap();
        assert_eq!(failures, 1);
        assert!(reports.is_empty());
        assert_eq!(format_output(&reports, &OutputFormat::Ndjson).unwrap(), "");
        assert_eq!(format_output(&reports, &OutputFormat::Json).unwrap(), "[]");
    }

    #[test]
    fn test_format_ndjson() {
        let processor = make_processor();
        let (reports, _) =
            collect_reports(processor.process_batch(&make_responses()), true).unwrap();

        let output = format_output(&reports, &OutputFormat::Ndjson).unwrap();
        assert!(output.ends_with('\n'));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["provenance"]["response_id"], "last");
    }

    #[test]
    fn test_validation_issues_fail() {
        let form = Form::builder()
            .field(Field::scale("upset", FieldType::OpinionScale, 5, false).unwrap())
            .build()
            .unwrap();
        let config = FormConfig::from_json(CONFIG_JSON).unwrap();

        let report = ValidationReport::new(&form, &config);
        assert_eq!(report.domains, 1);
        assert_eq!(report.items, 2);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].reference, "confident");

        let err = report.outcome().unwrap_err();
        assert!(matches!(err, SurveyCliError::ValidationFailed(1)));
        assert_eq!(CliError::from(err).code, "VALIDATION_FAILED");
    }

    #[test]
    fn test_validation_passes_for_matching_form() {
        let config = FormConfig::from_json(CONFIG_JSON).unwrap();
        let report = ValidationReport::new(&make_form(), &config);

        assert!(report.issues.is_empty());
        assert!(report.outcome().is_ok());
    }

    #[test]
    fn test_config_errors_have_config_code() {
        let json = r#"{"domains": [{"name": "x", "aggregation": "sum",
            "dimensions": [{"name": "y", "aggregation": "sum", "mising": "exclude",
                "items": ["q1"]}]}]}"#;
        let err = FormConfig::from_json(json).unwrap_err();

        let cli_error = CliError::from(SurveyCliError::Config(err));
        assert_eq!(cli_error.code, "CONFIG_ERROR");
        assert!(cli_error.message.contains("mising"));
    }

    #[test]
    fn test_out_of_range_answer_code() {
        let processor = make_processor();
        let response = Response::builder("bad")
            .number("upset", 9.0)
            .number("confident", 1.0)
            .build()
            .unwrap();

        let err = collect_reports(processor.process_batch(&[response]), false).unwrap_err();
        assert_eq!(CliError::from(err).code, "ANSWER_OUT_OF_RANGE");
    }
}
