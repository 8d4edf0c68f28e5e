use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use promptgrid::config::{ClientConfig, ModelParameters};
use promptgrid::evaluation::{EvaluationError, PromptEvaluator};
use promptgrid::output::CompletionResult;
use promptgrid::prompt::PromptTemplate;
use promptgrid::utils::llm::anthropic::AnthropicClient;
use promptgrid::variables::{Variables, VariableSpec};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Markdown table rendered for the terminal
    Table,
    Csv,
    Json,
    /// One plain text block per result
    Text,
}

/// Test multiple prompt and variable combinations at once.
#[derive(Debug, Parser)]
#[command(name = "promptgrid", version)]
struct Cli {
    /// File holding the prompt template
    #[arg(short, long, conflicts_with = "prompt", required_unless_present = "prompt")]
    template: Option<PathBuf>,

    /// Prompt template given inline
    #[arg(short, long)]
    prompt: Option<String>,

    /// JSON file mapping placeholders to {"type": "single", "value": ...} or {"type": "array", "values": [...]}
    #[arg(long)]
    variables: Option<PathBuf>,

    /// A value for a placeholder; repeat to give several candidates. Overrides the variable file
    #[arg(short = 'v', long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// JSON file with model parameters: {"model", "max_tokens", "temperature"}
    #[arg(long)]
    params: Option<PathBuf>,

    #[arg(short, long)]
    model: Option<String>,

    #[arg(long)]
    max_tokens: Option<u32>,

    #[arg(long)]
    temperature: Option<f32>,

    /// Defaults to $CLAUDE_API_KEY, then $ANTHROPIC_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    base_url: Option<String>,

    /// Text appended to the JSON response prefill
    #[arg(long)]
    prefill: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// List the expanded prompts with estimated token counts without sending them
    #[arg(long)]
    dry_run: bool,

    /// Print the placeholders detected in the template and exit
    #[arg(long)]
    placeholders: bool,
}

/// Splits `NAME=VALUE` flags and groups values by name, keeping the order they were given in.
fn parse_vars(vars: &[String]) -> Result<Vec<(String, Vec<String>)>> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for var in vars {
        let Some((name, value)) = var.split_once('=') else {
            bail!("invalid --var `{}`, expected NAME=VALUE", var);
        };
        match grouped.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => values.push(value.to_string()),
            None => grouped.push((name.to_string(), vec![value.to_string()])),
        }
    }
    Ok(grouped)
}

fn load_variables(cli: &Cli, template: &PromptTemplate) -> Result<Variables> {
    let mut variables = match &cli.variables {
        Some(path) => Variables::load(path)
            .with_context(|| format!("failed to read variable file {}", path.display()))?
            .unwrap_or_else(|| {
                warn!("Variable file {} holds no usable data", path.display());
                Variables::new()
            }),
        None => Variables::new(),
    };
    for (name, values) in parse_vars(&cli.vars)? {
        variables.insert(name, VariableSpec::from_rows(values));
    }
    variables.retain_placeholders(&template.placeholders);
    Ok(variables)
}

fn load_parameters(cli: &Cli) -> Result<ModelParameters> {
    let mut parameters = match &cli.params {
        Some(path) => ModelParameters::load(path)
            .with_context(|| format!("failed to read model parameters {}", path.display()))?,
        None => ModelParameters::default(),
    };
    if let Some(model) = &cli.model {
        parameters.model = Some(model.clone());
    }
    if let Some(max_tokens) = cli.max_tokens {
        parameters.max_tokens = max_tokens;
    }
    if let Some(temperature) = cli.temperature {
        parameters.temperature = temperature;
    }
    Ok(parameters)
}

fn load_template(cli: &Cli) -> Result<PromptTemplate> {
    let template = match (&cli.template, &cli.prompt) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt template {}", path.display()))?,
        (None, Some(prompt)) => prompt.clone(),
        (None, None) => bail!("either --template or --prompt is required"),
    };
    Ok(PromptTemplate::new(template))
}

async fn evaluate(cli: &Cli,
                  template: &PromptTemplate,
                  variables: &Variables,
                  parameters: ModelParameters) -> Result<Vec<CompletionResult>, EvaluationError> {
    let mut config = ClientConfig::from_env_or(cli.api_key.clone())?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(prefill) = &cli.prefill {
        config = config.with_additional_prefill(prefill);
    }
    let evaluator = PromptEvaluator::new(AnthropicClient::new(config)?, parameters);
    evaluator.evaluate(template, variables).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let template = load_template(&cli)?;
    if cli.placeholders {
        println!("{}", serde_json::to_string(&template.placeholders)?);
        return Ok(ExitCode::SUCCESS);
    }

    let variables = load_variables(&cli, &template)?;
    if cli.dry_run {
        render::print_dry_run(&template, &variables)?;
        return Ok(ExitCode::SUCCESS);
    }

    let parameters = load_parameters(&cli)?;
    match evaluate(&cli, &template, &variables, parameters).await {
        Ok(results) => {
            info!("Collected {} result(s)", results.len());
            render::print_results(&results, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            render::print_error(&e, cli.format)?;
            Ok(ExitCode::FAILURE)
        }
    }
}
