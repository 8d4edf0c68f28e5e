use std::fmt::Display;

use anyhow::Result;
use promptgrid::output::{error_row, escape_csv, to_csv, CompletionResult, HEADERS};
use promptgrid::prompt::PromptTemplate;
use promptgrid::utils::printing::{results_to_markdown, rows_to_markdown, MarkdownPrinter};
use promptgrid::utils::token::tiktoken::Tiktoken;
use promptgrid::utils::token::CountToken;
use promptgrid::variables::Variables;
use serde_json::json;

use crate::Format;

pub fn print_results(results: &[CompletionResult], format: Format) -> Result<()> {
    match format {
        Format::Table => MarkdownPrinter::default().print(&results_to_markdown(results)),
        Format::Csv => println!("{}", to_csv(results)),
        Format::Json => println!("{}", serde_json::to_string_pretty(results)?),
        Format::Text => results.iter().for_each(|result| print!("{}", result)),
    }
    Ok(())
}

/// Failures show up in place of the results, as a single row.
pub fn print_error(error: &impl Display, format: Format) -> Result<()> {
    let row = error_row(error);
    match format {
        Format::Table => MarkdownPrinter::default().print(&rows_to_markdown([row])),
        Format::Csv => println!("{}\n,,{},0,0", HEADERS.join(","), escape_csv(&row[2])),
        Format::Json => println!("{}", serde_json::to_string_pretty(&json!({"error": row[2]}))?),
        Format::Text => println!("Error: {}", row[2]),
    }
    Ok(())
}

/// Lists every prompt that would be sent, with its estimated token count.
pub fn print_dry_run(template: &PromptTemplate, variables: &Variables) -> Result<()> {
    let expansion = template.expand(variables)?;
    let counter = Tiktoken::new()?;
    println!("{} prompt(s)", expansion.len());
    for (idx, expanded) in expansion.iter().enumerate() {
        println!("--- #{} ({} tokens, est.) {}", idx + 1, counter.count_token(&expanded.prompt), serde_json::to_string(&expanded.combination)?);
        println!("{}", expanded.prompt);
    }
    Ok(())
}
