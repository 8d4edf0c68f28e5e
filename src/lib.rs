//! # promptgrid
//!
//! Expand prompt templates over grids of variable values and compare LLM completions side by side.
//!
//! ## Usage
//! `promptgrid` is not released on crates.io. Depend on it by path, or run the `promptgrid` binary from the
//! `promptgrid-cli` workspace member.
//!
//! ## Why `promptgrid`
//!
//! Prompt engineering is mostly trying a prompt with this wording, then that wording, then with another input, and
//! squinting at the differences. Doing that by hand is slow and the comparison is never quite fair. `promptgrid` writes
//! the grid down once and runs all of it.
//!
//! ## Concepts and Design
//!
//! ### Prompt Template and Placeholder
//!
//! As straightforward as its name, it's a template of prompts.
//!
//! For example, a template looks like
//!
//! ```text
//! Translate {text} to {lang}
//! ```
//!
//! Now, `{text}` and `{lang}` are placeholders, slots to be filled, which have names `"text"` and `"lang"`.
//!
//! The format of a named placeholder is `{name}`, where the name is made of letters, digits and underscores. To write
//! a literal brace, double it: `{{` and `}}`. Other brace text, like a JSON example in the prompt, is left alone.
//!
//! ### Variables
//!
//! Each placeholder is bound to a [VariableSpec](crate::variables::VariableSpec): either a single value or an array of
//! candidate values. For the template above,
//!
//! ```json
//! {"text": {"type": "single", "value": "hello"}, "lang": {"type": "array", "values": ["fr", "es"]}}
//! ```
//!
//! gives two prompts, `Translate hello to fr` and `Translate hello to es`.
//!
//! ### Expansion
//!
//! [PromptTemplate::expand](crate::prompt::PromptTemplate::expand) checks that every placeholder has a variable and
//! returns the lazy cartesian product of all values, or fails if the grid has more combinations than fit in a
//! `usize`. Each item pairs the concrete prompt with the
//! [PromptCombination](crate::prompt::PromptCombination) that produced it.
//!
//! ### Endpoint
//!
//! The endpoint of `PromptTemplate -> combinations -> prompts` is an LLM. Anything implementing
//! [Complete](crate::utils::llm::Complete) will do; [AnthropicClient](crate::utils::llm::anthropic::AnthropicClient)
//! talks to the Anthropic Messages API and asks for a JSON-shaped answer by prefilling the assistant turn.
//!
//! ### Evaluation
//!
//! [PromptEvaluator](crate::evaluation::PromptEvaluator) sends every prompt of a run at once, waits for all of them,
//! and returns one [CompletionResult](crate::output::CompletionResult) per prompt in expansion order. A run is
//! all-or-nothing: if one request fails, the run fails.
//!
//! ```no_run
//! use promptgrid::config::{ClientConfig, ModelParameters};
//! use promptgrid::evaluation::PromptEvaluator;
//! use promptgrid::prompt::PromptTemplate;
//! use promptgrid::utils::llm::anthropic::AnthropicClient;
//! use promptgrid::variables::{Variables, VariableSpec};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = AnthropicClient::new(ClientConfig::from_env()?)?;
//! let evaluator = PromptEvaluator::new(client, ModelParameters::new("claude-3-5-sonnet-20240620", 1000, 0.7));
//! let template = PromptTemplate::new("Translate {text} to {lang}");
//! let variables = Variables::new()
//!     .with("text", VariableSpec::single("hello"))
//!     .with("lang", VariableSpec::array(["fr", "es"]));
//! for result in evaluator.evaluate(&template, &variables).await? {
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! `promptgrid` will always remain free under Apache license.
//!
//! ## Attribution
//! * `tiktoken-rs`: In [crate::utils::token::tiktoken], we re-export parts of the `tiktoken-rs` crate.


pub mod prompt;
pub mod variables;
pub mod config;
pub mod evaluation;
pub mod output;
pub mod utils;
