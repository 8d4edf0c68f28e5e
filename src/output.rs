//! # Output
//! Aggregated results of an evaluation run and the ways to lay them out: table rows, CSV lines, JSON and a plain
//! text report.

use std::fmt;
use std::fmt::Formatter;
use serde::Serialize;
use serde_json::json;
use crate::prompt::{ExpandedPrompt, PromptCombination};
use crate::utils::llm::MessageResponse;

/// Column names of the result table.
pub const HEADERS: [&str; 5] = ["Variables", "Prompt", "Response", "Input Tokens", "Output Tokens"];

/// One prompt paired with what the model answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[readonly::make]
pub struct CompletionResult {
    /// The combination of variable values that produced the prompt
    pub variables: PromptCombination,
    pub prompt: String,
    pub response_text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub stop_reason: Option<String>,
}

impl CompletionResult {
    pub fn new(expanded: ExpandedPrompt, response: &MessageResponse) -> Self {
        Self {
            variables: expanded.combination,
            prompt: expanded.prompt,
            response_text: response.text(),
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            stop_reason: response.stop_reason.clone(),
        }
    }

    /// Variables as compact JSON, the way they appear in tables and CSV.
    pub fn variables_json(&self) -> String {
        serde_json::to_string(&self.variables).unwrap_or_default()
    }

    /// Cells in [HEADERS] order.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.variables_json(),
            self.prompt.clone(),
            self.response_text.clone(),
            self.input_tokens.to_string(),
            self.output_tokens.to_string(),
        ]
    }

    /// One CSV line in [HEADERS] order, without trailing newline.
    pub fn to_csv(&self) -> String {
        format!("{},{},{},{},{}",
                escape_csv(&self.variables_json()),
                escape_csv(&self.prompt),
                escape_csv(&self.response_text),
                self.input_tokens,
                self.output_tokens)
    }
}

impl fmt::Display for CompletionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let variables = serde_json::to_string_pretty(&self.variables).unwrap_or_default();
        let usage = json!({"input_tokens": self.input_tokens, "output_tokens": self.output_tokens});
        let usage = serde_json::to_string_pretty(&usage).unwrap_or_default();
        write!(f, "Variables: {}\nPrompt:\n{}\n\nResponse:\n{}\n\nToken Usage: {}\n\n----------------------------------------\n\n",
               variables, self.prompt, self.response_text, usage)
    }
}

/// Quote a field when it holds a comma or a line break. Inner quotes are doubled and line breaks are written as
/// a literal `\n` so every record stays on one line.
pub fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\"").replace('\n', "\\n"))
    } else {
        value.to_string()
    }
}

/// Pair every expanded prompt with its response, keeping input order.
pub fn aggregate(prompts: Vec<ExpandedPrompt>, responses: &[MessageResponse]) -> Vec<CompletionResult> {
    prompts.into_iter()
        .zip(responses)
        .map(|(expanded, response)| CompletionResult::new(expanded, response))
        .collect()
}

/// Header row followed by one row per result.
pub fn format_results(results: &[CompletionResult]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(results.len() + 1);
    rows.push(HEADERS.iter().map(|h| h.to_string()).collect());
    rows.extend(results.iter().map(|r| r.to_row().to_vec()));
    rows
}

/// The row shown in place of results when an evaluation fails.
pub fn error_row(error: &impl fmt::Display) -> [String; 5] {
    [String::new(), String::new(), error.to_string(), "0".to_string(), "0".to_string()]
}

/// Header line plus one line per result.
pub fn to_csv(results: &[CompletionResult]) -> String {
    let mut csv = HEADERS.join(",");
    for result in results {
        csv.push('\n');
        csv.push_str(&result.to_csv());
    }
    csv
}

#[cfg(test)]
mod test_output {
    use crate::prompt::{ExpandedPrompt, PromptCombination};
    use crate::utils::llm::{ContentBlock, MessageResponse, Usage};
    use super::{aggregate, error_row, escape_csv, format_results, to_csv, CompletionResult, HEADERS};

    fn response(text: &str, input_tokens: u32, output_tokens: u32) -> MessageResponse {
        MessageResponse {
            id: "msg".to_string(),
            kind: "message".to_string(),
            role: "assistant".to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            content: vec![ContentBlock::Text { text: text.to_string() }],
            stop_reason: Some("end_turn".to_string()),
            stop_sequence: None,
            usage: Usage { input_tokens, output_tokens },
        }
    }

    fn expanded(lang: &str) -> ExpandedPrompt {
        ExpandedPrompt {
            combination: [("lang", lang), ("text", "hello")].into_iter().collect::<PromptCombination>(),
            prompt: format!("Translate hello to {}", lang),
        }
    }

    fn results() -> Vec<CompletionResult> {
        aggregate(vec![expanded("fr"), expanded("es")], &[response("bonjour", 10, 2), response("hola, amigo\n", 11, 4)])
    }

    #[test]
    fn test_aggregate_keeps_order() {
        let results = results();
        assert_eq!(2, results.len());
        assert_eq!("Translate hello to fr", results[0].prompt);
        assert_eq!("bonjour", results[0].response_text);
        assert_eq!(Some("es"), results[1].variables.get("lang"));
        assert_eq!(11, results[1].input_tokens);
        assert_eq!(4, results[1].output_tokens);
    }

    #[test]
    fn test_rows() {
        let rows = format_results(&results());
        assert_eq!(3, rows.len());
        assert_eq!(HEADERS.to_vec(), rows[0]);
        assert_eq!(r#"{"lang":"fr","text":"hello"}"#, rows[1][0]);
        assert_eq!("2", rows[1][4]);
        let row = error_row(&"RemoteApiError: boom");
        assert_eq!("RemoteApiError: boom", row[2]);
        assert_eq!("0", row[3]);
    }

    #[test]
    fn test_csv() {
        assert_eq!("plain", escape_csv("plain"));
        assert_eq!(r#""a, ""b""""#, escape_csv(r#"a, "b""#));
        assert_eq!(r#""line\nbreak""#, escape_csv("line\nbreak"));
        let csv = to_csv(&results());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(3, lines.len());
        assert_eq!("Variables,Prompt,Response,Input Tokens,Output Tokens", lines[0]);
        assert_eq!(r#""{""lang"":""es"",""text"":""hello""}",Translate hello to es,"hola, amigo\n",11,4"#, lines[2]);
    }

    #[test]
    fn test_display() {
        let text = results()[0].to_string();
        assert!(text.starts_with("Variables: {\n  \"lang\": \"fr\""));
        assert!(text.contains("Response:\nbonjour\n"));
        assert!(text.contains("\"output_tokens\": 2"));
    }
}
