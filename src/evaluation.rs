//! # Evaluation
//! The whole pipeline of one run: expand the template over the variables, send every prompt to the completion
//! endpoint at once, wait for all of them, and pair prompts with responses.
//!
//! A batch is all-or-nothing. The first failing request fails the run and the other responses are discarded.

use futures::future::try_join_all;
use log::info;
use thiserror::Error;
use crate::config::{ConfigError, ModelParameters};
use crate::output::{aggregate, CompletionResult};
use crate::prompt::errors::ExpansionError;
use crate::prompt::{ExpandedPrompt, PromptTemplate};
use crate::utils::llm::{Complete, CompletionRequest, MessageResponse, RemoteApiError};
use crate::variables::Variables;

/// Any failure of an evaluation run.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Expansion(#[from] ExpansionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    RemoteApi(#[from] RemoteApiError),
}

/// Runs prompts against one completion endpoint with fixed model parameters.
#[derive(Debug, Clone)]
pub struct PromptEvaluator<C> {
    client: C,
    parameters: ModelParameters,
}

impl<C: Complete> PromptEvaluator<C> {
    pub fn new(client: C, parameters: ModelParameters) -> Self {
        Self { client, parameters }
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Send one request per prompt concurrently and return the responses in prompt order.
    ///
    /// Parameters are checked before anything is sent. Fails as a whole on the first failing request.
    pub async fn dispatch<S: AsRef<str>>(&self, prompts: &[S]) -> Result<Vec<MessageResponse>, EvaluationError> {
        let requests = prompts
            .iter()
            .map(|prompt| CompletionRequest::new(prompt.as_ref(), &self.parameters))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Dispatching {} prompt(s) to model {}", requests.len(), self.parameters.model.as_deref().unwrap_or_default());
        let responses = try_join_all(requests.into_iter().map(|request| self.client.complete(request))).await?;
        Ok(responses)
    }

    /// Expand `template` over `variables`, dispatch every prompt and aggregate the results in expansion order.
    ///
    /// Missing variables and bad parameters fail before any request is sent.
    pub async fn evaluate(&self, template: &PromptTemplate, variables: &Variables) -> Result<Vec<CompletionResult>, EvaluationError> {
        self.parameters.validate()?;
        let expanded: Vec<ExpandedPrompt> = template.expand(variables)?.iter().collect();
        let prompts: Vec<&str> = expanded.iter().map(|e| e.prompt.as_str()).collect();
        let responses = self.dispatch(&prompts).await?;
        Ok(aggregate(expanded, &responses))
    }
}

/// Parse `template`, then [PromptEvaluator::evaluate] it with `client`.
pub async fn evaluate_prompts<C: Complete>(template: &str,
                                           variables: &Variables,
                                           parameters: ModelParameters,
                                           client: C) -> Result<Vec<CompletionResult>, EvaluationError> {
    let template = PromptTemplate::new(template);
    PromptEvaluator::new(client, parameters).evaluate(&template, variables).await
}
