//! # Prompt
//! A prompt is simply a string
//! ## PromptTemplate
//! A prompt template is a string with placeholders.
//!
//! ## Placeholder
//! A placeholder is a string that is in the format of `{name}`, where the name is made of word characters. It can be
//! filled with a value. Literal braces are written doubled, `{{` and `}}`.
//!
//! ## Expansion
//! Given [Variables], [PromptTemplate::expand] checks that every placeholder is bound and returns an [Expansion]: the
//! cartesian product of all candidate values. Iterating an [Expansion] lazily yields one [ExpandedPrompt] per
//! combination, and it can be iterated again from the start as many times as needed.

use std::collections::{BTreeMap, HashMap};
use std::iter::FusedIterator;
use std::sync::Arc;
use log::warn;
use serde::Serialize;
use crate::prompt::errors::{ExpansionError, MissingVariable};
use crate::utils::prompt_processing::{get_placeholders, replace_all_placeholders};
use crate::variables::Variables;


/// A prompt template with placeholders.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PromptTemplate {
    /// The template string, immutable
    template: Arc<String>,

    /// The placeholders in the template in order of first appearance, readonly
    #[readonly]
    pub placeholders: Vec<String>,
}

impl PromptTemplate {
    /// Create a prompt template from a string. Warns if the template does not have any placeholder.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let placeholders = get_placeholders(&template);
        if placeholders.is_empty() {
            warn!("Your prompt template does not have a placeholder. If this is intended, ignore this message. \
            Otherwise, check whether you have written placeholders correctly.\n\
            Got prompt template:\n\
            {}", template);
        }
        Self {
            template: Arc::new(template),
            placeholders,
        }
    }

    /// Get the prompt template as a string.
    #[inline]
    pub fn str(&self) -> &str {
        &self.template
    }

    /// Prepare the cartesian product of `variables` over this template.
    ///
    /// Axes are the template's placeholders in order of first appearance, then any variables the template does not
    /// reference (by name). Earlier axes vary slower. Fails if a placeholder has no variable, or if the number of
    /// combinations does not fit in a `usize`.
    pub fn expand<'a>(&'a self, variables: &'a Variables) -> Result<Expansion<'a>, ExpansionError> {
        let missing: Vec<String> = self.placeholders
            .iter()
            .filter(|p| !variables.contains(p))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(MissingVariable {
                missing,
                available: variables.names().map(str::to_string).collect(),
            }.into());
        }

        let mut axes: Vec<(&'a str, &'a [String])> = Vec::with_capacity(variables.len());
        for placeholder in self.placeholders.iter() {
            if let Some(spec) = variables.get(placeholder) {
                axes.push((placeholder.as_str(), spec.values()));
            }
        }
        for (name, spec) in variables {
            if !self.placeholders.contains(name) {
                warn!("Variable `{}` does not appear in the prompt template but still multiplies the combinations", name);
                axes.push((name.as_str(), spec.values()));
            }
        }
        let mut len = 1usize;
        for (name, values) in axes.iter() {
            if values.is_empty() {
                warn!("Variable `{}` has no values, so no prompt combination will be produced", name);
                len = 0;
            }
        }
        // an empty axis wins over overflow
        if len != 0 {
            len = axes
                .iter()
                .try_fold(1usize, |acc, (_, values)| acc.checked_mul(values.len()))
                .ok_or_else(|| ExpansionError::TooManyCombinations {
                    counts: axes.iter().map(|(_, values)| values.len()).collect(),
                })?;
        }
        Ok(Expansion { template: self, axes, len })
    }

    pub(crate) fn render(&self, mapping: &HashMap<&str, &str>) -> String {
        replace_all_placeholders(self.str(), mapping)
    }
}

/// One concrete value per placeholder, chosen from the cartesian product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PromptCombination(BTreeMap<String, String>);

impl PromptCombination {
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.0.get(placeholder).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item=(&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PromptCombination {
    fn from_iter<T: IntoIterator<Item=(K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A prompt produced by an [Expansion] together with the combination that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedPrompt {
    pub combination: PromptCombination,
    pub prompt: String,
}

/// The cartesian product of a template's variables, ready to be iterated.
#[derive(Debug, Clone)]
pub struct Expansion<'a> {
    template: &'a PromptTemplate,
    axes: Vec<(&'a str, &'a [String])>,
    len: usize,
}

impl<'a> Expansion<'a> {
    /// Number of combinations. Zero if any variable has no values, one if there are no variables.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh iterator starting from the first combination.
    pub fn iter(&self) -> Combinations<'_> {
        Combinations {
            expansion: self,
            cursor: vec![0; self.axes.len()],
            remaining: self.len(),
        }
    }

    /// Only the expanded prompt strings.
    pub fn prompts(&self) -> impl Iterator<Item=String> + '_ {
        self.iter().map(|expanded| expanded.prompt)
    }
}

impl<'e, 'a> IntoIterator for &'e Expansion<'a> {
    type Item = ExpandedPrompt;
    type IntoIter = Combinations<'e>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the combinations of an [Expansion]. The last axis varies fastest.
#[derive(Debug, Clone)]
pub struct Combinations<'e> {
    expansion: &'e Expansion<'e>,
    cursor: Vec<usize>,
    remaining: usize,
}

impl<'e> Combinations<'e> {
    fn advance(&mut self) {
        for (idx, (_, values)) in self.expansion.axes.iter().enumerate().rev() {
            self.cursor[idx] += 1;
            if self.cursor[idx] < values.len() {
                return;
            }
            self.cursor[idx] = 0;
        }
    }
}

impl<'e> Iterator for Combinations<'e> {
    type Item = ExpandedPrompt;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let mapping: HashMap<&str, &str> = self.expansion.axes
            .iter()
            .zip(self.cursor.iter())
            .map(|((name, values), &idx)| (*name, values[idx].as_str()))
            .collect();
        let prompt = self.expansion.template.render(&mapping);
        let combination = mapping.into_iter().collect();
        self.remaining -= 1;
        self.advance();
        Some(ExpandedPrompt { combination, prompt })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

impl FusedIterator for Combinations<'_> {}

pub mod errors {
    use thiserror::Error;

    /// Error when the prompt template references placeholders that have no variable.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    #[error("MissingVariable: prompt template requires placeholders {missing:?}, but only {available:?} are defined")]
    pub struct MissingVariable {
        pub missing: Vec<String>,
        pub available: Vec<String>,
    }

    /// Why a template could not be expanded over a set of variables.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ExpansionError {
        #[error(transparent)]
        MissingVariable(#[from] MissingVariable),
        #[error("TooManyCombinations: value counts {counts:?} multiply beyond {}", usize::MAX)]
        TooManyCombinations { counts: Vec<usize> },
    }
}
