use anyhow::Result;
pub use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::utils::token::CountToken;

/// Counter using the Tiktoken `cl100k_base` encoding.
///
/// Hosted models tokenize with their own vocabularies, so the count is an estimate of the input size of a prompt,
/// good for comparing combinations before sending them.
#[derive(Clone)]
#[readonly::make]
pub struct Tiktoken {
    /// The tokenizer. read-only.
    #[readonly]
    pub bpe: CoreBPE,
}

impl Tiktoken {
    /// Create a new Tiktoken counter.
    pub fn new() -> Result<Self> {
        Ok(Self { bpe: cl100k_base()? })
    }
}

impl CountToken for Tiktoken {
    fn count_token(&self, string: &str) -> usize {
        self.bpe.encode_with_special_tokens(string).len()
    }
}

#[cfg(test)]
mod test_tiktoken {
    use crate::utils::token::CountToken;
    use super::Tiktoken;

    #[test]
    fn test_count() {
        let counter = Tiktoken::new().unwrap();
        assert_eq!(0, counter.count_token(""));
        let short = counter.count_token("Translate hello to fr");
        let long = counter.count_token("Translate hello to fr, then explain the grammar in detail.");
        assert!(short > 0);
        assert!(long > short);
    }
}
