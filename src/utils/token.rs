//! Token counting traits and utilities

pub mod tiktoken;

/// Trait for counting tokens in a string.
pub trait CountToken {
    fn count_token(&self, string: &str) -> usize;
}

/// Blanket impl of CountToken for Fn(&str) -> usize.
impl<F> CountToken for F where F: Fn(&str) -> usize {
    fn count_token(&self, string: &str) -> usize {
        self(string)
    }
}

/// Count the number of tokens in a string by the length of the string.
#[inline]
pub fn count_tokens_by_len(string: &str) -> usize {
    string.len()
}

/// Count tokens of every prompt, in order.
pub fn count_prompt_tokens<'a, I>(prompts: I, counter: &impl CountToken) -> Vec<usize>
    where I: IntoIterator<Item=&'a str> {
    prompts.into_iter().map(|p| counter.count_token(p)).collect()
}

#[cfg(test)]
mod test_token {
    use super::{count_prompt_tokens, count_tokens_by_len, CountToken};

    #[test]
    fn test_str_len_impl() {
        let counter = str::len;
        let size = counter.count_token("");
        assert_eq!(0, size);
    }

    #[test]
    fn test_count_prompts() {
        let counter = count_tokens_by_len;
        assert_eq!(vec![2, 5], count_prompt_tokens(["hi", "hello"], &counter));
    }
}
