pub mod llm;
pub mod token;
#[cfg(feature = "terminal_printing")]
pub mod printing;
pub(crate) mod prompt_processing;

pub use prompt_processing::get_placeholders;
