mod error;
mod manager;
mod template;

pub use error::PmError;
pub use manager::{INTERVIEW_TEMPLATE, PromptManager};
pub use template::PromptTemplate;
