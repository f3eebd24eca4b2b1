mod atomic;
mod composer;
mod config;
mod engine;
mod error;
mod scorer;
mod session;
mod store;

pub use composer::{ComposeRequest, Composer, PromptContext, resolve};
pub use config::{
    Defaults, EngineConfig, InterviewConfig, Level, Mode, OutputSection, Template,
    TemplateOverrides, builtin_config, load_interview_config, parse_interview_config,
};
pub use engine::{Engine, Generated};
pub use error::{CoreError, ErrorKind};
pub use scorer::{Assessment, score};
pub use session::{SCORE_RANGE, Session, sort_most_recent_first, validate_score};
pub use store::{JsonFileStore, MemoryStore, SessionStore};
