use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mockprep_core::{Assessment, ComposeRequest, Engine, EngineConfig, Level, Mode, Session};

/// Log slug for commands that also log to a file.
const SERVE_LOG_SLUG: &str = "serve";

#[derive(Debug, Parser)]
#[command(name = "mockprep", about = "Interview prompt generator with session tracking")]
pub struct Cli {
    /// Directory holding sessions, configuration, prompt overrides and logs
    #[arg(long, global = true, default_value = ".mockprep")]
    pub data_dir: PathBuf,

    /// Configuration file (defaults to <data-dir>/config.yaml, else built-in)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compose an interview prompt and start a session
    Generate {
        /// Template identifier
        template: String,

        /// Candidate level (junior, middle, senior)
        #[arg(short, long)]
        level: Level,

        /// Technology stack, comma separated (replaces the configured default)
        #[arg(long, value_delimiter = ',')]
        stack: Vec<String>,

        /// Extra focus topics, comma separated
        #[arg(long, value_delimiter = ',')]
        focus: Vec<String>,

        /// Additional context for the interviewer
        #[arg(long)]
        context: Option<String>,

        /// Output shape (simulation, direct)
        #[arg(long)]
        mode: Option<Mode>,

        /// Minutes the candidate has to answer in simulation mode
        #[arg(long)]
        timebox: Option<u32>,

        /// Interview language
        #[arg(long, conflicts_with = "english")]
        language: Option<String>,

        /// Conduct the interview in English
        #[arg(long)]
        english: bool,

        /// Only print the prompt, do not record a session
        #[arg(long)]
        no_session: bool,
    },

    /// Record the evaluation of an existing session
    Evaluate {
        /// Session identifier printed by `generate`
        session_id: String,

        /// Score between 0 and 10
        #[arg(short, long, allow_negative_numbers = true)]
        score: f64,

        /// Evaluation notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List configured templates and their levels
    Templates {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List recorded sessions, most recent first
    Sessions {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Remove every recorded session
    Clear,

    /// Heuristically score an answer (text argument, --file, or stdin)
    Score {
        /// Answer text
        text: Option<String>,

        /// Read the answer from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to bind
        #[arg(short, long, default_value_t = 8787)]
        port: u16,
    },
}

impl Cli {
    /// Returns the log directory and, for long-running commands, the slug
    /// of the file log.
    pub fn log_context(&self) -> (PathBuf, Option<&'static str>) {
        let slug = match self.command {
            Commands::Serve { .. } => Some(SERVE_LOG_SLUG),
            _ => None,
        };
        (self.engine_config().logs_dir(), slug)
    }

    fn engine_config(&self) -> EngineConfig {
        match &self.config {
            Some(file) => EngineConfig::builder()
                .data_dir(self.data_dir.clone())
                .config_file(file.clone())
                .build(),
            None => EngineConfig::builder()
                .data_dir(self.data_dir.clone())
                .build(),
        }
    }

    pub async fn run(self) -> Result<()> {
        let engine = Engine::new(self.engine_config())?;

        match self.command {
            Commands::Generate {
                template,
                level,
                stack,
                focus,
                context,
                mode,
                timebox,
                language,
                english,
                no_session,
            } => {
                let request = ComposeRequest {
                    template_id: template,
                    level,
                    stack: (!stack.is_empty()).then_some(stack),
                    focus_boost: focus,
                    extra_context: context,
                    mode,
                    timebox_minutes: timebox,
                    language: if english {
                        Some("English".to_owned())
                    } else {
                        language
                    },
                };
                let generated = engine.generate(&request, !no_session)?;
                println!("{}", generated.prompt);
                if let Some(session) = generated.session {
                    eprintln!("session: {}", session.id);
                }
            }
            Commands::Evaluate {
                session_id,
                score,
                notes,
            } => {
                engine.evaluate(&session_id, score, notes.as_deref())?;
                println!("recorded score {score} for session {session_id}");
            }
            Commands::Templates { json } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(engine.templates())?);
                } else {
                    for template in engine.templates() {
                        let levels: Vec<&str> =
                            template.levels.iter().map(|l| l.as_str()).collect();
                        println!(
                            "{:<24} {:<36} {}",
                            template.id,
                            template.title,
                            levels.join(", ")
                        );
                    }
                }
            }
            Commands::Sessions { json } => {
                let sessions = engine.sessions()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&sessions)?);
                } else if sessions.is_empty() {
                    println!("no sessions recorded");
                } else {
                    for session in &sessions {
                        println!("{}", format_session(session));
                    }
                }
            }
            Commands::Clear => {
                engine.clear_sessions()?;
                println!("cleared sessions");
            }
            Commands::Score { text, file } => {
                let answer = read_answer(text, file.as_deref())?;
                print!("{}", format_assessment(&engine.assess(&answer)));
            }
            Commands::Serve { host, port } => {
                let router = mockprep_web::build_router(Arc::new(engine));
                let addr = SocketAddr::new(host, port);
                eprintln!("serving on http://{addr}");
                mockprep_web::serve(router, addr)
                    .await
                    .with_context(|| format!("failed to serve on {addr}"))?;
            }
        }
        Ok(())
    }
}

fn read_answer(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read answer file: {}", path.display()));
    }
    let mut answer = String::new();
    std::io::stdin()
        .read_to_string(&mut answer)
        .context("failed to read answer from stdin")?;
    Ok(answer)
}

fn format_session(session: &Session) -> String {
    let score = session
        .score
        .map(|s| format!("{s:.1}"))
        .unwrap_or_else(|| "-".to_owned());
    let mut line = format!(
        "{}  {}  {:<20} {:<6}  {:>4}",
        session.date, session.id, session.template_id, session.level, score
    );
    if let Some(notes) = &session.notes {
        line.push_str("  ");
        line.push_str(notes);
    }
    line
}

fn format_assessment(assessment: &Assessment) -> String {
    let mut out = format!("score: {}/10\n", assessment.score);
    for (title, items) in [
        ("strengths", &assessment.strengths),
        ("weaknesses", &assessment.weaknesses),
        ("recommendations", &assessment.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("{title}:\n"));
        for item in items {
            out.push_str(&format!("  - {item}\n"));
        }
    }
    out
}
