// command line interface

use crate::core::{CompanyDocument, SessionId, TextLoader};
use crate::logging::{self, LogFormat};
use crate::output::Output;
use crate::{App, Provider, Server, Settings};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "agentrail",
    about = "Ask legal, financial, and general questions, routed to guarded agents"
)]
struct Cli {
    /// ai provider (claude, openai)
    #[arg(long, short = 'p', env = "AGENTRAIL_PROVIDER", default_value = "claude", global = true)]
    provider: Provider,

    /// api key for the ai provider
    #[arg(long, short = 'k', global = true)]
    api_key: Option<String>,

    /// model name, provider default if not set
    #[arg(long, short = 'm', env = "AGENTRAIL_MODEL", global = true)]
    model: Option<String>,

    /// seconds to wait for each generation call
    #[arg(long, default_value = "60", global = true)]
    timeout: u64,

    /// toml file overriding the built-in content policies
    #[arg(long, env = "AGENTRAIL_POLICIES", global = true)]
    policies: Option<PathBuf>,

    /// log level, RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[arg(long, value_enum, default_value = "compact", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// start as http server
    Serve {
        /// port number
        #[arg(long, short = 'P', default_value = "3000")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// ask one question and exit
    Ask {
        query: String,

        /// print the reply turn as json
        #[arg(long)]
        json: bool,
    },

    /// interactive chat on stdin (the default)
    Chat {
        /// write the transcript here on exit
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// compare four companies from text documents
    Analyze {
        #[arg(num_args = 4, required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);

    let settings = Settings {
        provider: cli.provider,
        api_key: cli.api_key,
        model: cli.model,
        timeout: Duration::from_secs(cli.timeout.max(1)),
        policies: cli.policies,
    };
    let app = App::from_settings(&settings)?;

    match cli.command {
        Some(Commands::Serve { port, host }) => Ok(Server::run(app, &host, port).await?),

        Some(Commands::Ask { query, json }) => {
            let id = SessionId::generate();
            let turn = app.sessions.submit(&id, &query).await?;
            if json {
                Output::raw(&turn);
            } else {
                Output::pretty(&turn, app.sessions.assistant().agents());
            }
            Ok(())
        }

        Some(Commands::Analyze { files, json }) => {
            let mut companies = Vec::with_capacity(files.len());
            for path in &files {
                companies.push(CompanyDocument::load(&TextLoader, path)?);
            }

            let report = app.analyst.analyze(companies).await?;
            if json {
                Output::raw(&report);
            } else {
                Output::report(&report);
            }
            Ok(())
        }

        Some(Commands::Chat { export }) => chat(app, export).await,
        None => chat(app, None).await,
    }
}

async fn chat(app: App, export: Option<PathBuf>) -> Result<()> {
    let agents = app.sessions.assistant().agents();
    let id = SessionId::generate();

    println!("ask anything - /agents, /reset, /export [file], /quit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().into_diagnostic()?;

        let Some(line) = lines.next_line().await.into_diagnostic()? else {
            break;
        };
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => continue,
            ("/quit" | "/exit", _) => break,
            ("/agents", _) => Output::agents(agents),
            ("/reset", _) => {
                app.sessions.reset(&id).await;
                println!("conversation cleared\n");
            }
            ("/export", path) => {
                let path = if path.trim().is_empty() {
                    default_export_path()
                } else {
                    PathBuf::from(path.trim())
                };
                write_transcript(&app, &id, &path).await?;
            }
            _ => match app.sessions.submit(&id, line).await {
                Ok(turn) => {
                    println!();
                    Output::pretty(&turn, agents);
                    println!();
                }
                Err(e) => eprintln!("error: {e}\n"),
            },
        }
    }

    if let Some(path) = export {
        write_transcript(&app, &id, &path).await?;
    }
    Ok(())
}

async fn write_transcript(app: &App, id: &SessionId, path: &Path) -> Result<()> {
    let turns = app.sessions.export(id).await;
    let json = serde_json::to_string_pretty(&turns).into_diagnostic()?;
    tokio::fs::write(path, json).await.into_diagnostic()?;
    println!("saved {} turns to {}\n", turns.len(), path.display());
    Ok(())
}

fn default_export_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("conversation_{stamp}.json"))
}
