use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use study_guide::{
    client::{DEFAULT_SERVER_URL, GuideClient},
    config::{Config, DEFAULT_LOG_FILTER},
    guide::{ComponentRequest, GuideSession, StudyPreferences},
    http::start_http_server,
    server::StudyGuideServer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "study-guide",
    version,
    about = "Personalized study guides, generated step by step"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the study guide form and its JSON endpoints
    Serve {
        /// Address to bind, overrides STUDY_GUIDE_BIND
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Generate a guide step by step against a running server
    Generate(GenerateArgs),
    /// Explain a term in the context of a subject
    Explain {
        #[arg(long)]
        subject: String,
        /// Term or passage to explain
        term: String,
        #[command(flatten)]
        conn: ConnArgs,
    },
}

#[derive(Args, Debug)]
struct ConnArgs {
    /// Base URL of the study guide server
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server: String,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 180)]
    timeout_secs: u64,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    subject: String,
    #[arg(long, default_value = "beginner")]
    level: String,
    /// Hours available per week
    #[arg(long, default_value = "5")]
    hours: String,
    #[arg(long, default_value = "visual")]
    style: String,
    #[arg(long, default_value = "")]
    goal: String,
    #[arg(long, default_value_t = 1)]
    steps: u32,
    /// Write the assembled guide as Markdown
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    conn: ConnArgs,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind } => {
            let mut config = Config::load()?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let server = StudyGuideServer::from_config(config)?;
            start_http_server(server).await?;
        }
        Command::Generate(args) => run_generate(args).await?,
        Command::Explain {
            subject,
            term,
            conn,
        } => {
            let client = GuideClient::new(conn.server, Duration::from_secs(conn.timeout_secs))?;
            let explanation = client
                .explain(&ComponentRequest {
                    component: term,
                    subject,
                })
                .await?;
            println!("{}", explanation.trim_end());
        }
    }

    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let client = GuideClient::new(args.conn.server, Duration::from_secs(args.conn.timeout_secs))?;
    let preferences = StudyPreferences {
        subject: args.subject,
        current_level: args.level,
        time_available: args.hours,
        learning_style: args.style,
        goal: args.goal,
    };
    let mut session = GuideSession::new(preferences, args.steps);
    info!(
        "Generating {} step(s) for {} via {}",
        session.total_steps(),
        session.preferences().subject,
        client.base_url()
    );

    let outcome = client
        .run_session(&mut session, |card| {
            println!("## Step {}: {}\n", card.step + 1, card.title);
            println!("{}\n", card.markdown.trim_end());
        })
        .await;

    if let Some(path) = &args.out
        && !outcome.cards.is_empty()
    {
        std::fs::write(path, session.to_markdown())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote guide to {}", path.display());
    }

    match outcome.error {
        Some(e) => Err(anyhow::anyhow!(
            "stopped after {} of {} step(s): {}",
            outcome.cards.len(),
            session.total_steps(),
            e
        )),
        None => Ok(()),
    }
}
