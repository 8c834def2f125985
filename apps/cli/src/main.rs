use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use searchstream_core::{
    Config, ConfigLayer, Endpoint, HttpConnector, IgnoreReason, Phase, StartOutcome,
    StreamSessionController,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing_subscriber::EnvFilter;

use crate::render::TerminalRenderer;

mod render;

/// CLI wrapper for Endpoint enum (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliEndpoint {
    SearchComplete,
    Search,
}

impl From<CliEndpoint> for Endpoint {
    fn from(cli: CliEndpoint) -> Self {
        match cli {
            CliEndpoint::SearchComplete => Endpoint::SearchComplete,
            CliEndpoint::Search => Endpoint::Search,
        }
    }
}

#[derive(Parser)]
#[command(name = "searchstream")]
#[command(about = "Stream answers, videos and video summaries from the search SSE API")]
struct Cli {
    /// Question to search for. Omit it to type questions interactively.
    query: Option<String>,

    /// Search endpoint
    #[arg(short, long)]
    endpoint: Option<CliEndpoint>,

    /// Backend base URL (default http://localhost:3333)
    #[arg(long)]
    base_url: Option<String>,

    /// Certainty threshold (search-complete only)
    #[arg(long)]
    certainty: Option<f64>,

    /// Maximum number of videos (search-complete only)
    #[arg(long)]
    limit: Option<u32>,

    /// Prompt for the answer (search-complete only)
    #[arg(long)]
    prompt: Option<String>,

    /// Prompt for the per-video summaries (search-complete only)
    #[arg(long)]
    prompt_video: Option<String>,

    /// Seconds to wait for the end event before closing the stream
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default <config dir>/searchstream/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final session as JSON instead of streaming text
    #[arg(long)]
    json: bool,

    /// Print event counters after each session
    #[arg(long)]
    stats: bool,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            base_url: self.base_url.clone(),
            endpoint: self.endpoint.map(Endpoint::from),
            timeout_secs: self.timeout,
            certainty: self.certainty,
            limit: self.limit,
            prompt: self.prompt.clone(),
            prompt_video: self.prompt_video.clone(),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn exit_code(phase: Phase) -> ExitCode {
    match phase {
        Phase::Completed | Phase::NoResults => ExitCode::SUCCESS,
        Phase::Errored | Phase::TimedOut => ExitCode::from(1),
        Phase::Idle | Phase::Streaming => ExitCode::from(130),
    }
}

/// Run one submission to its end. `None` when the query was ignored.
async fn run_query(
    ctl: &mut StreamSessionController<HttpConnector>,
    config: &Config,
    cli: &Cli,
    query: &str,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<Option<Phase>> {
    let request = config.request(query);

    match ctl.start_stream(&request)? {
        StartOutcome::Started { .. } => {}
        StartOutcome::Ignored(IgnoreReason::EmptyQuery) => return Ok(None),
        StartOutcome::Ignored(IgnoreReason::AlreadyStreaming) => {
            anyhow::bail!("a search is already streaming")
        }
    }

    if !cli.json {
        println!(
            "{} {}",
            style(request.endpoint.name()).dim(),
            style(request.url(&config.base_url)?).dim()
        );
    }

    let mut renderer = TerminalRenderer::start(cli.json);
    let phase = ctl
        .drive(shutdown, |update, state| renderer.on_update(update, state))
        .await;

    let metrics = cli.stats.then(|| ctl.metrics().snapshot());
    renderer.finish(&request, ctl.state(), metrics)?;

    Ok(Some(phase))
}

async fn interactive(
    ctl: &mut StreamSessionController<HttpConnector>,
    config: &Config,
    cli: &Cli,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<ExitCode> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut code = ExitCode::SUCCESS;

    loop {
        print!("{} ", style("›").cyan().bold());
        io::stdout().flush()?;

        let line = tokio::select! {
            Ok(()) = shutdown.recv() => {
                code = exit_code(Phase::Idle);
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        match run_query(ctl, config, cli, &line, shutdown).await? {
            Some(Phase::Idle) => {
                code = exit_code(Phase::Idle);
                break;
            }
            Some(_) | None => continue,
        }
    }

    ctl.close();
    Ok(code)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::load(cli.config.as_deref(), cli.overrides()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return Ok(ExitCode::from(2));
        }
    };

    tracing::debug!(?config, "configuration loaded");

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    if !cli.json {
        println!(
            "\n{}  {}\n",
            style("searchstream").cyan().bold(),
            style("SSE search harness").dim()
        );
    }

    let mut ctl = StreamSessionController::new(HttpConnector::new(), config.settings());

    let Some(query) = cli.query.as_deref() else {
        return interactive(&mut ctl, &config, &cli, &mut shutdown_rx).await;
    };

    match run_query(&mut ctl, &config, &cli, query, &mut shutdown_rx).await? {
        Some(phase) => Ok(exit_code(phase)),
        None => {
            eprintln!("{} empty question", style("Error:").red().bold());
            Ok(ExitCode::from(2))
        }
    }
}
