//! sitelens: entry point for the HTTP service and the one-shot CLI.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use sitelens::renderer::chromium::ChromiumRenderer;
use sitelens::{ExtractConfig, Extractor, NoopRenderer, Renderer};
use sitelens_server::config::{load_noise_rules, resolve_addr, resolve_request_timeout};
use sitelens_server::rest::{self, AppState};

#[derive(Parser)]
#[command(
    name = "sitelens",
    about = "Section-aware web page extraction with a headless-browser fallback",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API.
    Serve {
        /// Listen address (host:port). Also reads SITELENS_ADDR.
        #[arg(long)]
        addr: Option<String>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Per-request deadline in milliseconds. Also reads
        /// SITELENS_REQUEST_TIMEOUT_MS.
        #[arg(long)]
        request_timeout_ms: Option<u64>,
    },

    /// Extract one URL and print the result as JSON.
    Extract {
        url: String,

        #[command(flatten)]
        engine: EngineArgs,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   sitelens completions bash > ~/.local/share/bash-completion/completions/sitelens
    ///   sitelens completions zsh > ~/.zfunc/_sitelens
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct EngineArgs {
    /// JSON noise rule table replacing the built-in one. Also reads
    /// SITELENS_NOISE_RULES.
    #[arg(long)]
    noise_rules: Option<String>,

    /// Chromium binary. Defaults to SITELENS_CHROMIUM_PATH, then PATH.
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Never launch a browser.
    #[arg(long)]
    static_only: bool,
}

impl EngineArgs {
    async fn build(&self) -> anyhow::Result<Extractor> {
        let config = ExtractConfig::from_env()?;
        let rules = load_noise_rules(self.noise_rules.as_deref())?;
        let renderer: Arc<dyn Renderer> = if self.static_only {
            Arc::new(NoopRenderer)
        } else {
            match ChromiumRenderer::launch(self.chromium.clone(), &config.user_agent).await {
                Ok(chromium) => Arc::new(chromium),
                Err(e) => {
                    tracing::warn!("{e:#}; continuing without a browser");
                    Arc::new(NoopRenderer)
                }
            }
        };
        Ok(Extractor::new(config, rules, renderer))
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Serve {
            addr,
            engine,
            request_timeout_ms,
        } => {
            let addr = resolve_addr(addr.as_deref());
            let request_timeout = resolve_request_timeout(request_timeout_ms)?;
            let extractor = engine.build().await?;
            let state = Arc::new(AppState {
                extractor,
                request_timeout,
            });
            rest::serve(&addr, state).await?;
        }

        Commands::Extract {
            url,
            engine,
            pretty,
        } => {
            let extractor = engine.build().await?;
            let result = extractor.extract(&url).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");
            extractor.renderer().shutdown().await?;
        }

        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "sitelens",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
