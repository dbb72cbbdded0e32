mod output;
mod serve;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gqlprobe_core::config::parse_header;
use gqlprobe_core::{Config, Crawler, HttpTransport};

#[derive(Parser)]
#[command(name = "gqlprobe")]
#[command(about = "Find GraphQL operations that are reachable without credentials", long_about = None)]
struct Cli {
    /// Config file to use instead of the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every query and mutation of the target
    Crawl {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Test a single query or mutation
    Test {
        #[command(flatten)]
        target: TargetArgs,

        /// Root type the operation belongs to
        #[arg(short, long, value_enum, default_value_t = OperationKind::Query)]
        kind: OperationKind,

        /// Name of the root field
        name: String,
    },
    /// Run the HTTP control server
    Serve {
        #[command(flatten)]
        target: TargetArgs,

        /// Port to listen on
        #[arg(short = 'l', long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Reload the target schema periodically
        #[arg(long)]
        enable_polling: bool,

        /// Minutes between schema reloads
        #[arg(long)]
        polling_interval: Option<u64>,
    },
    /// Print the introspected schema as JSON
    Schema {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Send a query from a file and print the response
    Execute {
        #[command(flatten)]
        target: TargetArgs,

        /// File containing the query
        #[arg(short, long)]
        file: PathBuf,

        /// JSON file containing the variables
        #[arg(long)]
        variables: Option<PathBuf>,
    },
    /// Print the default configuration
    Config,
}

/// Flags shared by every command that talks to a target.
#[derive(Args)]
struct TargetArgs {
    /// GraphQL endpoint
    #[arg(short, long = "target-url")]
    target_url: Option<String>,

    /// Queries and mutations to skip
    #[arg(short, long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Header to send with every request, as key:value
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
}

impl TargetArgs {
    /// Applies the flags on top of the loaded configuration.
    fn apply(self, config: &mut Config) -> color_eyre::Result<()> {
        if let Some(url) = self.target_url {
            config.target.url = Some(url);
        }

        if !self.ignore.is_empty() {
            config.crawl.ignore = self.ignore;
        }

        for header in &self.headers {
            let (key, value) = parse_header(header)?;
            config.target.headers.insert(key, value);
        }

        Ok(())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OperationKind {
    Query,
    Mutation,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load {}", path.display()))?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Crawl { target, json } => {
            target.apply(&mut config)?;
            let crawler = build_crawler(&config)?;

            let spinner = spinner("Crawling");
            let result = crawler.crawl().await;
            spinner.finish_and_clear();
            let report = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_report(&report);
            }
        }
        Commands::Test { target, kind, name } => {
            target.apply(&mut config)?;
            let crawler = build_crawler(&config)?;

            let op = match kind {
                OperationKind::Query => crawler.test_query(&name).await?,
                OperationKind::Mutation => crawler.test_mutation(&name).await?,
            };
            output::print_operation(&op);
        }
        Commands::Serve {
            target,
            port,
            host,
            enable_polling,
            polling_interval,
        } => {
            target.apply(&mut config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if enable_polling {
                config.polling.enabled = true;
            }
            if let Some(interval) = polling_interval {
                config.polling.interval_minutes = interval;
            }

            // The target may also be set later through POST /target.
            let crawler = Arc::new(Crawler::new(http_transport(&config)?, &config)?);
            serve::start_server(
                crawler,
                serve::ServeConfig {
                    host,
                    port: config.server.port,
                },
            )
            .await?;
        }
        Commands::Schema { target } => {
            target.apply(&mut config)?;
            let crawler = build_crawler(&config)?;

            let spinner = spinner("Introspecting");
            let result = crawler.fetch_schema().await;
            spinner.finish_and_clear();

            println!("{}", serde_json::to_string_pretty(&result?)?);
        }
        Commands::Execute {
            target,
            file,
            variables,
        } => {
            target.apply(&mut config)?;
            let crawler = build_crawler(&config)?;

            let query = std::fs::read_to_string(&file)
                .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
            let variables: Option<serde_json::Value> = match variables {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)
                        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
                    Some(serde_json::from_str(&content).wrap_err("Variables file is not valid JSON")?)
                }
                None => None,
            };

            let response = crawler.execute(query, variables).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
        }
    }

    Ok(())
}

fn build_crawler(config: &Config) -> color_eyre::Result<Crawler<HttpTransport>> {
    if config.target.url.is_none() {
        return Err(eyre!("No GraphQL endpoint specified, use --target-url or set [target] url"));
    }
    Ok(Crawler::new(http_transport(config)?, config)?)
}

fn http_transport(config: &Config) -> color_eyre::Result<HttpTransport> {
    HttpTransport::with_timeout(config.target.timeout())
        .wrap_err("Failed to build the HTTP client")
}

/// Logs go to stderr so stdout only carries results.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::builder().parse_lossy("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy()
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn spinner(message: &'static str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner} {msg:.dim} {elapsed}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let spinner = ProgressBar::new_spinner()
        .with_message(message)
        .with_style(style);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
