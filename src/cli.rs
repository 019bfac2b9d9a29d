// command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing::info;

use crate::api::DEFAULT_SESSION;
use crate::config::Config;
use crate::core::seed;
use crate::output::Output;
use crate::{Agent, Ai, Db, Provider, Server, logger};

#[derive(Parser)]
#[command(name = "estateql", about = "Ask about Dubai properties in plain english")]
struct Cli {
    /// database connection url
    #[arg(long, short, env = "DATABASE_URL", global = true)]
    db: Option<String>,

    /// ai provider
    #[arg(long, short = 'p', global = true)]
    provider: Option<Provider>,

    /// api key for the ai provider
    #[arg(long, short = 'k', global = true)]
    api_key: Option<String>,

    /// model name, overrides the provider default
    #[arg(long, short = 'm', global = true)]
    model: Option<String>,

    /// api base url, for proxies and compatible gateways
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// toml config file
    #[arg(long, short = 'c', env = "ESTATEQL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// log level (RUST_LOG wins when set)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// start the http api
    Serve {
        /// port number
        #[arg(long)]
        port: Option<u16>,

        /// host to bind
        #[arg(long)]
        host: Option<String>,

        /// don't add sample listings on startup
        #[arg(long)]
        no_seed: bool,

        /// sample listings to generate
        #[arg(long)]
        seed_rows: Option<usize>,

        /// include error details in responses
        #[arg(long)]
        debug: bool,

        /// list rows instead of asking the model to phrase answers
        #[arg(long)]
        no_summarize: bool,
    },

    /// ask one question and print the answer
    Ask {
        /// the question, e.g. "villas in Emirates Hills with 5+ bedrooms"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// print the reply as json
        #[arg(long)]
        json: bool,

        /// also print the rows as a table
        #[arg(long, short)]
        table: bool,

        /// generate sql without running it
        #[arg(long)]
        dry_run: bool,

        /// list rows instead of asking the model to phrase answers
        #[arg(long)]
        no_summarize: bool,
    },

    /// create the properties table and add sample listings
    Seed {
        /// listings to generate
        #[arg(long, short)]
        rows: Option<usize>,

        /// insert even if the table is already populated
        #[arg(long, short)]
        force: bool,

        /// fixed rng seed for reproducible data
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// chat with a running server in the terminal
    Chat {
        /// server base url
        #[arg(long, short, env = "ESTATEQL_SERVER", default_value = "http://127.0.0.1:5000")]
        server: String,

        /// conversation id kept by the server
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },
}

pub async fn run() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(p) = cli.provider {
        config.llm.provider = p;
    }
    if cli.model.is_some() {
        config.llm.model = cli.model.clone();
    }
    if cli.api_base.is_some() {
        config.llm.api_base = cli.api_base.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // the chat ui owns the terminal, so no log output there
    if !matches!(cli.command, Commands::Chat { .. }) {
        logger::init(&config.log_level)?;
    }

    match cli.command {
        Commands::Serve {
            port,
            host,
            no_seed,
            seed_rows,
            debug,
            no_summarize,
        } => {
            let db = require_db(cli.db)?;

            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(rows) = seed_rows {
                config.seed.rows = rows;
            }
            config.seed.enabled &= !no_seed;
            config.server.debug |= debug;
            config.agent.summarize &= !no_summarize;

            Ok(Server::run(&db, &config, cli.api_key).await?)
        }

        Commands::Ask {
            question,
            json,
            table,
            dry_run,
            no_summarize,
        } => {
            let db_url = require_db(cli.db)?;
            config.agent.summarize &= !no_summarize;

            let ai = Ai::new(&config.llm, cli.api_key)?;
            let db = Db::connect(&db_url).await?;
            let schema = db.schema().await?;

            let agent = Agent::new(db, ai, schema, config.agent.clone());
            let reply = agent.ask(&question.join(" "), &[], dry_run).await?;

            if json {
                Output::raw(&reply);
            } else {
                Output::reply(&reply);
                if let Some(result) = reply.result.as_ref().filter(|_| table) {
                    println!();
                    Output::pretty(result);
                }
            }
            Ok(())
        }

        Commands::Seed {
            rows,
            force,
            rng_seed,
        } => {
            let db_url = require_db(cli.db)?;
            let db = Db::connect(&db_url).await?;

            let rows = rows.unwrap_or(config.seed.rows);
            let report = seed::populate(&db, rows, force, rng_seed).await?;
            info!(?report, "seed finished");

            if report.inserted == 0 {
                println!("properties already has {} rows, nothing inserted", report.existing);
            } else {
                println!(
                    "inserted {} listings ({} already present)",
                    report.inserted, report.existing
                );
            }
            Ok(())
        }

        Commands::Chat { server, session } => Ok(crate::tui::run(&server, &session).await?),
    }
}

fn require_db(db: Option<String>) -> Result<String> {
    db.ok_or_else(|| miette::miette!("database url required (--db or DATABASE_URL)"))
}
