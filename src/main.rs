use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tootscrap::config::{Credentials, Layout};
use tootscrap::process::Harvester;
use tootscrap::request::MastodonClient;
use tootscrap::{
    info_time, Result, DEFAULT_API_BASE_URL, DEFAULT_BASE_DIR, DEFAULT_ID_FIELD,
    DEFAULT_POSTS_PER_QUERY,
};

#[derive(Parser)]
#[command(name = "tootscrap")]
#[command(about = "Harvest Mastodon hashtag timelines into CSV checkpoints", long_about = None)]
struct Cli {
    #[arg(long, env = "MASTODON_CLIENT_ID", default_value = "")]
    client_id: String,

    #[arg(long, env = "MASTODON_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    client_secret: String,

    #[arg(long, env = "MASTODON_ACCESS_TOKEN", default_value = "", hide_env_values = true)]
    access_token: String,

    #[arg(long, env = "MASTODON_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    base_url: String,

    /// Directory all output goes under
    #[arg(long, default_value = DEFAULT_BASE_DIR)]
    out: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run epochs, resuming after the last checkpoint
    Epochs {
        /// Query list, one hashtag per line
        #[arg(long, short)]
        queries: PathBuf,

        /// Number of epochs to run
        #[arg(long, short, default_value = "1")]
        count: usize,

        /// Posts per query (clamped to 0..=40)
        #[arg(long, default_value_t = DEFAULT_POSTS_PER_QUERY, allow_negative_numbers = true)]
        posts_per_query: i64,
    },

    /// Merge all checkpoints into combined_epochs.csv
    Combine {
        /// Column used for de-duplication and sorting
        #[arg(long, default_value = DEFAULT_ID_FIELD)]
        id_field: String,
    },

    /// Search a single hashtag
    Search {
        query: String,

        #[arg(long, default_value_t = DEFAULT_POSTS_PER_QUERY, allow_negative_numbers = true)]
        posts_per_query: i64,

        /// Inclusive lower id bound
        #[arg(long)]
        start_id: Option<u128>,

        /// Inclusive upper id bound
        #[arg(long)]
        end_id: Option<u128>,
    },

    /// Search every hashtag in a query list
    SearchList {
        #[arg(long, short)]
        queries: PathBuf,

        #[arg(long, default_value_t = DEFAULT_POSTS_PER_QUERY, allow_negative_numbers = true)]
        posts_per_query: i64,

        #[arg(long)]
        start_id: Option<u128>,

        #[arg(long)]
        end_id: Option<u128>,
    },

    /// Search a single hashtag and write it as JSON and CSV
    Export {
        query: String,

        #[arg(long, default_value_t = DEFAULT_POSTS_PER_QUERY, allow_negative_numbers = true)]
        posts_per_query: i64,

        #[arg(long)]
        start_id: Option<u128>,

        #[arg(long)]
        end_id: Option<u128>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let start_time = Local::now();
    let cli = Cli::parse();

    let credentials = Credentials::new(cli.client_id, cli.client_secret, cli.access_token)
        .with_base_url(cli.base_url);
    let client = MastodonClient::new(credentials)?;
    let mut harvester = Harvester::new(client, Layout::new(cli.out));

    match cli.command {
        Commands::Epochs {
            queries,
            count,
            posts_per_query,
        } => {
            harvester.load_queries(queries)?;
            harvester.run_epochs(count, posts_per_query).await?;
        }
        Commands::Combine { id_field } => {
            let combined = harvester.combine_epochs(&id_field)?;
            info_time!("Combined archive holds {} posts", combined.len());
        }
        Commands::Search {
            query,
            posts_per_query,
            start_id,
            end_id,
        } => {
            harvester
                .search_one_query(&query, posts_per_query, start_id, end_id)
                .await?;
        }
        Commands::SearchList {
            queries,
            posts_per_query,
            start_id,
            end_id,
        } => {
            harvester.load_queries(queries)?;
            harvester
                .search_list_of_queries(posts_per_query, start_id, end_id)
                .await?;
        }
        Commands::Export {
            query,
            posts_per_query,
            start_id,
            end_id,
        } => {
            harvester
                .export_query(&query, posts_per_query, start_id, end_id)
                .await?;
        }
    }

    info_time!(start_time, "Full program time:");
    Ok(())
}
