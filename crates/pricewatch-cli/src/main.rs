mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricewatch-cli")]
#[command(about = "Vendor price scraping from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one scrape over the configured vendors and print the summary
    Run {
        /// Restrict the run to these vendors (repeatable); defaults to all enabled vendors
        #[arg(long = "vendor")]
        vendors: Vec<String>,

        /// Scrape this keyword instead of each vendor's categories
        #[arg(long)]
        keyword: Option<String>,

        /// Only record products whose price changed
        #[arg(long)]
        price_update: bool,

        /// Save at most this many products per keyword and page
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=500))]
        max_products: Option<u64>,

        /// When the run was expected to start (RFC 3339 or unix seconds)
        #[arg(long)]
        expected_start: Option<String>,
    },
    /// List enabled vendors and their categories
    Vendors,
    /// Check a keyword against the API's validation rules
    CheckKeyword { keyword: String },
    /// Print the salted SHA-256 digest to put in tokens.yaml
    HashToken {
        token: String,

        #[arg(long, env = "PRICEWATCH_TOKEN_SALT")]
        salt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            vendors,
            keyword,
            price_update,
            max_products,
            expected_start,
        } => {
            commands::run(commands::RunArgs {
                vendors,
                keyword,
                price_update,
                max_products,
                expected_start,
            })
            .await
        }
        Commands::Vendors => commands::list_vendors(),
        Commands::CheckKeyword { keyword } => commands::check_keyword(&keyword),
        Commands::HashToken { token, salt } => {
            println!("{}", commands::hash_token(&token, salt.as_deref()));
            Ok(())
        }
    }
}
