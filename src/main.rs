use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use price_scout::browser::open_in_browser;
use price_scout::report::{render_deals, render_history, render_results, top_deals};
use price_scout::scrapers::HttpFetcher;
use price_scout::{logging, Config, PriceStore, PriceTracker};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "price-scout")]
#[command(about = "Compare Amazon and eBay prices and track them over time")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log file (overrides the config)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Number of best deals to show (overrides the config)
    #[arg(long)]
    top: Option<usize>,

    /// Run one command and exit instead of showing the menu
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search both marketplaces and save the results
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the saved records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show stored price history for a search term
    History {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }
    if let Some(top) = cli.top {
        config.top_deals = top;
    }
    config.validate()?;

    logging::init(&config.log_file)?;
    info!("🛍️  Price Scout starting");

    let store = PriceStore::open(&config.database_path)
        .await
        .context("Failed to open price database")?;
    let fetcher = HttpFetcher::new(&config.http, config.marketplaces.clone())?;
    let tracker = PriceTracker::new(Box::new(fetcher), store.clone(), config.marketplaces.clone());

    let result = match cli.command {
        Some(Commands::Search { query, json }) => search_once(&tracker, &query.join(" "), json).await,
        Some(Commands::History { query, json }) => history_once(&tracker, &query.join(" "), json).await,
        None => run_menu(&tracker, config.top_deals).await,
    };

    store.close().await;
    result
}

async fn search_once(tracker: &PriceTracker, query: &str, json: bool) -> Result<()> {
    let outcome = tracker.search(query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    } else {
        print!("{}", render_results(&outcome));
    }
    Ok(())
}

async fn history_once(tracker: &PriceTracker, query: &str, json: bool) -> Result<()> {
    let records = tracker.history(query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render_history(query, &records));
    }
    Ok(())
}

fn clear_terminal() {
    print!("\x1B[2J\x1B[H");
    let _ = std::io::stdout().flush();
}

/// Line-oriented reader over stdin that treats Ctrl-C and EOF as "quit"
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        print!("{question}");
        std::io::stdout().flush()?;

        tokio::select! {
            line = self.lines.next_line() => {
                Ok(line.context("Failed to read from stdin")?.map(|l| l.trim().to_string()))
            }
            _ = tokio::signal::ctrl_c() => Ok(None),
        }
    }

    async fn confirm(&mut self, question: &str) -> Result<Option<bool>> {
        Ok(self
            .ask(question)
            .await?
            .map(|answer| answer.eq_ignore_ascii_case("y")))
    }

    async fn pause(&mut self) -> Result<Option<()>> {
        Ok(self.ask("\n⏎ Press Enter to continue...").await?.map(|_| ()))
    }
}

async fn run_menu(tracker: &PriceTracker, top_n: usize) -> Result<()> {
    let mut prompt = Prompt::new();

    loop {
        clear_terminal();
        println!("🛍️  Price Comparison Tool 🛍️");
        println!("\n1. 🔍 Search for products");
        println!("2. 📊 View price history");
        println!("3. 🚪 Exit");

        let Some(choice) = prompt.ask("\n✨ Enter your choice (1-3): ").await? else {
            break;
        };

        let keep_going = match choice.as_str() {
            "1" => search_menu(tracker, &mut prompt, top_n).await?,
            "2" => history_menu(tracker, &mut prompt).await?,
            "3" => break,
            _ => {
                println!("❌ Invalid choice. Please try again.");
                prompt.pause().await?.is_some()
            }
        };

        if !keep_going {
            break;
        }
    }

    clear_terminal();
    println!("👋 Goodbye! Thank you for using Price Comparison Tool!");
    Ok(())
}

/// Returns `false` when the user quit mid-way
async fn search_menu(tracker: &PriceTracker, prompt: &mut Prompt, top_n: usize) -> Result<bool> {
    clear_terminal();
    let Some(query) = prompt.ask("🔍 Enter product name to search: ").await? else {
        return Ok(false);
    };
    if query.is_empty() {
        println!("❌ Please enter a valid product name.");
        return Ok(prompt.pause().await?.is_some());
    }

    println!("\n🔍 Searching for products across multiple sites...");
    let outcome = match tracker.search(&query).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Search for {:?} could not be saved: {}", query, e);
            println!("❌ Could not save search results: {:#}", anyhow::Error::from(e));
            return Ok(prompt.pause().await?.is_some());
        }
    };
    print!("{}", render_results(&outcome));

    if !outcome.records.is_empty() {
        let question = format!("\n🎁 Would you like to see the top {top_n} best deals? (y/n): ");
        match prompt.confirm(&question).await? {
            None => return Ok(false),
            Some(false) => {}
            Some(true) => {
                clear_terminal();
                let deals = top_deals(&outcome.records, top_n);
                print!("{}", render_deals(&deals));

                let open = prompt
                    .confirm("\n🌐 Would you like to open these deals in your browser? (y/n): ")
                    .await?;
                match open {
                    None => return Ok(false),
                    Some(true) => deals.iter().for_each(|deal| open_in_browser(&deal.url)),
                    Some(false) => {}
                }
            }
        }
    }

    Ok(prompt.pause().await?.is_some())
}

async fn history_menu(tracker: &PriceTracker, prompt: &mut Prompt) -> Result<bool> {
    clear_terminal();
    let Some(query) = prompt.ask("🔍 Enter product name to view history: ").await? else {
        return Ok(false);
    };
    if query.is_empty() {
        println!("❌ Please enter a valid product name.");
        return Ok(prompt.pause().await?.is_some());
    }

    match tracker.history(&query).await {
        Ok(records) => {
            print!("{}", render_history(&query, &records));
            if records.is_empty() {
                let terms = tracker.known_terms().await;
                if !terms.is_empty() {
                    println!("💡 Searches with saved history: {}", terms.join(", "));
                }
            }
        }
        Err(e) => {
            error!("History lookup for {:?} failed: {}", query, e);
            println!("❌ Could not read price history: {:#}", anyhow::Error::from(e));
        }
    }

    Ok(prompt.pause().await?.is_some())
}
