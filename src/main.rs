use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use pollboard::catalog::ChampionBrowser;
use pollboard::catalog::filter::{ROLES, RoleFilter};
use pollboard::config::AppConfig;
use pollboard::display::{render_assets, render_browser, render_detail, render_list, render_price};
use pollboard::gateway::http_client::HttpClient;
use pollboard::gateway::{CoinGeckoClient, DataDragonClient};
use pollboard::price::PriceWidget;
use pollboard::utils;

#[derive(Parser)]
#[command(name = "pollboard", about = "Price prediction and champion browser widgets", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Tracing filter directive; overrides -v
    #[arg(long, env = "POLLBOARD_LOG", global = true)]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the BTC price and show the prediction (refreshes on the countdown)
    Price {
        /// Fetch once, print, and exit
        #[arg(long)]
        once: bool,
    },

    /// List champions, optionally filtered
    Champions {
        /// Case-insensitive substring of name or title
        #[arg(short, long, default_value = "")]
        search: String,

        /// Role: all, Assassin, Fighter, Mage, Marksman, Support or Tank (any case)
        #[arg(short, long, default_value = "all")]
        role: RoleFilter,
    },

    /// Show one champion's details
    Champion {
        /// Champion id, e.g. Ahri
        id: String,
    },

    /// Interactive browser: search, role, open, back, quit
    Browse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = cli.log.clone().unwrap_or_else(|| {
        match cli.verbose {
            0 => "pollboard=info,warn",
            1 => "pollboard=debug,info",
            _ => "trace",
        }
        .to_string()
    });

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let http = HttpClient::new(&config.http)?;

    match cli.command {
        Command::Price { once } => {
            let source = Arc::new(CoinGeckoClient::new(http, &config.price)?);
            let widget = PriceWidget::new(source, &config.price, Box::new(StdRng::from_entropy()));
            run_price(widget, once).await?;
        }

        Command::Champions { search, role } => {
            let (_, browser) = catalog_browser(http, &config)?;
            load_catalog(&browser).await?;
            browser.set_search(&search);
            browser.set_role(role);
            println!("{}", render_list(&browser.visible(), &browser.query()));
        }

        Command::Champion { id } => {
            let (dragon, browser) = catalog_browser(http, &config)?;
            load_catalog(&browser).await?;
            let detail = browser
                .open(&id)
                .await
                .with_context(|| format!("No details available for {:?}", id))?;
            println!("{}", render_detail(&detail));
            println!("{}", render_assets(&dragon, &detail, browser.find(&id).as_ref())?);
        }

        Command::Browse => {
            let (_, browser) = catalog_browser(http, &config)?;
            load_catalog(&browser).await?;
            run_browser(&browser).await?;
        }
    }

    Ok(())
}

fn catalog_browser(
    http: HttpClient,
    config: &AppConfig,
) -> Result<(Arc<DataDragonClient>, ChampionBrowser)> {
    let source = Arc::new(DataDragonClient::new(http, &config.catalog)?);
    let browser = ChampionBrowser::new(source.clone(), &config.catalog);
    Ok((source, browser))
}

async fn load_catalog(browser: &ChampionBrowser) -> Result<()> {
    let t = utils::Timer::start("Catalog load");
    browser.init().await;
    browser.wait_ready().await;
    if browser.entries().is_empty() {
        bail!("Champion catalog unavailable (see log for the fetch error)");
    }
    info!("{} champions after {:.2?}", browser.entries().len(), t.elapsed());
    Ok(())
}

async fn run_price(widget: Arc<PriceWidget>, once: bool) -> Result<()> {
    widget.init().await;
    widget.wait_ready().await;
    println!("{}", render_price(&widget.view()));
    if once {
        return Ok(());
    }

    let scheduler = widget.start();
    let mut revisions = widget.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render_price(&widget.view()));
            }
            line = lines.next_line() => {
                match line.context("Failed to read stdin")?.as_deref().map(str::trim) {
                    Some("r") => {
                        // Runs inline; the countdown keeps ticking meanwhile.
                        let _ = widget.refresh().await;
                    }
                    Some("q") | None => break,
                    Some("") => {}
                    Some(other) => warn!("Unknown command {:?} (r = refresh, q = quit)", other),
                }
            }
        }
    }

    scheduler.stop().await;
    Ok(())
}

async fn run_browser(browser: &ChampionBrowser) -> Result<()> {
    println!("{}", render_browser(&browser.view()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();

        match cmd {
            "search" => browser.set_search(arg),
            "role" => match arg.parse() {
                Ok(role) => browser.set_role(role),
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            },
            "open" if !arg.is_empty() => {
                browser.open(arg).await;
            }
            "back" => browser.back(),
            "quit" | "q" => break,
            "" => continue,
            _ => {
                warn!(
                    "Commands: search TERM | role {} | open ID | back | quit",
                    ROLES.join("|")
                );
                continue;
            }
        }
        println!("{}", render_browser(&browser.view()));
    }

    Ok(())
}
