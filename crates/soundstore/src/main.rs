//! soundstore - catalog browser backed by the TTL product cache

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use soundstore_core::{
    CatalogConfig, CategoryQuery, FileSessionStore, HttpCatalogApi, MemorySessionStore,
    ProductCache, RatingSink, RatingUpdate, SessionStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "soundstore",
    version,
    about = "Browse the soundstore catalog from the terminal",
    long_about = "Lists products, deals and categories from the storefront API through the\n\
                  TTL product cache, and records rating updates in the session journal.\n\
                  \n\
                  Examples:\n\
                    soundstore products --deals        # Products with deal pricing\n\
                    soundstore category headphones     # First page of a category\n\
                    soundstore search \"earbuds\"        # Search loaded products\n\
                    soundstore rate p1 --average 4.5 --reviews 10\n\
                    soundstore status                  # Cache and session state\n\
                  \n\
                  Environment Variables:\n\
                    SOUNDSTORE_API_URL                 # Storefront API base URL\n\
                    SOUNDSTORE_CONFIG                  # Path to config.toml\n\
                    SOUNDSTORE_SESSION_DIR             # Session storage directory\n\
                    SOUNDSTORE_NO_COLOR                # Disable ANSI colors\n\
                    RUST_LOG                           # Log filter (default: warn)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Storefront API base URL (overrides the config file)
    #[arg(long, global = true, env = "SOUNDSTORE_API_URL")]
    api_url: Option<String>,

    /// Path to config file (default: <config_dir>/soundstore/config.toml)
    #[arg(long, global = true, env = "SOUNDSTORE_CONFIG")]
    config: Option<PathBuf>,

    /// Session storage directory (default: <cache_dir>/soundstore/session)
    #[arg(long, global = true, env = "SOUNDSTORE_SESSION_DIR")]
    session_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "SOUNDSTORE_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List all products
    Products {
        /// Apply active deal pricing
        #[arg(long)]
        deals: bool,
        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
        /// Max rows
        #[arg(long, short = 'n', default_value = "50")]
        limit: usize,
    },
    /// List active deals
    Deals {
        #[arg(long)]
        refresh: bool,
    },
    /// List categories
    Categories {
        #[arg(long)]
        refresh: bool,
    },
    /// Show one page of a category
    Category {
        /// Category ID
        id: String,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "24")]
        limit: u32,
        /// Sort key passed through to the backend (e.g. price, -createdAt)
        #[arg(long)]
        sort: Option<String>,
        /// Apply active deal pricing
        #[arg(long)]
        deals: bool,
        #[arg(long)]
        refresh: bool,
    },
    /// Show detailed product info
    Show {
        /// Product ID
        id: String,
    },
    /// Search products by name, description or category
    Search {
        query: String,
        /// Max results
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },
    /// Record a new aggregate rating for a product
    Rate {
        /// Product ID
        id: String,
        /// New average rating (0-5)
        #[arg(long)]
        average: f64,
        /// New total review count
        #[arg(long)]
        reviews: u32,
    },
    /// Show cache entries and session rating overrides
    Status {
        /// Load products, deals and categories first
        #[arg(long)]
        warm: bool,
    },
    /// Drop session rating overrides
    ClearSession,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let session = open_session(&config);
    let api = HttpCatalogApi::new(&config).context("Failed to create API client")?;
    let cache = ProductCache::new(Arc::new(api), &config, Arc::clone(&session));

    let json = cli.json;
    let no_color = cli.no_color;

    match cli.command {
        Command::Products {
            deals,
            refresh,
            limit,
        } => run_products(&cache, deals, refresh, limit, json, no_color).await?,
        Command::Deals { refresh } => run_deals(&cache, refresh, json, no_color).await?,
        Command::Categories { refresh } => {
            run_categories(&cache, refresh, json, no_color).await?
        }
        Command::Category {
            id,
            page,
            limit,
            sort,
            deals,
            refresh,
        } => {
            let mut query = CategoryQuery::page(page, limit);
            if let Some(sort) = sort {
                query = query.with_sort(sort);
            }
            run_category(&cache, &id, &query, deals, refresh, json, no_color).await?
        }
        Command::Show { id } => run_show(&cache, &id, json).await?,
        Command::Search { query, limit } => {
            run_search(&cache, &query, limit, json, no_color).await?
        }
        Command::Rate {
            id,
            average,
            reviews,
        } => run_rate(&cache, id, average, reviews, json).await?,
        Command::Status { warm } => run_status(&cache, &config, warm, json, no_color).await?,
        Command::ClearSession => run_clear_session(&cache)?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config file (explicit, or the default location when present), then flag overrides
fn load_config(cli: &Cli) -> Result<CatalogConfig> {
    let path = cli.config.clone().or_else(|| {
        dirs::config_dir()
            .map(|d| d.join("soundstore").join("config.toml"))
            .filter(|p| p.exists())
    });

    let mut config = match path {
        Some(path) => CatalogConfig::load(&path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CatalogConfig::default(),
    };

    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(dir) = &cli.session_dir {
        config.session_dir = Some(dir.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_session(config: &CatalogConfig) -> Arc<dyn SessionStore> {
    match config.resolved_session_dir() {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "Using file session store");
            Arc::new(FileSessionStore::new(dir))
        }
        None => {
            tracing::warn!("No cache directory available, session will not persist");
            Arc::new(MemorySessionStore::new())
        }
    }
}

async fn run_products(
    cache: &ProductCache,
    deals: bool,
    refresh: bool,
    limit: usize,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let total = if deals {
        let fetched = cache
            .get_products_with_deals(refresh)
            .await
            .context("Failed to load products")?;
        let shown: Vec<_> = fetched.data.into_iter().take(limit).collect();
        println!("{}", cli::format_view_table(&shown, json, no_color));
        (shown.len(), fetched.total_count)
    } else {
        let fetched = cache
            .get_products(refresh)
            .await
            .context("Failed to load products")?;
        let shown: Vec<_> = fetched.data.into_iter().take(limit).collect();
        println!("{}", cli::format_product_table(&shown, json, no_color));
        (shown.len(), fetched.total_count)
    };

    if !json {
        eprintln!("\n{} of {} products", total.0, total.1);
    }
    Ok(())
}

async fn run_deals(cache: &ProductCache, refresh: bool, json: bool, no_color: bool) -> Result<()> {
    let fetched = cache
        .get_deals(refresh)
        .await
        .context("Failed to load deals")?;
    println!("{}", cli::format_deal_table(&fetched.data, json, no_color));
    Ok(())
}

async fn run_categories(
    cache: &ProductCache,
    refresh: bool,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let fetched = cache
        .get_categories(refresh)
        .await
        .context("Failed to load categories")?;
    println!("{}", cli::format_category_table(&fetched.data, json, no_color));
    Ok(())
}

async fn run_category(
    cache: &ProductCache,
    id: &str,
    query: &CategoryQuery,
    deals: bool,
    refresh: bool,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let pagination = if deals {
        let page = cache
            .get_category_products_with_deals(id, query, refresh)
            .await
            .with_context(|| format!("Failed to load category {}", id))?;
        println!("{}", cli::format_view_table(&page.data, json, no_color));
        page.pagination
    } else {
        let page = cache
            .get_category_products(id, query, refresh)
            .await
            .with_context(|| format!("Failed to load category {}", id))?;
        println!("{}", cli::format_product_table(&page.data, json, no_color));
        page.pagination
    };

    if !json {
        eprintln!("\n{}", cli::format_pagination(&pagination));
    }
    Ok(())
}

async fn run_show(cache: &ProductCache, id: &str, json: bool) -> Result<()> {
    let fetched = cache
        .get_products(false)
        .await
        .context("Failed to load products")?;

    let product = cache.get_product_by_id(id).ok_or(cli::CliError::NotFound {
        id: id.to_string(),
        scanned: fetched.data.len(),
    })?;

    println!("{}", cli::format_product_info(&product, json));
    Ok(())
}

async fn run_search(
    cache: &ProductCache,
    query: &str,
    limit: usize,
    json: bool,
    no_color: bool,
) -> Result<()> {
    if !json {
        eprint!("Loading products... ");
    }
    let fetched = cache
        .get_products(false)
        .await
        .context("Failed to load products")?;
    if !json {
        eprintln!("✓ {} products", fetched.data.len());
    }

    let results: Vec<_> = cache
        .search_products_in_cache(query)
        .into_iter()
        .take(limit)
        .collect();

    if results.is_empty() {
        return Err(cli::CliError::NoResults {
            query: query.to_string(),
            scanned: fetched.data.len(),
        }
        .into());
    }

    println!("{}", cli::format_product_table(&results, json, no_color));
    if !json {
        eprintln!("\n{} results", results.len());
    }
    Ok(())
}

async fn run_rate(
    cache: &ProductCache,
    id: String,
    average: f64,
    reviews: u32,
    json: bool,
) -> Result<()> {
    if !(0.0..=5.0).contains(&average) {
        return Err(cli::CliError::InvalidRating { average }.into());
    }

    // Loading first lets the patch reach the cached copy; a failed load still records it
    if let Err(e) = cache.get_products(false).await {
        tracing::warn!(error = %e, "Products unavailable, recording rating only");
    }

    let update = RatingUpdate::new(id, average, reviews);
    let copies = cache.apply_rating_update(&update);

    if json {
        let out = serde_json::json!({ "update": update, "copiesPatched": copies });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "✅ Rating recorded for {}: {}",
        update.product_id,
        cli::format_rating(update.average_rating, update.total_reviews)
    );
    match cache.get_product_by_id(&update.product_id) {
        Some(product) => println!("   {} ({} cached copies patched)", product.name, copies),
        None => println!("   Product not in the current listing; patch applies on next fetch"),
    }
    Ok(())
}

async fn run_status(
    cache: &ProductCache,
    config: &CatalogConfig,
    warm: bool,
    json: bool,
    no_color: bool,
) -> Result<()> {
    if warm {
        let (products, categories) =
            tokio::join!(cache.get_products_with_deals(false), cache.get_categories(false));
        if let Err(e) = products {
            tracing::warn!(error = %e, "Products could not be loaded");
        }
        if let Err(e) = categories {
            tracing::warn!(error = %e, "Categories could not be loaded");
        }
    }

    let journal = cache.journal().load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Rating journal unreadable");
        Default::default()
    });

    println!(
        "{}",
        cli::format_status(
            config.base_url(),
            cache.ttl(),
            &cache.status(),
            &journal,
            json,
            no_color
        )
    );
    Ok(())
}

fn run_clear_session(cache: &ProductCache) -> Result<()> {
    let dropped = cache
        .clear_session()
        .context("Failed to clear session journal")?;

    println!("✅ Session cleared");
    println!("   Rating overrides dropped: {}", dropped);
    Ok(())
}
