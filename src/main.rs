use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use fsd_site::config::{Mode, OfflineConfig, SiteConfig};
use fsd_site::models::ContentBundle;
use fsd_site::offline::{self, CacheRouter, CacheStorage, HttpFetcher};
use fsd_site::{animation, api, db, render};

#[derive(Parser)]
#[command(name = "fsd")]
#[command(about = "Frontend system design curriculum site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the site server
    Serve {
        /// Port for HTTP
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Content database path (overrides FSD_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Hide animation diagnostics (overrides FSD_ENV)
        #[arg(long)]
        production: bool,
    },
    /// Start the offline-caching proxy in front of the site
    Proxy {
        /// Port for the proxy
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Site to proxy (overrides FSD_UPSTREAM)
        #[arg(short, long)]
        upstream: Option<String>,

        /// Cache partition version (overrides FSD_CACHE_VERSION)
        #[arg(long)]
        cache_version: Option<String>,
    },
    /// Import a content bundle (JSON) into the database
    Seed {
        /// Bundle file
        file: PathBuf,

        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the curriculum outline
    Outline {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the animation spec JSON Schema
    Schema,
    /// Validate an animation spec file
    Validate {
        file: PathBuf,
    },
    /// Render a rich-text document file to HTML
    Render {
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "fsd_site=debug,tower_http=debug".into()),
    );

    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(path: Option<PathBuf>, config: &SiteConfig) -> anyhow::Result<db::Database> {
    let db = match path.or_else(|| config.db_path.clone()) {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn read_json(file: &PathBuf) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", file.display()))
}

async fn serve(port: u16, db: Option<PathBuf>, production: bool) -> anyhow::Result<()> {
    let mut config = SiteConfig::from_env();
    if production {
        config.mode = Mode::Production;
    }
    tracing::info!(
        "Starting {} on port {} ({})",
        config.site_name,
        port,
        config.mode.as_str()
    );

    let db = open_database(db, &config)?;
    let app = api::create_router(db, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Site listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn proxy(
    port: u16,
    upstream: Option<String>,
    cache_version: Option<String>,
) -> anyhow::Result<()> {
    let origin = Url::parse(&format!("http://127.0.0.1:{}", port))?;
    let mut config = OfflineConfig::from_env(origin.clone())?;
    if let Some(upstream) = upstream {
        config.upstream =
            Url::parse(&upstream).with_context(|| format!("Invalid upstream URL: {}", upstream))?;
    }
    if let Some(version) = cache_version {
        config.cache_version = version;
    }

    let fetcher = Arc::new(HttpFetcher::new(origin, config.upstream.clone()));
    let router = CacheRouter::from_config(&config, fetcher, Arc::new(CacheStorage::new()))?;

    router
        .install()
        .await
        .with_context(|| format!("Install failed; is {} running?", config.upstream))?;
    let deleted = router.activate();
    tracing::info!(
        "Cache {} active, {} stale partitions removed",
        config.cache_version,
        deleted.len()
    );

    let app = offline::create_proxy(Arc::new(router));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(
        "Offline proxy listening on http://127.0.0.1:{} -> {}",
        port,
        config.upstream
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            port,
            db,
            production,
        }) => serve(port, db, production).await?,
        Some(Commands::Proxy {
            port,
            upstream,
            cache_version,
        }) => proxy(port, upstream, cache_version).await?,
        Some(Commands::Seed { file, db }) => {
            let bundle: ContentBundle = serde_json::from_value(read_json(&file)?)
                .with_context(|| format!("{} is not a content bundle", file.display()))?;
            let db = open_database(db, &SiteConfig::from_env())?;
            let summary = db.import_bundle(bundle)?;
            println!(
                "Imported {} topics, {} resources, {} pages",
                summary.topics, summary.resources, summary.pages
            );
        }
        Some(Commands::Outline { db }) => {
            let db = open_database(db, &SiteConfig::from_env())?;
            let outline: Vec<render::OutlineNode> =
                db.get_all_topics()?.iter().map(render::topic_outline).collect();
            if outline.is_empty() {
                println!("No topics yet. Import some with `fsd seed <file>`.");
            } else {
                print!("{}", render::render_outline(&outline));
            }
        }
        Some(Commands::Schema) => {
            println!("{}", serde_json::to_string_pretty(&animation::json_schema())?);
        }
        Some(Commands::Validate { file }) => {
            let spec = animation::parse_spec(&read_json(&file)?);
            match spec {
                Ok(spec) => println!("{}: valid {} spec", file.display(), spec.body.kind()),
                Err(e) => {
                    for issue in e.issues() {
                        println!("  {}", issue);
                    }
                    anyhow::bail!("{} is not a valid animation spec", file.display());
                }
            }
        }
        Some(Commands::Render { file }) => {
            let doc: render::Document = serde_json::from_value(read_json(&file)?)
                .with_context(|| format!("{} is not a document tree", file.display()))?;
            print!("{}", render::render_document(&doc).html);
        }
        None => {
            // Default: start server
            serve(3000, None, false).await?;
        }
    }

    Ok(())
}
