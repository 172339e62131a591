//! CLI entry and dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog_core::api::{CredentialGateway, ProductGateway};
use catalog_core::config::{self, Config};
use catalog_core::session::SessionStore;
use catalog_core::session::storage::{FileStorage, SessionStorage};
use catalog_core::views::{CatalogView, LoginView};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

/// Env var holding the log filter directives.
const LOG_ENV: &str = "CATALOG_LOG";

#[derive(Parser)]
#[command(name = "catalog")]
#[command(version = "0.1")]
#[command(about = "Products catalog client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the catalog API (overrides the config file)
    #[arg(long, global = true, value_name = "URL", env = config::API_URL_ENV)]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out (clear the persisted session)
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProductCommands {
    /// Lists products with stock and value totals
    List {
        /// Only show products whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Shows a single product
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Adds a product
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        stock: i64,
    },
    /// Edits a product; omitted fields keep their current value
    Edit {
        #[arg(value_name = "ID")]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        stock: Option<i64>,
    },
    /// Deletes a product after confirmation
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the paths of the config and session files
    Path,
    /// Initialize a config file (if not present), seeded with --api-url
    Init,
    /// Show the effective configuration
    Show,
    /// Generate a fresh config from Rust defaults
    Generate,
}

/// Everything a command needs to talk to the API.
pub struct AppContext {
    pub config: Config,
    pub api_url: String,
    pub session: Arc<SessionStore>,
    pub storage_path: PathBuf,
}

impl AppContext {
    fn build(api_url_override: Option<&str>) -> Result<Self> {
        let config = Config::load().context("load config")?;
        let api_url = config
            .api_url(api_url_override)
            .context("resolve API url")?;

        let file_storage = FileStorage::at_default_path();
        let storage_path = file_storage.path().to_path_buf();
        let storage: Arc<dyn SessionStorage> = Arc::new(file_storage);
        let session = SessionStore::new(storage, CredentialGateway::new(api_url.as_str()))
            .with_config(&config.session);

        tracing::debug!(%api_url, "context ready");
        Ok(Self {
            config,
            api_url,
            session: Arc::new(session),
            storage_path,
        })
    }

    pub fn products(&self) -> ProductGateway {
        ProductGateway::new(self.api_url.as_str(), self.session.storage())
    }

    pub fn catalog_view(&self) -> CatalogView {
        CatalogView::new(
            Arc::clone(&self.session),
            self.products(),
            &self.config.notices,
        )
    }

    pub fn login_view(&self) -> LoginView {
        LoginView::new(Arc::clone(&self.session), &self.config.notices)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, api_url } = cli;
    let context = || AppContext::build(api_url.as_deref());

    match command {
        Commands::Login { username, password } => {
            let ctx = context()?;
            commands::auth::login(&ctx, username, password).await
        }
        Commands::Logout => commands::auth::logout(&context()?),
        Commands::Whoami => commands::auth::whoami(&context()?),

        Commands::Products { command } => {
            let ctx = context()?;
            match command {
                ProductCommands::List { filter } => {
                    commands::products::list(&ctx, filter.as_deref()).await
                }
                ProductCommands::Show { id } => commands::products::show(&ctx, id).await,
                ProductCommands::Add { name, price, stock } => {
                    commands::products::add(&ctx, name, price, stock).await
                }
                ProductCommands::Edit {
                    id,
                    name,
                    price,
                    stock,
                } => {
                    let changes = commands::products::Changes { name, price, stock };
                    commands::products::edit(&ctx, id, changes).await
                }
                ProductCommands::Delete { id, yes } => {
                    commands::products::delete(&ctx, id, yes).await
                }
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(api_url.as_deref()),
            ConfigCommands::Show => commands::config::show(api_url.as_deref()),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}
