//! NexusKart CLI - browse the store, manage a cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! nexuskart products list --category Laptop
//! nexuskart products show 12
//!
//! # Sign in and shop
//! nexuskart login -e meera@example.com
//! nexuskart cart add 12
//! nexuskart checkout --payment card
//!
//! # Store administration (admin accounts only)
//! nexuskart admin stats
//! nexuskart admin low-stock
//! ```
//!
//! The session and the cart are kept in a JSON file between runs
//! (`NEXUSKART_SESSION_PATH`, defaults to `.nexuskart/session.json`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nexuskart_core::{PaymentMethod, ProductId, UserId};
use nexuskart_storefront::cart::CartStore;
use nexuskart_storefront::config::ClientConfig;
use nexuskart_storefront::error::{AppError, Result, sentry_event_filter};
use nexuskart_storefront::state::AppState;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "nexuskart")]
#[command(author, version, about = "NexusKart storefront from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Read or write product reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewsAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        /// Payment method (`upi`, `card`, `netbanking`, `cod`)
        #[arg(short, long, default_value = "upi")]
        payment: PaymentMethod,

        /// Shipping address
        #[arg(short, long)]
        address: Option<String>,

        /// Do not drop cart lines whose product left the catalog first
        #[arg(long)]
        skip_sync: bool,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "NEXUSKART_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "NEXUSKART_PASSWORD", hide_env_values = true)]
        password: String,

        /// Store admin code; grants the admin role when it matches
        #[arg(long, env = "NEXUSKART_ADMIN_CODE", hide_env_values = true)]
        admin_code: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Edit the signed-in account
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// List orders
    Orders {
        /// Every customer's orders (admin only)
        #[arg(long)]
        all: bool,
    },
    /// Store administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Subscribe an address to the newsletter
    Newsletter { email: String },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// One page of the catalog
    List {
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        keyword: Option<String>,

        /// Zero-based page number
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        #[arg(short, long, default_value_t = nexuskart_storefront::models::page::DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    /// The whole catalog, unpaged
    All,
    /// Search by keyword
    Search { keyword: String },
    /// Product details and reviews
    Show { id: ProductId },
    /// Download a product image
    Image {
        id: ProductId,

        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ReviewsAction {
    /// Reviews of a product
    List { id: ProductId },
    /// Review a product (requires login)
    Add {
        id: ProductId,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        #[arg(short, long)]
        comment: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add { id: ProductId },
    /// Change a line's quantity by a signed amount
    Qty {
        id: ProductId,

        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Remove a line
    Remove { id: ProductId },
    /// Drop lines whose product is no longer in the catalog
    Sync,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Change name, email or password
    Update {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long, env = "NEXUSKART_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Upload a profile picture
    Picture { path: PathBuf },
    /// Download a user's profile picture
    Download {
        /// Defaults to the signed-in user
        #[arg(long)]
        user: Option<UserId>,

        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Store statistics
    Stats,
    /// Products running low on stock
    LowStock,
    /// Add a product
    Create {
        #[command(flatten)]
        product: ProductArgs,

        /// Product image
        #[arg(short, long)]
        image: PathBuf,
    },
    /// Edit a product; unset fields keep their current value
    Update {
        id: ProductId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        price: Option<Decimal>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        stock: Option<u32>,

        #[arg(long)]
        available: Option<bool>,

        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Delete a product
    Delete { id: ProductId },
}

#[derive(clap::Args)]
struct ProductArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    description: String,

    #[arg(long)]
    brand: String,

    #[arg(long)]
    price: Decimal,

    #[arg(long)]
    category: String,

    /// Release date (YYYY-MM-DD)
    #[arg(long)]
    release_date: Option<String>,

    #[arg(long, default_value_t = 0)]
    stock: u32,

    /// List the product as unavailable
    #[arg(long)]
    unavailable: bool,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration problem: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Sentry first so the tracing layer has a client to forward to.
    let sentry_guard = init_sentry(&config);

    // Logs go to stderr; stdout is for command output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nexuskart_storefront=warn,nexuskart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if sentry_guard.is_some() {
        tracing::debug!("Sentry initialized");
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.report());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    let state = AppState::new(config)?;
    let mut cart = state.restore().await?;

    let result = dispatch(cli.command, &state, &mut cart).await;

    // The cart and session are saved even when the command failed; a
    // failed checkout keeps its lines.
    let persisted = state.persist(&cart).await;
    result?;
    persisted
}

async fn dispatch(command: Commands, state: &AppState, cart: &mut CartStore) -> Result<()> {
    let client = state.client();
    match command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                category,
                keyword,
                page,
                size,
            } => commands::catalog::list(client, category, keyword, page, size).await,
            ProductsAction::All => commands::catalog::all(client).await,
            ProductsAction::Search { keyword } => commands::catalog::search(client, &keyword).await,
            ProductsAction::Show { id } => commands::catalog::show(client, id).await,
            ProductsAction::Image { id, out } => commands::catalog::image(client, id, &out).await,
        },
        Commands::Reviews { action } => match action {
            ReviewsAction::List { id } => commands::catalog::reviews(client, id).await,
            ReviewsAction::Add {
                id,
                rating,
                comment,
            } => commands::catalog::add_review(client, id, rating, comment).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => {
                commands::cart::show(cart);
                Ok(())
            }
            CartAction::Add { id } => commands::cart::add(client, cart, id).await,
            CartAction::Qty { id, delta } => commands::cart::change_quantity(cart, id, delta),
            CartAction::Remove { id } => {
                commands::cart::remove(cart, id);
                Ok(())
            }
            CartAction::Sync => commands::cart::sync(client, cart).await,
            CartAction::Clear => {
                commands::cart::clear(cart);
                Ok(())
            }
        },
        Commands::Checkout {
            payment,
            address,
            skip_sync,
        } => commands::cart::checkout(client, cart, payment, address, skip_sync).await,
        Commands::Login { email, password } => {
            commands::account::login(client, &email, password).await
        }
        Commands::Signup {
            name,
            email,
            password,
            admin_code,
        } => commands::account::signup(client, name, &email, password, admin_code).await,
        Commands::Logout => {
            commands::account::logout(client).await;
            Ok(())
        }
        Commands::Whoami => commands::account::whoami(client).await,
        Commands::Profile { action } => match action {
            ProfileAction::Update {
                name,
                email,
                password,
            } => commands::account::update_profile(client, name, email, password).await,
            ProfileAction::Picture { path } => {
                commands::account::upload_picture(client, &path).await
            }
            ProfileAction::Download { user, out } => {
                commands::account::download_picture(client, user, &out).await
            }
        },
        Commands::Orders { all } => commands::orders::list(client, all).await,
        Commands::Admin { action } => match action {
            AdminAction::Stats => commands::admin::stats(client).await,
            AdminAction::LowStock => commands::admin::low_stock(client).await,
            AdminAction::Create { product, image } => {
                commands::admin::create(client, product.into_draft()?, &image).await
            }
            AdminAction::Update {
                id,
                name,
                description,
                brand,
                price,
                category,
                stock,
                available,
                image,
            } => {
                let edit = commands::admin::ProductEdit {
                    name,
                    description,
                    brand,
                    price,
                    category,
                    stock,
                    available,
                };
                commands::admin::update(client, id, edit, image.as_deref()).await
            }
            AdminAction::Delete { id } => commands::admin::delete(client, id).await,
        },
        Commands::Newsletter { email } => commands::account::newsletter(client, &email).await,
    }
}

impl ProductArgs {
    fn into_draft(self) -> Result<nexuskart_storefront::models::ProductDraft> {
        let release_date = self
            .release_date
            .map(|raw| {
                raw.parse().map_err(|_| {
                    AppError::BadRequest(format!("release date '{raw}' is not YYYY-MM-DD"))
                })
            })
            .transpose()?;

        Ok(nexuskart_storefront::models::ProductDraft {
            name: self.name,
            description: self.description,
            brand: self.brand,
            price: nexuskart_core::Money::new(self.price),
            category: self.category,
            release_date,
            product_available: !self.unavailable,
            stock_quantity: self.stock,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn config(sentry_dsn: Option<&str>) -> ClientConfig {
        ClientConfig {
            api: nexuskart_storefront::config::ApiConfig::with_base_url("http://localhost:8085/api")
                .unwrap(),
            session_path: PathBuf::from("session.json"),
            sentry_dsn: sentry_dsn.map(String::from),
            sentry_environment: None,
        }
    }

    #[test]
    fn test_sentry_disabled_without_dsn() {
        assert!(init_sentry(&config(None)).is_none());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_quantity_delta_parses() {
        let cli = Cli::try_parse_from(["nexuskart", "cart", "qty", "4", "-2"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Qty { delta: -2, .. }
            })
        ));
    }

    #[test]
    fn test_unknown_payment_method_rejected() {
        assert!(Cli::try_parse_from(["nexuskart", "checkout", "--payment", "emi"]).is_err());
    }
}
