//! Blessed CLI - Catalog and admin management tools.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered like the storefront
//! blessed products list --drop drop02 --cat hoodies
//!
//! # Import products from YAML
//! blessed products import catalog.yaml --dry-run
//!
//! # List drops / switch one on or off
//! blessed drops list
//! blessed drops toggle drop03 --active false
//!
//! # Hash the admin password for ADMIN_PASSWORD_HASH
//! blessed admin hash-password < password.txt
//! ```
//!
//! # Commands
//!
//! - `products` - List and bulk-import catalog products
//! - `drops` - List drops and flip their active flag
//! - `admin hash-password` - Produce an Argon2 hash for the admin login

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "blessed")]
#[command(author, version, about = "Blessed catalog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Catalog products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Drop collections
    Drops {
        #[command(subcommand)]
        action: DropAction,
    },
    /// Admin account
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Only products in this drop
        #[arg(short, long)]
        drop: Option<String>,

        /// Only products in this category (tshirts, hoodies, crewnecks)
        #[arg(short, long)]
        cat: Option<String>,
    },
    /// Create products from a YAML file
    Import {
        /// Path to the YAML file
        file: String,

        /// Validate without sending anything to the backend
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum DropAction {
    /// List drops, active first
    List,
    /// Set whether a drop is active
    Toggle {
        /// Drop id, e.g. drop03
        id: String,

        /// New active state
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Hash a password read from stdin
    HashPassword,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blessed_cli=info,blessed_admin=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List { drop, cat } => commands::products::list(drop, cat).await?,
            ProductAction::Import { file, dry_run } => {
                commands::products::import(&file, dry_run).await?;
            }
        },
        Commands::Drops { action } => match action {
            DropAction::List => commands::drops::list().await?,
            DropAction::Toggle { id, active } => commands::drops::toggle(&id, active).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::HashPassword => commands::admin::hash_password_from_stdin()?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_products_list_filters() {
        let cli = Cli::try_parse_from(["blessed", "products", "list", "--drop", "drop02", "-c", "hoodies"])
            .unwrap();
        match cli.command {
            Commands::Products {
                action: ProductAction::List { drop, cat },
            } => {
                assert_eq!(drop.as_deref(), Some("drop02"));
                assert_eq!(cat.as_deref(), Some("hoodies"));
            }
            _ => panic!("expected products list"),
        }
    }

    #[test]
    fn test_parse_drops_toggle_requires_value() {
        let cli = Cli::try_parse_from(["blessed", "drops", "toggle", "drop03", "--active", "false"])
            .unwrap();
        match cli.command {
            Commands::Drops {
                action: DropAction::Toggle { id, active },
            } => {
                assert_eq!(id, "drop03");
                assert!(!active);
            }
            _ => panic!("expected drops toggle"),
        }

        assert!(Cli::try_parse_from(["blessed", "drops", "toggle", "drop03"]).is_err());
    }

    #[test]
    fn test_parse_import_dry_run() {
        let cli =
            Cli::try_parse_from(["blessed", "products", "import", "catalog.yaml", "--dry-run"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Products {
                action: ProductAction::Import { dry_run: true, .. }
            }
        ));
    }
}
