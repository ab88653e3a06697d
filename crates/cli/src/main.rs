use std::collections::HashSet;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use licensing_core::{
    catalog::{enrich, CatalogClient},
    categories::categories_for,
    slug, LicenseRegistry, LicensingConfig, LicensingError, MemoryLicenseStore, NewLicense,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "licensing")]
#[command(about = "License registry tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the slug for a license name
    Slug {
        /// License name
        name: String,
        /// Slugs already in use (comma-separated)
        #[arg(long, default_value = "")]
        taken: String,
    },
    /// Show the OSI categories for an SPDX identifier
    Categories {
        /// SPDX identifier, e.g. MIT
        identifier: String,
    },
    /// Fetch a license from the catalog and print it as JSON
    Fetch {
        /// SPDX identifier, e.g. MIT
        identifier: String,
    },
    /// Create a license from its catalog entry and print it as JSON
    Import {
        /// SPDX identifier, e.g. MIT
        identifier: String,
    },
    /// Validate a license record, filling blanks from the catalog, and print it as JSON
    Draft {
        /// SPDX identifier used for the catalog lookup
        identifier: String,
        /// License name (taken from the catalog if omitted)
        #[arg(long, default_value = "")]
        name: String,
        /// Canonical URL (taken from the catalog if omitted)
        #[arg(long, default_value = "")]
        url: String,
        /// Full license text (taken from the catalog if omitted)
        #[arg(long, default_value = "")]
        text: String,
        /// Short description
        #[arg(long)]
        description: Option<String>,
    },
}

fn parse_taken(taken: &str) -> HashSet<String> {
    taken
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("licensing_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = LicensingConfig::from_env()?;

    match cli.command {
        Some(Commands::Slug { name, taken }) => {
            println!("{}", slug::assign(&name, &parse_taken(&taken), None));
        }
        Some(Commands::Categories { identifier }) => {
            let categories = categories_for(&identifier);
            if categories.is_empty() {
                println!("{identifier}: no OSI category");
            } else {
                for category in categories {
                    println!("{identifier}: {}", category.label());
                }
            }
        }
        Some(Commands::Fetch { identifier }) => {
            let client = CatalogClient::new(&config)?;
            match client.fetch(&identifier).await {
                Ok(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                Err(e) => eprintln!("Error fetching {identifier}: {e}"),
            }
        }
        Some(Commands::Import { identifier }) => {
            let client = CatalogClient::new(&config)?;
            let registry = LicenseRegistry::new(Arc::new(MemoryLicenseStore::new()), config);
            match registry.import(&client, &identifier).await {
                Ok(license) => println!("{}", serde_json::to_string_pretty(&license)?),
                Err(e) => eprintln!("Error importing {identifier}: {e}"),
            }
        }
        Some(Commands::Draft {
            identifier,
            name,
            url,
            text,
            description,
        }) => {
            let client = CatalogClient::new(&config)?;
            let mut attrs = NewLicense::new(name, url, text);
            attrs.description = description;
            let attrs = enrich(&client, &identifier, attrs).await;

            let registry = LicenseRegistry::new(Arc::new(MemoryLicenseStore::new()), config);
            match registry.create(attrs) {
                Ok(license) => println!("{}", serde_json::to_string_pretty(&license)?),
                Err(LicensingError::Validation(errors)) => {
                    for field in errors.fields() {
                        for message in errors.messages(field) {
                            eprintln!("{field}: {message}");
                        }
                    }
                }
                Err(e) => eprintln!("Error creating license: {e}"),
            }
        }
        None => {
            println!("Use 'licensing --help' for commands");
        }
    }

    Ok(())
}
