use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use simple_sso::{
    AccountDirectory, AccountId, AccountName, DatabaseConfig, EmailAddress, SsoConfig,
    create_resolver,
};

#[derive(Parser)]
#[command(name = "simple-sso")]
#[command(about = "Header-based SSO identification service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve HTTP with SSO identification on every request.
    /// Only run this behind a proxy that controls the SSO headers.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080", env = "SIMPLESSO_BIND")]
        bind: String,
        #[arg(long, default_value = "memory")]
        db_url: String,
    },
    /// Initialize the directory database
    Init {
        #[arg(long, default_value = "memory")]
        db_url: String,
    },
    /// Look up an account by id, name or email
    Lookup {
        #[arg(long, conflicts_with_all = ["name", "email"], required_unless_present_any = ["name", "email"])]
        id: Option<String>,
        #[arg(long, conflicts_with = "email")]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "memory")]
        db_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("simple_sso=info".parse()?))
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, db_url } => {
            let sso_config = SsoConfig::load()?;
            info!(
                header_parameter = %sso_config.header_parameter,
                header_username = %sso_config.header_username,
                header_email = %sso_config.header_email,
                email_domain = ?sso_config.email_domain,
                "SSO configuration loaded"
            );

            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            info!("Using database url for SSO directory: {}", db_config.url);

            let resolver = Arc::new(create_resolver(sso_config, db_config).await?);
            let app = simple_sso::api::create_router(resolver);

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("SSO server listening on http://{}", bind);
            axum::serve(listener, app).await?;
        }
        Commands::Init { db_url } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            info!("Using database url for initialization: {}", db_config.url);

            info!("Initializing database...");
            let db = simple_sso::create_connection(db_config).await?;
            simple_sso::ensure_schema(&db).await?;
            info!("Database initialized successfully");
        }
        Commands::Lookup {
            id,
            name,
            email,
            db_url,
        } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            let resolver = create_resolver(SsoConfig::default(), db_config).await?;
            let directory = resolver.directory();

            // Stored values are lower-cased, so match them the same way.
            let account = if let Some(id) = id {
                directory.get_by_id(&AccountId::new(id.to_lowercase())).await?
            } else if let Some(name) = name {
                directory.get_by_name(&AccountName::new(name.to_lowercase())).await?
            } else if let Some(email) = email {
                directory.find_by_email(&EmailAddress::new(email.to_lowercase())).await?
            } else {
                None
            };

            match account {
                Some(account) => println!("{}", serde_json::to_string_pretty(&account)?),
                None => println!("No account found."),
            }
        }
    }

    Ok(())
}
