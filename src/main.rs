use std::fs;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use collabd::auth::CredentialHasher;
use collabd::config::ServerConfig;
use collabd::error::Error;
use collabd::hub::Hub;
use collabd::server::{AppState, create_router};
use collabd::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "collabd")]
#[command(about = "A self-hostable collaboration server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create a user directly in the database
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

fn run_create_user(username: &str, password: &str, data_dir: &str) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let store = SqliteStore::new(data_path.join("collabd.db"))?;
    store.initialize()?;

    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        bail!("username and password cannot be empty");
    }

    let password_hash = CredentialHasher::new().hash(password)?;
    let user = match store.create_user(username, &password_hash) {
        Ok(user) => user,
        Err(Error::UsernameTaken) => bail!("username '{username}' already taken"),
        Err(e) => return Err(e.into()),
    };

    println!("Created user '{}' (id {})", user.username, user.id);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("collabd=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::CreateUser {
                username,
                password,
                data_dir,
            } => {
                run_create_user(&username, &password, &data_dir)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            fs::create_dir_all(&config.data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let state = Arc::new(AppState {
                store: Arc::new(store),
                hub: Arc::new(Hub::new()),
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
