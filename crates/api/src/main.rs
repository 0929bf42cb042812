use clap::{Parser, Subcommand};

use vitrina_api::app::{build_app, services};
use vitrina_infra::AppConfig;

#[derive(Parser)]
#[command(name = "vitrina-api", about = "Vitrina shop back end", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (the default).
    Serve,
    /// Create an administrator account, or promote an existing one.
    CreateSuperuser {
        #[arg(long, help = "Email address of the account")]
        email: String,
        #[arg(
            long,
            env = "VITRINA_SUPERUSER_PASSWORD",
            hide_env_values = true,
            help = "Password for the account"
        )]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    vitrina_observability::init(&config.log_level, config.log_json);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateSuperuser { email, password } => {
            if config.database_url.is_none() {
                tracing::warn!("no database_url configured; the account is lost when this process exits");
            }
            let id = services::create_superuser(&config, &email, &password).await?;
            tracing::info!(user_id = %id, "superuser ready");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    if config.uses_dev_secret() {
        tracing::warn!("jwt_secret is the development default; set VITRINA__JWT_SECRET");
    }

    let store = services::open_store(&config).await?;
    let app = build_app(store, &config.jwt_secret, config.jwt_ttl());

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
