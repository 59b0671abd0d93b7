use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use mise::config::Config;
use mise::{build_app, cli, db, jobs};

const USAGE: &str = "usage: mise [serve | create-user <name> [email] | import-recipes <file> <user-id>]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mise=info,tower_http=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["serve"] => serve(config, pool).await,
        ["create-user", name] => cli::create_user(&pool, name, None).await,
        ["create-user", name, email] => cli::create_user(&pool, name, Some(*email)).await,
        ["import-recipes", file, user_id] => cli::import_recipes(&pool, file, user_id).await,
        _ => Err(USAGE.into()),
    }
}

async fn serve(config: Config, pool: sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    if config.run_jobs {
        jobs::spawn_all(pool.clone());
    }

    let app = build_app(pool, config.secure_cookies, &config.blob_base_url).await?;

    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
