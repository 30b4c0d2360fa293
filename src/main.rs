use o2d_dashboard::config::{self, Config};
use o2d_dashboard::error::StartupError;
use o2d_dashboard::{server, startup};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("Startup failed ({:?}): {}", e.kind(), e);
        eprintln!("{}\n{}", e, e.recovery_suggestion());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let path = config::config_path();
    let config: Config = config::load_config(&path)?;
    let table = startup::load_snapshot(&config).await?;
    server::serve(config, table).await
}
