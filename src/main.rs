use anyhow::{bail, Context};
use dotenvy::dotenv;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use okrserver::board::BoardService;
use okrserver::config::AppConfig;
use okrserver::store::{MemoryStore, RestStore, TableStore};
use okrserver::web::{run_server, AppState};

const USAGE: &str = "Usage: okrserver [--memory] [--seed <file>] [--config <file>]

  --memory         use the in-process store instead of the hosted backend
  --seed <file>    JSON file of rows keyed by table name (implies --memory)
  --config <file>  TOML configuration file (default: okrserver.toml)
  -h, --help       print this message";

#[derive(Debug, Default)]
struct Args {
    memory: bool,
    seed: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--memory" => args.memory = true,
            "--seed" => {
                let path = iter.next().context("--seed needs a file path")?;
                args.seed = Some(PathBuf::from(path));
                args.memory = true;
            }
            "--config" => {
                let path = iter.next().context("--config needs a file path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(None),
            other => bail!("Unknown argument: {other}\n\n{USAGE}"),
        }
    }
    Ok(Some(args))
}

fn open_store(args: &Args, config: &AppConfig) -> anyhow::Result<Arc<dyn TableStore>> {
    if args.memory {
        let store = match &args.seed {
            Some(path) => MemoryStore::load_seed(path)?,
            None => MemoryStore::new(),
        };
        info!("Using in-memory store");
        return Ok(Arc::new(store));
    }

    let Some(url) = config.store.url.as_deref() else {
        bail!("store.url is not configured; set OKR_STORE__URL or run with --memory");
    };
    let mut store = RestStore::new(url, &config.store.api_key, config.store.timeout())?;
    if let Some(token) = &config.store.access_token {
        store = store.with_access_token(token.clone());
    }
    info!("Using hosted store at {url}");
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let Some(args) = parse_args()? else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let store = open_store(&args, &config)?;
    let state = Arc::new(AppState::new(BoardService::new(store)));

    info!("Starting okrserver {}", env!("CARGO_PKG_VERSION"));
    run_server(state, &config.server.host, config.server.port).await?;
    Ok(())
}
