mod config;
mod db;
mod forecast;
mod import;
mod logging;
mod models;
mod recurring;
mod run;
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::AppConfig::load()?;
    if let Err(e) = logging::init(&config.log_path()) {
        eprintln!("Warning: logging disabled: {e:#}");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir().display(),
        "spendcast starting"
    );

    let mut db = db::Database::open(&config.db_path())?;

    match args.len() {
        1 => run::as_tui(&mut db),
        _ => run::as_cli(&args, &mut db),
    }
}
