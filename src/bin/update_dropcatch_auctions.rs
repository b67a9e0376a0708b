use std::{path::Path, process, time::Duration};

use clap::Parser;
use domaining::{
    db::prod_db::ProdDb,
    errors::Result,
    utils::{
        lib_download::{http_client, remove_downloads},
        lib_duckdb::open_with_retry,
    },
};
use duckdb::AccessMode;
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,
}

fn run() -> Result<()> {
    let archive = ProdDb::dropcatch_auctions()?;
    let client = http_client(ProdDb::http_timeout()?)?;

    let target = archive.get_download_target(&client)?;
    let downloaded = archive.download_file(&client, &target)?;
    info!("Downloaded {} successfully", target.file_name);
    let csv_path = archive.extract_csv(&downloaded)?;

    let conn = open_with_retry(
        &archive.duckdb_path,
        8,
        Duration::from_millis(25),
        AccessMode::ReadWrite,
    )?;
    let n = archive.update_duckdb(&conn, &csv_path)?;
    info!("{} rows were inserted into {}", n, archive.duckdb_path);

    remove_downloads(&downloaded, &csv_path);
    Ok(())
}

/// Run this job once a day, after the auction list is published
fn main() {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let env_file = format!(".env/{}.env", args.env);
    if let Err(e) = dotenvy::from_path(Path::new(&env_file)) {
        warn!("could not load {}: {}", env_file, e);
    }

    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
