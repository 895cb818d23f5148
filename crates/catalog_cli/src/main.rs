//! Catalog smoke entry point.
//!
//! # Responsibility
//! - Verify `catalog_core` wiring: logging, database bootstrap, product reads.
//! - Print one company's visible products with their derived names.
//!
//! Usage: `catalog_cli [db_path] [company_id]`. Falls back to
//! `CATALOG_DB_PATH`, `CATALOG_LOG_DIR` and `CATALOG_LOG_LEVEL`.

use catalog_core::db::open_db;
use catalog_core::{default_log_level, init_logging, ProductFindOptions, ProductStore};
use log::info;
use std::env;
use std::process::ExitCode;

const DEFAULT_DB_PATH: &str = "catalog.sqlite3";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("catalog_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1);
    let db_path = args
        .next()
        .or_else(|| env::var("CATALOG_DB_PATH").ok())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let company_id = match args.next() {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|err| format!("invalid company id `{raw}`: {err}"))?,
        ),
        None => None,
    };

    if let Ok(log_dir) = env::var("CATALOG_LOG_DIR") {
        let level =
            env::var("CATALOG_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let mut conn = open_db(&db_path).map_err(|err| format!("open `{db_path}`: {err}"))?;
    let store = ProductStore::new(&mut conn);
    let products = store
        .find(&ProductFindOptions {
            company_id,
            ..ProductFindOptions::default()
        })
        .map_err(|err| err.to_string())?;

    info!(
        "event=cli_list module=cli status=ok count={}",
        products.len()
    );
    println!("catalog_core version={}", catalog_core::core_version());
    for product in products {
        println!(
            "{}\tcompany={}\tcommodity={}\t{}",
            product.id, product.company_id, product.commodity_id, product.name
        );
    }
    Ok(())
}
