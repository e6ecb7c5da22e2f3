#![cfg(not(tarpaulin_include))]

use csvgen::{config, server};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Bind address from the first argument, then CSVGEN_BIND
    let args: Vec<String> = env::args().collect();
    let addr = args.get(1).cloned().unwrap_or_else(config::bind_address);

    println!("Starting CSV server on {addr}");
    server::run(&addr).await
}
