mod app_init;
mod client;
mod config;
mod domain;
mod id;
mod logging;
mod result;
mod server;
mod service;

use clap::Parser;

use crate::{
    app_init::{initialize_app, spawn_signal_handler},
    config::Cli,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let components = initialize_app(Cli::parse())?;
    spawn_signal_handler(components.shutdown.clone());

    server::start(
        components.server_config,
        components.service,
        components.shutdown,
    )
    .await?;

    Ok(())
}
