pub mod cli;
pub mod core;
pub mod providers;
pub mod server;
pub mod service;

use crate::core::config::AppConfig;
use crate::service::{ConversionRequest, RateService};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Convert {
        request: ConversionRequest,
        json: bool,
    },
    Rates {
        reference_date: Option<String>,
    },
    Dates,
    Serve {
        bind: Option<String>,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xrate starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    let service = RateService::from_config(&config)?;

    match command {
        AppCommand::Convert { request, json } => {
            cli::convert::run(&service, &request, json).await
        }
        AppCommand::Rates { reference_date } => {
            cli::rates::run(&service, reference_date.as_deref()).await
        }
        AppCommand::Dates => cli::rates::list_dates(&service).await,
        AppCommand::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            server::serve(Arc::new(service), &bind).await
        }
    }
}
