// src/main.rs

//! The main entry point for the Pupok SOCKS5 gateway.

use anyhow::Result;
use pupok::config::Config;
use pupok::server;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Version,
    Help,
    Run {
        config_path: String,
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().skip(1).collect();
    let (config_path, port_override) = match parse_args(&args) {
        Ok(Invocation::Version) => {
            println!("Pupok proxy version {VERSION}");
            return Ok(());
        }
        Ok(Invocation::Help) => {
            print_usage();
            return Ok(());
        }
        Ok(Invocation::Run { config_path, port }) => (config_path, port),
        Err(msg) => {
            eprintln!("{msg}");
            print_usage();
            std::process::exit(2);
        }
    };

    // The gateway cannot run without a valid configuration.
    let mut config = match Config::from_file(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from \"{config_path}\": {e:#}");
            std::process::exit(1);
        }
    };

    if let Some(port) = port_override {
        config.port = port;
        if let Err(e) = config.validate() {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    }

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true),
        )
        .init();

    info!("Starting Pupok proxy {VERSION}");
    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Scans the arguments (without the program name).
///
/// Flags may be spelled with one or two dashes, and values may follow as the
/// next argument or after `=`. Anything unrecognised is an error.
fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut port = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
            return Err(format!("Unexpected argument: {arg}"));
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (flag, None),
        };

        match name {
            "version" => return Ok(Invocation::Version),
            "h" | "help" => return Ok(Invocation::Help),
            "config" | "port" => {
                let value = match inline_value {
                    Some(value) => value,
                    None => iter
                        .next()
                        .cloned()
                        .ok_or_else(|| format!("Flag needs an argument: -{name}"))?,
                };
                if value.is_empty() {
                    return Err(format!("Flag needs an argument: -{name}"));
                }
                if name == "config" {
                    config_path = value;
                } else {
                    match value.parse::<u16>() {
                        Ok(p) if p != 0 => port = Some(p),
                        _ => return Err(format!("Invalid port number: {value}")),
                    }
                }
            }
            _ => return Err(format!("Unknown flag: {arg}")),
        }
    }

    Ok(Invocation::Run { config_path, port })
}

fn print_usage() {
    eprintln!(
        "Pupok proxy server
usage: pupok [-config path] [-port port] [-version]

  -config   path to the configuration file (JSON, or TOML when it ends in .toml).
            default is config.json.
  -port     overrides the SOCKS5 listen port from the configuration.

Flags may also be written with two dashes, and values as -flag=value."
    );
}
