//! UMA Gate CLI - operator tooling for the authorization gate

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::time::Instant;
use tracing::debug;
use umagate_core::{
    AccessRequest, AuthorizationGate, GateConfig, GateError, GateHealth, PermissionMapper,
    SegmentMapper, DEFAULT_PREFIX_DEPTH,
};

#[derive(Parser)]
#[command(name = "umagate")]
#[command(about = "UMA Gate - path-derived authorization against a UMA token endpoint")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the permission derived from a request path
    Permission {
        /// Request path, e.g. /api/v1/shop/orders/read
        path: String,

        /// Number of leading segments ignored before resource and scope
        #[arg(long, default_value_t = DEFAULT_PREFIX_DEPTH)]
        prefix_depth: usize,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate a gate configuration file
    Validate {
        /// Configuration file path
        file: String,
    },

    /// Ask the authorization server whether a token may access a path
    Check {
        /// Configuration file path
        #[arg(short, long)]
        config: String,

        /// Access token, sent as `Bearer <TOKEN>`
        #[arg(short, long)]
        token: String,

        /// Request path
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("umagate=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Permission {
            path,
            prefix_depth,
            format,
        } => permission_command(path, prefix_depth, format),
        Commands::Validate { file } => validate_command(file),
        Commands::Check {
            config,
            token,
            path,
        } => check_command(config, token, path).await,
    }
}

fn permission_command(path: String, prefix_depth: usize, format: String) -> Result<()> {
    let mapper = SegmentMapper::new(prefix_depth);
    let result = mapper.map(&path);

    if format == "json" {
        let value = match &result {
            Ok(permission) => serde_json::json!({
                "permission": permission.to_string(),
                "resource": permission.resource,
                "scope": permission.scope,
            }),
            Err(e) => error_json(e),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        if result.is_err() {
            std::process::exit(1);
        }
        return Ok(());
    }

    match result {
        Ok(permission) => {
            println!("{} Permission: {}", "▸".blue(), permission.to_string().bold());
            println!("{} Resource: {}", "▸".blue(), permission.resource);
            println!("{} Scope: {}", "▸".blue(), permission.scope);
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            println!(
                "  Expected {} prefix segments followed by /<resource>/<scope>",
                mapper.prefix_depth()
            );
            std::process::exit(1);
        }
    }

    Ok(())
}

fn validate_command(file: String) -> Result<()> {
    println!("{} Validating {}...", "→".blue(), file);

    let config = match GateConfig::from_path(&file) {
        Ok(config) => config,
        Err(e) => {
            println!("{} Configuration is invalid:", "✗".red());
            println!("  {}", e);
            std::process::exit(1);
        }
    };
    debug!(?config, "Parsed configuration");

    match GateHealth::from_config(&config) {
        GateHealth::Healthy => {
            println!("{} Configuration is valid!", "✓".green());
            println!("  Authorization server: {}", config.auth_server_url);
            println!("  Client: {}", config.client_id);
            println!("  Timeout: {}ms", config.timeout_ms);
            println!("  Prefix depth: {}", config.prefix_depth);
            if config.insecure_skip_verify {
                println!("  {} TLS certificate verification disabled", "!".yellow());
            }
        }
        GateHealth::Degraded(issues) => {
            println!("{} Configuration is incomplete:", "✗".red());
            for issue in issues {
                println!("  {}", issue);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn check_command(config: String, token: String, path: String) -> Result<()> {
    let start = Instant::now();

    println!("{} Loading configuration from {}...", "→".blue(), config);
    let config = GateConfig::from_path(&config)
        .with_context(|| format!("Failed to load configuration: {}", config))?;
    let gate = AuthorizationGate::new(config)?;

    let authorization = format!("Bearer {}", token);
    let request = AccessRequest::new(&path).with_authorization(Some(&authorization));

    println!("{} Querying {}...", "→".blue(), gate.config().auth_server_url);
    let outcome = gate.authorize(&request).await;

    println!("\n{} Authorization Result", "═".blue().bold());
    let granted = outcome.is_ok();
    match outcome {
        Ok(permission) => {
            println!("{} Status: {}", "▸".blue(), "GRANTED".green());
            println!("{} Permission: {}", "▸".blue(), permission);
        }
        Err(e) => {
            println!("{} Status: {}", "▸".blue(), "DENIED".red());
            println!("{} Kind: {}", "▸".blue(), e.kind());
            println!("{} HTTP status: {}", "▸".blue(), e.status_code());
            println!("{} Reason: {}", "▸".blue(), e);
        }
    }

    println!(
        "\n{} Total time: {:.3}ms",
        "✓".green(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    if !granted {
        std::process::exit(1);
    }
    Ok(())
}

fn error_json(error: &GateError) -> serde_json::Value {
    serde_json::json!({
        "error": error.kind(),
        "status": error.status_code(),
        "message": error.to_string(),
    })
}
