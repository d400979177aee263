//! Claim Circumstances Server CLI
//!
//! Starts the HTTP server, or prints operational reports against the
//! configured database.

use circumstances_server::{
    config::ServerConfig, init_tracing, start_server, unencrypted_report, ServerError,
};
use std::env;
use std::process;

const DEFAULT_REPORT_LIMIT: usize = 100;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).ok_or_else(|| {
                ServerError::Server("--config requires a file path".to_string())
            })?;
            ServerConfig::from_file(path)?
        }
        None => {
            eprintln!("Warning: No config file specified, using default test configuration");
            eprintln!("Usage: circumstances-server --config <path-to-config.toml>");
            eprintln!();
            ServerConfig::default_test_config()
        }
    };

    if let Some(i) = args.iter().position(|a| a == "--unencrypted") {
        let limit = match args.get(i + 1).filter(|a| !a.starts_with("--")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ServerError::Server(format!("Invalid limit: {}", raw)))?,
            None => DEFAULT_REPORT_LIMIT,
        };

        init_tracing();
        for claimant_id in unencrypted_report(&config, limit)? {
            println!("{}", claimant_id);
        }
        return Ok(());
    }

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("Claim Circumstances Server");
    println!();
    println!("USAGE:");
    println!("    circumstances-server --config <path-to-config.toml> [--unencrypted [limit]]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>          Load configuration from TOML file");
    println!("    --unencrypted [limit]    List claimant ids whose records are not yet");
    println!("                             encrypted at rest (default limit: {})", DEFAULT_REPORT_LIMIT);
    println!("    --help                   Print this help message");
    println!();
    println!("EXAMPLE:");
    println!("    circumstances-server --config config/server.toml");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address: IP address to bind (e.g., '127.0.0.1')");
    println!("    - bind_port: Port number (e.g., 8080)");
    println!("    - database_path: SQLite file (default: circumstances.db)");
    println!("    - base_path: Route prefix (default: /nsjsa)");
    println!("    - api_version: Optional version segment for resource paths (e.g., 'v1')");
    println!("    - [auth] enabled, jwt_secret (shared HS256 secret of the token issuer)");
    println!();
    println!("ENVIRONMENT:");
    println!("    CIRCUMSTANCES_DATABASE_PATH, CIRCUMSTANCES_JWT_SECRET, CIRCUMSTANCES_BIND_PORT");
    println!("    RUST_LOG controls log verbosity (default: info)");
    println!();
}
