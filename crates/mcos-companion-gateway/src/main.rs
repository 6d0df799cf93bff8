//! MinecraftOS companion gateway, port 8787 by default.
//! Desktop icons, app launching, icon assets, store catalog and the Gemini chat proxy.

mod error;
mod logging;
mod routes;
mod state;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use mcos_companion_core::{
    default_store_items, find_installable, CompanionConfig, IconDirectory, PackageInstaller,
};

use crate::state::AppState;

const USAGE: &str = "Usage: mcos-companion [--check] [--install <store-id>] [--write-config <path>]";

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env first: GEMINI_API_KEY and COMPANION__* overrides may live there.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[mcos-companion] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let config = match CompanionConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[mcos-companion] {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(pos) = args.iter().position(|a| a == "--write-config") {
        let Some(path) = args.get(pos + 1) else {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        };
        return match config.save_to_path(Path::new(path)) {
            Ok(()) => {
                println!("Configuration written to {}", path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("[mcos-companion] {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let _log_guard = logging::init(&config);

    if let Some(pos) = args.iter().position(|a| a == "--install") {
        let Some(item_id) = args.get(pos + 1) else {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        };
        return run_install(item_id).await;
    }

    if args.iter().any(|a| a == "--check") {
        return run_check(&config).await;
    }

    let api_key = CompanionConfig::gemini_api_key();
    if api_key.is_none() {
        tracing::warn!(
            "GEMINI_API_KEY missing or placeholder: /chat will answer 503 until it is set in .env"
        );
    }

    let bind_addr = config.bind_addr();
    let state = match AppState::from_config(config, api_key) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        "Catalog: {} app(s), icons in {}",
        state.catalog.len(),
        state.icons.root().display()
    );

    let app = routes::build_app(state);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Cannot bind {}: {}", bind_addr, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        "Companion server v{} started on {}",
        mcos_companion_core::version(),
        bind_addr
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    tracing::info!("Companion server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Ctrl+C handler failed: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested (Ctrl+C)");
}

/// `--install <store-id>`: only store items that carry a package name are installable.
async fn run_install(item_id: &str) -> ExitCode {
    let items = default_store_items();
    let Some(package) = find_installable(&items, item_id).and_then(|i| i.package.as_deref()) else {
        tracing::error!("'{}' is not an installable store item", item_id);
        return ExitCode::FAILURE;
    };
    match PackageInstaller::new().install(package).await {
        Ok(outcome) => {
            println!("{} installed or already present (via {}).", outcome.package, outcome.installed_by);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Install failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `--check`: report catalog, icon availability and chat configuration, then exit.
async fn run_check(config: &CompanionConfig) -> ExitCode {
    let catalog = match config.catalog() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Catalog invalid: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let icons = IconDirectory::new(config.icons_dir.clone());
    let available = match icons.list_icons().await {
        Ok(names) => names,
        Err(e) => {
            eprintln!("Icon directory unreadable: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("mcos-companion {}", mcos_companion_core::version());
    println!("Listening address: {}", config.bind_addr());
    println!("Icon directory: {}", icons.root().display());
    for entry in catalog.entries() {
        let mark = if available.contains(&entry.icon_file) { "ok" } else { "missing icon" };
        println!("  {:<12} {:<20} {}", entry.id, entry.icon_file, mark);
    }
    let chat = if CompanionConfig::gemini_api_key().is_some() {
        format!("configured ({})", config.gemini_model)
    } else {
        "not configured".to_string()
    };
    println!("Chat: {}", chat);
    ExitCode::SUCCESS
}
