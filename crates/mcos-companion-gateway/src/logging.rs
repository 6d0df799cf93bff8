//! Console + file logging. `RUST_LOG` controls the filter (default `info`).

use std::fs::OpenOptions;
use std::path::Path;

use mcos_companion_core::CompanionConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Keep the returned guard alive for the process
/// lifetime or buffered file lines are lost on exit.
pub fn init(config: &CompanionConfig) -> Option<WorkerGuard> {
    let path = config.log_file_path(dirs::home_dir().as_deref());
    let (file_layer, guard) = match open_append(&path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(e) => {
            eprintln!(
                "[mcos-companion] log file {} unavailable: {} (console only)",
                path.display(),
                e
            );
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn open_append(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
