//! MinecraftOS companion core.
//! Desktop catalog, icon directory, detached launcher, Gemini bridge and store installer.

pub mod catalog;
pub mod config;
pub mod gemini_bridge;
pub mod icons;
pub mod installer;
pub mod launcher;

pub use catalog::{default_store_items, find_installable, AppEntry, Catalog, CatalogError, StoreItem};
pub use config::{CompanionConfig, ConfigError};
pub use gemini_bridge::{usable_api_key, ChatError, GeminiClient, TextGenerator};
pub use icons::{is_bare_name, DesktopIcon, IconDirectory, IconError, ICON_CONTENT_TYPE};
pub use installer::{InstallError, InstallOutcome, InstallStep, PackageInstaller};
pub use launcher::{LaunchError, ProcessLauncher, ShellLauncher};

/// Crate version, reported at startup and by `--check`.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #[test]
    fn version_matches_manifest() {
        assert_eq!(super::version(), env!("CARGO_PKG_VERSION"));
        assert!(!super::version().is_empty());
    }
}
