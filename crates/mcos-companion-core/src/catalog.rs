//! Desktop catalog and store catalog.
//!
//! The desktop catalog maps an application id to its display name, icon file and
//! launch command. It is fixed at startup (built-in table or `[[apps]]` from the
//! config file) and never mutated afterwards. Order is definition order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One launchable desktop application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    /// Bare filename inside the icon directory (e.g. `terminal.svg`).
    #[serde(alias = "icon")]
    pub icon_file: String,
    /// Shell command handed to `sh -c`. Server-side only; never built from client input.
    #[serde(alias = "command")]
    pub launch_command: String,
}

impl AppEntry {
    pub fn new(id: &str, display_name: &str, icon_file: &str, launch_command: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            icon_file: icon_file.to_string(),
            launch_command: launch_command.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate application id: {0}")]
    DuplicateId(String),
    #[error("application id must not be empty")]
    EmptyId,
    #[error("application '{0}' has an empty launch command")]
    EmptyCommand(String),
}

/// Ordered, read-only catalog of desktop applications.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<AppEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate or empty ids and empty commands.
    pub fn new(entries: Vec<AppEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if entry.launch_command.trim().is_empty() {
                return Err(CatalogError::EmptyCommand(entry.id.clone()));
            }
            if index.insert(entry.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// The MinecraftOS desktop: file manager, terminal and the store GUI.
    pub fn builtin() -> Self {
        let entries = default_apps();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Self { entries, index }
    }

    pub fn get(&self, id: &str) -> Option<&AppEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Entries in definition order.
    pub fn entries(&self) -> &[AppEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn default_apps() -> Vec<AppEntry> {
    vec![
        AppEntry::new("files", "Files", "files.svg", "thunar"),
        AppEntry::new("terminal", "Terminal", "terminal.svg", "lxterminal"),
        AppEntry::new(
            "store",
            "Store",
            "store.svg",
            "python3 /usr/local/bin/minecraftos_scripts/minecraftos-store.py",
        ),
    ]
}

/// Marketplace entry as rendered by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub icon: String,
    pub price: String,
    /// System package name for items installed through pacman/yay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

fn store_item(
    id: &str,
    name: &str,
    description: &str,
    author: &str,
    icon: &str,
    price: &str,
    package: Option<&str>,
) -> StoreItem {
    StoreItem {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        author: author.to_string(),
        icon: icon.to_string(),
        price: price.to_string(),
        package: package.map(str::to_string),
    }
}

/// Fixed marketplace list served verbatim by `/store-items`.
pub fn default_store_items() -> Vec<StoreItem> {
    vec![
        store_item("hmcl", "HMCL Launcher", "Open source Minecraft launcher.", "HMCL Team", "hmcl.png", "Free", None),
        store_item("tlauncher", "TLauncher", "Alternative Minecraft launcher.", "TLauncher", "tlauncher.png", "Free", None),
        store_item("ai-bot", "AI Bot", "MinecraftOS AI assistant.", "MinecraftOS", "bot_icon.png", "Free", None),
        store_item("gimp", "GIMP", "Advanced image editor (official package).", "The GIMP Team", "gimp.png", "Free", Some("gimp")),
        store_item("vlc", "VLC", "Universal media player (official package).", "VideoLAN", "vlc.png", "Free", Some("vlc")),
        store_item("obs-studio", "OBS Studio", "Streaming and video capture (AUR possible).", "OBS Project", "obs.png", "Free", Some("obs-studio")),
        store_item("discord", "Discord", "Voice and text chat (AUR possible).", "Discord Inc.", "discord.png", "Free", Some("discord")),
    ]
}

/// Look up an installable store item by id. Items without a package are not installable.
pub fn find_installable<'a>(items: &'a [StoreItem], id: &str) -> Option<&'a StoreItem> {
    items.iter().find(|i| i.id == id && i.package.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_keeps_definition_order() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["files", "terminal", "store"]);
        assert_eq!(catalog.get("terminal").map(|e| e.launch_command.as_str()), Some("lxterminal"));
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::new(vec![
            AppEntry::new("a", "A", "a.svg", "true"),
            AppEntry::new("a", "Again", "b.svg", "true"),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("a".to_string()));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = Catalog::new(vec![AppEntry::new("a", "A", "a.svg", "  ")]).unwrap_err();
        assert_eq!(err, CatalogError::EmptyCommand("a".to_string()));
    }

    #[test]
    fn store_items_without_package_omit_the_field() {
        let items = default_store_items();
        let json = serde_json::to_value(&items).unwrap();
        assert!(json[0].get("package").is_none());
        assert_eq!(json[3]["package"], "gimp");
        assert!(find_installable(&items, "hmcl").is_none());
        assert_eq!(find_installable(&items, "vlc").and_then(|i| i.package.as_deref()), Some("vlc"));
    }

    #[test]
    fn app_entry_accepts_short_field_names() {
        let entry: AppEntry = toml::from_str(
            "id = \"terminal\"\nname = \"Terminal\"\nicon = \"terminal.svg\"\ncommand = \"echo hi\"\n",
        )
        .unwrap();
        assert_eq!(entry, AppEntry::new("terminal", "Terminal", "terminal.svg", "echo hi"));
    }
}
