//! Server credentials and the on-disk layout of harvested files.

use std::path::{Path, PathBuf};

use crate::{COMBINED_STEM, DEFAULT_API_BASE_URL, DEFAULT_BASE_DIR};

/// Everything needed to talk to a single Mastodon server.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub base_url: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: access_token.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Where the harvester reads and writes its files.
///
/// ```text
/// <base>/<query>.csv
/// <base>/epochs/<n>.csv
/// <base>/epochs/combined_epochs.csv
/// <base>/json/<query>.json
/// <base>/csv/<query>.csv
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    base_dir: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR)
    }
}

impl Layout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn epochs_dir(&self) -> PathBuf {
        self.base_dir.join("epochs")
    }

    pub fn json_dir(&self) -> PathBuf {
        self.base_dir.join("json")
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.base_dir.join("csv")
    }

    pub fn combined_path(&self) -> PathBuf {
        self.epochs_dir().join(format!("{COMBINED_STEM}.csv"))
    }
}

/// File stem used for a query: spaces become underscores.
pub fn query_file_stem(query: &str) -> String {
    query.replace(' ', "_")
}
