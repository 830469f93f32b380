use std::path::{Path, PathBuf};

/// Runtime settings for the `hotelbook` binary, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one WAL file per entity kind.
    pub data_dir: PathBuf,
    /// Prometheus exporter port; metrics are not exported when unset.
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("HOTELBOOK_DATA_DIR").unwrap_or_else(|| "./data".into());
        let metrics_port = lookup("HOTELBOOK_METRICS_PORT").and_then(|s| s.parse().ok());
        Self {
            data_dir: PathBuf::from(data_dir),
            metrics_port,
        }
    }

    pub fn rooms_wal(&self) -> PathBuf {
        self.wal_path("rooms")
    }

    pub fn bookings_wal(&self) -> PathBuf {
        self.wal_path("bookings")
    }

    pub fn customers_wal(&self) -> PathBuf {
        self.wal_path("customers")
    }

    fn wal_path(&self, kind: &str) -> PathBuf {
        self.data_dir.join(format!("{kind}.wal"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
