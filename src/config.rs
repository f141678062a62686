use std::path::PathBuf;

use anyhow::Context;

use crate::http::upload::UploadConfig;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub max_logo_bytes: usize,
    /// When unset the document store lives in memory only.
    pub store_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => {
                if !port.chars().all(|c| c.is_ascii_digit()) {
                    anyhow::bail!("PORT must be a number");
                }
                port.parse().context("PORT is out of range")?
            }
            None => DEFAULT_PORT,
        };

        let max_logo_bytes = match var("MAX_LOGO_BYTES") {
            Some(bytes) => bytes
                .parse()
                .context("MAX_LOGO_BYTES must be a byte count")?,
            None => DEFAULT_MAX_LOGO_BYTES,
        };

        Ok(Self {
            port,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            upload_dir: var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_logo_bytes,
            store_path: var("STORE_PATH").map(PathBuf::from),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            dir: self.upload_dir.clone(),
            max_file_bytes: self.max_logo_bytes,
        }
    }
}
