//! Centralized configuration for imgfs (server + store creation).
//!
//! - `ImgfsConfig::from_env()` собирает настройки сервера из ENV:
//!   IMGFS_LISTEN_ADDR, IMGFS_PORT (переопределяет только порт),
//!   IMGFS_MAX_HEADER_SIZE, IMGFS_STORE_PATH.
//!   Непарсящиеся значения игнорируются (остаётся дефолт).
//! - `ConfigBuilder`: тот же конфиг, но fluent и без обязательного чтения ENV.
//! - `CreateOptions`: параметры создания контейнера (max_files, разрешения, имя).

use std::fmt;
use std::path::PathBuf;

use crate::consts::{
    DEFAULT_IMGFS_NAME, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_FILES, DEFAULT_SMALL_RES,
    DEFAULT_THUMB_RES, MAX_HEADER_SIZE, MAX_IMGFS_NAME, MAX_MAX_FILES, MAX_SMALL_RES,
    MAX_THUMB_RES,
};
use crate::error::{ImgfsError, Result};

#[derive(Clone, Debug)]
pub struct ImgfsConfig {
    /// Адрес пассивного сокета ("host:port").
    /// Env: IMGFS_LISTEN_ADDR (default 127.0.0.1:8000), IMGFS_PORT
    pub listen_addr: String,

    /// Initial capacity of a connection's frame buffer; also the ceiling for a
    /// request header that never grows the buffer.
    /// Env: IMGFS_MAX_HEADER_SIZE (default 8192)
    pub max_header_size: usize,

    /// Default container path for the server binary.
    /// Env: IMGFS_STORE_PATH
    pub store_path: Option<PathBuf>,

    /// Prefix for worker thread names ("<prefix>-<n>").
    pub worker_name_prefix: String,
}

impl Default for ImgfsConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_header_size: MAX_HEADER_SIZE,
            store_path: None,
            worker_name_prefix: "imgfs-conn".to_string(),
        }
    }
}

impl ImgfsConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("IMGFS_LISTEN_ADDR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.listen_addr = s.to_string();
            }
        }

        if let Ok(v) = std::env::var("IMGFS_PORT") {
            if let Ok(port) = v.trim().parse::<u16>() {
                cfg.listen_addr = replace_port(&cfg.listen_addr, port);
            }
        }

        if let Ok(v) = std::env::var("IMGFS_MAX_HEADER_SIZE") {
            if let Ok(n) = v.trim().parse::<usize>() {
                if n > 0 {
                    cfg.max_header_size = n;
                }
            }
        }

        if let Ok(v) = std::env::var("IMGFS_STORE_PATH") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.store_path = Some(PathBuf::from(s));
            }
        }

        cfg
    }

    pub fn with_listen_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.listen_addr = addr.into();
        self
    }

    pub fn with_max_header_size(mut self, n: usize) -> Self {
        self.max_header_size = n;
        self
    }

    pub fn with_store_path<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.store_path = path.map(Into::into);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_header_size == 0 {
            return Err(ImgfsError::invalid("max_header_size must be > 0"));
        }
        if self.listen_addr.trim().is_empty() {
            return Err(ImgfsError::invalid("listen_addr is empty"));
        }
        Ok(())
    }
}

/// "host:port" → "host:<port>"; "[::1]:80" тоже поддерживается.
fn replace_port(addr: &str, port: u16) -> String {
    let host = match addr.rfind(':') {
        Some(idx) if !addr.ends_with(']') => &addr[..idx],
        _ => addr,
    };
    format!("{}:{}", host, port)
}

impl fmt::Display for ImgfsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImgfsConfig {{ listen_addr: {}, max_header_size: {}, store_path: {}, worker_name_prefix: {} }}",
            self.listen_addr,
            self.max_header_size,
            self.store_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.worker_name_prefix,
        )
    }
}

#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    cfg: ImgfsConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            cfg: ImgfsConfig::from_env(),
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: ImgfsConfig::default(),
        }
    }

    pub fn listen_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.cfg = self.cfg.with_listen_addr(addr);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.listen_addr = replace_port(&self.cfg.listen_addr, port);
        self
    }

    pub fn max_header_size(mut self, n: usize) -> Self {
        self.cfg = self.cfg.with_max_header_size(n);
        self
    }

    pub fn store_path<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.cfg = self.cfg.with_store_path(path);
        self
    }

    pub fn build(self) -> ImgfsConfig {
        self.cfg
    }
}

// ---------------- Store creation ----------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOptions {
    pub name: String,
    pub max_files: u32,
    pub thumb_res: (u16, u16),
    pub small_res: (u16, u16),
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_IMGFS_NAME.to_string(),
            max_files: DEFAULT_MAX_FILES,
            thumb_res: DEFAULT_THUMB_RES,
            small_res: DEFAULT_SMALL_RES,
        }
    }
}

impl CreateOptions {
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_files(mut self, n: u32) -> Self {
        self.max_files = n;
        self
    }

    pub fn with_thumb_res(mut self, w: u16, h: u16) -> Self {
        self.thumb_res = (w, h);
        self
    }

    pub fn with_small_res(mut self, w: u16, h: u16) -> Self {
        self.small_res = (w, h);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_files == 0 || self.max_files > MAX_MAX_FILES {
            return Err(ImgfsError::invalid(format!(
                "max_files must be in 1..={}, got {}",
                MAX_MAX_FILES, self.max_files
            )));
        }
        let (tw, th) = self.thumb_res;
        if tw == 0 || th == 0 || tw > MAX_THUMB_RES || th > MAX_THUMB_RES {
            return Err(ImgfsError::Resolutions(format!(
                "thumbnail {}x{} (each side must be in 1..={})",
                tw, th, MAX_THUMB_RES
            )));
        }
        let (sw, sh) = self.small_res;
        if sw == 0 || sh == 0 || sw > MAX_SMALL_RES || sh > MAX_SMALL_RES {
            return Err(ImgfsError::Resolutions(format!(
                "small {}x{} (each side must be in 1..={})",
                sw, sh, MAX_SMALL_RES
            )));
        }
        if self.name.len() > MAX_IMGFS_NAME {
            return Err(ImgfsError::invalid(format!(
                "imgFS name too long: {} bytes (max {})",
                self.name.len(),
                MAX_IMGFS_NAME
            )));
        }
        Ok(())
    }
}
