//! config.rs
//! Run configuration: serde-loadable, normalized before the pipeline starts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::charset::Alphabet;
use crate::constants::{gpu, DEFAULT_BATCH_SIZE, DEFAULT_MAX_LEN, DEFAULT_MIN_LEN, DEFAULT_REPORT_INTERVAL};
use crate::types::ConfigError;

/// Invoked once with the recovered password, by the worker that found it.
pub type FoundCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Cpu,
    #[serde(alias = "vulkan")]
    Gpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cpu => f.write_str("cpu"),
            BackendKind::Gpu => f.write_str("gpu"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackConfig {
    pub alphabet: Alphabet,
    pub min_len: usize,
    pub max_len: usize,
    pub workers: usize,
    pub batch_size: usize,
    pub report_interval_ms: u64,
    pub backend: BackendKind,
    /// Compute kernel source, relative to the working directory.
    pub kernel_path: PathBuf,
    /// Max candidates per GPU dispatch.
    pub gpu_batch_capacity: usize,
    #[serde(skip)]
    pub on_found: Option<FoundCallback>,
}

impl Default for CrackConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::default(),
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
            workers: num_cpus::get(),
            batch_size: DEFAULT_BATCH_SIZE,
            report_interval_ms: DEFAULT_REPORT_INTERVAL.as_millis() as u64,
            backend: BackendKind::Cpu,
            kernel_path: PathBuf::from(gpu::DEFAULT_KERNEL_PATH),
            gpu_batch_capacity: gpu::DEFAULT_BATCH_CAPACITY,
            on_found: None,
        }
    }
}

impl fmt::Debug for CrackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrackConfig")
            .field("alphabet", &self.alphabet.to_string())
            .field("min_len", &self.min_len)
            .field("max_len", &self.max_len)
            .field("workers", &self.workers)
            .field("batch_size", &self.batch_size)
            .field("report_interval_ms", &self.report_interval_ms)
            .field("backend", &self.backend)
            .field("kernel_path", &self.kernel_path)
            .field("gpu_batch_capacity", &self.gpu_batch_capacity)
            .field("on_found", &self.on_found.is_some())
            .finish()
    }
}

impl CrackConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn with_on_found(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_found = Some(Arc::new(f));
        self
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Replace non-positive or inconsistent values with safe defaults.
    pub fn normalized(mut self) -> Self {
        if self.workers == 0 {
            self.workers = 1;
        }
        if self.batch_size == 0 {
            self.batch_size = 1;
        }
        if self.report_interval_ms == 0 {
            self.report_interval_ms = DEFAULT_REPORT_INTERVAL.as_millis() as u64;
        }
        if self.max_len < self.min_len {
            warn!("[CONFIG] max_len {} < min_len {}; using {}", self.max_len, self.min_len, self.min_len);
            self.max_len = self.min_len;
        }
        if self.gpu_batch_capacity == 0 {
            self.gpu_batch_capacity = gpu::DEFAULT_BATCH_CAPACITY;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alphabet.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_counts_normalize_to_one() {
        let cfg = CrackConfig { workers: 0, batch_size: 0, report_interval_ms: 0, ..Default::default() }.normalized();
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.batch_size, 1);
        assert_eq!(cfg.report_interval(), DEFAULT_REPORT_INTERVAL);
    }

    #[test]
    fn inverted_lengths_collapse() {
        let cfg = CrackConfig { min_len: 5, max_len: 2, ..Default::default() }.normalized();
        assert_eq!((cfg.min_len, cfg.max_len), (5, 5));
    }

    #[test]
    fn empty_alphabet_rejected() {
        let cfg = CrackConfig { alphabet: Alphabet::from(""), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyAlphabet)));
    }

    #[test]
    fn debug_hides_callback() {
        let cfg = CrackConfig::default().with_on_found(|_| {});
        assert!(format!("{cfg:?}").contains("on_found: true"));
    }
}
