use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling a single analysis run.
///
/// Every field has a serde default so a partial TOML file (or none at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default = "default_true")]
    pub analyze_dependencies: bool,
    #[serde(default = "default_true")]
    pub analyze_lifecycle_methods: bool,
    #[serde(default = "default_true")]
    pub detect_design_patterns: bool,
    #[serde(default = "default_true")]
    pub generate_metadata: bool,
    #[serde(default = "default_true")]
    pub generate_context_summary: bool,
    #[serde(default)]
    pub include_namespaces: Vec<String>,
    #[serde(default)]
    pub exclude_namespaces: Vec<String>,
    #[serde(default = "default_include_file_patterns")]
    pub include_file_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_file_patterns: Vec<String>,
    #[serde(default)]
    pub verbose_logging: bool,
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_true() -> bool {
    true
}

fn default_include_file_patterns() -> Vec<String> {
    vec!["*.cs".to_string()]
}

fn default_max_threads() -> usize {
    num_cpus::get()
}

impl AnalysisOptions {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let options: AnalysisOptions = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(options)
    }

    /// Worker count actually used by the engine; never zero.
    pub fn worker_threads(&self) -> usize {
        self.max_threads.max(1)
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analyze_dependencies: true,
            analyze_lifecycle_methods: true,
            detect_design_patterns: true,
            generate_metadata: true,
            generate_context_summary: true,
            include_namespaces: Vec::new(),
            exclude_namespaces: Vec::new(),
            include_file_patterns: default_include_file_patterns(),
            exclude_file_patterns: Vec::new(),
            verbose_logging: false,
            max_threads: default_max_threads(),
        }
    }
}
