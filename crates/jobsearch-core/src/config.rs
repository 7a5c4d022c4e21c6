//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_SEARCH__RRF_K`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed view over the whole configuration; absent keys take defaults.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract::<Settings>()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        settings.validate()?;
        match env {
            "prod" | "production" if settings.embedding.use_fake => {
                Err(Error::InvalidConfig("fake embeddings are not allowed in production".into()).into())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub search: SearchSettings,
    pub autocomplete: AutocompleteSettings,
    pub map: MapSettings,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let s = &self.search;
        if !(s.rrf_k.is_finite() && s.rrf_k > 0.0) {
            return Err(Error::InvalidConfig(format!("search.rrf_k must be positive, got {}", s.rrf_k)));
        }
        for (name, w) in [("search.text_weight", s.text_weight), ("search.vector_weight", s.vector_weight)] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be a non-negative number, got {w}")));
            }
        }
        if s.max_page_size == 0 || s.default_page_size == 0 {
            return Err(Error::InvalidConfig("page sizes must be at least 1".into()));
        }
        if s.max_result_window < s.max_page_size {
            return Err(Error::InvalidConfig("search.max_result_window must be at least search.max_page_size".into()));
        }
        if self.map.point_cap == 0 || self.map.fallback_point_cap == 0 {
            return Err(Error::InvalidConfig("map point caps must be at least 1".into()));
        }
        if self.map.zoom_tiers.windows(2).any(|w| w[0].below >= w[1].below) {
            return Err(Error::InvalidConfig("map.zoom_tiers must be sorted by ascending zoom".into()));
        }
        if self.embedding.dimension == 0 || self.embedding.max_attempts == 0 {
            return Err(Error::InvalidConfig("embedding.dimension and embedding.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub text_index_dir: String,
    pub vector_db_dir: String,
    pub jobs_table: String,
    pub chunks_table: String,
    pub companies_file: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            text_index_dir: "./data/indexes/tantivy".to_string(),
            vector_db_dir: "./data/indexes/lancedb".to_string(),
            jobs_table: "jobs".to_string(),
            chunks_table: "job_chunks".to_string(),
            companies_file: None,
        }
    }
}

impl DataSettings {
    pub fn text_index_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.text_index_dir)
    }

    pub fn vector_db_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.vector_db_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// RRF damping constant.
    pub rrf_k: f64,
    pub text_weight: f64,
    pub vector_weight: f64,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub branch_limit_floor: usize,
    pub branch_limit_pad: usize,
    pub num_candidates_floor: usize,
    pub num_candidates_multiplier: usize,
    /// Distance at which the proximity boost halves.
    pub geo_pivot_km: f64,
    pub geo_boost: f32,
    /// Deepest reachable result; requests with `page * size` beyond it are
    /// rejected.
    pub max_result_window: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            text_weight: 0.4,
            vector_weight: 0.6,
            default_page_size: 10,
            max_page_size: 50,
            branch_limit_floor: 500,
            branch_limit_pad: 100,
            num_candidates_floor: 1000,
            num_candidates_multiplier: 20,
            geo_pivot_km: 20.0,
            geo_boost: 1.0,
            max_result_window: 10_000,
        }
    }
}

impl SearchSettings {
    pub fn branch_limit(&self, page: usize, size: usize) -> usize {
        let ceiling = self.max_result_window.saturating_add(self.branch_limit_pad).max(self.branch_limit_floor);
        page.saturating_mul(size)
            .saturating_add(self.branch_limit_pad)
            .max(self.branch_limit_floor)
            .min(ceiling)
    }

    pub fn num_candidates(&self, branch_limit: usize) -> usize {
        branch_limit
            .saturating_mul(self.num_candidates_multiplier)
            .max(self.num_candidates_floor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Over-fetch factor applied before title deduplication.
    pub overfetch: usize,
    /// Matching titles read by the substring fallback.
    pub fallback_scan_limit: usize,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self { default_limit: 10, max_limit: 20, overfetch: 5, fallback_scan_limit: 10_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTier {
    /// Tier applies to zoom levels strictly below this value.
    pub below: f64,
    pub buckets: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub high_zoom_threshold: f64,
    pub point_cap: usize,
    pub fallback_point_cap: usize,
    pub member_id_cap: usize,
    pub zoom_tiers: Vec<ZoomTier>,
    pub default_buckets: usize,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            high_zoom_threshold: 12.0,
            point_cap: 50,
            fallback_point_cap: 100,
            member_id_cap: 20,
            zoom_tiers: vec![
                ZoomTier { below: 5.0, buckets: 2 },
                ZoomTier { below: 8.0, buckets: 4 },
                ZoomTier { below: 10.0, buckets: 6 },
                ZoomTier { below: 11.0, buckets: 7 },
                ZoomTier { below: 12.0, buckets: 8 },
            ],
            default_buckets: 20,
        }
    }
}

impl MapSettings {
    pub fn bucket_count(&self, zoom: f64) -> usize {
        self.zoom_tiers
            .iter()
            .find(|tier| zoom < tier.below)
            .map_or(self.default_buckets, |tier| tier.buckets)
    }

    pub fn is_high_zoom(&self, zoom: f64) -> bool {
        zoom >= self.high_zoom_threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dimension: usize,
    pub max_len: usize,
    pub model_dir: Option<String>,
    pub use_fake: bool,
    pub max_attempts: usize,
    pub retry_backoff_ms: u64,
    pub chunk_words: usize,
    pub chunk_overlap: f32,
    /// Minimum chunk rows before an IVF_PQ index is worth training.
    pub ann_min_rows: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dimension: 1024,
            max_len: 256,
            model_dir: None,
            use_fake: false,
            max_attempts: 3,
            retry_backoff_ms: 200,
            chunk_words: 300,
            chunk_overlap: 0.2,
            ann_min_rows: 5_000,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
