//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::KeyScope;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "site-counts";
const ENV_PREFIX: &str = "SITE_COUNTS";
const DEFAULT_CACHE_CAPACITY: usize = 64;
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_CONTENT_SEED: &str = "content/site.toml";
const DEFAULT_CLASS_NAME: &str = "wp-block-site-counts";

/// Command-line arguments for the site-counts binary.
#[derive(Debug, Parser)]
#[command(
    name = "site-counts",
    version,
    about = "Render the cached site counts fragment"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SITE_COUNTS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render the fragment from a content seed and print it to stdout.
    Render(Box<RenderArgs>),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: RenderOverrides,

    /// Number of consecutive renders; repeats inside the TTL are cache hits.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            overrides: RenderOverrides::default(),
            repeat: 1,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the content seed file.
    #[arg(long = "content", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_seed: Option<PathBuf>,

    /// Override the CSS class placed on the fragment container.
    #[arg(long = "class-name", value_name = "NAME")]
    pub class_name: Option<String>,

    /// Override the current item id shown in the fragment.
    #[arg(long = "item-id", value_name = "ID")]
    pub item_id: Option<u64>,

    /// Toggle the fragment cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the fragment cache TTL.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the cache key scope (shared|per-request).
    #[arg(long = "cache-key-scope", value_name = "SCOPE")]
    pub cache_key_scope: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub content: ContentSettings,
    pub fragment: FragmentSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: NonZeroUsize,
    pub ttl: Duration,
    pub key_scope: KeyScope,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub seed_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FragmentSettings {
    pub class_name: String,
    pub item_id: u64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Render(args)) => raw.apply_render_overrides(&args.overrides),
        None => raw.apply_render_overrides(&RenderOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    content: RawContentSettings,
    fragment: RawFragmentSettings,
}

impl RawSettings {
    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(path) = overrides.content_seed.as_ref() {
            self.content.seed = Some(path.clone());
        }
        if let Some(class_name) = overrides.class_name.as_ref() {
            self.fragment.class_name = Some(class_name.clone());
        }
        if let Some(item_id) = overrides.item_id {
            self.fragment.item_id = Some(item_id);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(scope) = overrides.cache_key_scope.as_ref() {
            self.cache.key_scope = Some(scope.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            content,
            fragment,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;
        let content = build_content_settings(content)?;
        let fragment = build_fragment_settings(fragment);

        Ok(Self {
            logging,
            cache,
            content,
            fragment,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity_value = cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY);
    let capacity = NonZeroUsize::new(capacity_value)
        .ok_or_else(|| LoadError::invalid("cache.capacity", "must be greater than zero"))?;

    let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero; set cache.enabled = false to disable caching",
        ));
    }

    let key_scope = match cache.key_scope {
        Some(scope) => KeyScope::from_str(&scope)
            .map_err(|err| LoadError::invalid("cache.key_scope", err.to_string()))?,
        None => KeyScope::default(),
    };

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        capacity,
        ttl: Duration::from_secs(ttl_seconds),
        key_scope,
    })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let seed_path = content
        .seed
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_SEED));
    if seed_path.as_os_str().is_empty() {
        return Err(LoadError::invalid("content.seed", "path must not be empty"));
    }
    Ok(ContentSettings { seed_path })
}

fn build_fragment_settings(fragment: RawFragmentSettings) -> FragmentSettings {
    FragmentSettings {
        class_name: fragment
            .class_name
            .unwrap_or_else(|| DEFAULT_CLASS_NAME.to_string()),
        item_id: fragment.item_id.unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<usize>,
    ttl_seconds: Option<u64>,
    key_scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    seed: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFragmentSettings {
    class_name: Option<String>,
    item_id: Option<u64>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
