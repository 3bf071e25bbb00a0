#![forbid(unsafe_code)]

//! Collection view configuration.
//!
//! Defaults cover the common dashboard case. A few knobs can be overridden
//! from the environment:
//!
//! - `VISTA_OVERSCAN_ROWS`: rows materialized beyond each viewport edge
//! - `VISTA_THRESHOLD_ROWS`: pagination distance from the last row
//! - `VISTA_LAYOUT_MODE`: `grid` or `list`
//!
//! [`CollectionConfig::from_env_with`] logs and ignores malformed values;
//! [`CollectionConfig::try_from_env_with`] reports the first one instead.

use std::fmt;

use vista_layout::{LayoutMode, LayoutSpec};

/// Overrides [`CollectionConfig::overscan_rows`].
pub const ENV_OVERSCAN_ROWS: &str = "VISTA_OVERSCAN_ROWS";
/// Overrides [`CollectionConfig::threshold_rows`].
pub const ENV_THRESHOLD_ROWS: &str = "VISTA_THRESHOLD_ROWS";
/// Overrides the layout mode: `grid` or `list`.
pub const ENV_LAYOUT_MODE: &str = "VISTA_LAYOUT_MODE";

/// Default rows of overscan on each side.
pub const DEFAULT_OVERSCAN_ROWS: usize = 2;
/// Default pagination threshold in rows.
pub const DEFAULT_THRESHOLD_ROWS: usize = 2;

/// An environment override could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `key` held `value`, which is not a valid `expected`.
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid {
                key,
                value,
                expected,
            } => write!(f, "{key}={value:?} is not a valid {expected}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything a [`CollectionView`](crate::CollectionView) needs besides data.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectionConfig {
    /// Geometry hints for the layout engine.
    pub layout: LayoutSpec,
    /// Extra rows materialized above and below the viewport.
    pub overscan_rows: usize,
    /// Request the next page when the last rendered row is this close to the end.
    pub threshold_rows: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            layout: LayoutSpec::default(),
            overscan_rows: DEFAULT_OVERSCAN_ROWS,
            threshold_rows: DEFAULT_THRESHOLD_ROWS,
        }
    }
}

impl CollectionConfig {
    /// Defaults with a given layout.
    #[must_use]
    pub fn new(layout: LayoutSpec) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Grid or list.
    #[must_use]
    pub fn with_mode(mut self, mode: LayoutMode) -> Self {
        self.layout.mode = mode;
        self
    }

    /// Fixed item height in logical pixels.
    #[must_use]
    pub fn with_item_height(mut self, item_height: f32) -> Self {
        self.layout.item_height = item_height;
        self
    }

    /// Narrowest a grid column may get before a column is dropped.
    #[must_use]
    pub fn with_min_item_width(mut self, min_item_width: f32) -> Self {
        self.layout.min_item_width = min_item_width;
        self
    }

    /// Spacing between items, both axes.
    #[must_use]
    pub fn with_gap(mut self, gap: f32) -> Self {
        self.layout.gap = gap;
        self
    }

    /// Rows materialized beyond each viewport edge.
    #[must_use]
    pub fn with_overscan_rows(mut self, rows: usize) -> Self {
        self.overscan_rows = rows;
        self
    }

    /// Pagination distance from the last row.
    #[must_use]
    pub fn with_threshold_rows(mut self, rows: usize) -> Self {
        self.threshold_rows = rows;
        self
    }

    /// Defaults plus process environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().merge_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults plus overrides from a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().merge_env_with(get_env)
    }

    /// Apply overrides on top of `self`, skipping malformed values.
    #[must_use]
    pub fn merge_env_with<F>(mut self, get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match parse_rows(&get_env, ENV_OVERSCAN_ROWS) {
            Ok(Some(rows)) => self.overscan_rows = rows,
            Ok(None) => {}
            Err(err) => log_ignored(&err),
        }
        match parse_rows(&get_env, ENV_THRESHOLD_ROWS) {
            Ok(Some(rows)) => self.threshold_rows = rows,
            Ok(None) => {}
            Err(err) => log_ignored(&err),
        }
        match parse_mode(&get_env) {
            Ok(Some(mode)) => self.layout.mode = mode,
            Ok(None) => {}
            Err(err) => log_ignored(&err),
        }
        self
    }

    /// Like [`CollectionConfig::from_env_with`], but fails on the first
    /// malformed value.
    pub fn try_from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(rows) = parse_rows(&get_env, ENV_OVERSCAN_ROWS)? {
            config.overscan_rows = rows;
        }
        if let Some(rows) = parse_rows(&get_env, ENV_THRESHOLD_ROWS)? {
            config.threshold_rows = rows;
        }
        if let Some(mode) = parse_mode(&get_env)? {
            config.layout.mode = mode;
        }
        Ok(config)
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_ignored(err: &ConfigError) {
    vista_core::warn!(error = %err, "ignoring invalid configuration override");
}

fn parse_rows<F>(get_env: &F, key: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = get_env(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            key,
            value,
            expected: "row count",
        })
}

fn parse_mode<F>(get_env: &F) -> Result<Option<LayoutMode>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = get_env(ENV_LAYOUT_MODE) else {
        return Ok(None);
    };
    match LayoutMode::parse(&value) {
        Some(mode) => Ok(Some(mode)),
        None => Err(ConfigError::Invalid {
            key: ENV_LAYOUT_MODE,
            value,
            expected: "layout mode (grid|list)",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn defaults() {
        let config = CollectionConfig::default();
        assert_eq!(config.layout.mode, LayoutMode::Grid);
        assert_eq!(config.layout.item_height, 100.0);
        assert_eq!(config.layout.min_item_width, 200.0);
        assert_eq!(config.layout.gap, 0.0);
        assert_eq!(config.overscan_rows, 2);
        assert_eq!(config.threshold_rows, 2);
    }

    #[test]
    fn env_overrides_apply() {
        let config = CollectionConfig::from_env_with(env(&[
            (ENV_OVERSCAN_ROWS, "5"),
            (ENV_THRESHOLD_ROWS, " 0 "),
            (ENV_LAYOUT_MODE, "list"),
        ]));
        assert_eq!(config.overscan_rows, 5);
        assert_eq!(config.threshold_rows, 0);
        assert_eq!(config.layout.mode, LayoutMode::List);
    }

    #[test]
    fn lenient_parse_ignores_bad_values() {
        let config = CollectionConfig::from_env_with(env(&[
            (ENV_OVERSCAN_ROWS, "-1"),
            (ENV_THRESHOLD_ROWS, "4"),
            (ENV_LAYOUT_MODE, "masonry"),
        ]));
        assert_eq!(config.overscan_rows, DEFAULT_OVERSCAN_ROWS);
        assert_eq!(config.threshold_rows, 4);
        assert_eq!(config.layout.mode, LayoutMode::Grid);
    }

    #[test]
    fn strict_parse_reports_key() {
        let err = CollectionConfig::try_from_env_with(env(&[(ENV_OVERSCAN_ROWS, "lots")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: ENV_OVERSCAN_ROWS,
                value: "lots".into(),
                expected: "row count",
            }
        );
        assert_eq!(
            err.to_string(),
            "VISTA_OVERSCAN_ROWS=\"lots\" is not a valid row count"
        );
    }

    #[test]
    fn builders_chain() {
        let config = CollectionConfig::default()
            .with_mode(LayoutMode::List)
            .with_item_height(48.0)
            .with_gap(4.0)
            .with_min_item_width(120.0)
            .with_overscan_rows(1)
            .with_threshold_rows(3);
        assert_eq!(config.layout.mode, LayoutMode::List);
        assert_eq!(config.layout.item_height, 48.0);
        assert_eq!(config.layout.gap, 4.0);
        assert_eq!(config.layout.min_item_width, 120.0);
        assert_eq!((config.overscan_rows, config.threshold_rows), (1, 3));
    }
}
