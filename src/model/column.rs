use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ResizeError, Result};

/// Stable column identifier.
pub type ColumnId = String;

pub const DEFAULT_MIN_WIDTH: u32 = 40;
pub const DEFAULT_FALLBACK_WIDTH: u32 = 150;

fn default_true() -> bool {
    true
}

/// Column definition as supplied by the host table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: ColumnId,
    #[serde(default)]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub max_width: Option<u32>,
    /// Initial width, also the target of `reset_column`.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default = "default_true")]
    pub can_resize: bool,
    #[serde(default = "default_true")]
    pub growable: bool,
}

impl ColumnConfig {
    pub fn new(id: impl Into<ColumnId>, width: u32) -> Self {
        Self {
            id: id.into(),
            min_width: None,
            max_width: None,
            width: Some(width),
            can_resize: true,
            growable: true,
        }
    }

    pub fn with_min(mut self, min: u32) -> Self {
        self.min_width = Some(min);
        self
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max_width = Some(max);
        self
    }

    pub fn resizable(mut self, can_resize: bool) -> Self {
        self.can_resize = can_resize;
        self
    }

    pub fn growable(mut self, growable: bool) -> Self {
        self.growable = growable;
        self
    }
}

/// Column with every default resolved and its bounds validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    pub min_width: u32,
    pub max_width: Option<u32>,
    pub default_width: u32,
    pub can_resize: bool,
    pub growable: bool,
}

impl Column {
    /// Resolve a config against engine defaults.
    ///
    /// An explicit `min_width` wins over `default_min`; when only a max is
    /// given and it sits below `default_min`, the floor drops to the max so
    /// narrow capped columns stay valid.
    pub fn resolve(config: &ColumnConfig, default_min: u32, fallback_width: u32) -> Result<Self> {
        if config.id.is_empty() {
            return Err(ResizeError::InvalidConstraint(
                "column id must not be empty".to_string(),
            ));
        }

        let min_width = match (config.min_width, config.max_width) {
            (Some(min), _) => min,
            (None, Some(max)) => default_min.min(max),
            (None, None) => default_min,
        };

        if let Some(max) = config.max_width {
            if max == 0 {
                return Err(ResizeError::InvalidConstraint(format!(
                    "column `{}` has a zero max width",
                    config.id
                )));
            }
            if min_width > max {
                return Err(ResizeError::InvalidConstraint(format!(
                    "column `{}` has min width {} above max width {}",
                    config.id, min_width, max
                )));
            }
        }

        let mut column = Self {
            id: config.id.clone(),
            min_width,
            max_width: config.max_width,
            default_width: 0,
            can_resize: config.can_resize,
            growable: config.growable,
        };
        column.default_width = column.clamp(config.width.unwrap_or(fallback_width));
        Ok(column)
    }

    /// Resolve a full column set, rejecting duplicate ids.
    pub fn resolve_all(
        configs: &[ColumnConfig],
        default_min: u32,
        fallback_width: u32,
    ) -> Result<Vec<Self>> {
        let mut seen = HashSet::new();
        configs
            .iter()
            .map(|config| {
                if !seen.insert(config.id.as_str()) {
                    return Err(ResizeError::InvalidConstraint(format!(
                        "duplicate column id `{}`",
                        config.id
                    )));
                }
                Self::resolve(config, default_min, fallback_width)
            })
            .collect()
    }

    pub fn max_or_unbounded(&self) -> f64 {
        self.max_width.map(f64::from).unwrap_or(f64::INFINITY)
    }

    pub fn clamp(&self, width: u32) -> u32 {
        let width = width.max(self.min_width);
        match self.max_width {
            Some(max) => width.min(max),
            None => width,
        }
    }

    pub fn contains(&self, width: u32) -> bool {
        width >= self.min_width && self.max_width.is_none_or(|max| width <= max)
    }
}
