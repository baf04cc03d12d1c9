use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse pin config")]
    Parse(#[from] serde_json::Error),
}

const DEFAULT_PINNED_PANEL_ID: &str = "formulaBarContainer";
const DEFAULT_PANEL_CLASS_FRAGMENT: &str = "sidebar-container";

/// Displaced-panel selectors, most specific first. The host renames its
/// hashed class suffixes between releases, so the bare class comes last.
const DEFAULT_DISPLACED_SELECTORS: [&str; 4] = [
    ".sidebar-container[class*=\"container_\"]",
    ".container_1ma5eibo.sidebar-container",
    ".container_1m5eibo.sidebar-container",
    ".sidebar-container",
];

/// Heuristic thresholds for "a panel docked at the trailing edge".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub selectors: Vec<String>,
    pub class_fragment: String,
    pub min_width: f64,
    pub min_height: f64,
    pub edge_margin: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_DISPLACED_SELECTORS
                .iter()
                .map(|selector| (*selector).to_string())
                .collect(),
            class_fragment: DEFAULT_PANEL_CLASS_FRAGMENT.to_string(),
            min_width: 200.0,
            min_height: 300.0,
            edge_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub min_width: f64,
    pub max_width: f64,
    /// Padding plus drag handle subtracted from the panel width for editors.
    pub chrome_allowance: f64,
    pub relayout_delay_ms: u64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_width: 200.0,
            max_width: 800.0,
            chrome_allowance: 22.0,
            relayout_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub transition_ms: u64,
    pub settle_delay_ms: u64,
    pub structural_delays_ms: Vec<u64>,
    pub swap_recheck_ms: u64,
    pub revalidate_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            transition_ms: 300,
            settle_delay_ms: 1_000,
            structural_delays_ms: vec![10, 100],
            swap_recheck_ms: 50,
            revalidate_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            retry_delay_ms: 1_000,
        }
    }
}

/// Engine tunables. Every field has a default so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub pinned_panel_id: String,
    pub content_region_selector: String,
    pub rich_editor_selector: String,
    pub pinned_z_index: u32,
    pub displaced_z_index: u32,
    pub locator: LocatorConfig,
    pub resize: ResizeConfig,
    pub timing: TimingConfig,
    pub discovery: DiscoveryConfig,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            pinned_panel_id: DEFAULT_PINNED_PANEL_ID.to_string(),
            content_region_selector: ".focusZone-298".to_string(),
            rich_editor_selector: ".monaco-editor".to_string(),
            pinned_z_index: 1_000,
            displaced_z_index: 999,
            locator: LocatorConfig::default(),
            resize: ResizeConfig::default(),
            timing: TimingConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl PinConfig {
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.validated())
    }

    /// Normalizes values that would break the engine's arithmetic.
    pub fn validated(mut self) -> Self {
        if self.resize.min_width > self.resize.max_width {
            tracing::warn!(
                min = self.resize.min_width,
                max = self.resize.max_width,
                "resize bounds inverted; swapping"
            );
            std::mem::swap(&mut self.resize.min_width, &mut self.resize.max_width);
        }
        if self.timing.revalidate_interval_ms == 0 {
            self.timing.revalidate_interval_ms = TimingConfig::default().revalidate_interval_ms;
        }
        if self.discovery.retry_delay_ms == 0 {
            self.discovery.retry_delay_ms = DiscoveryConfig::default().retry_delay_ms;
        }
        if self.locator.selectors.is_empty() {
            self.locator.selectors = LocatorConfig::default().selectors;
        }
        self
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.timing.transition_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.timing.settle_delay_ms)
    }

    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_millis(self.timing.revalidate_interval_ms)
    }

    pub fn swap_recheck(&self) -> Duration {
        Duration::from_millis(self.timing.swap_recheck_ms)
    }

    pub fn structural_delays(&self) -> impl Iterator<Item = Duration> + '_ {
        self.timing
            .structural_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
    }

    pub fn relayout_delay(&self) -> Duration {
        Duration::from_millis(self.resize.relayout_delay_ms)
    }

    pub fn discovery_delay(&self) -> Duration {
        Duration::from_millis(self.discovery.retry_delay_ms)
    }
}

/// Parses the optional JSON settings blob, falling back to defaults.
pub fn load_config(raw: Option<&str>) -> PinConfig {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return PinConfig::default();
    };
    PinConfig::from_json(raw).unwrap_or_else(|err| {
        tracing::warn!(?err, "failed to parse pin config; using defaults");
        PinConfig::default()
    })
}
