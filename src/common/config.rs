use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::layout_engine::{LayoutDescriptor, LayoutKind, OverlapAlgorithm};
use crate::sys::marker::MARKER_CAPACITY;

pub fn data_dir() -> PathBuf { dirs::home_dir().unwrap().join(".mosaic") }
pub fn config_file() -> PathBuf { dirs::home_dir().unwrap().join(".mosaic.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// When true, dragging snaps only while the modifier is held; when
    /// false the polarity flips and the modifier suppresses snapping.
    #[serde(default = "yes")]
    pub shift_drag: bool,
    /// Allow a middle/secondary click during the drag to toggle snapping,
    /// for mice-only users.
    #[serde(default)]
    pub mouse_switch: bool,
    #[serde(default)]
    pub show_zones_on_all_monitors: bool,
    /// Treat all monitors as one combined work area.
    #[serde(default)]
    pub span_zones_across_monitors: bool,
    #[serde(default = "yes")]
    pub make_dragged_window_transparent: bool,
    /// Restore the pre-drag size/position when a drag ends without
    /// snapping.
    #[serde(default = "yes")]
    pub restore_size: bool,
    /// Keyboard snapping may hop to the adjacent display at an edge.
    #[serde(default)]
    pub move_windows_across_monitors: bool,
    /// Arrow snapping picks zones by geometry instead of by index order.
    #[serde(default)]
    pub move_windows_based_on_position: bool,
    /// Re-apply each window's persisted zone when a work area is
    /// recreated after a topology change.
    #[serde(default = "yes")]
    pub restore_last_zones: bool,
    /// Flash the overlay when a work area's layout changes.
    #[serde(default)]
    pub flash_zones_on_layout_change: bool,
    /// Application names that are never zoning candidates.
    #[serde(default)]
    pub excluded_apps: Vec<String>,
    #[serde(default)]
    pub layout: LayoutSettings,
}

impl Default for Settings {
    fn default() -> Self { Config::default().settings }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default)]
    pub kind: LayoutKind,
    #[serde(default = "default_zone_count")]
    pub zone_count: usize,
    #[serde(default = "yes")]
    pub show_spacing: bool,
    /// Pixels between zones, and between the outermost zones and the work
    /// area edge.
    #[serde(default = "default_spacing")]
    pub spacing: i32,
    /// How far outside a zone a hover point may fall and still capture it.
    #[serde(default = "default_sensitivity_radius")]
    pub sensitivity_radius: i32,
    #[serde(default)]
    pub overlap_algorithm: OverlapAlgorithm,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            kind: LayoutKind::default(),
            zone_count: default_zone_count(),
            show_spacing: true,
            spacing: default_spacing(),
            sensitivity_radius: default_sensitivity_radius(),
            overlap_algorithm: OverlapAlgorithm::default(),
        }
    }
}

impl LayoutSettings {
    /// The descriptor the registry installs on every work area. Builtin
    /// layouts are identified by a stable kind/count uuid so history
    /// records survive restarts.
    pub fn to_descriptor(&self) -> LayoutDescriptor {
        LayoutDescriptor {
            uuid: format!("{}-{}", self.kind, self.zone_count),
            kind: self.kind,
            zone_count: self.zone_count,
            show_spacing: self.show_spacing,
            spacing: self.spacing,
            sensitivity_radius: self.sensitivity_radius,
            overlap_algorithm: self.overlap_algorithm,
            custom: None,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.zone_count == 0 {
            issues.push("layout.zone_count must be at least 1".to_string());
        }
        if self.zone_count > MARKER_CAPACITY {
            issues.push(format!(
                "layout.zone_count must not exceed {} (zone markers cannot address more)",
                MARKER_CAPACITY
            ));
        }
        if self.spacing < 0 {
            issues.push(format!("layout.spacing must be non-negative, got {}", self.spacing));
        }
        if self.sensitivity_radius < 0 {
            issues.push(format!(
                "layout.sensitivity_radius must be non-negative, got {}",
                self.sensitivity_radius
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.zone_count == 0 {
            self.zone_count = 1;
            fixes += 1;
        }
        if self.zone_count > MARKER_CAPACITY {
            self.zone_count = MARKER_CAPACITY;
            fixes += 1;
        }
        if self.spacing < 0 {
            self.spacing = default_spacing();
            fixes += 1;
        }
        if self.sensitivity_radius < 0 {
            self.sensitivity_radius = default_sensitivity_radius();
            fixes += 1;
        }

        fixes
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (index, app) in self.excluded_apps.iter().enumerate() {
            if app.trim().is_empty() {
                issues.push(format!("excluded_apps[{index}] is empty"));
            }
        }

        issues.extend(self.layout.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        let before = self.excluded_apps.len();
        self.excluded_apps.retain(|app| !app.trim().is_empty());
        fixes += before - self.excluded_apps.len();

        fixes += self.layout.auto_fix_values();

        fixes
    }
}

fn yes() -> bool { true }

fn default_zone_count() -> usize { 3 }

fn default_spacing() -> i32 { 16 }

fn default_sensitivity_radius() -> i32 { 20 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config {
        static DEFAULT: Lazy<Config> =
            Lazy::new(|| Config::parse(include_str!("../../mosaic.default.toml")).unwrap());
        DEFAULT.clone()
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }
}
