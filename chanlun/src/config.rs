use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constant::{DataError, Timeframe};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub trend_lookback: usize,
    pub trend_stroke_window: usize,
    pub trend_threshold: f64,
    pub up_ratio_bull: f64,
    pub up_ratio_bear: f64,
    pub sideways_strength: f64,
    pub level_count: usize,

    pub strength_min: f64,
    pub strength_max: f64,
    /// Accept ties on the bar's opposite side when classifying swings.
    pub swing_inclusive_opposite: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfigPatch {
    pub trend_lookback: Option<usize>,
    pub trend_stroke_window: Option<usize>,
    pub trend_threshold: Option<f64>,
    pub up_ratio_bull: Option<f64>,
    pub up_ratio_bear: Option<f64>,
    pub sideways_strength: Option<f64>,
    pub level_count: Option<usize>,

    pub strength_min: Option<f64>,
    pub strength_max: Option<f64>,
    pub swing_inclusive_opposite: Option<bool>,
}

/// `default` applies first, then the matching `timeframe` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisProfileConfig {
    #[serde(default)]
    pub default: AnalysisConfigPatch,
    #[serde(default)]
    pub timeframe: HashMap<String, AnalysisConfigPatch>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_lookback: 10,
            trend_stroke_window: 3,
            trend_threshold: 0.02,
            up_ratio_bull: 0.6,
            up_ratio_bear: 0.4,
            sideways_strength: 0.3,
            level_count: 3,

            strength_min: 0.1,
            strength_max: 3.0,
            swing_inclusive_opposite: false,
        }
    }
}

impl AnalysisConfig {
    pub fn apply_patch(mut self, patch: AnalysisConfigPatch) -> Self {
        if let Some(v) = patch.trend_lookback {
            self.trend_lookback = v;
        }
        if let Some(v) = patch.trend_stroke_window {
            self.trend_stroke_window = v;
        }
        if let Some(v) = patch.trend_threshold {
            self.trend_threshold = v;
        }
        if let Some(v) = patch.up_ratio_bull {
            self.up_ratio_bull = v;
        }
        if let Some(v) = patch.up_ratio_bear {
            self.up_ratio_bear = v;
        }
        if let Some(v) = patch.sideways_strength {
            self.sideways_strength = v;
        }
        if let Some(v) = patch.level_count {
            self.level_count = v;
        }

        if let Some(v) = patch.strength_min {
            self.strength_min = v;
        }
        if let Some(v) = patch.strength_max {
            self.strength_max = v;
        }
        if let Some(v) = patch.swing_inclusive_opposite {
            self.swing_inclusive_opposite = v;
        }
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        let patch: AnalysisConfigPatch = serde_yaml::from_str(yaml)?;
        Ok(Self::default().apply_patch(patch))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }
}

impl AnalysisProfileConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn resolve_for(&self, timeframe: Timeframe) -> AnalysisConfig {
        let mut config = AnalysisConfig::default().apply_patch(self.default.clone());
        let key = timeframe.as_str();
        if let Some(patch) = self
            .timeframe
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
        {
            config = config.apply_patch(patch.clone());
        }
        config
    }
}
