use std::fs;
use std::path::Path;

use chanlun::DataError;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::BacktestError;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub window: usize,
    pub step: usize,
    pub initial_capital: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BacktestConfigPatch {
    pub window: Option<usize>,
    pub step: Option<usize>,
    pub initial_capital: Option<Decimal>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window: 100,
            step: 10,
            initial_capital: Decimal::from(10_000),
        }
    }
}

impl BacktestConfig {
    pub fn apply_patch(mut self, patch: BacktestConfigPatch) -> Self {
        if let Some(v) = patch.window {
            self.window = v;
        }
        if let Some(v) = patch.step {
            self.step = v;
        }
        if let Some(v) = patch.initial_capital {
            self.initial_capital = v;
        }
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, BacktestError> {
        let patch: BacktestConfigPatch = serde_yaml::from_str(yaml).map_err(DataError::from)?;
        let config = Self::default().apply_patch(patch);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, BacktestError> {
        let content = fs::read_to_string(path).map_err(DataError::from)?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.window < 3 {
            return Err(BacktestError::InvalidConfig(format!(
                "window must be at least 3 bars, got {}",
                self.window
            )));
        }
        if self.step == 0 {
            return Err(BacktestError::InvalidConfig("step must be positive".to_string()));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        Ok(())
    }
}
