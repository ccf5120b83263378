use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::config::AnalysisConfig;
use crate::stroke::{Stroke, StrokeBuilder};
use crate::structure::{StructureAnalyzer, TrendState};
use crate::swing::{SwingDetector, SwingPoint};

/// Swings, strokes and trend for one bar window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    pub bar_count: usize,
    pub swings: Vec<SwingPoint>,
    pub strokes: Vec<Stroke>,
    pub trend: TrendState,
}

/// Bars -> swings -> strokes -> trend, on an already aggregated series.
#[derive(Debug, Clone, Default)]
pub struct StructurePipeline {
    detector: SwingDetector,
    builder: StrokeBuilder,
    analyzer: StructureAnalyzer,
}

impl StructurePipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            detector: SwingDetector::from_config(&config),
            builder: StrokeBuilder,
            analyzer: StructureAnalyzer::new(config),
        }
    }

    pub fn run(&self, bars: &[Bar]) -> StructureSnapshot {
        let swings = self.detector.detect(bars);
        let strokes = self.builder.build(&swings);
        let trend = self.analyzer.analyze_with_swings(bars, &swings, &strokes);
        StructureSnapshot {
            bar_count: bars.len(),
            swings,
            strokes,
            trend,
        }
    }
}
