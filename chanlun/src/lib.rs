pub mod aggregator;
pub mod bar;
pub mod config;
pub mod constant;
pub mod engine;
pub mod frame;
pub mod logging;
pub mod mtc;
pub mod receiver;
pub mod stroke;
pub mod structure;
pub mod swing;

pub use aggregator::{aggregate, aggregate_period, BarAggregator, BucketAggregator};
pub use bar::{validate_series, Bar};
pub use config::{AnalysisConfig, AnalysisConfigPatch, AnalysisProfileConfig};
pub use constant::{
	DataError, Direction, MarketPhase, SwingKind, Timeframe, TrendDirection,
};
pub use engine::{StructurePipeline, StructureSnapshot};
pub use logging::{init_logging, init_logging_with_level};
pub use mtc::{MultiTimeframeContext, TimeframeAnalysis};
pub use receiver::load_bars_csv;
pub use stroke::{build_strokes, Stroke, StrokeBuilder};
pub use structure::{analyze_structure, StructureAnalyzer, TrendState};
pub use swing::{detect_swings, SwingDetector, SwingPoint};
