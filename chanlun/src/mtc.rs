//! 多周期上下文（MTC）。
//!
//! 把同一组基础 bar 聚合到多个周期，并在各周期上独立计算结构快照。
//! 各周期之间无共享可变状态，使用 scoped 线程并行处理。

use crossbeam::thread;
use serde::Serialize;
use tracing::info;

use crate::aggregator::aggregate;
use crate::bar::{validate_series, Bar};
use crate::config::AnalysisProfileConfig;
use crate::constant::{DataError, Timeframe};
use crate::engine::{StructurePipeline, StructureSnapshot};

#[derive(Debug, Clone, Serialize)]
pub struct TimeframeAnalysis {
    pub timeframe: Timeframe,
    #[serde(skip)]
    pub bars: Vec<Bar>,
    pub structure: StructureSnapshot,
}

#[derive(Debug, Clone, Default)]
pub struct MultiTimeframeContext {
    profile: AnalysisProfileConfig,
}

impl MultiTimeframeContext {
    pub fn new(profile: AnalysisProfileConfig) -> Self {
        Self { profile }
    }

    pub fn analyze(
        &self,
        base: &[Bar],
        timeframes: &[Timeframe],
    ) -> Result<Vec<TimeframeAnalysis>, DataError> {
        validate_series(base)?;
        let mut timeframes = timeframes.to_vec();
        timeframes.sort();
        timeframes.dedup();

        let profile = &self.profile;
        let results = thread::scope(|scope| {
            let handles = timeframes
                .iter()
                .map(|&timeframe| {
                    scope.spawn(move |_| -> Result<TimeframeAnalysis, DataError> {
                        let bars = aggregate(base, timeframe)?;
                        let pipeline = StructurePipeline::new(profile.resolve_for(timeframe));
                        let structure = pipeline.run(&bars);
                        Ok(TimeframeAnalysis {
                            timeframe,
                            bars,
                            structure,
                        })
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|e| std::panic::resume_unwind(e));

        let out = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        info!(
            base = base.len(),
            timeframes = out.len(),
            "multi timeframe analysis done"
        );
        Ok(out)
    }
}
