mod analyzer;
mod config;
mod progress;
mod result;
mod solver;
mod thermal_evaluator;

pub use analyzer::{BatchStatistics, MetricStats, RankMetric, ResultAnalyzer};
pub use config::{
    BatchConfigError, BatteryIterationConfig, CruiseSpeedSpec, IntegratedConfig, PropFilter,
    SpeedSweepSpec,
};
pub use progress::{channel_observer, BatchProgress, CancelToken, ProgressCallback};
pub use result::{ms_to_mph, IntegratedBatchResult, IntegratedResult};
pub use solver::{IntegratedSolver, WorkItem};
pub use thermal_evaluator::{ThermalEvaluation, ThermalEvaluator};
