pub mod battery;
pub mod drag;
pub mod environment;
pub mod flight;
pub mod integrated;
pub mod motor;
pub mod prop;
pub mod utils;

pub use battery::{BatteryPack, CellDatabase, CellSpec, PackConfig, ThermalEnvironment};
pub use drag::{DragBreakdown, DragModel};
pub use flight::{FlightConditions, FlightResult, FlightSolver, SolveIssue};
pub use integrated::{
    BatchProgress, CancelToken, IntegratedBatchResult, IntegratedConfig, IntegratedResult,
    IntegratedSolver, RankMetric, ResultAnalyzer,
};
pub use motor::{MotorCatalog, MotorParameters, MotorState};
pub use prop::{PropDatabase, PropTable};
pub use utils::EngineError;
