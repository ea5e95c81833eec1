mod result;
mod solver;

pub use result::{FlightResult, SolveIssue};
pub use solver::{FlightConditions, FlightSolver, FlightSolverError, ThrottlePoint};
