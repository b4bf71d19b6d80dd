/// Outcome of one paired test of the imbalance experiment
pub mod false_positive_record;
/// Outcome of one fit of the recovery experiment
pub mod simulation_record;
