pub mod monthly;
pub mod totals;
