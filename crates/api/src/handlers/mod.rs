pub mod attendance;
pub mod leaves;
pub mod substitutes;
