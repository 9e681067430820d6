pub mod analyze;
pub mod combos;
pub mod sweep;
pub mod vars;
