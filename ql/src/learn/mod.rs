pub mod epsilon;
pub mod q_table;
