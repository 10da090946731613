//! Occupancy statistics of a table.

mod table_stats;

pub use table_stats::TableStats;
