//! Download the stock product feed and turn it into two CSV files: a fully
//! normalised copy and a pruned copy holding only MODEL rows.

pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod table;
pub mod transform;
