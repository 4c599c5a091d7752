pub mod aggregate;
pub mod charts;
pub mod dataset;
pub mod domain;
pub mod fetch;
pub mod filter;
pub mod insights;
pub mod output;
pub mod report;
pub mod stats;
