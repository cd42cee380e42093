//! CSV renderings of API results for the command line.

pub mod payment_writer;
pub mod plan_writer;
pub mod quota_writer;
