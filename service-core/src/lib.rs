//! service-core: shared HTTP plumbing for the plot-booking back office.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
