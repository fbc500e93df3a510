pub mod metrics;
pub mod reporter;
pub mod routes;
