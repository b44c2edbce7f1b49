//! Remote data acquisition: the ISO-3166 table, administrative boundaries,
//! and overlay datasets, all behind one shared HTTP client.

pub mod boundaries;
pub mod datasets;
pub mod http_client;
pub mod iso_codes;
