pub mod batch;
pub mod diff;
pub mod errors;
pub mod history;
pub mod ports;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod fixtures;
