pub mod aggregation;
pub mod catalog;
pub mod completion;
pub mod ecrf;
pub mod emissions;
pub mod error;
pub mod export;
pub mod slot;
pub mod store;
pub mod units;

#[cfg(test)]
mod test_support;

pub use error::CityGasError;
