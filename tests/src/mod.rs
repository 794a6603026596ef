#[cfg(test)]
pub mod award_api_tests;
#[cfg(test)]
pub mod persistence_tests;
#[cfg(test)]
pub mod sbt_api_tests;
#[cfg(test)]
pub mod utils;
