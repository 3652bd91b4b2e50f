#[cfg(test)]
mod fixture;
pub use fixture::Fixture;

#[cfg(test)]
mod runner;
pub use runner::{assert_same_content, expected_file, run_pedselect};
