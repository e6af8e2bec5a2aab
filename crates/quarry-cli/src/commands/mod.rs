pub mod check;
pub mod compile;
pub mod loader;
pub mod plan;
pub mod run_common;

#[cfg(test)]
mod loader_tests;
#[cfg(test)]
mod plan_tests;
#[cfg(test)]
mod test_utils;
