//! Integration suites for the built-in catalog and the pass properties.

mod catalog_scenarios;
mod properties;
