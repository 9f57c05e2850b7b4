//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod provider;

pub use provider::FeatureQueryProvider;
