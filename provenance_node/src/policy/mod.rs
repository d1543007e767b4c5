// Access-control and integrity policies injected into registry contracts

pub mod access_policy;

pub use access_policy::*;
