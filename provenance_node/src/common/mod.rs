mod error;

pub use error::{ContractKind, ErrorKind, RegistryError, RegistryError as Error, Result};
