// Application layer: input validation, request deadlines and dispatch to the store.

pub mod error;
pub mod service;
pub mod validation;

pub use error::*;
pub use service::*;
pub use validation::*;
