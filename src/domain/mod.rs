mod account;
mod extract;
mod money;
mod transaction;

pub use account::*;
pub use extract::*;
pub use money::*;
pub use transaction::*;
