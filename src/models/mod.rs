pub mod query;
pub mod quote;
pub mod response;

pub use query::*;
pub use quote::*;
pub use response::*;
