pub mod employee;
pub mod leave;
pub mod macros;
pub mod organization;

pub use employee::*;
pub use leave::*;
pub use organization::*;
