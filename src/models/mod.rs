pub mod account;
pub mod purchase;
pub mod resume;

pub use account::*;
pub use purchase::*;
pub use resume::*;
