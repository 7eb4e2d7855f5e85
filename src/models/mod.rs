pub mod calendar;
pub mod codes;
pub mod priority;
pub mod slot;

pub use calendar::*;
pub use priority::*;
pub use slot::*;
