pub mod actor;
pub mod clock;

pub use actor::*;
pub use clock::Clock;
