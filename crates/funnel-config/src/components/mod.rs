//! Configuration components
//!
//! One focused section per concern the core needs to tune.

pub mod logging;
pub mod sharing;
pub mod sync;

pub use logging::*;
pub use sharing::*;
pub use sync::*;
