//! Shared gitbatch data models consumed by the diff core and its UI collaborators.

pub mod change;
pub mod commit;
pub mod stash;

pub use change::*;
pub use commit::*;
pub use stash::*;
