pub mod runtime;

pub use crate::runtime::{Mode, StampedeCli, StampedeRuntime};
