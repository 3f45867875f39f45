//! Audio loading and time windowing

pub mod loader;
pub mod time_window;

pub use loader::{load, probe, AudioError, Recording, WavInfo};
pub use time_window::{window, ResolvedWindow, TimeWindow};
