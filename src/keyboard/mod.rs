pub mod aggregator;
pub mod flusher;
pub mod keymap;
pub mod monitor;

pub use aggregator::PressAggregator;
pub use flusher::KeyPressStore;
pub use monitor::KeyboardMonitor;
