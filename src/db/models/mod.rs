pub mod key_press;

pub use key_press::{KeyPressDelta, KeyPressRecord};
