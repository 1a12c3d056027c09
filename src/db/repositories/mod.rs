pub mod key_presses;
