//! Teacher availability preferences: the tri-state grid and its wire codec.

mod codec;
mod matrix;

pub use codec::{decode, encode};
pub use matrix::PreferenceMatrix;
