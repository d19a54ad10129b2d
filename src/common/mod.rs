//! Common, shared types.

pub mod layers;
pub mod signals;
pub mod state;

#[cfg(test)]
pub mod test_utils;
