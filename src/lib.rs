pub mod bridge;
pub mod error;
pub mod mobility;
pub mod sim;
pub mod traffic;

pub use error::BridgeError;

#[cfg(test)]
mod test;
