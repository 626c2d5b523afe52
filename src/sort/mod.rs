pub mod core;
pub mod key;
pub mod pipeline;
pub mod radix;

#[cfg(test)]
mod tests;

pub use self::core::*;
pub use self::key::*;
pub use self::pipeline::*;
pub use self::radix::*;
