pub mod classifier;
pub mod dialect;
pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod splitter;
#[doc(hidden)]
// Internal module for testing. Made public for use in integration tests.
pub mod test_utils;

pub use classifier::*;
pub use dialect::Dialect;
pub use error::Error;
pub use extractor::*;
pub use fingerprint::fingerprint;
pub use splitter::*;
pub use sqlparser;
