//! Incremental, best-effort construction of a composition from decoded
//! generation events.

pub mod driver;
pub mod session;
pub mod source;

pub use driver::run_session;
pub use session::{BuilderOutcome, BuilderSession};
pub use source::GenerationSource;
