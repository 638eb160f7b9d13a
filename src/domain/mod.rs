//! Domain models for the TrueCred dashboards
//!
//! Plain data: feed entries, uploaded documents, verification states and
//! outcome records, and the signed-in session.

mod activity;
mod document;
mod session;
mod verification;

pub use activity::*;
pub use document::*;
pub use session::*;
pub use verification::*;
