//! Link verification pass
//!
//! Revisits every recorded document link that has no HTTP status yet, under
//! the same per-domain politeness rules as the crawl, and records what the
//! server says about it: status, content type, length, last modification
//! and the first few bytes of the body.

mod verifier;

pub use verifier::{Verifier, VerifySummary, VerifyTask};
