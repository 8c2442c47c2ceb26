//! Content digests for quire.
//!
//! Digests are XXH64 hashes rendered as 16 lowercase hex digits. They are
//! fast and stable across runs for identical input, which is all change
//! detection needs; they are not suitable for anything security related.

pub mod digest;

pub use digest::{digest_json, digest_str, DigestError, DigestGenerator, DigestInput};
