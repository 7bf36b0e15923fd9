//! Library target for the `televize` package.
//!
//! The primary deliverable of this package is the `televize` CLI binary
//! (`src/main.rs`). This library exists so CI can run `cargo test -p televize --doc`
//! for feature/doctype validation.

#[doc(hidden)]
pub use ct_platforms;
#[doc(hidden)]
pub use live_engine;
