//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use pcommon::normalize_text;
//!
//! assert_eq!(normalize_text("wait\u{2026}"), "wait...");
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use pcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod text;

pub use future::BoxFuture;
pub use text::{normalize_optional_text, normalize_text};
