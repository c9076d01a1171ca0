//! # Addon Bridge
//!
//! Safe, ergonomic bindings over the C-level extension ABI of a JavaScript
//! host runtime. Native extension authors write type-safe, `Result`-based
//! code against host values; every operation translates into a direct call
//! through the host's entry-point table, with C status codes converted into
//! errors at the boundary and back into script-visible exceptions where no
//! native caller remains.
//!
//! ## Architecture
//!
//! ```text
//! Extension code (yours)
//!     │
//!     │ Env / Value / Reference / AsyncWork
//!     ▼
//! This crate
//!     │
//!     │ HostAbi entry table (C ABI)
//!     ▼
//! JavaScript host runtime
//! ```
//!
//! ## Background work
//!
//! The core facility is [`work::AsyncWork`]: it runs a [`work::BackgroundWork`]
//! off-thread on the host's worker pool and delivers the outcome back to a
//! script callback on the context thread: success with no arguments, or an
//! error value carrying the message captured off-thread. Cancellation before
//! execution skips delivery entirely.

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod env;
pub mod error;
pub mod reference;
pub mod scope;
pub mod sys;
pub mod value;
pub mod work;

// Re-export commonly used types
pub use env::Env;
pub use error::{Error, Result};
pub use reference::Reference;
pub use scope::{EscapableHandleScope, HandleScope};
pub use sys::Status;
pub use value::{Function, Object, Value};
pub use work::{AsyncWork, BackgroundWork, Completion};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
