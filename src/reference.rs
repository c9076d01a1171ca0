//! Persistent and weak reference holders.
//!
//! A reference keeps a host value reachable independently of native stack
//! lifetime. With a count of zero it is weak: it tracks the value without
//! preventing collection. With a count of one or more it is persistent and
//! keeps the value alive until released.

use crate::env::Env;
use crate::error::Result;
use crate::sys::{RawRef, Status};
use crate::value::Value;
use std::ptr;
use tracing::warn;

/// A counted reference to a host value.
///
/// The underlying host reference is deleted when the holder drops, unless
/// ownership has been transferred to the host via [`Reference::suppress_release`].
pub struct Reference {
    env: Env,
    raw: RawRef,
    suppress_release: bool,
}

impl Reference {
    /// Create a reference to `value` with the given initial count.
    pub fn new(value: Value, initial_refcount: u32) -> Result<Self> {
        let env = value.env();
        let mut raw: RawRef = ptr::null_mut();
        let status = unsafe {
            (env.abi().create_reference)(env.raw(), value.raw(), initial_refcount, &mut raw)
        };
        env.check(status)?;
        Ok(Self {
            env,
            raw,
            suppress_release: false,
        })
    }

    /// Create a persistent (strong) reference, count 1.
    pub fn persistent(value: Value) -> Result<Self> {
        Self::new(value, 1)
    }

    /// Create a weak reference, count 0.
    pub fn weak(value: Value) -> Result<Self> {
        Self::new(value, 0)
    }

    /// The context this reference belongs to.
    pub fn env(&self) -> Env {
        self.env
    }

    /// Read the referenced value.
    ///
    /// Returns `None` when the target of a weak reference has been collected.
    /// Usually called inside a handle scope so the produced handle is cleaned
    /// up promptly.
    pub fn value(&self) -> Result<Option<Value>> {
        let mut out = ptr::null_mut();
        let status =
            unsafe { (self.env.abi().get_reference_value)(self.env.raw(), self.raw, &mut out) };
        self.env.check(status)?;
        if out.is_null() {
            Ok(None)
        } else {
            Ok(Some(Value::from_raw(self.env, out)))
        }
    }

    /// Increment the count, returning the new count.
    pub fn ref_(&mut self) -> Result<u32> {
        let mut count = 0;
        let status = unsafe { (self.env.abi().reference_ref)(self.env.raw(), self.raw, &mut count) };
        self.env.check(status)?;
        Ok(count)
    }

    /// Decrement the count, returning the new count. At zero the target
    /// becomes eligible for collection; the reference itself stays usable.
    pub fn unref(&mut self) -> Result<u32> {
        let mut count = 0;
        let status =
            unsafe { (self.env.abi().reference_unref)(self.env.raw(), self.raw, &mut count) };
        self.env.check(status)?;
        Ok(count)
    }

    /// Suppress deletion of the host reference on drop.
    ///
    /// Used when ownership has been handed to the host, e.g. into an
    /// object-wrap finalizer that will release it instead.
    pub fn suppress_release(&mut self) {
        self.suppress_release = true;
    }
}

impl Drop for Reference {
    fn drop(&mut self) {
        if self.suppress_release {
            return;
        }
        let status = unsafe { (self.env.abi().delete_reference)(self.env.raw(), self.raw) };
        if status != Status::Ok {
            warn!(%status, "failed to delete reference");
        }
    }
}

impl std::fmt::Debug for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reference")
            .field("raw", &self.raw)
            .field("suppress_release", &self.suppress_release)
            .finish()
    }
}
