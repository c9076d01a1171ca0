//! Scoped-handle guards.
//!
//! Values created during a span of native execution are owned by the
//! innermost open handle scope and released when it closes. Scopes must close
//! in exactly the reverse order of opening; violating that is undefined
//! behavior at the host ABI level, so these guards tie the close to `Drop`
//! and make the scope unmovable out of its opening span by construction.

use crate::env::Env;
use crate::error::Result;
use crate::sys::{RawEscapableHandleScope, RawHandleScope};
use crate::value::Value;
use std::ptr;
use tracing::warn;

/// An ordinary handle scope, closed unconditionally on drop.
pub struct HandleScope {
    env: Env,
    raw: RawHandleScope,
}

impl HandleScope {
    /// Open a scope on `env`.
    pub fn open(env: Env) -> Result<Self> {
        let mut raw: RawHandleScope = ptr::null_mut();
        let status = unsafe { (env.abi().open_handle_scope)(env.raw(), &mut raw) };
        env.check(status)?;
        Ok(Self { env, raw })
    }

    /// The context this scope is bound to.
    pub fn env(&self) -> Env {
        self.env
    }
}

impl Drop for HandleScope {
    fn drop(&mut self) {
        let status = unsafe { (self.env.abi().close_handle_scope)(self.env.raw(), self.raw) };
        if status != crate::sys::Status::Ok {
            warn!(%status, "failed to close handle scope");
        }
    }
}

/// An escapable handle scope: like [`HandleScope`], but one value can be
/// promoted into the parent scope before it closes.
pub struct EscapableHandleScope {
    env: Env,
    raw: RawEscapableHandleScope,
}

impl EscapableHandleScope {
    /// Open an escapable scope on `env`.
    pub fn open(env: Env) -> Result<Self> {
        let mut raw: RawEscapableHandleScope = ptr::null_mut();
        let status = unsafe { (env.abi().open_escapable_handle_scope)(env.raw(), &mut raw) };
        env.check(status)?;
        Ok(Self { env, raw })
    }

    /// The context this scope is bound to.
    pub fn env(&self) -> Env {
        self.env
    }

    /// Promote `value` to the parent scope so it survives this one closing.
    ///
    /// The host permits exactly one escape per scope; a second call fails
    /// with `ESCAPE_CALLED_TWICE`.
    pub fn escape(&mut self, value: Value) -> Result<Value> {
        let mut out = ptr::null_mut();
        let status = unsafe {
            (self.env.abi().escape_handle)(self.env.raw(), self.raw, value.raw(), &mut out)
        };
        self.env.check(status)?;
        Ok(Value::from_raw(self.env, out))
    }
}

impl Drop for EscapableHandleScope {
    fn drop(&mut self) {
        let status =
            unsafe { (self.env.abi().close_escapable_handle_scope)(self.env.raw(), self.raw) };
        if status != crate::sys::Status::Ok {
            warn!(%status, "failed to close escapable handle scope");
        }
    }
}
