//! The host execution context handle.
//!
//! `Env` is the capability through which all value creation and host calls
//! happen. It pairs the host's opaque context pointer with the ABI entry
//! table handed over at module initialization, and performs the single
//! status-to-error translation at the FFI edge.

use crate::error::{Error, Result, GENERIC_ABI_MESSAGE};
use crate::sys::{ExtendedErrorInfo, HostAbi, RawEnv, RawValue, Status};
use crate::value::{Object, Value};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;

/// Handle to a host execution context.
///
/// Cheap to copy. Deliberately not `Send`: host values and calls are only
/// legal on the thread that owns the context.
#[derive(Clone, Copy)]
pub struct Env {
    raw: RawEnv,
    abi: *const HostAbi,
}

impl Env {
    /// Wrap the raw context and ABI table provided by the host at module
    /// initialization.
    ///
    /// # Safety
    ///
    /// `raw` must be a live context owned by the calling thread and `abi`
    /// must point to an entry table that outlives every use of this handle.
    pub unsafe fn from_raw(raw: RawEnv, abi: *const HostAbi) -> Self {
        Self { raw, abi }
    }

    /// The underlying raw context handle.
    pub fn raw(&self) -> RawEnv {
        self.raw
    }

    pub(crate) fn abi(&self) -> &HostAbi {
        // Liveness is the from_raw contract.
        unsafe { &*self.abi }
    }

    /// Translate a non-ok status into an error, attaching the host's own
    /// description of the failure when one is available.
    pub fn error_from_status(&self, status: Status) -> Error {
        let mut info: *const ExtendedErrorInfo = ptr::null();
        let fetched = unsafe { (self.abi().get_last_error_info)(self.raw, &mut info) };

        let mut reported = status;
        let mut message = None;
        if fetched == Status::Ok && !info.is_null() {
            let info = unsafe { &*info };
            if info.error_code != Status::Ok {
                reported = info.error_code;
            }
            if !info.error_message.is_null() {
                let text = unsafe { CStr::from_ptr(info.error_message) };
                message = Some(text.to_string_lossy().into_owned());
            }
        }

        Error::Abi {
            status: reported,
            message: message.unwrap_or_else(|| GENERIC_ABI_MESSAGE.to_string()),
        }
    }

    /// Convert a status into a `Result`, translating failures.
    pub(crate) fn check(&self, status: Status) -> Result<()> {
        if status == Status::Ok {
            Ok(())
        } else {
            Err(self.error_from_status(status))
        }
    }

    /// Create a string value from UTF-8 text.
    pub fn create_string(&self, text: &str) -> Result<Value> {
        let mut out: RawValue = ptr::null_mut();
        let status = unsafe {
            (self.abi().create_string_utf8)(
                self.raw,
                text.as_ptr() as *const c_char,
                text.len(),
                &mut out,
            )
        };
        self.check(status)?;
        Ok(Value::from_raw(*self, out))
    }

    /// Create a fresh empty object.
    pub fn create_object(&self) -> Result<Object> {
        let mut out: RawValue = ptr::null_mut();
        let status = unsafe { (self.abi().create_object)(self.raw, &mut out) };
        self.check(status)?;
        Ok(Object::from_value(Value::from_raw(*self, out)))
    }

    /// Create an error value carrying a message.
    pub fn create_error(&self, message: &str) -> Result<Value> {
        let msg = self.create_string(message)?;
        let mut out: RawValue = ptr::null_mut();
        let status = unsafe { (self.abi().create_error)(self.raw, msg.raw(), &mut out) };
        self.check(status)?;
        Ok(Value::from_raw(*self, out))
    }

    /// Create a type-error value carrying a message.
    pub fn create_type_error(&self, message: &str) -> Result<Value> {
        let msg = self.create_string(message)?;
        let mut out: RawValue = ptr::null_mut();
        let status = unsafe { (self.abi().create_type_error)(self.raw, msg.raw(), &mut out) };
        self.check(status)?;
        Ok(Value::from_raw(*self, out))
    }

    /// Create a range-error value carrying a message.
    pub fn create_range_error(&self, message: &str) -> Result<Value> {
        let msg = self.create_string(message)?;
        let mut out: RawValue = ptr::null_mut();
        let status = unsafe { (self.abi().create_range_error)(self.raw, msg.raw(), &mut out) };
        self.check(status)?;
        Ok(Value::from_raw(*self, out))
    }

    /// Build the host error value matching a bridge error: type mismatches
    /// become type errors, everything else an ordinary error.
    pub fn error_value(&self, error: &Error) -> Result<Value> {
        if error.is_type_mismatch() {
            self.create_type_error(error.message())
        } else {
            self.create_error(error.message())
        }
    }

    /// Read a string value back as UTF-8.
    pub fn get_value_string(&self, value: Value) -> Result<String> {
        let mut length = 0usize;
        let status = unsafe {
            (self.abi().get_value_string_utf8)(
                self.raw,
                value.raw(),
                ptr::null_mut(),
                0,
                &mut length,
            )
        };
        self.check(status)?;

        // Room for the terminating NUL the host writes.
        let mut buf = vec![0u8; length + 1];
        let mut copied = 0usize;
        let status = unsafe {
            (self.abi().get_value_string_utf8)(
                self.raw,
                value.raw(),
                buf.as_mut_ptr() as *mut c_char,
                buf.len(),
                &mut copied,
            )
        };
        self.check(status)?;
        buf.truncate(copied);
        String::from_utf8(buf).map_err(|e| Error::from_reason(e.to_string()))
    }

    /// Throw a value as a script exception on this context.
    pub fn throw(&self, value: Value) -> Result<()> {
        let status = unsafe { (self.abi().throw)(self.raw, value.raw()) };
        self.check(status)
    }

    /// Create an error value from a message and throw it.
    pub fn throw_error(&self, message: &str) -> Result<()> {
        let value = self.create_error(message)?;
        self.throw(value)
    }

    /// Whether a script exception is pending on this context.
    pub fn is_exception_pending(&self) -> Result<bool> {
        let mut pending = false;
        let status = unsafe { (self.abi().is_exception_pending)(self.raw, &mut pending) };
        self.check(status)?;
        Ok(pending)
    }

    /// Fetch and clear the pending script exception, if any.
    pub fn get_and_clear_pending_exception(&self) -> Result<Option<Value>> {
        let mut out: RawValue = ptr::null_mut();
        let status =
            unsafe { (self.abi().get_and_clear_last_exception)(self.raw, &mut out) };
        self.check(status)?;
        if out.is_null() {
            Ok(None)
        } else {
            Ok(Some(Value::from_raw(*self, out)))
        }
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env").field("raw", &self.raw).finish()
    }
}
