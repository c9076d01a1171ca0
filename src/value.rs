//! Minimal host value handles.
//!
//! The bridge only carries the handles the completion path needs: a generic
//! value, the receiver object, and the callback function. The broad wrapper
//! families (numbers, arrays, buffers, property reflection) are out of scope.

use crate::env::Env;
use crate::error::Result;
use crate::sys::RawValue;
use std::ptr;

/// A host value handle, valid within the handle scope it was created in.
#[derive(Debug, Clone, Copy)]
pub struct Value {
    env: Env,
    raw: RawValue,
}

impl Value {
    /// Wrap a raw value handle belonging to `env`.
    pub fn from_raw(env: Env, raw: RawValue) -> Self {
        Self { env, raw }
    }

    /// The context this value belongs to.
    pub fn env(&self) -> Env {
        self.env
    }

    /// The underlying raw handle.
    pub fn raw(&self) -> RawValue {
        self.raw
    }
}

/// An object value.
#[derive(Debug, Clone, Copy)]
pub struct Object(Value);

impl Object {
    /// Create a fresh empty object on `env`.
    pub fn new(env: Env) -> Result<Self> {
        env.create_object()
    }

    /// Treat an existing value as an object.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The generic value handle.
    pub fn as_value(&self) -> Value {
        self.0
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        object.0
    }
}

/// A callable function value.
#[derive(Debug, Clone, Copy)]
pub struct Function(Value);

impl Function {
    /// Treat an existing value as a function.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The generic value handle.
    pub fn as_value(&self) -> Value {
        self.0
    }

    /// Call the function with `recv` as the receiver.
    ///
    /// A script exception raised by the callee comes back as a translated
    /// error with the exception left pending on the context.
    pub fn call(&self, recv: Value, args: &[Value]) -> Result<Value> {
        let env = self.0.env();
        let raw_args: Vec<RawValue> = args.iter().map(Value::raw).collect();
        let mut out: RawValue = ptr::null_mut();
        let status = unsafe {
            (env.abi().call_function)(
                env.raw(),
                recv.raw(),
                self.0.raw(),
                raw_args.len(),
                if raw_args.is_empty() {
                    ptr::null()
                } else {
                    raw_args.as_ptr()
                },
                &mut out,
            )
        };
        env.check(status)?;
        Ok(Value::from_raw(env, out))
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        function.0
    }
}
