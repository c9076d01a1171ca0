//! Raw C ABI surface of the host runtime.
//!
//! The host exposes an ABI-stable extension interface: opaque handles, a
//! status code for every operation, and a table of entry points handed to the
//! addon at module initialization. Everything in this module is `#[repr(C)]`
//! and layout-stable; the safe wrappers live in the rest of the crate.

use std::os::raw::{c_char, c_void};

macro_rules! opaque_handle {
    ($(#[$doc:meta])* $name:ident, $pointee:ident) => {
        $(#[$doc])*
        #[repr(C)]
        #[derive(Debug, Clone, Copy)]
        pub struct $pointee {
            _unused: [u8; 0],
        }

        $(#[$doc])*
        pub type $name = *mut $pointee;
    };
}

opaque_handle!(
    /// Host execution context handle.
    RawEnv,
    RawEnvOpaque
);
opaque_handle!(
    /// Host value handle, valid only within its handle scope.
    RawValue,
    RawValueOpaque
);
opaque_handle!(
    /// Ordinary handle scope.
    RawHandleScope,
    RawHandleScopeOpaque
);
opaque_handle!(
    /// Escapable handle scope.
    RawEscapableHandleScope,
    RawEscapableHandleScopeOpaque
);
opaque_handle!(
    /// Persistent/weak reference handle.
    RawRef,
    RawRefOpaque
);
opaque_handle!(
    /// Work-queue entry handle.
    RawWork,
    RawWorkOpaque
);

/// Status code returned by every host ABI call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Operation succeeded.
    Ok = 0,
    /// An argument was invalid.
    InvalidArg,
    /// An object was expected.
    ObjectExpected,
    /// A string was expected.
    StringExpected,
    /// A property name was expected.
    NameExpected,
    /// A function was expected.
    FunctionExpected,
    /// A number was expected.
    NumberExpected,
    /// A boolean was expected.
    BooleanExpected,
    /// An array was expected.
    ArrayExpected,
    /// Unspecified host failure.
    GenericFailure,
    /// A script exception is pending on the execution context.
    PendingException,
    /// The work-queue entry was cancelled before execution.
    Cancelled,
    /// `escape` was called a second time on the same scope.
    EscapeCalledTwice,
    /// Handle scopes were closed out of stack order.
    HandleScopeMismatch,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::InvalidArg => "INVALID_ARG",
            Status::ObjectExpected => "OBJECT_EXPECTED",
            Status::StringExpected => "STRING_EXPECTED",
            Status::NameExpected => "NAME_EXPECTED",
            Status::FunctionExpected => "FUNCTION_EXPECTED",
            Status::NumberExpected => "NUMBER_EXPECTED",
            Status::BooleanExpected => "BOOLEAN_EXPECTED",
            Status::ArrayExpected => "ARRAY_EXPECTED",
            Status::GenericFailure => "GENERIC_FAILURE",
            Status::PendingException => "PENDING_EXCEPTION",
            Status::Cancelled => "CANCELLED",
            Status::EscapeCalledTwice => "ESCAPE_CALLED_TWICE",
            Status::HandleScopeMismatch => "HANDLE_SCOPE_MISMATCH",
        };
        f.write_str(name)
    }
}

/// Extended information about the last failed ABI call on a context.
///
/// The message pointer is owned by the host and is only guaranteed valid
/// until the next ABI call on the same context.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExtendedErrorInfo {
    /// UTF-8 message, or null when the host has no description.
    pub error_message: *const c_char,
    /// Reserved for the host engine.
    pub engine_reserved: *mut c_void,
    /// Engine-specific error code.
    pub engine_error_code: u32,
    /// The status code of the failed call.
    pub error_code: Status,
}

/// Off-thread entry point of a work-queue entry.
///
/// Runs on a host worker thread. The context handle is passed through for
/// ABI symmetry but host values and calls are not usable here.
pub type ExecuteCallback = unsafe extern "C" fn(env: RawEnv, data: *mut c_void);

/// On-thread completion entry point of a work-queue entry.
///
/// Runs on the thread that owns the execution context, exactly once per
/// non-cancelled entry. `status` is `Cancelled` when the entry was aborted
/// before its off-thread phase started, `Ok` otherwise.
pub type CompleteCallback =
    unsafe extern "C" fn(env: RawEnv, status: Status, data: *mut c_void);

/// Entry-point table of the host ABI.
///
/// The host hands the addon a pointer to this table (alongside its `RawEnv`)
/// at module initialization; the table outlives every context created from
/// it. All functions follow the same convention: out-parameters last, status
/// code returned.
#[repr(C)]
pub struct HostAbi {
    /// Create a UTF-8 string value.
    pub create_string_utf8:
        unsafe extern "C" fn(RawEnv, *const c_char, usize, *mut RawValue) -> Status,
    /// Create an empty object value.
    pub create_object: unsafe extern "C" fn(RawEnv, *mut RawValue) -> Status,
    /// Create an error value from a message string value.
    pub create_error: unsafe extern "C" fn(RawEnv, RawValue, *mut RawValue) -> Status,
    /// Create a type-error value from a message string value.
    pub create_type_error: unsafe extern "C" fn(RawEnv, RawValue, *mut RawValue) -> Status,
    /// Create a range-error value from a message string value.
    pub create_range_error: unsafe extern "C" fn(RawEnv, RawValue, *mut RawValue) -> Status,
    /// Copy a string value into a caller buffer; null buffer queries length.
    pub get_value_string_utf8:
        unsafe extern "C" fn(RawEnv, RawValue, *mut c_char, usize, *mut usize) -> Status,

    /// Throw a value as a script exception.
    pub throw: unsafe extern "C" fn(RawEnv, RawValue) -> Status,
    /// Whether a script exception is pending on the context.
    pub is_exception_pending: unsafe extern "C" fn(RawEnv, *mut bool) -> Status,
    /// Fetch and clear the pending script exception.
    pub get_and_clear_last_exception:
        unsafe extern "C" fn(RawEnv, *mut RawValue) -> Status,
    /// Fetch extended information about the last failed call.
    pub get_last_error_info:
        unsafe extern "C" fn(RawEnv, *mut *const ExtendedErrorInfo) -> Status,

    /// Call a function value with a receiver and arguments.
    pub call_function: unsafe extern "C" fn(
        RawEnv,
        RawValue,
        RawValue,
        usize,
        *const RawValue,
        *mut RawValue,
    ) -> Status,

    /// Open an ordinary handle scope.
    pub open_handle_scope: unsafe extern "C" fn(RawEnv, *mut RawHandleScope) -> Status,
    /// Close an ordinary handle scope (must be the innermost open scope).
    pub close_handle_scope: unsafe extern "C" fn(RawEnv, RawHandleScope) -> Status,
    /// Open an escapable handle scope.
    pub open_escapable_handle_scope:
        unsafe extern "C" fn(RawEnv, *mut RawEscapableHandleScope) -> Status,
    /// Close an escapable handle scope.
    pub close_escapable_handle_scope:
        unsafe extern "C" fn(RawEnv, RawEscapableHandleScope) -> Status,
    /// Promote one value out of an escapable scope into its parent.
    pub escape_handle: unsafe extern "C" fn(
        RawEnv,
        RawEscapableHandleScope,
        RawValue,
        *mut RawValue,
    ) -> Status,

    /// Create a reference to a value with an initial count.
    pub create_reference:
        unsafe extern "C" fn(RawEnv, RawValue, u32, *mut RawRef) -> Status,
    /// Delete a reference.
    pub delete_reference: unsafe extern "C" fn(RawEnv, RawRef) -> Status,
    /// Increment a reference count, returning the new count.
    pub reference_ref: unsafe extern "C" fn(RawEnv, RawRef, *mut u32) -> Status,
    /// Decrement a reference count, returning the new count.
    pub reference_unref: unsafe extern "C" fn(RawEnv, RawRef, *mut u32) -> Status,
    /// Read the referenced value; null when a weak target was collected.
    pub get_reference_value: unsafe extern "C" fn(RawEnv, RawRef, *mut RawValue) -> Status,

    /// Register a work-queue entry with its two callbacks and user data.
    pub create_async_work: unsafe extern "C" fn(
        RawEnv,
        ExecuteCallback,
        CompleteCallback,
        *mut c_void,
        *mut RawWork,
    ) -> Status,
    /// Schedule a registered entry onto the host worker pool.
    pub queue_async_work: unsafe extern "C" fn(RawEnv, RawWork) -> Status,
    /// Best-effort abort of an entry that has not started executing.
    pub cancel_async_work: unsafe extern "C" fn(RawEnv, RawWork) -> Status,
    /// Release a work-queue entry. Never fails observably.
    pub delete_async_work: unsafe extern "C" fn(RawEnv, RawWork) -> Status,
}
