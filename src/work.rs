//! Background work bridge.
//!
//! A background work unit runs a long native computation on a host worker
//! thread and delivers its result or failure back to a script-visible
//! callback on the thread that owns the execution context. The host's work
//! queue drives both phases through two C trampolines; this module owns the
//! state handoff between them and the three-way completion outcome:
//! success, error-with-message, or cancelled-silently.

use crate::env::Env;
use crate::error::{Error, Result};
use crate::reference::Reference;
use crate::scope::HandleScope;
use crate::sys::{RawEnv, RawWork, Status};
use crate::value::{Function, Object, Value};
use std::any::Any;
use std::cell::Cell;
use std::os::raw::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use tracing::{debug, warn};

/// One schedulable unit of off-thread computation.
///
/// `execute` runs on a worker thread with no access to the execution context:
/// it must confine itself to native computation and stash results on `self`.
/// The completion hooks run on the context thread inside a fresh handle
/// scope, where host values are safe to create.
pub trait BackgroundWork: Send + 'static {
    /// Off-thread phase. A returned error (or a panic, which is caught) is
    /// captured as the unit's error message and re-surfaced on-thread via
    /// [`BackgroundWork::on_error`].
    fn execute(&mut self) -> Result<()>;

    /// On-thread success delivery. The default invokes the completion
    /// callback against the receiver with zero arguments.
    fn on_ok(&mut self, cx: &Completion<'_>) -> Result<()> {
        cx.call_callback(&[]).map(|_| ())
    }

    /// On-thread failure delivery. The default invokes the completion
    /// callback with the error value as the sole argument.
    fn on_error(&mut self, cx: &Completion<'_>, error: Value) -> Result<()> {
        cx.call_callback(&[error]).map(|_| ())
    }
}

/// On-thread completion context handed to [`BackgroundWork::on_ok`] and
/// [`BackgroundWork::on_error`].
pub struct Completion<'a> {
    env: Env,
    receiver: &'a Reference,
    callback: &'a Reference,
}

impl Completion<'_> {
    /// The execution context, safe to use for the duration of the hook.
    pub fn env(&self) -> Env {
        self.env
    }

    /// The receiver object the callback is invoked against.
    pub fn receiver(&self) -> Result<Value> {
        self.receiver
            .value()?
            .ok_or_else(|| Error::from_reason("work receiver is gone"))
    }

    /// The completion callback function.
    pub fn callback(&self) -> Result<Function> {
        let value = self
            .callback
            .value()?
            .ok_or_else(|| Error::from_reason("work callback is gone"))?;
        Ok(Function::from_value(value))
    }

    /// Invoke the completion callback against the receiver.
    pub fn call_callback(&self, args: &[Value]) -> Result<Value> {
        let recv = self.receiver()?;
        self.callback()?.call(recv, args)
    }
}

/// Heap state shared between the two trampolines. Its address is the opaque
/// user-data pointer registered with the host; the complete trampoline
/// reclaims the box on every exit path.
struct WorkState {
    env: Env,
    entry: RawWork,
    receiver: Reference,
    callback: Reference,
    /// Written at most once by the off-thread phase, read once on-thread.
    /// The phases are strictly ordered by the host, so no lock is needed.
    error: Option<String>,
    work: Box<dyn BackgroundWork>,
}

/// Handle to a registered background work unit.
///
/// Construction registers the unit with the host's work queue; [`queue`]
/// schedules it. Once queued, ownership of the unit passes to the host: it
/// destroys itself at the end of its completion phase (or when cancellation
/// is recognized), and the handle must not be used past that point. A unit
/// that is dropped without ever being queued is torn down by the handle
/// itself, releasing the work entry and both references.
///
/// [`queue`]: AsyncWork::queue
pub struct AsyncWork {
    env: Env,
    entry: RawWork,
    state: *mut WorkState,
    queued: Cell<bool>,
}

impl AsyncWork {
    /// Register a work unit bound to an explicit receiver and callback.
    ///
    /// Both are captured as persistent references: the off-thread phase may
    /// outlive every handle scope open at construction time.
    pub fn new<W: BackgroundWork>(
        env: Env,
        receiver: &Object,
        callback: &Function,
        work: W,
    ) -> Result<Self> {
        let receiver = Reference::persistent(receiver.as_value())?;
        let callback = Reference::persistent(callback.as_value())?;

        let state = Box::into_raw(Box::new(WorkState {
            env,
            entry: ptr::null_mut(),
            receiver,
            callback,
            error: None,
            work: Box::new(work),
        }));

        let mut entry: RawWork = ptr::null_mut();
        let status = unsafe {
            (env.abi().create_async_work)(
                env.raw(),
                on_execute,
                on_complete,
                state as *mut c_void,
                &mut entry,
            )
        };
        if status != Status::Ok {
            // Reclaim the state; the references drop with it.
            drop(unsafe { Box::from_raw(state) });
            return Err(env.error_from_status(status));
        }
        unsafe { (*state).entry = entry };

        debug!(entry = ?entry, "registered background work entry");
        Ok(Self {
            env,
            entry,
            state,
            queued: Cell::new(false),
        })
    }

    /// Register a work unit bound only to a callback; the receiver defaults
    /// to a freshly created empty object.
    pub fn with_callback<W: BackgroundWork>(
        env: Env,
        callback: &Function,
        work: W,
    ) -> Result<Self> {
        let receiver = Object::new(env)?;
        Self::new(env, &receiver, callback, work)
    }

    /// Request the host schedule the off-thread phase. Fire-and-forget;
    /// meaningful at most once per unit. On success the host takes over the
    /// unit's teardown.
    pub fn queue(&self) -> Result<()> {
        let status = unsafe { (self.env.abi().queue_async_work)(self.env.raw(), self.entry) };
        self.env.check(status)?;
        self.queued.set(true);
        debug!(entry = ?self.entry, "queued background work entry");
        Ok(())
    }

    /// Request the host abort the unit before its off-thread phase starts.
    ///
    /// Best-effort and race-prone by design: once execution has started the
    /// host rejects the request and the unit runs to normal completion.
    pub fn cancel(&self) -> Result<()> {
        let status = unsafe { (self.env.abi().cancel_async_work)(self.env.raw(), self.entry) };
        self.env.check(status)?;
        debug!(entry = ?self.entry, "cancelled background work entry");
        Ok(())
    }
}

impl Drop for AsyncWork {
    fn drop(&mut self) {
        // A queued unit is torn down by the completion trampoline. Anything
        // else never reached the host scheduler, so the handle still owns the
        // state and the work entry.
        if self.queued.get() {
            return;
        }
        drop(unsafe { Box::from_raw(self.state) });
        let status = unsafe { (self.env.abi().delete_async_work)(self.env.raw(), self.entry) };
        if status != Status::Ok {
            warn!(%status, entry = ?self.entry, "failed to release unqueued work entry");
        }
        debug!(entry = ?self.entry, "unqueued background work entry destroyed");
    }
}

/// Off-thread trampoline: runs the unit's native phase, capturing a returned
/// error or a panic as the error message. Host state is untouchable here.
unsafe extern "C" fn on_execute(_env: RawEnv, data: *mut c_void) {
    let state = unsafe { &mut *(data as *mut WorkState) };
    match catch_unwind(AssertUnwindSafe(|| state.work.execute())) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => state.error = Some(err.to_string()),
        Err(panic) => state.error = Some(panic_message(panic.as_ref())),
    }
}

/// On-thread trampoline: dispatches the completion outcome and tears the
/// unit down. The boxed state is reclaimed on every exit path.
unsafe extern "C" fn on_complete(_env: RawEnv, status: Status, data: *mut c_void) {
    let mut state = unsafe { Box::from_raw(data as *mut WorkState) };

    if status == Status::Cancelled {
        debug!(entry = ?state.entry, "work entry cancelled before execution, skipping delivery");
    } else {
        deliver(&mut state);
    }

    let env = state.env;
    let entry = state.entry;
    let status = unsafe { (env.abi().delete_async_work)(env.raw(), entry) };
    if status != Status::Ok {
        warn!(%status, entry = ?entry, "failed to release work entry");
    }
    debug!(entry = ?entry, "background work entry destroyed");
}

fn deliver(state: &mut WorkState) {
    let env = state.env;
    let _scope = match HandleScope::open(env) {
        Ok(scope) => scope,
        Err(err) => {
            warn!(error = %err, "could not open completion handle scope");
            return;
        }
    };

    // An empty captured message counts as success, matching the dispatch
    // rule of the interface this bridges.
    let captured = state.error.take().filter(|msg| !msg.is_empty());

    let (work, receiver, callback) = (&mut state.work, &state.receiver, &state.callback);
    let cx = Completion {
        env,
        receiver,
        callback,
    };

    let outcome = match captured {
        None => work.on_ok(&cx),
        Some(message) => match env.create_error(&message) {
            Ok(error) => work.on_error(&cx, error),
            Err(err) => Err(err),
        },
    };

    if let Err(err) = outcome {
        // No native caller remains past this point; the failure has to become
        // a script-visible exception. If the callback already left one
        // pending, that exception is the surfaced one.
        let already_pending = env.is_exception_pending().unwrap_or(false);
        if !already_pending {
            if let Err(throw_err) = env.throw_error(&err.to_string()) {
                warn!(error = %throw_err, "failed to surface completion failure");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "background work panicked".to_string()
    }
}
