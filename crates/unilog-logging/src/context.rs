//! Execution-unit-local correlation context
//!
//! Async code runs under a task-local slot, entered with [`scope`] or
//! [`spawn`]. Plain threads (and the future driven by `block_on`) use a
//! thread-local slot. A tokio task that was started any other way has no slot
//! of its own: its worker thread is shared with other tasks, so writes from it
//! are refused with [`UnscopedTask`] and reads see an empty context. There is
//! no process-wide map, so context set in one unit is never observed by
//! another.

use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use serde_json::{Map, Value};
use unilog_core_types::CorrelationContext;

tokio::task_local! {
    static TASK_CONTEXT: RefCell<CorrelationContext>;
}

thread_local! {
    static THREAD_CONTEXT: RefCell<CorrelationContext> = RefCell::new(CorrelationContext::new());
}

/// The calling tokio task was not started through [`scope`] or [`spawn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnscopedTask;

impl fmt::Display for UnscopedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tokio task has no correlation context slot; start it with context::scope or context::spawn")
    }
}

impl Error for UnscopedTask {}

fn with_slot<R>(f: impl FnOnce(&RefCell<CorrelationContext>) -> R) -> Result<R, UnscopedTask> {
    if TASK_CONTEXT.try_with(|_| ()).is_ok() {
        Ok(TASK_CONTEXT.with(f))
    } else if tokio::task::try_id().is_some() {
        Err(UnscopedTask)
    } else {
        Ok(THREAD_CONTEXT.with(f))
    }
}

/// Set the non-empty fields; the others keep their current value
///
/// # Errors
///
/// [`UnscopedTask`] when called from a tokio task without its own slot.
pub fn set(
    request_id: Option<&str>,
    user_id: Option<&str>,
    trace_id: Option<&str>,
) -> Result<(), UnscopedTask> {
    with_slot(|slot| slot.borrow_mut().set(request_id, user_id, trace_id))
}

/// # Errors
///
/// [`UnscopedTask`] when called from a tokio task without its own slot.
pub fn clear() -> Result<(), UnscopedTask> {
    with_slot(|slot| slot.borrow_mut().clear())
}

/// Copy of the current unit's context
pub fn snapshot() -> CorrelationContext {
    with_slot(|slot| slot.borrow().clone()).unwrap_or_default()
}

/// Only the populated ids, in request/user/trace order
pub fn filtered_snapshot() -> Map<String, Value> {
    with_slot(|slot| slot.borrow().filtered()).unwrap_or_default()
}

/// Swap in a whole context, returning the previous one
///
/// # Errors
///
/// [`UnscopedTask`] when called from a tokio task without its own slot.
pub fn replace(context: CorrelationContext) -> Result<CorrelationContext, UnscopedTask> {
    with_slot(|slot| slot.replace(context))
}

/// Restores the previous context when dropped
///
/// Not `Send`: it must be dropped on the unit that created it.
#[must_use = "the context is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ContextGuard {
    previous: Option<CorrelationContext>,
    _unit_bound: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let _ = replace(previous);
        }
    }
}

/// Install `context` for the current unit until the guard drops
///
/// # Errors
///
/// [`UnscopedTask`] when called from a tokio task without its own slot.
pub fn enter(context: CorrelationContext) -> Result<ContextGuard, UnscopedTask> {
    Ok(ContextGuard {
        previous: Some(replace(context)?),
        _unit_bound: PhantomData,
    })
}

/// Run `future` with its own task-local context
pub fn scope<F: Future>(context: CorrelationContext, future: F) -> impl Future<Output = F::Output> {
    TASK_CONTEXT.scope(RefCell::new(context), future)
}

/// Spawn a tokio task that starts with a copy of the caller's context
///
/// Must be called from within a tokio runtime.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(scope(snapshot(), future))
}

/// Spawn an OS thread that starts with a copy of the caller's context
///
/// The thread's slot is reset when `f` returns.
pub fn spawn_thread<F, T>(f: F) -> std::thread::JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let inherited = snapshot();
    std::thread::spawn(move || {
        // A fresh OS thread is never inside a tokio task.
        let _guard = enter(inherited).ok();
        f()
    })
}
