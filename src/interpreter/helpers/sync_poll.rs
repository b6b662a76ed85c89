//! Polls a `Future` to completion without a runtime.
//!
//! Used to run the handful of `Command` implementations that double as real
//! shell builtins (`echo`, `printf`, `pwd`) synchronously from
//! `builtin_dispatch`. These never actually suspend - `Command::execute` is
//! `async fn` purely to satisfy the shared `Command` trait - so one poll
//! always resolves.

use std::future::Future;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

fn noop(_: *const ()) {}
fn noop_clone(_: *const ()) -> RawWaker {
    raw_waker()
}
fn raw_waker() -> RawWaker {
    static VTABLE: RawWakerVTable = RawWakerVTable::new(noop_clone, noop, noop, noop);
    RawWaker::new(std::ptr::null(), &VTABLE)
}

/// Poll `fut` once. Panics if it isn't immediately ready - only call this
/// on futures known never to suspend.
pub fn block_on_ready<F: Future>(fut: F) -> F::Output {
    let waker = unsafe { Waker::from_raw(raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut fut = Box::pin(fut);
    match fut.as_mut().poll(&mut cx) {
        Poll::Ready(v) => v,
        Poll::Pending => unreachable!("builtin command future unexpectedly pending"),
    }
}
