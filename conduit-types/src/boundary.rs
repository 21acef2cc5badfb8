//! Panic containment for public operation boundaries.
//!
//! Hooks supplied by bindings may panic. A boundary runs the hook future
//! under `catch_unwind` and turns a panic into a [`Failure`], so no panic
//! ever escapes to the caller of an initialize/execute/handle/verb operation.

use crate::{ErrorCode, Failure};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Awaits `future`, converting a panic into a failure with `code` and the
/// panic message. A returned `Err` passes through unchanged.
pub async fn guarded<T, F>(code: ErrorCode, future: F) -> crate::Result<T>
where
    F: Future<Output = crate::Result<T>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(Failure::of(code, panic_message(payload.as_ref()))),
    }
}

/// Extracts the message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "hook panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_from_str_and_string() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(payload.as_ref()), "hook panicked");
    }
}
