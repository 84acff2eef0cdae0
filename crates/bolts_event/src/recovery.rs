//! Panic isolation for listener calls

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, turning a panic into its message
///
/// Unwind safety is asserted: a listener that panics is not called again
/// within the same pass.
pub fn catch_panic<F, R>(f: F) -> Result<R, String>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_panic() {
        assert_eq!(catch_panic(|| 42), Ok(42));

        let result: Result<i32, String> = catch_panic(|| panic!("Test panic"));
        assert_eq!(result.unwrap_err(), "Test panic");

        let code = 7;
        let result: Result<(), String> = catch_panic(|| panic!("failed with {}", code));
        assert_eq!(result.unwrap_err(), "failed with 7");
    }
}
