//! Internal disposal bag for managing teardown hooks.

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Container for teardown hooks with LIFO execution order.
///
/// Teardown is best-effort and total: a hook that panics is caught and logged,
/// and the remaining hooks in the batch still run.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<(String, Box<dyn FnOnce() + Send>)>,
}

impl DisposeBag {
    /// Add a teardown hook; `name` identifies the service in failure logs.
    pub(crate) fn push(&mut self, name: String, f: Box<dyn FnOnce() + Send>) {
        self.hooks.push((name, f));
    }

    /// Execute all hooks in reverse order (LIFO), swallowing per-hook panics.
    pub(crate) fn run_all_reverse(&mut self) {
        while let Some((name, f)) = self.hooks.pop() {
            if catch_unwind(AssertUnwindSafe(f)).is_err() {
                tracing::error!(service = %name, "teardown hook failed; continuing disposal");
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn hooks_run_in_reverse_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut bag = DisposeBag::default();
        for i in 0..3 {
            let order = order.clone();
            bag.push(
                format!("svc-{}", i),
                Box::new(move || order.lock().unwrap().push(i)),
            );
        }
        bag.run_all_reverse();
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn a_panicking_hook_does_not_stop_the_batch() {
        let ran = Arc::new(AtomicUsize::new(0));
        let mut bag = DisposeBag::default();
        {
            let ran = ran.clone();
            bag.push(
                "first".to_string(),
                Box::new(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        bag.push("boom".to_string(), Box::new(|| panic!("teardown failure")));
        bag.run_all_reverse();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(bag.is_empty());
    }
}
