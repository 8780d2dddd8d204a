//! Cross-cutting dispatch hooks
//!
//! Named hook lists invoked at fixed pipeline points regardless of which
//! route matched. Hooks run synchronously in registration order and are
//! trusted not to panic; the pipeline does not guard against unwinding
//! callbacks.

use std::collections::HashMap;

use parking_lot::RwLock;

use evoke_core::ValidationError;

/// Fixed pipeline points application hooks can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// Before the before/on/after chain of a validated dispatch.
    PreDispatch,
    /// After the chain completed without error.
    PostDispatch,
    /// When a dispatch enters the validation-failure branch.
    ValidationError,
}

/// Context handed to every hook invocation.
#[derive(Debug)]
pub struct HookContext<'a> {
    pub stage: HookStage,
    /// Resolved path of the matched route.
    pub path: &'a str,
    /// First validation error, present on the validation-error stage only.
    pub error: Option<&'a ValidationError>,
}

pub type Hook = Box<dyn Fn(&HookContext<'_>) + Send + Sync>;

/// Named hook lists, scoped to one router.
///
/// Registration happens during setup; dispatches only read. Registering
/// while traffic is live is not supported.
#[derive(Default)]
pub struct CallbackRegistry {
    collections: RwLock<HashMap<HookStage, Vec<Hook>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to the named list.
    pub fn add(&self, stage: HookStage, hook: impl Fn(&HookContext<'_>) + Send + Sync + 'static) {
        self.collections
            .write()
            .entry(stage)
            .or_default()
            .push(Box::new(hook));
    }

    /// Run every hook registered for the context's stage, in order.
    pub(crate) fn run(&self, context: &HookContext<'_>) {
        if let Some(hooks) = self.collections.read().get(&context.stage) {
            for hook in hooks {
                hook(context);
            }
        }
    }

    /// Number of hooks registered for a stage.
    pub fn count(&self, stage: HookStage) -> usize {
        self.collections
            .read()
            .get(&stage)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn hooks_run_in_registration_order() {
        let registry = CallbackRegistry::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            registry.add(HookStage::PreDispatch, move |_| seen.lock().push(tag));
        }

        registry.run(&HookContext {
            stage: HookStage::PreDispatch,
            path: "chat",
            error: None,
        });
        assert_eq!(*seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn stages_are_independent() {
        let registry = CallbackRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&fired);
        registry.add(HookStage::PostDispatch, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        registry.run(&HookContext {
            stage: HookStage::PreDispatch,
            path: "chat",
            error: None,
        });
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(registry.count(HookStage::PostDispatch), 1);
    }
}
