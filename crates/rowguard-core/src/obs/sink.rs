//! Validation event sink.
//!
//! This module is the only bridge between validation logic and the
//! logging backend. The default sink forwards to `tracing`; tests may
//! install a thread-scoped override.
use std::{cell::RefCell, fmt, sync::Arc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Arc<dyn ValidationSink>>> = const { RefCell::new(None) };
}

///
/// Operation
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum Operation {
    Aggregate,
    Create,
    CreateMany,
    DeleteMany,
    FindMany,
    GroupBy,
    Having,
    OrderBy,
    ResolveUnique,
    Row,
    Update,
    UpdateMany,
    Upsert,
    Where,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Create => "create",
            Self::CreateMany => "create_many",
            Self::DeleteMany => "delete_many",
            Self::FindMany => "find_many",
            Self::GroupBy => "group_by",
            Self::Having => "having",
            Self::OrderBy => "order_by",
            Self::ResolveUnique => "resolve_unique",
            Self::Row => "row",
            Self::Update => "update",
            Self::UpdateMany => "update_many",
            Self::Upsert => "upsert",
            Self::Where => "where",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ValidationEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationEvent {
    Accepted {
        entity: &'static str,
        operation: Operation,
    },
    Rejected {
        entity: &'static str,
        operation: Operation,
        issues: usize,
        first_path: String,
    },
}

///
/// ValidationSink
///

pub trait ValidationSink: Send + Sync {
    fn record(&self, event: &ValidationEvent);
}

///
/// TracingSink
/// Default sink; accepted payloads at debug, rejected at warn.
///

pub struct TracingSink;

impl ValidationSink for TracingSink {
    fn record(&self, event: &ValidationEvent) {
        match event {
            ValidationEvent::Accepted { entity, operation } => {
                tracing::debug!(entity, %operation, "payload accepted");
            }
            ValidationEvent::Rejected {
                entity,
                operation,
                issues,
                first_path,
            } => {
                tracing::warn!(
                    entity,
                    %operation,
                    issues,
                    first_path = %first_path,
                    "payload rejected"
                );
            }
        }
    }
}

pub(crate) fn record(event: &ValidationEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match sink {
        Some(sink) => sink.record(event),
        None => TracingSink.record(event),
    }
}

/// Run a closure with a temporary sink override on the current thread.
pub fn with_sink<T>(sink: Arc<dyn ValidationSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Arc<dyn ValidationSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        panic::{AssertUnwindSafe, catch_unwind},
        sync::Mutex,
    };

    #[derive(Default)]
    struct CaptureSink {
        events: Mutex<Vec<ValidationEvent>>,
    }

    impl CaptureSink {
        fn len(&self) -> usize {
            self.events.lock().expect("capture lock").len()
        }
    }

    impl ValidationSink for CaptureSink {
        fn record(&self, event: &ValidationEvent) {
            self.events.lock().expect("capture lock").push(event.clone());
        }
    }

    fn accepted() -> ValidationEvent {
        ValidationEvent::Accepted {
            entity: "Account",
            operation: Operation::Where,
        }
    }

    #[test]
    fn with_sink_routes_and_restores_nested_overrides() {
        let outer = Arc::new(CaptureSink::default());
        let inner = Arc::new(CaptureSink::default());

        with_sink(outer.clone(), || {
            record(&accepted());
            with_sink(inner.clone(), || record(&accepted()));
            record(&accepted());
        });

        assert_eq!(outer.len(), 2);
        assert_eq!(inner.len(), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn with_sink_restores_override_on_panic() {
        let sink = Arc::new(CaptureSink::default());

        let result = catch_unwind(AssertUnwindSafe(|| {
            with_sink(sink.clone(), || panic!("boom"));
        }));

        assert!(result.is_err());
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }
}
