/// Compensating multi-step writes
///
/// The record store offers no transaction spanning several table calls.
/// Flows that must not leave half-written state register a compensation
/// for every successful step; if a later step fails the compensations run
/// in reverse order.
///
/// ```text
/// step 1 ok  -> push undo 1
/// step 2 ok  -> push undo 2
/// step 3 err -> undo 2, undo 1, return step 3 error
/// ```
///
/// Compensation failures are logged and do not replace the original error.
///
/// # Example
///
/// ```no_run
/// use frota_shared::models::driver::{CreateDriver, Driver};
/// use frota_shared::saga::Saga;
/// use frota_shared::store::{InMemoryStore, StoreError};
/// use frota_shared::tenant::TenantContext;
/// use futures::FutureExt;
///
/// # async fn example(data: CreateDriver) -> Result<(), StoreError> {
/// let store = InMemoryStore::with_default_schema();
/// let ctx = TenantContext::new(1);
/// let mut saga = Saga::new("example");
///
/// let driver = saga
///     .step("insert driver", Driver::create(&store, &ctx, data), |d: &Driver| {
///         let id = d.id;
///         let store = &store;
///         async move { Driver::delete(store, &ctx, id).await.map(|_| ()).map_err(Into::into) }
///             .boxed()
///     })
///     .await?;
///
/// saga.commit();
/// # let _ = driver;
/// # Ok(())
/// # }
/// ```

use futures::future::BoxFuture;
use std::future::Future;
use tracing::{debug, error, warn};

/// Error type of a compensation
pub type CompensationError = Box<dyn std::error::Error + Send + Sync>;

/// Deferred undo action
pub type Compensation<'a> = BoxFuture<'a, Result<(), CompensationError>>;

/// Ordered steps with reverse-order compensation
pub struct Saga<'a> {
    name: &'static str,
    compensations: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str) -> Self {
        Saga {
            name,
            compensations: Vec::new(),
        }
    }

    /// Number of registered compensations
    pub fn pending(&self) -> usize {
        self.compensations.len()
    }

    /// Runs one forward step
    ///
    /// On success the compensation built from the step output is
    /// registered. On failure every registered compensation runs (newest
    /// first) and the step error is returned.
    pub async fn step<T, E, Fut, C>(
        &mut self,
        step: &'static str,
        action: Fut,
        compensate: C,
    ) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        C: FnOnce(&T) -> Compensation<'a>,
        E: std::fmt::Display,
    {
        match action.await {
            Ok(value) => {
                debug!(saga = self.name, step, "Saga step completed");
                self.compensations.push((step, compensate(&value)));
                Ok(value)
            }
            Err(err) => {
                warn!(saga = self.name, step, error = %err, "Saga step failed, compensating");
                self.unwind().await;
                Err(err)
            }
        }
    }

    /// Runs one forward step that needs no undo
    ///
    /// A failure still unwinds earlier steps.
    pub async fn run<T, E, Fut>(&mut self, step: &'static str, action: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match action.await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(saga = self.name, step, error = %err, "Saga step failed, compensating");
                self.unwind().await;
                Err(err)
            }
        }
    }

    /// Runs every compensation in reverse order
    pub async fn abort(mut self) {
        self.unwind().await;
    }

    /// Keeps all completed steps
    pub fn commit(mut self) {
        debug!(saga = self.name, steps = self.compensations.len(), "Saga committed");
        self.compensations.clear();
    }

    async fn unwind(&mut self) {
        while let Some((step, compensation)) = self.compensations.pop() {
            match compensation.await {
                Ok(()) => debug!(saga = self.name, step, "Compensated"),
                Err(err) => error!(
                    saga = self.name,
                    step,
                    error = %err,
                    "Compensation failed, manual cleanup required"
                ),
            }
        }
    }
}

impl Drop for Saga<'_> {
    fn drop(&mut self) {
        if !self.compensations.is_empty() {
            warn!(
                saga = self.name,
                pending = self.compensations.len(),
                "Saga dropped without commit, compensations discarded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Mutex;

    fn record<'a>(log: &'a Mutex<Vec<String>>, entry: String) -> Compensation<'a> {
        async move {
            log.lock().unwrap().push(entry);
            Ok(())
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_failure_unwinds_in_reverse_order() {
        let log = Mutex::new(Vec::new());
        let mut saga = Saga::new("test");

        let a: Result<i32, String> = saga
            .step("a", async { Ok(1) }, |v| record(&log, format!("undo a{}", v)))
            .await;
        assert!(a.is_ok());
        let b: Result<i32, String> = saga
            .step("b", async { Ok(2) }, |v| record(&log, format!("undo b{}", v)))
            .await;
        assert!(b.is_ok());

        let c: Result<i32, String> = saga
            .step("c", async { Err("boom".to_string()) }, |_| record(&log, "undo c".into()))
            .await;

        assert_eq!(c.unwrap_err(), "boom");
        assert_eq!(*log.lock().unwrap(), vec!["undo b2", "undo a1"]);
        assert_eq!(saga.pending(), 0);
    }

    #[tokio::test]
    async fn test_commit_discards_compensations() {
        let log = Mutex::new(Vec::new());
        let mut saga = Saga::new("test");

        let _: Result<(), String> = saga
            .step("a", async { Ok(()) }, |_| record(&log, "undo a".into()))
            .await;
        saga.commit();

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_original_error() {
        let log = Mutex::new(Vec::new());
        let mut saga = Saga::new("test");

        let _: Result<(), String> = saga
            .step("a", async { Ok(()) }, |_| record(&log, "undo a".into()))
            .await;
        let _: Result<(), String> = saga
            .step("b", async { Ok(()) }, |_| {
                async { Err::<(), CompensationError>("store down".into()) }.boxed()
            })
            .await;

        let err: Result<(), &str> = saga.run("c", async { Err("insert failed") }).await;

        assert_eq!(err.unwrap_err(), "insert failed");
        assert_eq!(*log.lock().unwrap(), vec!["undo a"]);
    }

    #[tokio::test]
    async fn test_abort_runs_compensations() {
        let log = Mutex::new(Vec::new());
        let mut saga = Saga::new("test");

        let _: Result<(), String> = saga
            .step("a", async { Ok(()) }, |_| record(&log, "undo a".into()))
            .await;
        saga.abort().await;

        assert_eq!(*log.lock().unwrap(), vec!["undo a"]);
    }
}
