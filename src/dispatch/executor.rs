//! Delivery Executor - serialisierte Zustellung auf einen Ziel-Thread
//!
//! Ersetzt den plattformspezifischen "post to main looper"-Mechanismus durch
//! eine injizierbare Task-Queue. Alle Tasks laufen nacheinander, in der
//! Reihenfolge, in der sie gepostet wurden.

use std::panic::{self, AssertUnwindSafe};
use tokio::sync::mpsc;

/// Eine einzelne Zustellung
pub type DeliveryTask = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// DELIVERY EXECUTOR
// ============================================================================

/// Single-Threaded Ausführungskontext für Listener-Callbacks
///
/// `post` darf nie blockieren und muss FIFO pro postendem Thread garantieren.
pub trait DeliveryExecutor: Send + Sync {
    fn post(&self, task: DeliveryTask);
}

// ============================================================================
// SERIAL EXECUTOR
// ============================================================================

/// Sender-Seite eines seriellen Executors (klonbar)
#[derive(Clone)]
pub struct SerialExecutor {
    tx: mpsc::UnboundedSender<DeliveryTask>,
}

impl SerialExecutor {
    /// Erstellt Executor und zugehörige Loop
    ///
    /// Die Loop muss auf dem Ziel-Thread laufen (siehe [`ExecutorLoop`]).
    pub fn new() -> (Self, ExecutorLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, ExecutorLoop { rx })
    }

    /// Prüft ob die Loop-Seite noch existiert
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl DeliveryExecutor for SerialExecutor {
    fn post(&self, task: DeliveryTask) {
        if self.tx.send(task).is_err() {
            tracing::warn!("Delivery loop is gone, dropping task");
        }
    }
}

impl std::fmt::Debug for SerialExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialExecutor")
            .field("is_closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// EXECUTOR LOOP
// ============================================================================

/// Empfänger-Seite: führt gepostete Tasks nacheinander aus
pub struct ExecutorLoop {
    rx: mpsc::UnboundedReceiver<DeliveryTask>,
}

impl ExecutorLoop {
    /// Blockiert den aktuellen Thread bis alle Executor-Handles gedroppt sind
    ///
    /// Darf nicht aus einem async-Kontext aufgerufen werden.
    pub fn run(mut self) {
        while let Some(task) = self.rx.blocking_recv() {
            Self::execute(task);
        }
        tracing::debug!("Delivery loop finished");
    }

    /// Blockiert bis `done` nach einer Zustellung `true` liefert
    ///
    /// Gibt `false` zurück, falls alle Executor-Handles vorher gedroppt wurden.
    pub fn run_until<F>(&mut self, mut done: F) -> bool
    where
        F: FnMut() -> bool,
    {
        if done() {
            return true;
        }
        while let Some(task) = self.rx.blocking_recv() {
            Self::execute(task);
            if done() {
                return true;
            }
        }
        false
    }

    /// Führt alle bereits wartenden Tasks aus, ohne zu blockieren
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.rx.try_recv() {
            Self::execute(task);
            executed += 1;
        }
        executed
    }

    /// Startet die Loop als einzelnen tokio-Task
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(task) = self.rx.recv().await {
                Self::execute(task);
            }
            tracing::debug!("Delivery loop finished");
        })
    }

    fn execute(task: DeliveryTask) {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!("Delivery task panicked, continuing with next task");
        }
    }
}

impl std::fmt::Debug for ExecutorLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorLoop").finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> DeliveryTask) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let make = move |n: u32| -> DeliveryTask {
            let seen = Arc::clone(&seen_clone);
            Box::new(move || seen.lock().push(n))
        };
        (seen, make)
    }

    #[test]
    fn test_tasks_run_in_post_order() {
        let (executor, mut delivery) = SerialExecutor::new();
        let (seen, task) = recorder();

        for n in 0..5 {
            executor.post(task(n));
        }

        assert!(seen.lock().is_empty());
        assert_eq!(delivery.run_pending(), 5);
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_panicking_task_does_not_stop_loop() {
        let (executor, mut delivery) = SerialExecutor::new();
        let (seen, task) = recorder();

        executor.post(task(1));
        executor.post(Box::new(|| panic!("listener blew up")));
        executor.post(task(2));

        assert_eq!(delivery.run_pending(), 3);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn test_run_returns_when_senders_dropped() {
        let (executor, delivery) = SerialExecutor::new();
        let (seen, task) = recorder();

        let worker = thread::spawn(move || {
            for n in 0..3 {
                executor.post(task(n));
            }
        });

        delivery.run();
        worker.join().unwrap();
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_run_until_stops_on_condition() {
        let (executor, mut delivery) = SerialExecutor::new();
        let (seen, task) = recorder();

        for n in 0..4 {
            executor.post(task(n));
        }

        let seen_check = Arc::clone(&seen);
        assert!(delivery.run_until(|| seen_check.lock().len() == 2));
        assert_eq!(*seen.lock(), vec![0, 1]);
        assert_eq!(delivery.run_pending(), 2);
    }

    #[test]
    fn test_post_after_loop_dropped_is_silent() {
        let (executor, delivery) = SerialExecutor::new();
        drop(delivery);

        assert!(executor.is_closed());
        executor.post(Box::new(|| {}));
    }

    #[tokio::test]
    async fn test_spawned_loop_delivers() {
        let (executor, delivery) = SerialExecutor::new();
        let (seen, task) = recorder();
        let handle = delivery.spawn();

        executor.post(task(7));
        executor.post(task(8));
        drop(executor);

        handle.await.unwrap();
        assert_eq!(*seen.lock(), vec![7, 8]);
    }
}
