//! HookController: lifecycle and delivery control over a native engine.
//!
//! The controller owns the callback registry and the dispatch gate and hands
//! the engine a sink closure at start time.  Two independent axes of state:
//!
//! ```text
//! lifecycle:  stopped ──start()──►  started ──stop()──►  stopped
//! gate:       paused  ◄─pause()──   active  ──resume()─► (unchanged)
//! ```
//!
//! `started` is the presence of a [`HookRegistration`] token, acquired in
//! [`HookController::start`] and released in [`HookController::stop`]; it
//! guarantees at most one engine registration per controller.  Calling
//! `start` twice or `stop` without `start` is reported through
//! [`Diagnostics`] and otherwise ignored.
//!
//! # Delivery path
//!
//! The engine calls the sink from its own thread.  For each message the sink
//! checks the gate, drops the `None` sentinel, classifies the type code, and
//! invokes the category's callbacks in registration order.  Callbacks run on
//! a snapshot taken under a short read lock, so a callback may itself call
//! [`HookController::on`] without deadlocking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use iohook_core::dispatch::registry::invoke_all;
use iohook_core::{classify, CallbackRegistry, EventCallback, EventCategory, RawEventRecord};
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use super::diagnostics::{Diagnostic, Diagnostics, TracingDiagnostics};
use super::stream::EventStream;
use crate::infrastructure::engine::{EngineError, EngineStatus, EventSink, NativeEngine};

/// Snapshot of delivery counters since the controller was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events that passed the gate and classified to a category.
    pub delivered: u64,
    /// Events that arrived while the gate was paused.
    pub dropped_paused: u64,
    /// Events whose type code has no category.
    pub dropped_unknown: u64,
    /// "No message" sentinels received from the engine.
    pub dropped_empty: u64,
    /// Callbacks that panicked.
    pub callback_failures: u64,
}

#[derive(Default)]
struct StatsCounters {
    delivered: AtomicU64,
    dropped_paused: AtomicU64,
    dropped_unknown: AtomicU64,
    dropped_empty: AtomicU64,
    callback_failures: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_paused: self.dropped_paused.load(Ordering::Relaxed),
            dropped_unknown: self.dropped_unknown.load(Ordering::Relaxed),
            dropped_empty: self.dropped_empty.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the controller and the sink held by the engine.
struct DispatchState {
    active: AtomicBool,
    registry: RwLock<CallbackRegistry>,
    stats: StatsCounters,
    diagnostics: Arc<dyn Diagnostics>,
}

impl DispatchState {
    /// The dispatch entry point.  Runs on the engine's thread.
    fn handle(&self, message: Option<&RawEventRecord>) {
        if !self.active.load(Ordering::SeqCst) {
            StatsCounters::bump(&self.stats.dropped_paused);
            return;
        }
        let Some(record) = message else {
            StatsCounters::bump(&self.stats.dropped_empty);
            return;
        };
        let Some(category) = classify(record.type_code) else {
            StatsCounters::bump(&self.stats.dropped_unknown);
            return;
        };
        StatsCounters::bump(&self.stats.delivered);

        let callbacks = self.read_registry().snapshot(category);
        if callbacks.is_empty() {
            return;
        }
        trace!(%category, subscribers = callbacks.len(), "dispatching event");

        let report = invoke_all(category, &callbacks, record);
        for failure in report.failures {
            StatsCounters::bump(&self.stats.callback_failures);
            self.diagnostics.report(Diagnostic::CallbackFailed(failure));
        }
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, CallbackRegistry> {
        match self.registry.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, CallbackRegistry> {
        match self.registry.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Token proving this controller holds the engine registration.
struct HookRegistration {
    id: Uuid,
    /// Callback passed to [`HookController::start_with`]; held, never invoked.
    _start_callback: Option<EventCallback>,
}

/// Public subscription and lifecycle API over a [`NativeEngine`].
pub struct HookController {
    engine: Arc<dyn NativeEngine>,
    state: Arc<DispatchState>,
    registration: Option<HookRegistration>,
}

impl HookController {
    /// Creates a stopped, paused controller that logs diagnostics via `tracing`.
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self::with_diagnostics(engine, Arc::new(TracingDiagnostics))
    }

    /// Creates a stopped, paused controller reporting to `diagnostics`.
    pub fn with_diagnostics(engine: Arc<dyn NativeEngine>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            engine,
            state: Arc::new(DispatchState {
                active: AtomicBool::new(false),
                registry: RwLock::new(CallbackRegistry::new()),
                stats: StatsCounters::default(),
                diagnostics,
            }),
            registration: None,
        }
    }

    /// Subscribes `callback` to `category`.
    ///
    /// Valid in any state; subscriptions made before [`start`](Self::start)
    /// take effect once started.  Every subscription is discarded by
    /// [`stop`](Self::stop).
    pub fn on<F>(&self, category: EventCategory, callback: F)
    where
        F: Fn(&RawEventRecord) + Send + Sync + 'static,
    {
        self.state.write_registry().subscribe(category, Arc::new(callback));
        debug!(%category, "callback subscribed");
    }

    /// Subscribes a channel-backed stream to `category`.
    ///
    /// The stream yields a copy of every delivered record and ends after
    /// [`stop`](Self::stop) clears the registry.
    pub fn stream(&self, category: EventCategory) -> EventStream {
        let (sender, stream) = EventStream::channel(category);
        self.on(category, move |record| {
            // A dropped stream just stops receiving.
            let _ = sender.send(*record);
        });
        stream
    }

    /// Installs the engine hook and opens the gate.
    ///
    /// Already started: reports [`Diagnostic::AlreadyStarted`] and returns
    /// `Ok(())` without touching the engine.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`EngineError`] if the hook cannot be installed;
    /// the controller then stays stopped.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.start_inner(None)
    }

    /// Like [`start`](Self::start), additionally accepting a callback.
    ///
    /// The callback is held for the lifetime of the registration but is not
    /// subscribed to any category; a [`Diagnostic::StartCallbackIgnored`] is
    /// reported.  Use [`on`](Self::on) to receive events.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub fn start_with<F>(&mut self, callback: F) -> Result<(), EngineError>
    where
        F: Fn(&RawEventRecord) + Send + Sync + 'static,
    {
        self.start_inner(Some(Arc::new(callback)))
    }

    fn start_inner(&mut self, start_callback: Option<EventCallback>) -> Result<(), EngineError> {
        if let Some(registration) = &self.registration {
            debug!(registration = %registration.id, "start ignored");
            self.state.diagnostics.report(Diagnostic::AlreadyStarted);
            return Ok(());
        }

        // The gate opens before the engine can deliver its first event.
        let was_active = self.state.active.swap(true, Ordering::SeqCst);
        let state = Arc::clone(&self.state);
        let sink: EventSink = Arc::new(move |message: Option<&RawEventRecord>| state.handle(message));

        if let Err(e) = self.engine.start_hook(sink) {
            self.state.active.store(was_active, Ordering::SeqCst);
            error!("failed to start input hook: {e}");
            return Err(e);
        }

        if start_callback.is_some() {
            self.state.diagnostics.report(Diagnostic::StartCallbackIgnored);
        }

        let id = Uuid::new_v4();
        info!(registration = %id, "input hook started");
        self.registration = Some(HookRegistration {
            id,
            _start_callback: start_callback,
        });
        Ok(())
    }

    /// Closes the gate.  Events arriving while paused are dropped, not queued.
    pub fn pause(&self) {
        self.state.active.store(false, Ordering::SeqCst);
        debug!("dispatch paused");
    }

    /// Opens the gate.  Harmless before [`start`](Self::start).
    pub fn resume(&self) {
        self.state.active.store(true, Ordering::SeqCst);
        debug!("dispatch resumed");
    }

    /// Uninstalls the engine hook, closes the gate, and clears every
    /// subscription.
    ///
    /// Not started: reports [`Diagnostic::NotStarted`] and changes nothing.
    pub fn stop(&mut self) {
        let Some(registration) = self.registration.take() else {
            self.state.diagnostics.report(Diagnostic::NotStarted);
            return;
        };

        self.engine.stop_hook();
        self.state.active.store(false, Ordering::SeqCst);
        self.state.write_registry().clear_all();
        info!(registration = %registration.id, "input hook stopped");
    }

    /// Forwards to `engine`'s status query without interpretation.
    pub fn engine_status(engine: &dyn NativeEngine) -> EngineStatus {
        engine.status()
    }

    /// Status of this controller's engine.
    pub fn status(&self) -> EngineStatus {
        Self::engine_status(self.engine.as_ref())
    }

    pub fn is_started(&self) -> bool {
        self.registration.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Number of callbacks currently subscribed to `category`.
    pub fn subscriber_count(&self, category: EventCategory) -> usize {
        self.state.read_registry().len(category)
    }

    pub fn stats(&self) -> DispatchStats {
        self.state.stats.snapshot()
    }
}

impl Drop for HookController {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            self.engine.stop_hook();
            debug!(registration = %registration.id, "input hook released on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::RecordingDiagnostics;
    use crate::infrastructure::engine::simulated::SimulatedEngine;
    use crate::infrastructure::engine::MockNativeEngine;
    use std::sync::Mutex;

    fn controller() -> (Arc<SimulatedEngine>, Arc<RecordingDiagnostics>, HookController) {
        let engine = SimulatedEngine::shared();
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let controller = HookController::with_diagnostics(engine.clone(), diagnostics.clone());
        (engine, diagnostics, controller)
    }

    fn counter(controller: &HookController, category: EventCategory) -> Arc<AtomicU64> {
        let count = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&count);
        controller.on(category, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    fn mouse_move() -> RawEventRecord {
        RawEventRecord::mouse(EventCategory::MouseMove, 0, 0, 10, 20)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    #[test]
    fn test_new_controller_is_stopped_and_paused() {
        let (_engine, diagnostics, controller) = controller();
        assert!(!controller.is_started());
        assert!(!controller.is_active());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_start_installs_hook_and_opens_gate() {
        // Arrange
        let (engine, _diagnostics, mut controller) = controller();

        // Act
        controller.start().expect("start should succeed");

        // Assert
        assert!(controller.is_started());
        assert!(controller.is_active());
        assert_eq!(engine.install_count(), 1);
        assert!(controller.status().running);
    }

    #[test]
    fn test_start_twice_installs_once_and_reports() {
        // Arrange
        let (engine, diagnostics, mut controller) = controller();
        controller.start().expect("first start");

        // Act
        controller.start().expect("second start is not an error");

        // Assert
        assert_eq!(engine.install_count(), 1);
        assert_eq!(diagnostics.entries(), vec![Diagnostic::AlreadyStarted]);
        assert!(controller.is_started());
    }

    #[test]
    fn test_stop_without_start_changes_nothing_and_reports() {
        let (engine, diagnostics, mut controller) = controller();
        controller.resume();

        controller.stop();

        assert!(!controller.is_started());
        assert!(controller.is_active(), "gate must not be touched by ignored stop");
        assert_eq!(engine.uninstall_count(), 0);
        assert_eq!(diagnostics.entries(), vec![Diagnostic::NotStarted]);
    }

    #[test]
    fn test_stop_uninstalls_closes_gate_and_clears_registry() {
        // Arrange
        let (engine, _diagnostics, mut controller) = controller();
        let moves = counter(&controller, EventCategory::MouseMove);
        controller.start().expect("start");

        // Act
        controller.stop();

        // Assert
        assert!(!controller.is_started());
        assert!(!controller.is_active());
        assert_eq!(engine.uninstall_count(), 1);
        assert_eq!(controller.subscriber_count(EventCategory::MouseMove), 0);
        assert!(!engine.emit(mouse_move()));
        assert_eq!(moves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restart_after_stop_requires_resubscribing() {
        let (engine, _diagnostics, mut controller) = controller();
        let old = counter(&controller, EventCategory::MouseMove);
        controller.start().expect("start");
        controller.stop();

        controller.start().expect("restart");
        engine.emit(mouse_move());

        assert_eq!(old.load(Ordering::SeqCst), 0);
        assert_eq!(engine.install_count(), 2);
        assert_eq!(controller.stats().delivered, 1);
    }

    #[test]
    fn test_failed_engine_start_leaves_controller_stopped() {
        // Arrange
        let (engine, diagnostics, mut controller) = controller();
        engine.fail_next_start();

        // Act
        let result = controller.start();

        // Assert
        assert!(matches!(result, Err(EngineError::KeyboardHookInstallFailed(_))));
        assert!(!controller.is_started());
        assert!(!controller.is_active());
        assert!(diagnostics.is_empty());

        controller.start().expect("next start succeeds");
        assert!(controller.is_started());
    }

    #[test]
    fn test_start_with_callback_is_held_but_never_invoked() {
        // Arrange
        let (engine, diagnostics, mut controller) = controller();
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);

        // Act
        controller
            .start_with(move |_| flag.store(true, Ordering::SeqCst))
            .expect("start");
        for category in EventCategory::ALL {
            engine.emit(RawEventRecord::from_code(category.type_code()));
        }

        // Assert
        assert!(!called.load(Ordering::SeqCst));
        assert_eq!(diagnostics.entries(), vec![Diagnostic::StartCallbackIgnored]);
    }

    #[test]
    fn test_drop_releases_started_hook() {
        let (engine, _diagnostics, mut controller) = controller();
        controller.start().expect("start");

        drop(controller);

        assert!(!engine.is_installed());
        assert_eq!(engine.uninstall_count(), 1);
    }

    // ── Gate ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_paused_controller_drops_events() {
        let (engine, _diagnostics, mut controller) = controller();
        let moves = counter(&controller, EventCategory::MouseMove);
        controller.start().expect("start");

        controller.pause();
        controller.pause();
        engine.emit(mouse_move());

        assert_eq!(moves.load(Ordering::SeqCst), 0);
        assert_eq!(controller.stats().dropped_paused, 1);
        assert!(controller.is_started());
    }

    #[test]
    fn test_resume_restores_delivery_without_replaying_dropped_events() {
        let (engine, _diagnostics, mut controller) = controller();
        let moves = counter(&controller, EventCategory::MouseMove);
        controller.start().expect("start");
        controller.pause();
        engine.emit(mouse_move());

        controller.resume();
        controller.resume();
        engine.emit(mouse_move());

        assert_eq!(moves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resume_before_start_is_harmless() {
        let (engine, diagnostics, mut controller) = controller();
        let moves = counter(&controller, EventCategory::MouseMove);

        controller.resume();
        assert!(!engine.emit(mouse_move()));
        controller.start().expect("start");
        engine.emit(mouse_move());

        assert_eq!(moves.load(Ordering::SeqCst), 1);
        assert!(diagnostics.is_empty());
    }

    // ── Delivery path ────────────────────────────────────────────────────────

    #[test]
    fn test_sentinel_and_unknown_codes_are_dropped_silently() {
        // Arrange
        let (engine, diagnostics, mut controller) = controller();
        let counts: Vec<_> = EventCategory::ALL
            .iter()
            .map(|c| counter(&controller, *c))
            .collect();
        controller.start().expect("start");

        // Act
        engine.emit_none();
        engine.emit(RawEventRecord::from_code(1));
        engine.emit(RawEventRecord::from_code(2));
        engine.emit(RawEventRecord::from_code(42));

        // Assert
        assert!(counts.iter().all(|c| c.load(Ordering::SeqCst) == 0));
        let stats = controller.stats();
        assert_eq!(stats.dropped_empty, 1);
        assert_eq!(stats.dropped_unknown, 3);
        assert_eq!(stats.delivered, 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_panicking_callback_is_reported_and_later_callbacks_run() {
        // Arrange
        let (engine, diagnostics, mut controller) = controller();
        controller.on(EventCategory::KeyDown, |_| panic!("handler exploded"));
        let after = counter(&controller, EventCategory::KeyDown);
        controller.start().expect("start");

        // Act
        engine.emit(RawEventRecord::keyboard(EventCategory::KeyDown, 30, 65, 0));

        // Assert
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert_eq!(controller.stats().callback_failures, 1);
        let entries = diagnostics.entries();
        assert_eq!(entries.len(), 1);
        assert!(matches!(
            &entries[0],
            Diagnostic::CallbackFailed(f)
                if f.category == EventCategory::KeyDown && f.index == 0 && f.message == "handler exploded"
        ));
    }

    #[test]
    fn test_callback_subscribing_reentrantly_does_not_deadlock() {
        // Arrange
        let engine = SimulatedEngine::shared();
        let controller = Arc::new(Mutex::new(HookController::new(engine.clone())));
        let inner_hits = Arc::new(AtomicU64::new(0));
        {
            let mut guard = controller.lock().unwrap();
            guard.start().expect("start");
        }
        let state = Arc::clone(&controller.lock().unwrap().state);
        let hits = Arc::clone(&inner_hits);
        controller.lock().unwrap().on(EventCategory::KeyDown, move |_| {
            let hits = Arc::clone(&hits);
            state.write_registry().subscribe(
                EventCategory::KeyDown,
                Arc::new(move |_: &RawEventRecord| {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            );
        });
        let key = RawEventRecord::keyboard(EventCategory::KeyDown, 1, 1, 0);

        // Act
        engine.emit(key);
        engine.emit(key);

        // Assert: the callback added during the first event runs on the second.
        assert_eq!(inner_hits.load(Ordering::SeqCst), 1);
        assert_eq!(controller.lock().unwrap().subscriber_count(EventCategory::KeyDown), 3);
    }

    // ── Engine interaction (mockall) ────────────────────────────────────────

    #[test]
    fn test_double_start_calls_engine_start_exactly_once() {
        // Arrange
        let mut engine = MockNativeEngine::new();
        engine.expect_start_hook().times(1).returning(|_| Ok(()));
        engine.expect_stop_hook().times(1).return_const(());
        let mut controller = HookController::with_diagnostics(
            Arc::new(engine),
            Arc::new(RecordingDiagnostics::new()),
        );

        // Act
        controller.start().expect("start");
        controller.start().expect("ignored start");
        controller.stop();
        controller.stop();
    }

    #[test]
    fn test_engine_status_is_passed_through_verbatim() {
        let status = EngineStatus {
            running: true,
            backend: "custom",
        };
        let mut engine = MockNativeEngine::new();
        engine.expect_status().times(2).return_const(status);
        let controller = HookController::new(Arc::new(engine));

        assert_eq!(controller.status(), status);
        assert_eq!(HookController::engine_status(controller.engine.as_ref()), status);
    }

    #[test]
    fn test_sink_handed_to_engine_drives_dispatch() {
        // Arrange
        let captured: Arc<Mutex<Option<EventSink>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&captured);
        let mut engine = MockNativeEngine::new();
        engine.expect_start_hook().times(1).returning(move |sink| {
            *slot.lock().unwrap() = Some(sink);
            Ok(())
        });
        engine.expect_stop_hook().return_const(());
        let mut controller = HookController::new(Arc::new(engine));
        let downs = counter(&controller, EventCategory::MouseDown);
        controller.start().expect("start");

        // Act
        let sink = captured.lock().unwrap().clone().expect("sink installed");
        sink(Some(&RawEventRecord::mouse(EventCategory::MouseDown, 1, 1, 0, 0)));
        sink(None);

        // Assert
        assert_eq!(downs.load(Ordering::SeqCst), 1);
        assert_eq!(controller.stats().dropped_empty, 1);
    }
}
