//! Simulation Harness
//!
//! Drives a [`ServiceShell`] with a deterministic synthetic platform feed:
//! a scripted mix of accessibility events, key events, and gestures. Used
//! by the `simulate` CLI command and as an end-to-end smoke path without a
//! real host platform.

use crate::app::config::{ServiceConfig, SimulateConfig};
use crate::event::{key_codes, EventKind, KeyAction, KeyEvent, UiEvent, UiNode};
use crate::service::{RootProvider, ServiceControl, ServiceShell};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Scripted accessibility event cycle.
const EVENT_SCRIPT: &[EventKind] = &[
    EventKind::WindowStateChanged,
    EventKind::ViewClicked,
    EventKind::ViewScrolled,
    EventKind::WindowContentChanged,
    EventKind::ViewFocused,
    EventKind::ViewTextChanged,
];

/// Synthetic screens the root provider cycles through.
const SCREENS: &[(&str, &str)] = &[
    ("android.widget.FrameLayout", "com.example.launcher"),
    ("android.widget.LinearLayout", "com.example.mail"),
    ("android.widget.ScrollView", "com.example.browser"),
];

/// Counters collected over one simulation run.
#[derive(Debug, Default)]
pub struct SimulationReport {
    pub events_fed: usize,
    pub delegate_hits: usize,
    pub events_consumed: usize,
    pub callback_hits: usize,
    pub keys_fed: usize,
    pub keys_swallowed: usize,
    pub keys_observed: usize,
    pub gestures_fed: usize,
    pub gestures_observed: usize,
    pub clean_shutdown: bool,
}

/// Root provider over a synthetic screen stack.
struct SimRootProvider {
    current: RwLock<UiNode>,
}

impl SimRootProvider {
    fn new() -> Self {
        let (class, package) = SCREENS[0];
        Self {
            current: RwLock::new(UiNode::new(class, package).with_children(3)),
        }
    }

    fn switch_to(&self, screen: usize) {
        let (class, package) = SCREENS[screen % SCREENS.len()];
        *self.current.write() = UiNode::new(class, package).with_children(3);
    }
}

impl RootProvider for SimRootProvider {
    fn active_root(&self) -> Result<Option<UiNode>> {
        Ok(Some(self.current.read().clone()))
    }
}

struct SimServiceControl {
    disabled: AtomicBool,
}

impl ServiceControl for SimServiceControl {
    fn disable_self(&self) -> Result<()> {
        self.disabled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A delegate that counts the events it sees and optionally consumes
/// clicks, to exercise early termination.
struct CountingDelegate {
    hits: Arc<AtomicUsize>,
    consumed: Arc<AtomicUsize>,
    consume_clicks: bool,
    kinds: Option<HashSet<EventKind>>,
}

impl crate::mux::Delegate for CountingDelegate {
    fn event_kinds(&self) -> Option<&HashSet<EventKind>> {
        self.kinds.as_ref()
    }

    fn on_event(&self, _ctx: &crate::mux::DispatchContext<'_>, event: &UiEvent) -> bool {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if self.consume_clicks && event.kind == EventKind::ViewClicked {
            self.consumed.fetch_add(1, Ordering::Relaxed);
            return true;
        }
        false
    }
}

/// Run one simulation and return its counters.
pub fn run(service: &ServiceConfig, sim: &SimulateConfig) -> Result<SimulationReport> {
    let shell = ServiceShell::new(service.mux_options());
    let mux = shell.mux();

    let delegate_hits = Arc::new(AtomicUsize::new(0));
    let events_consumed = Arc::new(AtomicUsize::new(0));

    // The highest-priority delegate consumes clicks; the rest observe.
    // Priorities are spaced out the way feature modules register them.
    for i in 0..sim.delegate_count {
        mux.register_delegate(
            (i as i32 + 1) * 10,
            Arc::new(CountingDelegate {
                hits: Arc::clone(&delegate_hits),
                consumed: Arc::clone(&events_consumed),
                consume_clicks: i == 0,
                kinds: None,
            }),
        );
    }

    let callback_hits = Arc::new(AtomicUsize::new(0));
    let cb_hits = Arc::clone(&callback_hits);
    mux.register_named_callback(
        "window_state_changed",
        Arc::new(move |event: &UiEvent| {
            debug!(package = ?event.package_name, "window changed");
            cb_hits.fetch_add(1, Ordering::Relaxed);
        }),
    )?;

    let keys_observed = Arc::new(AtomicUsize::new(0));
    let obs_hits = Arc::clone(&keys_observed);
    mux.sticky_key_observers().add(Arc::new(move |_: &KeyEvent| {
        obs_hits.fetch_add(1, Ordering::Relaxed);
    }));

    // Swallow BACK, pass everything else through to the platform.
    mux.key_interceptors()
        .add(Arc::new(|event: &KeyEvent| event.code == key_codes::BACK));

    let gestures_observed = Arc::new(AtomicUsize::new(0));
    let gesture_hits = Arc::clone(&gestures_observed);
    mux.gesture_listeners().add(Arc::new(move |_id: i32| {
        gesture_hits.fetch_add(1, Ordering::Relaxed);
    }));

    let provider = Arc::new(SimRootProvider::new());
    let control = Arc::new(SimServiceControl {
        disabled: AtomicBool::new(false),
    });
    shell.on_service_connected(Arc::clone(&provider) as _, Arc::clone(&control) as _);

    if !shell.wait_until_connected(Some(service.start_timeout())) {
        return Err(crate::Error::Service(
            "simulated service failed to connect".into(),
        ));
    }
    info!("simulated service connected");

    let mut report = SimulationReport::default();
    let step_delay = Duration::from_millis(sim.step_delay_ms);

    for step in 0..sim.event_count {
        let kind = EVENT_SCRIPT[step % EVENT_SCRIPT.len()];
        if kind == EventKind::WindowStateChanged {
            provider.switch_to(step / EVENT_SCRIPT.len());
        }
        let (class, package) = SCREENS[(step / EVENT_SCRIPT.len()) % SCREENS.len()];
        let event = UiEvent::new(kind)
            .with_package(package)
            .with_class(class)
            .with_text(format!("step {step}"));
        shell.on_event(&event);
        report.events_fed += 1;

        // Sprinkle key traffic through the feed: BACK gets swallowed by
        // the interceptor, VOLUME_DOWN passes through.
        if step % 4 == 3 {
            let code = if step % 8 == 3 {
                key_codes::BACK
            } else {
                key_codes::VOLUME_DOWN
            };
            for action in [KeyAction::Down, KeyAction::Up] {
                if shell.on_key_event(&KeyEvent::new(code, action)) {
                    report.keys_swallowed += 1;
                }
                report.keys_fed += 1;
            }
        }

        if step % 5 == 4 {
            // Gesture verdicts are always unhandled.
            let _handled = shell.on_gesture((step % 16) as i32 + 1);
            report.gestures_fed += 1;
        }

        if !step_delay.is_zero() {
            thread::sleep(step_delay);
        }
    }

    debug!(fast_root = ?mux.fast_root(), "cached root after feed");
    report.clean_shutdown = shell.stop();

    report.delegate_hits = delegate_hits.load(Ordering::Relaxed);
    report.events_consumed = events_consumed.load(Ordering::Relaxed);
    report.callback_hits = callback_hits.load(Ordering::Relaxed);
    report.keys_observed = keys_observed.load(Ordering::Relaxed);
    report.gestures_observed = gestures_observed.load(Ordering::Relaxed);

    info!(
        events = report.events_fed,
        delegate_hits = report.delegate_hits,
        consumed = report.events_consumed,
        callbacks = report.callback_hits,
        keys = report.keys_fed,
        swallowed = report.keys_swallowed,
        gestures = report.gestures_fed,
        clean = report.clean_shutdown,
        "simulation finished"
    );
    Ok(report)
}
