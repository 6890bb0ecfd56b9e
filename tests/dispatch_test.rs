//! Integration tests for event dispatch
//!
//! These tests drive the full path the host platform would:
//! Platform callback -> ServiceShell -> EventMultiplexer -> consumers

use a11y_mux::event::{key_codes, EventKind, KeyAction, KeyEvent, UiEvent, UiNode};
use a11y_mux::mux::{Delegate, DispatchContext};
use a11y_mux::service::{RootProvider, ServiceControl, ServiceShell};
use a11y_mux::{Error, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Root provider over a fixed synthetic node
struct FixedRoot(UiNode);

impl RootProvider for FixedRoot {
    fn active_root(&self) -> Result<Option<UiNode>> {
        Ok(Some(self.0.clone()))
    }
}

struct NoopControl;

impl ServiceControl for NoopControl {
    fn disable_self(&self) -> Result<()> {
        Ok(())
    }
}

/// Delegate that records its id into a shared log
struct Recording {
    id: usize,
    log: Arc<Mutex<Vec<usize>>>,
    consume: bool,
    kinds: Option<HashSet<EventKind>>,
}

impl Delegate for Recording {
    fn event_kinds(&self) -> Option<&HashSet<EventKind>> {
        self.kinds.as_ref()
    }

    fn on_event(&self, _ctx: &DispatchContext<'_>, _event: &UiEvent) -> bool {
        self.log.lock().unwrap().push(self.id);
        self.consume
    }
}

fn make_root() -> UiNode {
    UiNode::new("android.widget.FrameLayout", "com.example.app")
        .with_bounds((0, 0, 1080, 1920))
        .with_children(4)
}

fn connected_shell() -> ServiceShell {
    let shell = ServiceShell::default();
    shell.on_service_connected(Arc::new(FixedRoot(make_root())), Arc::new(NoopControl));
    shell
}

#[test]
fn test_priority_order_with_early_termination() {
    let shell = connected_shell();
    let log = Arc::new(Mutex::new(Vec::new()));
    for (priority, id, consume) in [(30, 3, false), (10, 1, false), (20, 2, true)] {
        shell.mux().register_delegate(
            priority,
            Arc::new(Recording {
                id,
                log: Arc::clone(&log),
                consume,
                kinds: None,
            }),
        );
    }

    shell.on_event(&UiEvent::new(EventKind::ViewClicked));
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    shell.on_destroy();
}

#[test]
fn test_named_callback_fires_before_and_despite_consumption() {
    let shell = connected_shell();
    let log = Arc::new(Mutex::new(Vec::new()));

    let cb_log = Arc::clone(&log);
    shell
        .mux()
        .register_named_callback(
            "view_clicked",
            Arc::new(move |_: &UiEvent| cb_log.lock().unwrap().push(0)),
        )
        .unwrap();
    shell.mux().register_delegate(
        10,
        Arc::new(Recording {
            id: 1,
            log: Arc::clone(&log),
            consume: true,
            kinds: None,
        }),
    );

    shell.on_event(&UiEvent::new(EventKind::ViewClicked));
    shell.on_event(&UiEvent::new(EventKind::ViewClicked));
    assert_eq!(*log.lock().unwrap(), vec![0, 1, 0, 1]);
    shell.on_destroy();
}

#[test]
fn test_unknown_event_name_is_rejected() {
    let shell = ServiceShell::default();
    let err = shell
        .mux()
        .register_named_callback("no_such_event", Arc::new(|_: &UiEvent| {}))
        .unwrap_err();
    match err {
        Error::UnknownEventName(name) => assert_eq!(name, "no_such_event"),
        other => panic!("unexpected error: {other}"),
    }
    shell.on_destroy();
}

#[test]
fn test_every_event_name_round_trips_through_registration() {
    let shell = ServiceShell::default();
    for kind in EventKind::all() {
        shell
            .mux()
            .register_named_callback(kind.name(), Arc::new(|_: &UiEvent| {}))
            .unwrap_or_else(|e| panic!("{} should register: {e}", kind.name()));
    }
    shell.mux().clear_named_callbacks();
    shell.on_destroy();
}

#[test]
fn test_filtered_delegates_skip_unwanted_kinds() {
    let shell = connected_shell();
    let log = Arc::new(Mutex::new(Vec::new()));
    shell.mux().register_delegate(
        10,
        Arc::new(Recording {
            id: 1,
            log: Arc::clone(&log),
            consume: false,
            kinds: Some([EventKind::ViewScrolled].into_iter().collect()),
        }),
    );
    shell.mux().register_delegate(
        20,
        Arc::new(Recording {
            id: 2,
            log: Arc::clone(&log),
            consume: false,
            kinds: Some([EventKind::ViewClicked, EventKind::ViewScrolled]
                .into_iter()
                .collect()),
        }),
    );

    shell.on_event(&UiEvent::new(EventKind::ViewClicked));
    shell.on_event(&UiEvent::new(EventKind::ViewScrolled));
    shell.on_event(&UiEvent::new(EventKind::Announcement));
    assert_eq!(*log.lock().unwrap(), vec![2, 1, 2]);
    shell.on_destroy();
}

#[test]
fn test_delegate_reads_root_during_dispatch() {
    let shell = connected_shell();
    let seen = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    shell.mux().register_delegate(
        10,
        Arc::new(move |ctx: &DispatchContext<'_>, _: &UiEvent| {
            *slot.lock().unwrap() = ctx.root_in_active_window();
            false
        }),
    );

    shell.on_event(&UiEvent::new(EventKind::WindowContentChanged));
    assert_eq!(seen.lock().unwrap().clone(), Some(make_root()));
    shell.on_destroy();
}

#[test]
fn test_fast_root_tracks_window_and_focus_events() {
    let shell = connected_shell();
    shell.mux().register_delegate(
        10,
        Arc::new(|_: &DispatchContext<'_>, _: &UiEvent| false),
    );

    assert!(shell.mux().fast_root().is_none());
    shell.on_event(&UiEvent::new(EventKind::ViewClicked));
    assert!(shell.mux().fast_root().is_none());

    shell.on_event(&UiEvent::new(EventKind::ViewFocused));
    assert_eq!(shell.mux().fast_root(), Some(make_root()));
    shell.on_destroy();
}

#[test]
fn test_key_interceptor_verdict_returned_to_platform() {
    let shell = connected_shell();
    shell
        .mux()
        .key_interceptors()
        .add(Arc::new(|event: &KeyEvent| {
            event.code == key_codes::VOLUME_UP && event.action == KeyAction::Down
        }));

    assert!(shell.on_key_event(&KeyEvent::new(key_codes::VOLUME_UP, KeyAction::Down)));
    assert!(!shell.on_key_event(&KeyEvent::new(key_codes::VOLUME_UP, KeyAction::Up)));
    assert!(!shell.on_key_event(&KeyEvent::new(key_codes::HOME, KeyAction::Down)));
    shell.on_destroy();
}

#[test]
fn test_key_observers_see_events_off_thread() {
    let shell = connected_shell();
    let observed = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&observed);
    shell
        .mux()
        .sticky_key_observers()
        .add(Arc::new(move |_: &KeyEvent| {
            count.fetch_add(1, Ordering::SeqCst);
        }));

    for _ in 0..5 {
        shell.on_key_event(&KeyEvent::new(key_codes::MENU, KeyAction::Down));
    }
    // Destroy drains the worker before returning.
    shell.on_destroy();
    assert_eq!(observed.load(Ordering::SeqCst), 5);
}

#[test]
fn test_gestures_never_handled() {
    let shell = connected_shell();
    let seen = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&seen);
    shell.mux().gesture_listeners().add(Arc::new(move |_: i32| {
        count.fetch_add(1, Ordering::SeqCst);
    }));

    for id in 1..=3 {
        assert!(!shell.on_gesture(id));
    }
    shell.on_destroy();
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[test]
fn test_replacing_delegate_keeps_kind_routed() {
    let shell = connected_shell();
    let log = Arc::new(Mutex::new(Vec::new()));
    shell.mux().register_delegate(
        10,
        Arc::new(Recording {
            id: 1,
            log: Arc::clone(&log),
            consume: false,
            kinds: Some([EventKind::ViewClicked].into_iter().collect()),
        }),
    );
    // Replacement subscribes to a different kind; the click routing from
    // the first registration survives at the registry level.
    shell.mux().register_delegate(
        10,
        Arc::new(Recording {
            id: 2,
            log: Arc::clone(&log),
            consume: false,
            kinds: Some([EventKind::ViewScrolled].into_iter().collect()),
        }),
    );

    shell.on_event(&UiEvent::new(EventKind::ViewScrolled));
    assert_eq!(*log.lock().unwrap(), vec![2]);
    shell.on_destroy();
}
