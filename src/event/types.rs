//! Core types for event dispatch
//!
//! Defines the fundamental data structures flowing through the multiplexer.
//! Event kinds carry the platform's numeric type codes as explicit
//! discriminants; the name table is static so callers registering callbacks
//! by name never go through runtime reflection.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Accessibility event kinds understood by the multiplexer.
///
/// Discriminants are the platform's `TYPE_*` bit values, so a kind converts
/// losslessly to and from the raw code delivered with each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum EventKind {
    /// A view was clicked
    ViewClicked = 0x0000_0001,
    /// A view was long-clicked
    ViewLongClicked = 0x0000_0002,
    /// A view was selected
    ViewSelected = 0x0000_0004,
    /// A view received input focus
    ViewFocused = 0x0000_0008,
    /// The text of a view changed
    ViewTextChanged = 0x0000_0010,
    /// The window state changed (new window, dialog, ...)
    WindowStateChanged = 0x0000_0020,
    /// A notification was posted
    NotificationStateChanged = 0x0000_0040,
    /// Hover enter over a view
    ViewHoverEnter = 0x0000_0080,
    /// Hover exit from a view
    ViewHoverExit = 0x0000_0100,
    /// Touch exploration gesture started
    TouchExplorationGestureStart = 0x0000_0200,
    /// Touch exploration gesture ended
    TouchExplorationGestureEnd = 0x0000_0400,
    /// The content of a window changed
    WindowContentChanged = 0x0000_0800,
    /// A view was scrolled
    ViewScrolled = 0x0000_1000,
    /// The text selection of a view changed
    ViewTextSelectionChanged = 0x0000_2000,
    /// An application announcement
    Announcement = 0x0000_4000,
    /// A view gained accessibility focus
    ViewAccessibilityFocused = 0x0000_8000,
    /// A view lost accessibility focus
    ViewAccessibilityFocusCleared = 0x0001_0000,
    /// Text traversed at a movement granularity
    ViewTextTraversedAtMovementGranularity = 0x0002_0000,
    /// Gesture detection started
    GestureDetectionStart = 0x0004_0000,
    /// Gesture detection ended
    GestureDetectionEnd = 0x0008_0000,
    /// Touch interaction started
    TouchInteractionStart = 0x0010_0000,
    /// Touch interaction ended
    TouchInteractionEnd = 0x0020_0000,
    /// The set of windows changed
    WindowsChanged = 0x0040_0000,
    /// A view was context-clicked
    ViewContextClicked = 0x0080_0000,
    /// Assist read the current context
    AssistReadingContext = 0x0100_0000,
}

/// Static name table, one entry per kind.
const EVENT_NAMES: &[(EventKind, &str)] = &[
    (EventKind::ViewClicked, "view_clicked"),
    (EventKind::ViewLongClicked, "view_long_clicked"),
    (EventKind::ViewSelected, "view_selected"),
    (EventKind::ViewFocused, "view_focused"),
    (EventKind::ViewTextChanged, "view_text_changed"),
    (EventKind::WindowStateChanged, "window_state_changed"),
    (
        EventKind::NotificationStateChanged,
        "notification_state_changed",
    ),
    (EventKind::ViewHoverEnter, "view_hover_enter"),
    (EventKind::ViewHoverExit, "view_hover_exit"),
    (
        EventKind::TouchExplorationGestureStart,
        "touch_exploration_gesture_start",
    ),
    (
        EventKind::TouchExplorationGestureEnd,
        "touch_exploration_gesture_end",
    ),
    (EventKind::WindowContentChanged, "window_content_changed"),
    (EventKind::ViewScrolled, "view_scrolled"),
    (
        EventKind::ViewTextSelectionChanged,
        "view_text_selection_changed",
    ),
    (EventKind::Announcement, "announcement"),
    (
        EventKind::ViewAccessibilityFocused,
        "view_accessibility_focused",
    ),
    (
        EventKind::ViewAccessibilityFocusCleared,
        "view_accessibility_focus_cleared",
    ),
    (
        EventKind::ViewTextTraversedAtMovementGranularity,
        "view_text_traversed_at_movement_granularity",
    ),
    (EventKind::GestureDetectionStart, "gesture_detection_start"),
    (EventKind::GestureDetectionEnd, "gesture_detection_end"),
    (EventKind::TouchInteractionStart, "touch_interaction_start"),
    (EventKind::TouchInteractionEnd, "touch_interaction_end"),
    (EventKind::WindowsChanged, "windows_changed"),
    (EventKind::ViewContextClicked, "view_context_clicked"),
    (EventKind::AssistReadingContext, "assist_reading_context"),
];

impl EventKind {
    /// The platform's numeric type code for this kind.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// The canonical snake_case name for this kind.
    pub fn name(self) -> &'static str {
        EVENT_NAMES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    /// Resolve a human-readable event name to its kind.
    ///
    /// # Errors
    /// Returns [`Error::UnknownEventName`] when no kind carries that name.
    pub fn from_name(name: &str) -> Result<Self> {
        EVENT_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| Error::UnknownEventName(name.to_string()))
    }

    /// All kinds, in ascending code order.
    pub fn all() -> impl Iterator<Item = EventKind> {
        EVENT_NAMES.iter().map(|(kind, _)| *kind)
    }

    /// Check if this kind should refresh the cached root node.
    ///
    /// Window-state changes and focus changes are the moments the active
    /// window's root is most likely to have been replaced.
    pub fn refreshes_root(self) -> bool {
        matches!(
            self,
            EventKind::WindowStateChanged | EventKind::ViewFocused
        )
    }
}

impl TryFrom<u32> for EventKind {
    type Error = ();

    fn try_from(value: u32) -> std::result::Result<Self, ()> {
        EVENT_NAMES
            .iter()
            .find(|(kind, _)| kind.code() == value)
            .map(|(kind, _)| *kind)
            .ok_or(())
    }
}

/// Lightweight snapshot of a UI node.
///
/// Used for the fast-root cache and as the optional source of an event.
/// The multiplexer treats nodes as opaque payload; only the host platform
/// can resolve them back into live objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiNode {
    /// Class name of the backing view
    pub class_name: String,
    /// Package owning the view
    pub package_name: String,
    /// Bounds in screen coordinates (left, top, right, bottom)
    pub bounds: (i32, i32, i32, i32),
    /// Number of direct children
    pub child_count: usize,
}

impl UiNode {
    /// Create a node snapshot with empty bounds and no children.
    pub fn new(class_name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            package_name: package_name.into(),
            bounds: (0, 0, 0, 0),
            child_count: 0,
        }
    }

    /// Set screen bounds.
    pub fn with_bounds(mut self, bounds: (i32, i32, i32, i32)) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the direct child count.
    pub fn with_children(mut self, count: usize) -> Self {
        self.child_count = count;
        self
    }
}

/// An accessibility event as delivered by the host platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiEvent {
    /// Event kind
    pub kind: EventKind,
    /// Package that produced the event
    pub package_name: Option<String>,
    /// Class name of the source view
    pub class_name: Option<String>,
    /// Text payload carried by the event
    pub text: Vec<String>,
    /// Snapshot of the source node, when the platform provided one
    pub source: Option<UiNode>,
    /// Wall-clock timestamp (milliseconds since the epoch)
    pub timestamp_ms: u64,
}

impl UiEvent {
    /// Create an event of the given kind, stamped now.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            package_name: None,
            class_name: None,
            text: Vec::new(),
            source: None,
            timestamp_ms: now_ms(),
        }
    }

    /// Set the producing package.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package_name = Some(package.into());
        self
    }

    /// Set the source view class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_name = Some(class.into());
        self
    }

    /// Set the text payload.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text.push(text.into());
        self
    }

    /// Attach a source node snapshot.
    pub fn with_source(mut self, source: UiNode) -> Self {
        self.source = Some(source);
        self
    }
}

/// Direction of a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    /// Key pressed
    Down,
    /// Key released
    Up,
}

/// A hardware key event as delivered by the host platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Platform key code
    pub code: u32,
    /// Press or release
    pub action: KeyAction,
    /// Wall-clock timestamp (milliseconds since the epoch)
    pub timestamp_ms: u64,
}

impl KeyEvent {
    /// Create a key event, stamped now.
    pub fn new(code: u32, action: KeyAction) -> Self {
        Self {
            code,
            action,
            timestamp_ms: now_ms(),
        }
    }
}

/// Platform key codes for the keys automation scripts commonly observe.
pub mod key_codes {
    pub const HOME: u32 = 3;
    pub const BACK: u32 = 4;
    pub const VOLUME_UP: u32 = 24;
    pub const VOLUME_DOWN: u32 = 25;
    pub const POWER: u32 = 26;
    pub const MENU: u32 = 82;
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
