// TailPane - app/pane.rs
//
// The pane layout: an ordered collection of views over log sources, split
// by adjustable dividers, each view following its source independently.
//
// Architecture:
//   - `PaneContainer` lives on the presentation thread and exclusively owns
//     every `ViewWrapper`; all structural mutation happens there.
//   - Poll ticks run on background threads and communicate exclusively by
//     sending `ViewEvent`s over the container's mpsc channel, which the
//     presentation thread drains (same pattern as every background activity
//     in this crate).
//   - Dividers are a plain fraction list parallel to the view order; any
//     front end mirrors it.  Invariant at every return:
//     divider count == max(0, view count - 1).

use crate::app::reader::SourceReader;
use crate::app::scheduler::Scheduler;
use crate::app::tail::TailController;
use crate::core::model::{LogSource, Orientation, TailState, ViewEvent, ViewId};
use crate::core::scroll::{self, ScrollUnit};
use crate::util::constants::DEFAULT_DIVIDER_POSITION;
use crate::util::error::ReaderError;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::Duration;

// =============================================================================
// Presentation collaborator
// =============================================================================

/// The rendering side of one view.  Implementations are thin: a GUI widget,
/// or a no-op/recording stub for headless use and tests.
pub trait ViewSurface {
    /// Move the view's visible window by `delta` (positive = towards older
    /// content).
    fn apply_movement(&mut self, delta: f64);

    /// Give this view input focus.
    fn request_focus(&mut self);
}

// =============================================================================
// View wrapper
// =============================================================================

/// One log source composed with its tail controller, reader resource, and
/// presentation surface.
///
/// Lifecycle: Created -> Active (Idle|Tailing, toggles freely) -> Closed.
/// Closed is terminal; the container removes the wrapper as part of closing
/// it.
pub struct ViewWrapper {
    id: ViewId,
    source: LogSource,
    tail: TailController,

    /// Shared with the poll tick closure; the wrapper alone drives its
    /// lifecycle (`close` / `stop`).
    reader: Arc<Mutex<Box<dyn SourceReader>>>,

    surface: Box<dyn ViewSurface>,

    /// Fired exactly once when the view is closed by the user.  Not fired
    /// by `stop` (application shutdown).
    on_close: Option<Box<dyn FnOnce()>>,

    closed: bool,
}

impl ViewWrapper {
    #[allow(clippy::too_many_arguments)]
    fn open(
        id: ViewId,
        source: LogSource,
        reader: Box<dyn SourceReader>,
        surface: Box<dyn ViewSurface>,
        scheduler: Arc<Scheduler>,
        poll_interval: Duration,
        events: mpsc::Sender<ViewEvent>,
        on_close: Box<dyn FnOnce()>,
    ) -> Self {
        let reader = Arc::new(Mutex::new(reader));

        // The repeating poll: read appended lines and marshal them to the
        // presentation thread.  Sender is moved behind a mutex because the
        // tick closure must be shareable across successive registrations.
        let tick_reader = Arc::clone(&reader);
        let events = Mutex::new(events);
        let tick = move || {
            let result = lock(&tick_reader).read_appended();
            match result {
                Ok(lines) => {
                    if !lines.is_empty() {
                        let _ = lock(&events).send(ViewEvent::NewLines { view: id, lines });
                    }
                }
                Err(ReaderError::Closed { .. }) => {
                    // Tick in flight during teardown; nothing to deliver.
                    tracing::trace!(%id, "Tick skipped: reader closed");
                }
                Err(e) => {
                    // Tick-level failure: logged, reported, never fatal to
                    // the schedule.
                    tracing::warn!(%id, error = %e, "Tick read failed");
                    let _ = lock(&events).send(ViewEvent::ReadError {
                        view: id,
                        message: e.to_string(),
                    });
                }
            }
        };

        Self {
            id,
            source,
            tail: TailController::new(scheduler, poll_interval, tick),
            reader,
            surface,
            on_close: Some(on_close),
            closed: false,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    /// Header text: display name plus the advisory size badge.
    pub fn header_title(&self) -> String {
        format!("{} {}", self.source.display_name, self.source.size_badge())
    }

    pub fn start_tailing(&self) {
        self.tail.start_tailing();
    }

    pub fn stop_tailing(&self) {
        self.tail.stop_tailing();
    }

    pub fn is_tailing(&self) -> bool {
        self.tail.is_tailing()
    }

    pub fn tail_state(&self) -> TailState {
        self.tail.tail_state()
    }

    /// Apply a scroll gesture: scrolling up breaks the follow, scrolling
    /// down while following is redundant and suppressed.
    pub fn handle_scroll(&mut self, delta_y: f64, unit: ScrollUnit) {
        let response = scroll::resolve(delta_y, unit, self.tail.is_tailing());
        if response.stop_tailing {
            self.tail.stop_tailing();
        }
        if let Some(movement) = response.movement {
            self.surface.apply_movement(movement);
        }
    }

    fn request_focus(&mut self) {
        self.surface.request_focus();
    }

    /// User-initiated close: stop tailing, release the reader, then fire
    /// the on-close callback.  The callback fires even if the release
    /// fails — release is attempted first, the callback always follows.
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.tail.stop_tailing();
        if let Err(e) = lock(&self.reader).close() {
            tracing::warn!(id = %self.id, error = %e, "Reader release failed during close");
        }
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }

    /// Application-shutdown teardown: stop tailing and release the reader
    /// without firing the on-close callback — the view is not being closed,
    /// the application is going away.
    fn stop(&mut self) {
        self.tail.stop_tailing();
        if let Err(e) = lock(&self.reader).close() {
            tracing::warn!(id = %self.id, error = %e, "Reader release failed during shutdown");
        }
    }
}

// =============================================================================
// Pane container
// =============================================================================

/// Ordered, resizable collection of views.
///
/// Order is meaningful: it is the visual left-to-right (or top-to-bottom)
/// order, and the divider fractions between adjacent views are what gets
/// persisted.
pub struct PaneContainer {
    views: Vec<ViewWrapper>,

    /// Fraction in [0,1] for each split between adjacent views.
    dividers: Vec<f64>,

    orientation: Orientation,

    /// The view currently receiving input, if any.  Transient, never
    /// persisted; updated by `focus_on` and input-focus events.
    focused: Option<ViewId>,

    next_id: u64,
    scheduler: Arc<Scheduler>,
    poll_interval: Duration,
    events_tx: mpsc::Sender<ViewEvent>,
}

impl PaneContainer {
    /// Create an empty container.  The returned receiver is the
    /// presentation thread's end of the view-event channel.
    pub fn new(
        scheduler: Arc<Scheduler>,
        poll_interval: Duration,
    ) -> (Self, mpsc::Receiver<ViewEvent>) {
        let (events_tx, events_rx) = mpsc::channel();
        (
            Self {
                views: Vec::new(),
                dividers: Vec::new(),
                orientation: Orientation::default(),
                focused: None,
                next_id: 0,
                scheduler,
                poll_interval,
                events_tx,
            },
            events_rx,
        )
    }

    /// Open `source` as a new view at `insert_index` (append when `None` or
    /// out of range).  The new divider adopts the default midpoint.
    ///
    /// `on_close` fires exactly once if and when the view is closed by the
    /// user; it does not fire on `close_all`.
    pub fn add(
        &mut self,
        source: LogSource,
        reader: Box<dyn SourceReader>,
        surface: Box<dyn ViewSurface>,
        on_close: Box<dyn FnOnce()>,
        insert_index: Option<usize>,
    ) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;

        let wrapper = ViewWrapper::open(
            id,
            source,
            reader,
            surface,
            Arc::clone(&self.scheduler),
            self.poll_interval,
            self.events_tx.clone(),
            on_close,
        );

        let old_count = self.views.len();
        let position = insert_index.filter(|&i| i <= old_count).unwrap_or(old_count);
        self.views.insert(position, wrapper);

        if old_count >= 1 {
            // The new divider sits between the inserted view and the
            // neighbour it split from.
            let divider_index = position.min(old_count - 1);
            self.dividers
                .insert(divider_index, DEFAULT_DIVIDER_POSITION);
        }

        tracing::info!(%id, views = self.views.len(), "View opened");
        self.assert_divider_invariant();
        id
    }

    /// Close one view: remove it from the order, stop its tailing, release
    /// its reader, and fire its on-close callback.  Unknown ids are a
    /// silent no-op.
    pub fn close(&mut self, view: ViewId) {
        let Some(index) = self.index_of(view) else {
            tracing::debug!(%view, "Close requested for absent view");
            return;
        };

        let mut wrapper = self.views.remove(index);
        if !self.dividers.is_empty() {
            // Drop the divider adjacent to the removed view.
            self.dividers.remove(index.min(self.dividers.len() - 1));
        }
        if self.focused == Some(view) {
            self.focused = None;
        }

        wrapper.close();
        tracing::info!(%view, views = self.views.len(), "View closed");
        self.assert_divider_invariant();
    }

    /// Visually collapse the focused view by moving a divider; the view,
    /// its tailing state, and its resources are untouched.
    ///
    /// No-op with fewer than two views or without a focused view.  The last
    /// view in order has no divider after it, so it is hidden by opening
    /// the previous divider fully instead.
    pub fn hide(&mut self) {
        if self.views.len() < 2 {
            return; // nothing can be hidden out of a single view
        }
        let Some(index) = self.focused.and_then(|id| self.index_of(id)) else {
            return;
        };

        if index == self.views.len() - 1 {
            self.dividers[index - 1] = 1.0;
        } else {
            self.dividers[index] = 0.0;
        }
        tracing::debug!(index, "View hidden");
    }

    /// Focus the view showing `path`, if present; absent sources are a
    /// silent no-op.
    pub fn focus_on(&mut self, path: &Path) {
        let found = self
            .views
            .iter_mut()
            .find(|wrapper| wrapper.source.path == path);
        if let Some(wrapper) = found {
            let id = wrapper.id;
            wrapper.request_focus();
            self.focused = Some(id);
        }
    }

    /// Record an input-focus change reported by the front end.
    pub fn set_focus(&mut self, view: ViewId) {
        if self.index_of(view).is_some() {
            self.focused = Some(view);
        }
    }

    pub fn focused(&self) -> Option<ViewId> {
        self.focused
    }

    /// Position of `view` in the visual order.
    pub fn index_of(&self, view: ViewId) -> Option<usize> {
        self.views.iter().position(|wrapper| wrapper.id == view)
    }

    /// Move `view` to `target_index` in the visual order (clamped to the
    /// end).  Divider fractions keep their positions.
    pub fn move_view(&mut self, view: ViewId, target_index: usize) {
        let Some(index) = self.index_of(view) else {
            return;
        };
        let wrapper = self.views.remove(index);
        let target = target_index.min(self.views.len());
        self.views.insert(target, wrapper);
        self.assert_divider_invariant();
    }

    /// Route a scroll gesture to a view.  Unknown ids are a silent no-op.
    pub fn handle_scroll(&mut self, view: ViewId, delta_y: f64, unit: ScrollUnit) {
        if let Some(index) = self.index_of(view) {
            self.views[index].handle_scroll(delta_y, unit);
        }
    }

    pub fn divider_positions(&self) -> Vec<f64> {
        self.dividers.clone()
    }

    /// Restore divider fractions, e.g. from a persisted session.
    ///
    /// Fractions are clamped into [0,1]; a count mismatch applies the
    /// overlapping prefix and warns rather than erroring.
    pub fn set_divider_positions(&mut self, positions: &[f64]) {
        if positions.len() != self.dividers.len() {
            tracing::warn!(
                supplied = positions.len(),
                expected = self.dividers.len(),
                "Divider count mismatch; applying overlapping prefix"
            );
        }
        for (slot, &fraction) in self.dividers.iter_mut().zip(positions) {
            *slot = if fraction.is_finite() {
                fraction.clamp(0.0, 1.0)
            } else {
                DEFAULT_DIVIDER_POSITION
            };
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Flip the split direction.
    pub fn switch_orientation(&mut self) {
        self.orientation = self.orientation.flipped();
        tracing::debug!(orientation = ?self.orientation, "Orientation switched");
    }

    /// Application-shutdown teardown: stop tailing and release every reader
    /// without firing per-view on-close callbacks.
    pub fn close_all(&mut self) {
        tracing::info!(views = self.views.len(), "Closing all views");
        for wrapper in &mut self.views {
            wrapper.stop();
        }
        self.views.clear();
        self.dividers.clear();
        self.focused = None;
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, view: ViewId) -> Option<&ViewWrapper> {
        self.index_of(view).map(|index| &self.views[index])
    }

    pub fn get_mut(&mut self, view: ViewId) -> Option<&mut ViewWrapper> {
        self.index_of(view).map(|index| &mut self.views[index])
    }

    /// Views in visual order.
    pub fn views(&self) -> impl Iterator<Item = &ViewWrapper> {
        self.views.iter()
    }

    /// Source paths in visual order (for session capture).
    pub fn open_paths(&self) -> Vec<PathBuf> {
        self.views
            .iter()
            .map(|wrapper| wrapper.source.path.clone())
            .collect()
    }

    /// Source paths of views currently tailing (for session capture).
    pub fn tailing_paths(&self) -> Vec<PathBuf> {
        self.views
            .iter()
            .filter(|wrapper| wrapper.is_tailing())
            .map(|wrapper| wrapper.source.path.clone())
            .collect()
    }

    fn assert_divider_invariant(&self) {
        debug_assert_eq!(
            self.dividers.len(),
            self.views.len().saturating_sub(1),
            "divider count must equal max(0, view count - 1)"
        );
    }
}

/// Lock a mutex, continuing with the inner value if another thread panicked
/// while holding it.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Unit tests
// =============================================================================
