// ── Magnifier controller ──────────────────────────────────────────────────────
//
// Owns the lifecycle state machine, the refresh algorithm, the resize
// reaction, and teardown.  All platform access goes through the two injected
// collaborators below, so this module is pure safe Rust and the whole state
// machine is testable without a window system.
//
// States: Uninitialized → Inert (subsystem init failed; terminal, still
// disposable) or Active; Active → Paused on host-window closing (ticks stop,
// resources intact); Active|Paused → Released on dispose (terminal).  Resize
// notifications are accepted in every state except Released and only refresh
// the cached client rectangle and surface bounds.
//
// Threading model: everything here runs on the host window's UI thread.  The
// tick is a re-entry point driven by the host's dispatch loop, never a
// concurrent thread, so ticks are serialized and no locking exists.

use crate::geometry::{source_rect, Point, Rect};
use crate::{LoupeError, Result};

// ── Collaborator contracts ────────────────────────────────────────────────────

/// The narrow capability surface over the platform's screen-magnification
/// service plus the window/geometry helpers the controller needs.
///
/// Every command is a one-shot OS operation: failures are reported as
/// `false`/`None` and never retried.  The process-wide
/// [`init_subsystem`](Self::init_subsystem)/[`uninit_subsystem`](Self::uninit_subsystem)
/// pair must stay balanced; `uninit_subsystem` is only called after a
/// successful initialization.
pub trait MagBackend {
    /// Identity of a host window.  Borrowed by the controller, never owned.
    type Window: Copy;
    /// Identity of a created magnification surface.  Exclusively owned by the
    /// controller between creation and destruction.
    type Surface: Copy;

    /// Initialize the process-wide magnification subsystem.  `false` means
    /// magnification is unavailable (for example on an unsupported platform)
    /// and no further magnification operation may be attempted.
    fn init_subsystem(&mut self) -> bool;

    /// Release the process-wide magnification capability.
    fn uninit_subsystem(&mut self);

    /// Create a magnification surface child of `parent`, sized to `bounds`,
    /// showing the magnified cursor.  `None` on failure.
    fn create_surface(&mut self, parent: Self::Window, bounds: Rect) -> Option<Self::Surface>;

    /// Destroy a surface previously returned by
    /// [`create_surface`](Self::create_surface).
    fn destroy_surface(&mut self, surface: Self::Surface);

    /// Apply a uniform scale transform to the surface's rendering.
    fn set_transform(&mut self, surface: Self::Surface, scale: f32) -> bool;

    /// Tell the surface which desktop region (screen coordinates) to capture.
    fn set_source_rect(&mut self, surface: Self::Surface, source: Rect) -> bool;

    /// Reposition/resize the surface within its parent's client area.
    fn set_surface_bounds(&mut self, surface: Self::Surface, bounds: Rect) -> bool;

    /// Invalidate the surface's whole area so the next paint is not stale.
    fn invalidate(&mut self, surface: Self::Surface);

    /// Whether `window` still identifies a live window.
    fn window_exists(&self, window: Self::Window) -> bool;

    /// The window's current client-area rectangle.
    fn client_rect(&self, window: Self::Window) -> Rect;

    /// Disable any transparency on the window so magnified content is never
    /// blended against a background color.
    fn make_opaque(&mut self, window: Self::Window);

    /// Re-assert the window's topmost z-order without moving, resizing, or
    /// activating it.
    fn raise_topmost(&mut self, window: Self::Window);

    /// Current pointer position in screen coordinates.
    fn cursor_pos(&self) -> Point;

    /// Primary screen size in device pixels.
    fn screen_size(&self) -> (i32, i32);
}

/// The periodic refresh scheduler.
///
/// Ticks must be delivered on the same thread as every other controller call
/// (on Win32 this is a `WM_TIMER` message timer).  `release` is the
/// explicit-disposal tier: the reclamation path calls `stop` but never
/// `release`, so implementations must not put anything in `release` that is
/// unsafe to leak.
pub trait RefreshTimer {
    /// Begin firing ticks at a fixed interval, restarting if already running.
    fn start(&mut self, interval_ms: u32);
    /// Stop firing ticks.  Safe to call when already stopped.
    fn stop(&mut self);
    /// Free any resources behind the timer object itself.
    fn release(&mut self);
}

// ── Constants ─────────────────────────────────────────────────────────────────

/// Zoom factor a freshly constructed controller starts with.
pub const DEFAULT_MAGNIFICATION: f32 = 2.0;

/// Shortest tick interval the host scheduler guarantees without excessive CPU
/// cost (Win32's `USER_TIMER_MINIMUM`).
pub const MIN_TICK_INTERVAL_MS: u32 = 10;

// ── Controller ────────────────────────────────────────────────────────────────

/// An in-window loupe that follows the pointer.
///
/// Bound to one host window for its whole life.  The host forwards its
/// resize, closing, and timer-tick notifications to [`on_resize`],
/// [`on_closing`], and [`on_tick`]; dropping the controller (or calling
/// [`dispose`]) tears the native resources down exactly once.
///
/// [`on_resize`]: Self::on_resize
/// [`on_closing`]: Self::on_closing
/// [`on_tick`]: Self::on_tick
/// [`dispose`]: Self::dispose
pub struct Magnifier<B: MagBackend, T: RefreshTimer> {
    backend: B,
    timer: T,
    host: B::Window,
    surface: Option<B::Surface>,
    /// True once the platform subsystem accepted initialization; reset only
    /// by teardown, which balances it with exactly one uninitialize.
    initialized: bool,
    /// Terminal latch: set by teardown, checked by every entry point.
    released: bool,
    magnification: f32,
    /// Last known client-area geometry, refreshed on every resize event and
    /// reused by every tick in between.
    client: Rect,
}

impl<B: MagBackend, T: RefreshTimer> Magnifier<B, T> {
    /// Bind a magnifier to `host` and bring it up.
    ///
    /// Fails with [`LoupeError::MissingHostWindow`] before touching any
    /// native resource if `host` is absent or already destroyed.  If the
    /// subsystem declines to initialize, the returned controller is
    /// permanently inert (no surface, no ticking) but safely disposable.
    pub fn new(backend: B, timer: T, host: B::Window) -> Result<Self> {
        if !backend.window_exists(host) {
            return Err(LoupeError::MissingHostWindow);
        }

        let mut magnifier = Self {
            backend,
            timer,
            host,
            surface: None,
            initialized: false,
            released: false,
            magnification: DEFAULT_MAGNIFICATION,
            client: Rect::default(),
        };

        magnifier.initialized = magnifier.backend.init_subsystem();
        if magnifier.initialized {
            magnifier.setup();
            magnifier.timer.start(MIN_TICK_INTERVAL_MS);
        } else {
            #[cfg(debug_assertions)]
            eprintln!("[loupe] magnification subsystem unavailable; controller is inert");
        }

        Ok(magnifier)
    }

    /// One-time surface bring-up after successful subsystem initialization.
    ///
    /// A creation failure leaves `surface` as `None`: a silent, non-fatal
    /// degraded state in which every later operation is a no-op while the
    /// subsystem stays initialized for the balanced uninitialize at disposal.
    fn setup(&mut self) {
        self.client = self.backend.client_rect(self.host);
        self.backend.make_opaque(self.host);

        let bounds = Rect::of_size(self.client.width(), self.client.height());
        self.surface = self.backend.create_surface(self.host, bounds);

        match self.surface {
            Some(surface) => {
                let _ = self.backend.set_transform(surface, self.magnification);
            }
            None => {
                #[cfg(debug_assertions)]
                eprintln!("[loupe] magnification surface creation failed; running degraded");
            }
        }
    }

    // ── Host-window notifications ─────────────────────────────────────────────

    /// React to a host-window resize: refresh the cached client rectangle
    /// and, if a surface exists, resize it to exactly fill the client area.
    pub fn on_resize(&mut self) {
        if self.released {
            return;
        }
        self.client = self.backend.client_rect(self.host);
        if let Some(surface) = self.surface {
            let bounds = Rect::of_size(self.client.width(), self.client.height());
            let _ = self.backend.set_surface_bounds(surface, bounds);
        }
    }

    /// React to the host window starting to close: stop ticking.  Surface and
    /// subsystem stay intact; full teardown is reserved for [`dispose`].
    ///
    /// [`dispose`]: Self::dispose
    pub fn on_closing(&mut self) {
        self.timer.stop();
    }

    /// One refresh tick: recompute the capture rectangle around the pointer
    /// and push it to the surface.
    pub fn on_tick(&mut self) {
        if !self.initialized {
            return;
        }
        let Some(surface) = self.surface else {
            return;
        };

        let cursor = self.backend.cursor_pos();
        let (screen_w, screen_h) = self.backend.screen_size();
        let source = source_rect(
            cursor,
            self.client.width(),
            self.client.height(),
            self.magnification,
            screen_w,
            screen_h,
        );

        // The host can outlive its window; that is a normal end-of-life
        // condition, not a fault.  Stop ticking and leave state untouched.
        if !self.backend.window_exists(self.host) {
            self.timer.stop();
            return;
        }

        let _ = self.backend.set_source_rect(surface, source);

        // Reclaim topmost status, to prevent unmagnified popups (menus and
        // the like) from remaining in view over the surface.
        self.backend.raise_topmost(self.host);

        // Force a repaint so content is not left stale between captures.
        self.backend.invalidate(surface);
    }

    // ── Magnification factor ──────────────────────────────────────────────────

    /// The current zoom factor.
    pub fn magnification(&self) -> f32 {
        self.magnification
    }

    /// Change the zoom factor.
    ///
    /// Rejects zero, negative, and non-finite values.  Setting the current
    /// value again is a no-op (no native call).  The new factor is stored
    /// even while the controller is inert or degraded; the transform is only
    /// pushed when a surface exists.
    pub fn set_magnification(&mut self, value: f32) -> Result<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(LoupeError::InvalidMagnification { value });
        }
        if value == self.magnification {
            return Ok(());
        }

        self.magnification = value;
        if let Some(surface) = self.surface {
            let _ = self.backend.set_transform(surface, value);
        }
        Ok(())
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    /// Tear down the surface and the subsystem and release the timer.
    ///
    /// Idempotent: calling it again, or after a partial/failed setup, does
    /// nothing further and never double-releases the subsystem.
    pub fn dispose(&mut self) {
        self.teardown(true);
    }

    /// Shared teardown routine for both disposal tiers.  `disposing` is true
    /// on the explicit path only; the reclamation path must not release the
    /// timer object itself.
    fn teardown(&mut self, disposing: bool) {
        self.timer.stop();
        if disposing {
            self.timer.release();
        }
        if let Some(surface) = self.surface.take() {
            self.backend.destroy_surface(surface);
        }
        if self.initialized {
            self.backend.uninit_subsystem();
            self.initialized = false;
        }
        self.released = true;
    }
}

impl<B: MagBackend, T: RefreshTimer> Drop for Magnifier<B, T> {
    fn drop(&mut self) {
        if !self.released {
            self.teardown(false);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    // A recording backend: configurable failure points, call log shared with
    // the test through an Rc so it survives the controller taking ownership.
    #[derive(Debug)]
    struct BackendState {
        init_ok: bool,
        create_ok: bool,
        host_alive: bool,
        cursor: Point,
        screen: (i32, i32),
        client: Rect,
        init_calls: u32,
        uninit_calls: u32,
        create_calls: u32,
        destroy_calls: u32,
        opaque_calls: u32,
        topmost_calls: u32,
        invalidate_calls: u32,
        transforms: Vec<f32>,
        sources: Vec<Rect>,
        bounds: Vec<Rect>,
    }

    impl Default for BackendState {
        fn default() -> Self {
            Self {
                init_ok: true,
                create_ok: true,
                host_alive: true,
                cursor: Point { x: 400, y: 300 },
                screen: (1920, 1080),
                client: Rect::of_size(800, 600),
                init_calls: 0,
                uninit_calls: 0,
                create_calls: 0,
                destroy_calls: 0,
                opaque_calls: 0,
                topmost_calls: 0,
                invalidate_calls: 0,
                transforms: Vec::new(),
                sources: Vec::new(),
                bounds: Vec::new(),
            }
        }
    }

    struct MockBackend(Rc<RefCell<BackendState>>);

    impl MagBackend for MockBackend {
        type Window = u32;
        type Surface = u32;

        fn init_subsystem(&mut self) -> bool {
            let mut s = self.0.borrow_mut();
            s.init_calls += 1;
            s.init_ok
        }

        fn uninit_subsystem(&mut self) {
            self.0.borrow_mut().uninit_calls += 1;
        }

        fn create_surface(&mut self, _parent: u32, bounds: Rect) -> Option<u32> {
            let mut s = self.0.borrow_mut();
            s.create_calls += 1;
            s.bounds.push(bounds);
            if s.create_ok {
                Some(7)
            } else {
                None
            }
        }

        fn destroy_surface(&mut self, _surface: u32) {
            self.0.borrow_mut().destroy_calls += 1;
        }

        fn set_transform(&mut self, _surface: u32, scale: f32) -> bool {
            self.0.borrow_mut().transforms.push(scale);
            true
        }

        fn set_source_rect(&mut self, _surface: u32, source: Rect) -> bool {
            self.0.borrow_mut().sources.push(source);
            true
        }

        fn set_surface_bounds(&mut self, _surface: u32, bounds: Rect) -> bool {
            self.0.borrow_mut().bounds.push(bounds);
            true
        }

        fn invalidate(&mut self, _surface: u32) {
            self.0.borrow_mut().invalidate_calls += 1;
        }

        fn window_exists(&self, window: u32) -> bool {
            window != 0 && self.0.borrow().host_alive
        }

        fn client_rect(&self, _window: u32) -> Rect {
            self.0.borrow().client
        }

        fn make_opaque(&mut self, _window: u32) {
            self.0.borrow_mut().opaque_calls += 1;
        }

        fn raise_topmost(&mut self, _window: u32) {
            self.0.borrow_mut().topmost_calls += 1;
        }

        fn cursor_pos(&self) -> Point {
            self.0.borrow().cursor
        }

        fn screen_size(&self) -> (i32, i32) {
            self.0.borrow().screen
        }
    }

    #[derive(Debug, Default)]
    struct TimerState {
        running: bool,
        start_calls: u32,
        released: bool,
        interval: u32,
    }

    struct MockTimer(Rc<RefCell<TimerState>>);

    impl RefreshTimer for MockTimer {
        fn start(&mut self, interval_ms: u32) {
            let mut t = self.0.borrow_mut();
            t.running = true;
            t.start_calls += 1;
            t.interval = interval_ms;
        }

        fn stop(&mut self) {
            self.0.borrow_mut().running = false;
        }

        fn release(&mut self) {
            self.0.borrow_mut().released = true;
        }
    }

    const HOST: u32 = 1;

    fn rig() -> (Rc<RefCell<BackendState>>, Rc<RefCell<TimerState>>) {
        (
            Rc::new(RefCell::new(BackendState::default())),
            Rc::new(RefCell::new(TimerState::default())),
        )
    }

    fn magnifier(
        backend: &Rc<RefCell<BackendState>>,
        timer: &Rc<RefCell<TimerState>>,
    ) -> Magnifier<MockBackend, MockTimer> {
        Magnifier::new(MockBackend(Rc::clone(backend)), MockTimer(Rc::clone(timer)), HOST)
            .expect("construction")
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn rejects_absent_host_window_before_any_native_call() {
        let (backend, timer) = rig();
        backend.borrow_mut().host_alive = false;

        let result = Magnifier::new(MockBackend(Rc::clone(&backend)), MockTimer(timer), HOST);
        assert!(matches!(result, Err(LoupeError::MissingHostWindow)));
        // Fail-fast: no partially constructed native resource.
        assert_eq!(backend.borrow().init_calls, 0);
        assert_eq!(backend.borrow().create_calls, 0);
    }

    #[test]
    fn successful_construction_brings_up_surface_and_timer() {
        let (backend, timer) = rig();
        let m = magnifier(&backend, &timer);

        let b = backend.borrow();
        assert_eq!(b.init_calls, 1);
        assert_eq!(b.opaque_calls, 1);
        assert_eq!(b.create_calls, 1);
        // Surface fills the client area at the origin.
        assert_eq!(b.bounds[0], Rect::of_size(800, 600));
        // Initial transform pushes the default factor.
        assert_eq!(b.transforms, vec![DEFAULT_MAGNIFICATION]);
        drop(b);

        assert!(timer.borrow().running);
        assert_eq!(timer.borrow().interval, MIN_TICK_INTERVAL_MS);
        assert_eq!(m.magnification(), DEFAULT_MAGNIFICATION);
    }

    #[test]
    fn failed_init_leaves_controller_inert_for_all_operations() {
        let (backend, timer) = rig();
        backend.borrow_mut().init_ok = false;
        let mut m = magnifier(&backend, &timer);

        // No surface, no ticking.
        assert_eq!(backend.borrow().create_calls, 0);
        assert!(!timer.borrow().running);
        assert_eq!(timer.borrow().start_calls, 0);

        // Any later sequence of events stays a no-op on the native side.
        m.on_resize();
        m.on_tick();
        m.set_magnification(3.0).unwrap();
        m.on_tick();

        let b = backend.borrow();
        assert_eq!(b.create_calls, 0);
        assert!(b.transforms.is_empty());
        assert!(b.sources.is_empty());
        drop(b);

        // The factor is still stored for the getter.
        assert_eq!(m.magnification(), 3.0);
    }

    #[test]
    fn failed_surface_creation_degrades_but_keeps_subsystem_balanced() {
        let (backend, timer) = rig();
        backend.borrow_mut().create_ok = false;
        let mut m = magnifier(&backend, &timer);

        m.on_tick();
        assert!(backend.borrow().sources.is_empty());
        assert!(backend.borrow().transforms.is_empty());

        m.dispose();
        let b = backend.borrow();
        assert_eq!(b.destroy_calls, 0, "no surface to destroy");
        assert_eq!(b.uninit_calls, 1, "subsystem still uninitialized once");
    }

    // ── Refresh ───────────────────────────────────────────────────────────────

    #[test]
    fn tick_pushes_clamped_source_and_reasserts_topmost() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        m.on_tick();

        let b = backend.borrow();
        // 800×600 at 2.0× centered on (400, 300): no clamping needed.
        assert_eq!(
            b.sources,
            vec![Rect {
                left: 200,
                top: 150,
                right: 600,
                bottom: 450
            }]
        );
        assert_eq!(b.topmost_calls, 1);
        assert_eq!(b.invalidate_calls, 1);
    }

    #[test]
    fn tick_clamps_at_screen_corner() {
        let (backend, timer) = rig();
        backend.borrow_mut().cursor = Point { x: 10, y: 10 };
        let mut m = magnifier(&backend, &timer);

        m.on_tick();
        assert_eq!(
            backend.borrow().sources[0],
            Rect {
                left: 0,
                top: 0,
                right: 400,
                bottom: 300
            }
        );
    }

    #[test]
    fn tick_uses_cached_client_rect_between_resizes() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        // The window shrank but no resize notification arrived yet: the tick
        // keeps using the cached 800×600 rectangle.
        backend.borrow_mut().client = Rect::of_size(400, 200);
        m.on_tick();
        assert_eq!(backend.borrow().sources[0].right - backend.borrow().sources[0].left, 400);

        m.on_resize();
        m.on_tick();
        let b = backend.borrow();
        assert_eq!(b.sources[1].right - b.sources[1].left, 200);
    }

    #[test]
    fn tick_stops_timer_when_host_window_is_gone() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        backend.borrow_mut().host_alive = false;
        m.on_tick();

        assert!(!timer.borrow().running);
        assert!(backend.borrow().sources.is_empty());
        assert_eq!(backend.borrow().topmost_calls, 0);
    }

    // ── Resize / closing ──────────────────────────────────────────────────────

    #[test]
    fn resize_refits_surface_to_new_client_area() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        backend.borrow_mut().client = Rect::of_size(1024, 768);
        m.on_resize();

        let b = backend.borrow();
        assert_eq!(b.bounds.last().copied(), Some(Rect::of_size(1024, 768)));
    }

    #[test]
    fn closing_stops_ticks_but_keeps_resources() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        m.on_closing();

        assert!(!timer.borrow().running);
        let b = backend.borrow();
        assert_eq!(b.uninit_calls, 0);
        assert_eq!(b.destroy_calls, 0);
        drop(b);

        // Ticks can still be delivered by a queued message; they keep working
        // because only disposal tears the surface down.
        m.on_tick();
        assert_eq!(backend.borrow().sources.len(), 1);
    }

    // ── Magnification setter ──────────────────────────────────────────────────

    #[test]
    fn setting_equal_value_issues_no_transform() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        m.set_magnification(DEFAULT_MAGNIFICATION).unwrap();
        assert_eq!(backend.borrow().transforms.len(), 1, "only the setup transform");

        m.set_magnification(2.5).unwrap();
        assert_eq!(backend.borrow().transforms.as_slice(), &[2.0, 2.5]);
    }

    #[test]
    fn setter_rejects_non_positive_and_non_finite_factors() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = m.set_magnification(bad).unwrap_err();
            assert!(matches!(err, LoupeError::InvalidMagnification { .. }));
        }

        // Stored value and native state are untouched.
        assert_eq!(m.magnification(), DEFAULT_MAGNIFICATION);
        assert_eq!(backend.borrow().transforms.len(), 1);
    }

    // ── Disposal ──────────────────────────────────────────────────────────────

    #[test]
    fn dispose_is_idempotent() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        m.dispose();
        m.dispose();

        let b = backend.borrow();
        assert_eq!(b.destroy_calls, 1);
        assert_eq!(b.uninit_calls, 1);
        drop(b);
        assert!(!timer.borrow().running);
        assert!(timer.borrow().released);
    }

    #[test]
    fn drop_after_dispose_releases_nothing_further() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);

        m.dispose();
        drop(m);

        assert_eq!(backend.borrow().uninit_calls, 1);
        assert_eq!(backend.borrow().destroy_calls, 1);
    }

    #[test]
    fn drop_without_dispose_tears_down_but_skips_timer_release() {
        let (backend, timer) = rig();
        let m = magnifier(&backend, &timer);

        drop(m);

        let b = backend.borrow();
        assert_eq!(b.destroy_calls, 1);
        assert_eq!(b.uninit_calls, 1);
        drop(b);
        // Reclamation tier: the timer is stopped but its object is not
        // released from this context.
        assert!(!timer.borrow().running);
        assert!(!timer.borrow().released);
    }

    #[test]
    fn dispose_after_failed_init_never_uninitializes() {
        let (backend, timer) = rig();
        backend.borrow_mut().init_ok = false;
        let mut m = magnifier(&backend, &timer);

        m.dispose();
        m.dispose();

        assert_eq!(backend.borrow().uninit_calls, 0);
        assert!(timer.borrow().released);
    }

    #[test]
    fn events_after_dispose_are_inert() {
        let (backend, timer) = rig();
        let mut m = magnifier(&backend, &timer);
        m.dispose();

        let before = backend.borrow().bounds.len();
        m.on_resize();
        m.on_tick();
        assert_eq!(backend.borrow().bounds.len(), before);
        assert!(backend.borrow().sources.is_empty());
    }
}
