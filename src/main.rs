//! Skills Breaker entry point
//!
//! On wasm the host page calls the exported [`wasm_game::mount`] with a
//! canvas id, the skill taxonomy, the current progress snapshot, and its
//! callbacks; it gets back a `GameHandle` whose methods back the overlay
//! buttons (retry, activate-all, reset, exit) and whose `dispose` tears
//! the whole session down, listeners included. Natively the binary runs
//! a short headless autopilot session for profiling and sanity checks.

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, EventTarget, HtmlCanvasElement, HtmlElement};

    use skills_breaker::renderer::SdfRenderState;
    use skills_breaker::sim::{GameEvent, GamePhase};
    use skills_breaker::skills::{SkillProgress, Taxonomy};
    use skills_breaker::{HostHooks, Session, Tuning};

    /// How long a floating feedback label stays on screen
    const FLOAT_TTL_MS: f64 = 900.0;

    /// An event listener that is removed again when dropped. Forgetting
    /// closures would leak handlers across rebuilt sessions; a mounted
    /// game must unregister everything on dispose.
    struct ListenerGuard {
        target: EventTarget,
        event: &'static str,
        closure: Closure<dyn FnMut(web_sys::Event)>,
    }

    impl ListenerGuard {
        fn attach(
            target: &EventTarget,
            event: &'static str,
            closure: Closure<dyn FnMut(web_sys::Event)>,
        ) -> Self {
            target
                .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
                .expect("failed to add listener");
            Self {
                target: target.clone(),
                event,
                closure,
            }
        }
    }

    impl Drop for ListenerGuard {
        fn drop(&mut self) {
            let _ = self.target.remove_event_listener_with_callback(
                self.event,
                self.closure.as_ref().unchecked_ref(),
            );
        }
    }

    /// Everything one mounted game owns
    struct Mounted {
        session: Session,
        render_state: Option<SdfRenderState>,
        listeners: Vec<ListenerGuard>,
        /// Floating "+N skill" labels with their expiry timestamps
        floats: Vec<(Element, f64)>,
        last_time: f64,
    }

    impl Mounted {
        /// One animation frame: advance the sim, drive the callbacks,
        /// redraw, refresh the HUD.
        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            self.last_time = time;

            let events = self.session.advance(dt);
            self.spawn_floats(&events, time);
            self.expire_floats(time);

            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(self.session.state(), time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }

            self.update_hud();
        }

        fn spawn_floats(&mut self, events: &[GameEvent], now: f64) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let Some(container) = document.get_element_by_id("floats") else {
                return;
            };
            for event in events {
                let (text, at) = match event {
                    GameEvent::PointsAwarded { skill, delta, at } => {
                        let name = &self.session.state().book.skill(*skill).name;
                        (format!("{name} +{delta}"), *at)
                    }
                    GameEvent::EndlessScored { total, at } => (format!("{total}"), *at),
                    GameEvent::CategoryCleared { category, at } => {
                        let name = &self.session.state().book.category(*category).name;
                        (format!("{name} ✓"), *at)
                    }
                    _ => continue,
                };
                if let Ok(el) = document.create_element("div") {
                    let _ = el.set_attribute("class", "sb-float");
                    el.set_text_content(Some(&text));
                    if let Some(html) = el.dyn_ref::<HtmlElement>() {
                        let style = html.style();
                        let _ = style.set_property("left", &format!("{}px", at.x));
                        let _ = style.set_property("top", &format!("{}px", at.y));
                    }
                    let _ = container.append_child(&el);
                    self.floats.push((el, now + FLOAT_TTL_MS));
                }
            }
        }

        fn expire_floats(&mut self, now: f64) {
            self.floats.retain(|(el, expires)| {
                if now >= *expires {
                    el.remove();
                    false
                } else {
                    true
                }
            });
        }

        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let state = self.session.state();

            if let Some(el) = hud_value(&document, "#hud-lives .hud-value") {
                el.set_text_content(Some(&state.lives.to_string()));
            }
            if self.session.endless() {
                if let Some(el) = hud_value(&document, "#hud-score .hud-value") {
                    el.set_text_content(Some(&state.endless_score.to_string()));
                }
            }

            set_visible(&document, "launch-hint", state.phase == GamePhase::Ready);
            set_visible(&document, "game-over", state.phase == GamePhase::GameOver);
            set_visible(&document, "win-screen", state.phase == GamePhase::Win);
        }
    }

    fn hud_value(document: &Document, selector: &str) -> Option<Element> {
        document.query_selector(selector).ok().flatten()
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// The object handed back to the host page. All overlay buttons route
    /// through here; `dispose` is idempotent and final.
    #[wasm_bindgen]
    pub struct GameHandle {
        inner: Rc<RefCell<Mounted>>,
    }

    #[wasm_bindgen]
    impl GameHandle {
        /// Current phase as the host-facing string
        pub fn phase(&self) -> String {
            match self.inner.borrow().session.phase() {
                GamePhase::Ready => "ready",
                GamePhase::Playing => "playing",
                GamePhase::GameOver => "gameOver",
                GamePhase::Win => "win",
            }
            .to_string()
        }

        /// Retry from game over (or replay after a win)
        pub fn retry(&self) {
            self.inner.borrow_mut().session.retry();
        }

        /// Report the terminal outcome through `on_game_end`
        pub fn finish(&self) {
            self.inner.borrow_mut().session.finish();
        }

        /// Start the scripted bulk-completion walk
        pub fn activate_all(&self) {
            self.inner.borrow_mut().session.activate_all();
        }

        /// Endless mode only: wipe progress and restart
        pub fn reset_progress(&self) {
            self.inner.borrow_mut().session.reset_progress();
        }

        /// Tear the session down: stops the animation loop, strands all
        /// deferred actions, removes every DOM listener.
        pub fn dispose(&self) {
            let mut inner = self.inner.borrow_mut();
            inner.session.dispose();
            inner.listeners.clear();
            for (el, _) in inner.floats.drain(..) {
                el.remove();
            }
        }
    }

    /// Mount the game onto `canvas_id`. `skills_json` is the ordered
    /// category array, `progress_json` a map from skill name to
    /// `{points, activated}`, `has_won` selects endless mode, and
    /// `tuning_json` an optional partial balance override.
    #[wasm_bindgen]
    pub async fn mount(
        canvas_id: String,
        skills_json: String,
        progress_json: String,
        has_won: bool,
        tuning_json: Option<String>,
        on_point_update: js_sys::Function,
        on_game_end: js_sys::Function,
        on_activate_all: js_sys::Function,
        on_reset_progress: js_sys::Function,
    ) -> Result<GameHandle, JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let taxonomy = Taxonomy::from_json(&skills_json)
            .map_err(|e| JsValue::from_str(&format!("bad skills json: {e}")))?;
        let progress: HashMap<String, SkillProgress> = serde_json::from_str(&progress_json)
            .map_err(|e| JsValue::from_str(&format!("bad progress json: {e}")))?;
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("bad tuning json: {e}")))?,
            None => Tuning::default(),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(&canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas not found"))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;

        // Backing store at device resolution; the sim runs in CSS px
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let field_w = client_w as f32;
        let field_h = skills_breaker::field_height(field_w);
        let width = (client_w as f64 * dpr) as u32;
        let height = (field_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        if let Some(html) = canvas.dyn_ref::<HtmlElement>() {
            let _ = html.style().set_property("height", &format!("{field_h}px"));
        }

        let hooks = HostHooks {
            on_point_update: Box::new(move |name, delta| {
                let _ = on_point_update.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(name),
                    &JsValue::from_f64(delta as f64),
                );
            }),
            on_game_end: Box::new(move |win| {
                let _ = on_game_end.call1(&JsValue::NULL, &JsValue::from_bool(win));
            }),
            on_activate_all: Box::new(move || {
                let _ = on_activate_all.call0(&JsValue::NULL);
            }),
            on_reset_progress: Box::new(move || {
                let _ = on_reset_progress.call0(&JsValue::NULL);
            }),
        };

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(seed, field_w, taxonomy, &progress, has_won, tuning, hooks);
        log::info!("Skills Breaker mounted: seed {seed}, field {field_w}x{field_h}");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface: {e}")))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| JsValue::from_str("no adapter"))?;
        let render_state = SdfRenderState::new(surface, &adapter, width, height).await;

        let mounted = Rc::new(RefCell::new(Mounted {
            session,
            render_state: Some(render_state),
            listeners: Vec::new(),
            floats: Vec::new(),
            last_time: 0.0,
        }));

        setup_input_handlers(&canvas, &window, mounted.clone());
        schedule_frame(mounted.clone());

        Ok(GameHandle { inner: mounted })
    }

    fn setup_input_handlers(
        canvas: &HtmlCanvasElement,
        window: &web_sys::Window,
        mounted: Rc<RefCell<Mounted>>,
    ) {
        let mut listeners = Vec::new();

        // Mouse move tracks the paddle absolutely
        {
            let mounted = mounted.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let event: web_sys::MouseEvent = event.unchecked_into();
                mounted
                    .borrow_mut()
                    .session
                    .input_mut()
                    .point_to(event.offset_x() as f32);
            });
            listeners.push(ListenerGuard::attach(canvas, "mousemove", closure));
        }

        // Mouse down launches
        {
            let mounted = mounted.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                mounted.borrow_mut().session.input_mut().press();
            });
            listeners.push(ListenerGuard::attach(canvas, "mousedown", closure));
        }

        // Touch move tracks, touch start tracks and launches
        {
            let mounted = mounted.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                let event: web_sys::TouchEvent = event.unchecked_into();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    mounted.borrow_mut().session.input_mut().point_to(x);
                }
            });
            listeners.push(ListenerGuard::attach(canvas, "touchmove", closure));
        }
        {
            let mounted = mounted.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                let event: web_sys::TouchEvent = event.unchecked_into();
                let mut m = mounted.borrow_mut();
                m.session.input_mut().press();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    m.session.input_mut().point_to(x);
                }
            });
            listeners.push(ListenerGuard::attach(canvas, "touchstart", closure));
        }

        // Keyboard on the window so the canvas needs no focus
        {
            let mounted = mounted.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let event: web_sys::KeyboardEvent = event.unchecked_into();
                if mounted
                    .borrow_mut()
                    .session
                    .input_mut()
                    .key_down(&event.key())
                {
                    event.prevent_default();
                }
            });
            listeners.push(ListenerGuard::attach(window, "keydown", closure));
        }
        {
            let mounted = mounted.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let event: web_sys::KeyboardEvent = event.unchecked_into();
                mounted.borrow_mut().session.input_mut().key_up(&event.key());
            });
            listeners.push(ListenerGuard::attach(window, "keyup", closure));
        }

        mounted.borrow_mut().listeners = listeners;
    }

    /// Self-rescheduling animation frame. Stops rescheduling once the
    /// session is disposed, which ends the loop without an explicit
    /// cancel handle.
    fn schedule_frame(mounted: Rc<RefCell<Mounted>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once_into_js(move |time: f64| {
            if mounted.borrow().session.disposed() {
                return;
            }
            mounted.borrow_mut().frame(time);
            schedule_frame(mounted);
        });
        let _ = window.request_animation_frame(closure.unchecked_ref());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::collections::HashMap;

    use skills_breaker::consts::SIM_DT;
    use skills_breaker::sim::{GameEvent, GamePhase};
    use skills_breaker::skills::Taxonomy;
    use skills_breaker::{HostHooks, Session, Tuning};

    env_logger::init();
    log::info!("Skills Breaker (native) headless autopilot");

    let taxonomy = Taxonomy::from_json(
        r##"[
            {"name": "Languages", "color": "#e0218a", "skills": ["Python", "Rust", "SQL"]},
            {"name": "ML/AI", "color": "#0abdc6", "skills": ["TensorFlow", "PyTorch"]},
            {"name": "Tools", "color": "#9333ea", "skills": ["Docker", "Git"]}
        ]"##,
    )
    .expect("demo taxonomy");

    let mut session = Session::new(
        1234,
        800.0,
        taxonomy,
        &HashMap::new(),
        false,
        Tuning::default(),
        HostHooks::default(),
    );

    // Autopilot: keep the paddle under the lowest descending ball and run
    // for up to two simulated minutes.
    session.input_mut().press();
    let mut awards = 0u32;
    let mut lives_lost = 0u32;
    for _ in 0..(120 * 60) {
        let target = session
            .state()
            .balls
            .iter()
            .filter(|b| b.vel.y > 0.0)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|b| b.pos.x);
        if let Some(x) = target {
            session.input_mut().point_to(x);
        }
        if session.phase() == GamePhase::Ready {
            session.input_mut().press();
        }

        for event in session.advance(SIM_DT) {
            match event {
                GameEvent::PointsAwarded { skill, delta, .. } => {
                    awards += 1;
                    let name = &session.state().book.skill(skill).name;
                    log::debug!("award {name} +{delta}");
                }
                GameEvent::LifeLost { remaining } => {
                    lives_lost += 1;
                    log::info!("life lost, {remaining} remaining");
                }
                GameEvent::PhaseChanged { phase } => log::info!("phase -> {phase:?}"),
                _ => {}
            }
        }

        if matches!(session.phase(), GamePhase::GameOver | GamePhase::Win) {
            break;
        }
    }

    let state = session.state();
    let activated = (0..state.book.skill_count())
        .filter(|&i| state.book.skill(i).activated)
        .count();
    println!(
        "autopilot done: phase {:?}, {} brick awards, {} lives lost, {}/{} skills activated",
        state.phase,
        awards,
        lives_lost,
        activated,
        state.book.skill_count()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the exported `mount`; this satisfies the bin target
}
