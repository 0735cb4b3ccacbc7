//! Draws a [`ParticleField`] onto a full-viewport canvas, one step per
//! display frame.

use crate::particles::{ParticleConfig, ParticleField};
use gloo_events::EventListener;
use gloo_render::{request_animation_frame, AnimationFrame};
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

fn viewport_size() -> (f64, f64) {
    let window = gloo_utils::window();
    let read = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    (read(window.inner_width()), read(window.inner_height()))
}

struct Inner {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    field: RefCell<ParticleField>,
    frame: RefCell<Option<AnimationFrame>>,
    listeners: RefCell<Vec<EventListener>>,
    running: Cell<bool>,
}

impl Inner {
    fn fit_viewport(&self) {
        let (width, height) = viewport_size();
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.field
            .borrow_mut()
            .resize(width, height, &mut rand::rng());
        debug!("Particle canvas resized to {}x{}", width, height);
    }

    fn draw(&self) {
        let field = self.field.borrow();
        let ctx = &self.context;
        ctx.clear_rect(0.0, 0.0, field.width(), field.height());
        for p in field.particles() {
            ctx.set_global_alpha(p.opacity);
            ctx.set_fill_style_str(p.color);
            ctx.begin_path();
            if ctx.arc(p.x, p.y, p.radius, 0.0, TAU).is_ok() {
                ctx.fill();
            }
        }
        ctx.set_global_alpha(1.0);
    }

    fn schedule(self: &Rc<Self>) {
        let next = Rc::clone(self);
        let handle = request_animation_frame(move |_| {
            if !next.running.get() {
                return;
            }
            next.field.borrow_mut().step();
            next.draw();
            next.schedule();
        });
        *self.frame.borrow_mut() = Some(handle);
    }
}

/// Running particle animation. Stops when [`stop`](Self::stop) is called
/// or the animator is dropped.
pub struct ParticleAnimator {
    inner: Rc<Inner>,
}

impl ParticleAnimator {
    pub fn start(canvas: HtmlCanvasElement) -> Result<Self, String> {
        let context = canvas
            .get_context("2d")
            .map_err(|e| crate::browser::describe_js(&e))?
            .ok_or_else(|| "2d canvas context unavailable".to_string())?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "unexpected canvas context type".to_string())?;

        let (width, height) = viewport_size();
        let field = ParticleField::new(ParticleConfig::default(), width, height, &mut rand::rng())
            .map_err(|e| e.to_string())?;

        let inner = Rc::new(Inner {
            canvas,
            context,
            field: RefCell::new(field),
            frame: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            running: Cell::new(true),
        });
        inner.fit_viewport();
        Self::listen(&inner);
        inner.schedule();
        Ok(Self { inner })
    }

    // Listeners hold weak handles so they never keep the animation alive
    fn listen(inner: &Rc<Inner>) {
        let on_move = {
            let weak: Weak<Inner> = Rc::downgrade(inner);
            EventListener::new(&gloo_utils::document(), "mousemove", move |event| {
                let (Some(inner), Some(event)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>())
                else {
                    return;
                };
                inner
                    .field
                    .borrow_mut()
                    .set_pointer_target(event.client_x() as f64, event.client_y() as f64);
            })
        };
        let on_resize = {
            let weak = Rc::downgrade(inner);
            EventListener::new(&gloo_utils::window(), "resize", move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.fit_viewport();
                }
            })
        };
        inner.listeners.borrow_mut().extend([on_move, on_resize]);
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Cancel the pending frame and detach listeners.
    pub fn stop(&self) {
        if self.inner.running.replace(false) {
            debug!("Particle animation stopped");
        }
        self.inner.frame.borrow_mut().take();
        self.inner.listeners.borrow_mut().clear();
    }
}

impl Drop for ParticleAnimator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the animator unless the user prefers reduced motion.
pub fn start_unless_reduced_motion(canvas: HtmlCanvasElement) -> Option<ParticleAnimator> {
    if crate::page::prefers_reduced_motion() {
        debug!("Reduced motion requested, particle field disabled");
        return None;
    }
    ParticleAnimator::start(canvas)
        .map_err(|err| warn!("Particle field unavailable: {}", err))
        .ok()
}
