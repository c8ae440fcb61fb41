//! Brickwave entry point
//!
//! Handles platform-specific initialization and runs the game loop. All
//! gameplay lives in `brickwave::sim`; this file only draws state and
//! feeds input back in.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use brickwave::consts::*;
    use brickwave::sim::{
        Block, BlockKind, GameEvent, GamePhase, ParticleColor, PowerUpKind, SimState, Variant, step,
    };

    /// Game instance holding all state
    struct Game {
        state: SimState,
        variant: Variant,
        ctx: CanvasRenderingContext2d,
        accumulator: f32,
        last_time: f64,
    }

    impl Game {
        fn new(variant: Variant, seed: u64, ctx: CanvasRenderingContext2d) -> Self {
            Self {
                state: SimState::new(variant, seed),
                variant,
                ctx,
                accumulator: 0.0,
                last_time: 0.0,
            }
        }

        /// Run simulation ticks against the fixed-timestep accumulator
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                for event in step(&mut self.state, SIM_DT) {
                    match event {
                        GameEvent::LevelComplete { new_level } => {
                            log::info!("level complete, now at {new_level}");
                        }
                        GameEvent::GameOver { final_score } => {
                            log::info!("game over, final score {final_score}");
                        }
                        _ => {}
                    }
                }
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
        }

        /// Restart with a fresh seed
        fn restart(&mut self, seed: u64) {
            self.state = SimState::new(self.variant, seed);
            self.accumulator = 0.0;
        }

        /// Render the current frame
        fn render(&self) {
            let ctx = &self.ctx;
            let cfg = &self.state.config;
            ctx.clear_rect(0.0, 0.0, cfg.width as f64, cfg.height as f64);

            for block in self.state.blocks.iter().filter(|b| b.visible) {
                self.draw_block(block);
            }

            // Paddle
            ctx.set_fill_style_str("#4facfe");
            let p = &self.state.paddle;
            ctx.fill_rect(p.x as f64, p.y as f64, p.width as f64, p.height as f64);

            for item in &self.state.power_ups {
                ctx.set_fill_style_str(power_up_color(item.kind));
                ctx.fill_rect(
                    item.pos.x as f64,
                    item.pos.y as f64,
                    item.size as f64,
                    item.size as f64,
                );
            }

            for ball in &self.state.balls {
                // Fading trail, oldest and smallest first
                let len = ball.trail.len();
                for (i, point) in ball.trail.iter().enumerate() {
                    let t = i as f64 / len as f64;
                    ctx.set_global_alpha(t * 0.5);
                    ctx.begin_path();
                    let _ = ctx.arc(
                        point.x as f64,
                        point.y as f64,
                        ball.radius as f64 * t,
                        0.0,
                        TAU,
                    );
                    ctx.set_fill_style_str("#fff");
                    ctx.fill();
                }
                ctx.set_global_alpha(1.0);

                ctx.begin_path();
                let _ = ctx.arc(
                    ball.pos.x as f64,
                    ball.pos.y as f64,
                    ball.radius as f64,
                    0.0,
                    TAU,
                );
                ctx.set_fill_style_str("#fff");
                ctx.fill();
            }

            for particle in &self.state.particles {
                let alpha = particle.life as f64 / particle.max_life as f64;
                ctx.set_global_alpha(alpha);
                ctx.set_fill_style_str(&particle_color(particle.color));
                ctx.begin_path();
                let _ = ctx.arc(
                    particle.pos.x as f64,
                    particle.pos.y as f64,
                    particle.size as f64,
                    0.0,
                    TAU,
                );
                ctx.fill();
            }
            ctx.set_global_alpha(1.0);
        }

        fn draw_block(&self, block: &Block) {
            let ctx = &self.ctx;
            let r = &block.rect;
            ctx.set_fill_style_str(&block_color(block));

            if block.kind == BlockKind::Spin {
                // Spin blocks rotate around their center
                ctx.save();
                let center = block.center();
                let _ = ctx.translate(center.x as f64, center.y as f64);
                let _ = ctx.rotate(block.rotation as f64);
                ctx.fill_rect(
                    -(r.w as f64) / 2.0,
                    -(r.h as f64) / 2.0,
                    r.w as f64,
                    r.h as f64,
                );
                ctx.restore();
                return;
            }

            ctx.fill_rect(r.x as f64, r.y as f64, r.w as f64, r.h as f64);
            ctx.set_stroke_style_str("#333");
            ctx.set_line_width(1.0);
            ctx.stroke_rect(r.x as f64, r.y as f64, r.w as f64, r.h as f64);
        }

        /// Push score/lives/level into the DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let set = |id: &str, value: String| {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(&value));
                }
            };
            set("score", self.state.score.to_string());
            set("lives", self.state.lives.to_string());
            set("level", self.state.level.to_string());
            set("ball-count", self.state.balls.len().to_string());
        }
    }

    fn block_color(block: &Block) -> String {
        match block.kind {
            BlockKind::Normal => format!("hsl({:.0}, 70%, 50%)", block.hue),
            BlockKind::Bomb => "#000".into(),
            BlockKind::Star => "#ffd700".into(),
            BlockKind::Spin => "#9b59b6".into(),
            BlockKind::Speed => "#f1c40f".into(),
            BlockKind::Hard => "#7f8c8d".into(),
        }
    }

    fn particle_color(color: ParticleColor) -> String {
        match color {
            ParticleColor::Block(hue) => format!("hsl({hue:.0}, 70%, 50%)"),
            ParticleColor::Spark => "#fff".into(),
            ParticleColor::Blast => "#ff0000".into(),
        }
    }

    fn power_up_color(kind: PowerUpKind) -> &'static str {
        match kind {
            PowerUpKind::BigPaddle => "#ff0000",
            PowerUpKind::MultiBall => "#0066ff",
            PowerUpKind::FastBall => "#00ff00",
            PowerUpKind::ScoreBoost => "#ffff00",
            PowerUpKind::ExtraLife => "#ffffff",
        }
    }

    /// Variant selection from the page URL (`?variant=powerups` etc.)
    fn variant_from_query(search: &str) -> Variant {
        let value = search
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("variant="));
        match value {
            Some("powerups") => Variant::PowerUps,
            Some("physics") => Variant::Physics,
            Some("special") => Variant::Special,
            _ => Variant::Classic,
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .expect("2d context unavailable")
            .expect("2d context missing")
            .dyn_into()
            .expect("not a 2d context");

        let variant = window
            .location()
            .search()
            .map(|s| variant_from_query(&s))
            .unwrap_or_default();
        let seed = js_sys::Date::now() as u64;
        log::info!("starting {variant:?} with seed {seed}");

        let game = Rc::new(RefCell::new(Game::new(variant, seed, ctx)));
        {
            let cfg = game.borrow().state.config;
            canvas.set_width(cfg.width as u32);
            canvas.set_height(cfg.height as u32);
        }

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());

        request_animation_frame(game);
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        // Keyboard: paddle velocity, space for start/pause
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.state.set_paddle_velocity(-PADDLE_SPEED),
                    "ArrowRight" | "d" | "D" => g.state.set_paddle_velocity(PADDLE_SPEED),
                    " " => match g.state.phase {
                        GamePhase::Waiting | GamePhase::GameOver => g.state.start(),
                        _ => g.state.toggle_pause(),
                    },
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if matches!(
                    event.key().as_str(),
                    "ArrowLeft" | "a" | "A" | "ArrowRight" | "d" | "D"
                ) {
                    game.borrow_mut().state.set_paddle_velocity(0.0);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse: absolute paddle positioning
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut()
                    .state
                    .set_paddle_target(event.offset_x() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .expect("no document");

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().state.start();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("pause-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().state.toggle_pause();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("reset-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
                log::info!("restarted with seed {seed}");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use brickwave::consts::SIM_DT;
    use brickwave::sim::{SimState, Variant, step};

    env_logger::init();
    log::info!("Brickwave (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    // Headless smoke run: one minute of classic play
    let mut state = SimState::new(Variant::Classic, 42);
    state.start();
    for _ in 0..3600 {
        step(&mut state, SIM_DT);
    }
    println!(
        "after 60s: score {}, lives {}, level {}",
        state.score, state.lives, state.level
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
