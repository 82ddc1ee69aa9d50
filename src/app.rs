//! App: terminal init, main loop, tick and key handling.

use crate::game::{Screen, Session};
use crate::highscores::HighScoreStore;
use crate::input::{Action, InputState};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Render pacing (~60 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// After a stall (suspended terminal, slow draw), run at most this many steps before resyncing.
const MAX_CATCH_UP_STEPS: u32 = 5;

pub struct App {
    session: Session,
    theme: Theme,
    input: InputState,
    tick_interval: Duration,
    last_tick: Instant,
    no_animation: bool,
    /// TachyonFX game-over flash (created when the game-over screen is first drawn).
    flash: Option<Effect>,
    /// Last time we processed the flash (for delta).
    flash_time: Option<Instant>,
}

impl App {
    pub fn new(
        args: &Args,
        config: GameConfig,
        theme: Theme,
        store: Box<dyn HighScoreStore>,
    ) -> Self {
        let mut session = Session::new(config, store);
        if args.no_menu {
            session.start();
        }
        let rate = if args.tick_rate.is_finite() && args.tick_rate > 0.0 {
            args.tick_rate
        } else {
            log::warn!("invalid tick rate {}, using 60", args.tick_rate);
            60.0
        };
        Self {
            session,
            theme,
            input: InputState::default(),
            tick_interval: Duration::from_secs_f64(1.0 / rate),
            last_tick: Instant::now(),
            no_animation: args.no_animation,
            flash: None,
            flash_time: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        with_restore(
            || {
                let mut stdout = std::io::stdout();
                execute!(stdout, EnterAlternateScreen)?;
                // Release events let held arrow keys move smoothly; not every terminal supports them.
                let _ = execute!(
                    stdout,
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
                );
                let mut terminal =
                    DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
                let result = self.run_loop(&mut terminal);
                let _ = terminal.show_cursor();
                result
            },
            || {
                let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
                let left = execute!(std::io::stdout(), LeaveAlternateScreen);
                disable_raw_mode()?;
                left?;
                Ok(())
            },
        )
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_tick = Instant::now();
        loop {
            let now = Instant::now();
            if self.session.screen != Screen::GameOver {
                self.flash = None;
                self.flash_time = None;
            }
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &self.session,
                    &self.theme,
                    &mut self.flash,
                    &mut self.flash_time,
                    now,
                    self.no_animation,
                )
            })?;

            let timeout = FRAME_DURATION.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    let action = self.input.handle_key(key, Instant::now());
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let quit = action == Action::Quit
                        || (action == Action::Menu && self.session.screen == Screen::Menu);
                    if quit {
                        log::info!("quit requested");
                        return Ok(());
                    }
                }
            }

            self.run_due_steps();
        }
    }

    /// Advance the session by every fixed step that is due.
    fn run_due_steps(&mut self) {
        let mut steps = 0;
        while self.last_tick.elapsed() >= self.tick_interval {
            if steps == MAX_CATCH_UP_STEPS {
                self.last_tick = Instant::now();
                break;
            }
            self.last_tick += self.tick_interval;
            let frame = self.input.take_frame(Instant::now());
            let before = self.session.screen;
            self.session.step(&frame);
            if self.session.screen != before {
                self.input.clear();
            }
            steps += 1;
        }
    }
}

/// Run `body`, then `restore` whether or not `body` failed. The body's error wins.
fn with_restore<T>(
    body: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let result = body();
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}
