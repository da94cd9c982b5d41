use crate::clock::{Clock, SystemClock};
use crate::config::{load_settings, save_settings_atomic, Paths, Settings};
use crate::input::{map_key, poll_keys, Command};
use crate::model::{Notice, PetState};
use crate::render::{
    canvas_to_grid, draw_box, draw_creature, draw_creature_ascii, draw_panel, PetView, Screen,
    Viewport,
};
use crate::sim::PetAction;
use crate::storage::{load_or_init, save_atomic};
use std::cmp::{max, min};
use std::fmt::Write as _;
use std::time::{Duration, Instant};

const HELP: &str = "Keep your lumipod glowing: every stat drains each second.\n\
\n\
F Feed   +18 hunger\n\
C Clean  +16 hygiene\n\
P Play   +20 fun, costs 6 energy\n\
R Rest   +24 energy, costs 5 hunger\n\
\n\
D Claim the daily LumiSeed: +15 to all stats, +1 Glow Burst.\n\
B Start a Glow Burst: 60s of bigger gains and slower decay.\n\
\n\
Healthy stats earn score every second.\n\
Esc or H to close help.";

#[derive(Clone, Debug, Default)]
pub(crate) struct LaunchOptions {
    pub(crate) ascii: bool,
    pub(crate) no_color: bool,
    pub(crate) reset: bool,
    pub(crate) status: bool,
}

/// Owns the pet for one session and is the only place that mutates it.
pub(crate) struct Session<C: Clock> {
    pub(crate) state: PetState,
    pub(crate) clock: C,
    save_path: std::path::PathBuf,
    pub(crate) last_notice: Option<Notice>,
}

impl<C: Clock> Session<C> {
    pub(crate) fn open(paths: &Paths, clock: C, reset: bool) -> Self {
        let state = if reset {
            log::info!("reset requested, starting a fresh pet");
            PetState::new(&clock)
        } else {
            load_or_init(&paths.save_path, &clock)
        };
        let session = Self {
            state,
            clock,
            save_path: paths.save_path.clone(),
            last_notice: None,
        };
        session.persist();
        session
    }

    pub(crate) fn tick(&mut self) {
        let notices = self.state.tick(&self.clock);
        for n in &notices {
            log::info!("{n}");
        }
        if let Some(n) = notices.into_iter().last() {
            self.last_notice = Some(n);
        }
        self.persist();
    }

    pub(crate) fn act(&mut self, action: PetAction) {
        let notice = self.state.apply(action, &self.clock);
        log::info!("{notice}");
        self.last_notice = Some(notice);
        self.persist();
    }

    pub(crate) fn view(&self) -> PetView {
        PetView::capture(
            &self.state,
            self.clock.now_ms(),
            self.clock.today(),
            self.last_notice.as_ref(),
        )
    }

    /// Write-through save; a failed write only costs the latest progress.
    fn persist(&self) {
        if let Err(e) = save_atomic(&self.save_path, &self.state) {
            log::warn!("save to {} failed: {e:#}", self.save_path.display());
        }
    }
}

pub(crate) fn status_report(view: &PetView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Lumipod - day {}, score {}", view.day, view.score);
    for (stat, val) in &view.stats {
        let _ = writeln!(out, "  {:<8}{:>6.1}", stat.label(), val);
    }
    let _ = writeln!(out, "  {:<8}{:>6.1} ({:?})", "health", view.health, view.tier);
    let _ = writeln!(out, "Daily reward: {}", view.daily_label());
    let _ = write!(out, "Boosts owned: {}", view.boosts_owned);
    if view.boosted {
        let _ = write!(out, " (active, {}s left)", view.boost_remaining_secs);
    }
    out.push('\n');
    if let Some(n) = &view.notice {
        let _ = writeln!(out, "{n}");
    }
    out
}

struct App {
    settings: Settings,
    session: Session<SystemClock>,
    screen: Screen,
    help_open: bool,
    should_quit: bool,
    started: Instant,
}

impl App {
    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(5, 60);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let tick_every = Duration::from_millis(self.settings.tick_ms.max(100));
        let mut next_tick = Instant::now() + tick_every;

        while !self.should_quit {
            self.screen.resize_if_needed()?;

            let wait = frame_dt.min(next_tick.saturating_duration_since(Instant::now()));
            for key in poll_keys(wait)? {
                match map_key(key, self.help_open) {
                    Some(Command::Quit) => self.should_quit = true,
                    Some(Command::HelpToggle) => self.help_open = !self.help_open,
                    Some(Command::Pet(action)) => self.session.act(action),
                    None => {}
                }
            }

            let now = Instant::now();
            if now >= next_tick {
                self.session.tick();
                next_tick += tick_every;
                if next_tick <= now {
                    // throttled or suspended; elapsed time is measured from the save anyway
                    next_tick = now + tick_every;
                }
            }

            self.render_frame()?;
        }

        Ok(())
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let view = self.session.view();
        let cols = self.screen.cols as i32;
        let rows = self.screen.rows as i32;
        let panel_w = min(max(44, cols / 2), cols - 10).max(0);
        let t = self.started.elapsed().as_secs_f32();

        self.screen.cur.clear();
        if self.settings.enable_braille {
            self.screen.canvas.clear();
            let vp = Viewport {
                x: panel_w * 2,
                y: 0,
                w: (cols - panel_w) * 2,
                h: rows * 4,
            };
            draw_creature(&mut self.screen.canvas, &view, vp, t);
            canvas_to_grid(&self.screen.canvas, &mut self.screen.cur, self.settings.enable_color);
        } else {
            let cx = panel_w + (cols - panel_w) / 2;
            let color = self.settings.enable_color;
            draw_creature_ascii(&mut self.screen.cur, &view, cx, rows / 2, color);
        }

        draw_panel(&mut self.screen.cur, &view, &self.settings);
        if self.help_open {
            draw_box(&mut self.screen.cur, "How to care for your lumipod", HELP);
        }

        self.screen.present()
    }
}

pub(crate) fn run(paths: Paths, opts: LaunchOptions) -> anyhow::Result<()> {
    let file_settings = load_settings(&paths.settings_path);
    let session = Session::open(&paths, SystemClock, opts.reset);

    if opts.status {
        let mut session = session;
        session.tick();
        print!("{}", status_report(&session.view()));
        return Ok(());
    }

    let mut settings = file_settings.clone();
    if opts.ascii {
        settings.enable_braille = false;
    }
    if opts.no_color {
        settings.enable_color = false;
    }

    let mut app = App {
        settings,
        session,
        screen: Screen::begin()?,
        help_open: false,
        should_quit: false,
        started: Instant::now(),
    };
    log::info!("session started");
    let result = app.run();
    save_on_exit(&app.session, &paths, &file_settings);
    let restored = app.screen.end();
    log::info!("session ended");
    result.and(restored)
}

/// Final writes, done before the terminal is handed back so a failed
/// restore can't lose them.
fn save_on_exit<C: Clock>(session: &Session<C>, paths: &Paths, settings: &Settings) {
    session.persist();
    if let Err(e) = save_settings_atomic(&paths.settings_path, settings) {
        log::warn!("could not write settings: {e:#}");
    }
}
