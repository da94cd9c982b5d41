use crate::config::Settings;
use crate::model::{Notice, PetState, Stat, BOOST_NAME, DAILY_REWARD_NAME};
use chrono::NaiveDate;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/* -----------------------------
   What the renderer is allowed to see
------------------------------ */

/// Creature growth stage, chosen from health alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tier {
    Teardrop,
    Oval,
    Blob,
    Radiant,
}

impl Tier {
    pub(crate) fn from_health(h: f64) -> Self {
        if h < 25.0 {
            Tier::Teardrop
        } else if h < 50.0 {
            Tier::Oval
        } else if h < 75.0 {
            Tier::Blob
        } else {
            Tier::Radiant
        }
    }

    /// Half extents of the body in a 200×200 design box.
    fn body_radii(self) -> (f32, f32) {
        match self {
            Tier::Teardrop => (35.0, 50.0),
            Tier::Oval => (40.0, 57.0),
            Tier::Blob => (52.0, 64.0),
            Tier::Radiant => (60.0, 72.0),
        }
    }
}

/// Read-only snapshot of the pet taken after each mutation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PetView {
    pub(crate) stats: [(Stat, f64); 4],
    pub(crate) health: f64,
    pub(crate) tier: Tier,
    pub(crate) boosted: bool,
    pub(crate) boost_remaining_secs: i64,
    pub(crate) day: u32,
    pub(crate) score: u64,
    pub(crate) boosts_owned: u32,
    pub(crate) reward_claimed_today: bool,
    pub(crate) can_use_boost: bool,
    pub(crate) notice: Option<String>,
}

impl PetView {
    pub(crate) fn capture(
        st: &PetState,
        now_ms: i64,
        today: NaiveDate,
        notice: Option<&Notice>,
    ) -> Self {
        let health = st.health();
        Self {
            stats: Stat::ALL.map(|s| (s, st.stat(s))),
            health,
            tier: Tier::from_health(health),
            boosted: st.boosted(now_ms),
            boost_remaining_secs: (st.boost_remaining_ms(now_ms) + 999) / 1000,
            day: st.day,
            score: st.score,
            boosts_owned: st.boosts_owned,
            reward_claimed_today: st.reward_claimed_on(today),
            can_use_boost: st.can_use_boost(now_ms),
            notice: notice.map(|n| n.to_string()),
        }
    }

    pub(crate) fn daily_label(&self) -> &'static str {
        if self.reward_claimed_today {
            "claimed"
        } else {
            DAILY_REWARD_NAME
        }
    }
}

/// Bar fill percentage. A sliver always shows so empty stats stay visible.
pub(crate) fn bar_fill_pct(value: f64) -> f64 {
    value.round().max(4.0)
}

/// Eye radius in design units; grows with health and while boosted.
pub(crate) fn eye_radius(health: f64, boosted: bool) -> f32 {
    let boost = if boosted { 2.0 } else { 0.0 };
    (6.0 + health / 25.0 + boost) as f32
}

/// Mouth curve depth in design units; positive is a smile.
pub(crate) fn smile(health: f64) -> f32 {
    ((health - 50.0) / 3.0).clamp(-12.0, 14.0) as f32
}

pub(crate) fn face_dimmed(health: f64) -> bool {
    health < 8.0
}

/// Vertical breathing offset in design units at animation time `t` (seconds).
pub(crate) fn breathing(health: f64, t: f32) -> f32 {
    (t / 0.9).sin() * (2.0 + health as f32 / 80.0)
}

/* -----------------------------
   Cell grid + pixel canvas
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct Grid {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub(crate) fn set_i32(&mut self, x: i32, y: i32, c: Cell) {
        if x >= 0 && y >= 0 {
            self.set(x as u16, y as u16, c);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Rgba {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Rgba {
    const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    fn with_alpha(self, a: f32) -> Self {
        Self {
            a: (a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            ..self
        }
    }
}

const BODY: Rgba = Rgba::new(124, 58, 237, 230);
const AURA: Rgba = Rgba::new(167, 139, 250, 255);
const AURA_BOOSTED: Rgba = Rgba::new(253, 224, 71, 255);
const INK: Rgba = Rgba::new(12, 8, 24, 250);

pub(crate) struct Canvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Rgba>,
}

impl Canvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Rgba::default(); (w as usize) * (h as usize)],
        }
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn clear(&mut self) {
        self.px.fill(Rgba::default());
    }

    fn blend(&mut self, x: i32, y: i32, src: Rgba) {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Rgba::default();
            return;
        }
        let mix = |s: u8, d: u8| -> u8 {
            let out = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 255.0) + 0.5) as u8
        };
        self.px[i] = Rgba {
            r: mix(src.r, dst.r),
            g: mix(src.g, dst.g),
            b: mix(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    fn disc(&mut self, cx: f32, cy: f32, r: f32, col: Rgba) {
        let r_i = r.ceil() as i32;
        for dy in -r_i..=r_i {
            for dx in -r_i..=r_i {
                if (dx * dx + dy * dy) as f32 <= r * r {
                    self.blend(cx as i32 + dx, cy as i32 + dy, col);
                }
            }
        }
    }
}

/* -----------------------------
   Braille: each cell packs a 2×4 block of canvas pixels
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    const BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];
    BITS.get(dx as usize)
        .and_then(|col| col.get(dy as usize))
        .copied()
        .unwrap_or(0)
}

pub(crate) fn canvas_to_grid(canvas: &Canvas, out: &mut Grid, enable_color: bool) {
    for cy in 0..out.h as u32 {
        for cx in 0..out.w as u32 {
            let mut mask = 0u8;
            let (mut r, mut g, mut b, mut n) = (0u32, 0u32, 0u32, 0u32);

            for dy in 0..4 {
                for dx in 0..2 {
                    let (x, y) = (cx * 2 + dx, cy * 4 + dy);
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        r += p.r as u32;
                        g += p.g as u32;
                        b += p.b as u32;
                        n += 1;
                    }
                }
            }
            if mask == 0 {
                continue;
            }

            let fg = if enable_color {
                Color::Rgb {
                    r: (r / n) as u8,
                    g: (g / n) as u8,
                    b: (b / n) as u8,
                }
            } else {
                Color::White
            };
            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            out.set(cx as u16, cy as u16, Cell { ch, fg, bg: Color::Black });
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Viewport {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: i32,
    pub(crate) h: i32,
}

/// Paints the creature into `canvas`, scaling the 200×200 design box into `vp`.
pub(crate) fn draw_creature(canvas: &mut Canvas, view: &PetView, vp: Viewport, t: f32) {
    let h = view.health;
    let scale = (vp.w.min(vp.h) as f32 / 200.0).max(0.05);
    let bob = breathing(h, t);
    let to_px = |dx: f32, dy: f32| -> (f32, f32) {
        (
            vp.x as f32 + vp.w as f32 / 2.0 + dx * scale,
            vp.y as f32 + vp.h as f32 / 2.0 + (dy + bob) * scale,
        )
    };

    // aura behind the body
    let aura_r = (60.0 + h as f32 / 2.0) * 0.8;
    let aura_a = 0.20 + h as f32 / 250.0;
    let (aura_col, ring) = if view.boosted {
        (AURA_BOOSTED, aura_a + 0.25)
    } else {
        (AURA, aura_a)
    };
    let (cx, cy) = to_px(0.0, 0.0);
    let r_px = aura_r * scale;
    let r_i = r_px.ceil() as i32;
    for dy in -r_i..=r_i {
        for dx in -r_i..=r_i {
            let d = ((dx * dx + dy * dy) as f32).sqrt() / r_px;
            if d > 1.0 {
                continue;
            }
            // brightest near the rim, fading toward the body
            let a = ring * d * d * (1.0 - d).sqrt() * 1.6;
            canvas.blend(cx as i32 + dx, cy as i32 + dy, aura_col.with_alpha(a));
        }
    }

    // body
    let (rx, ry) = view.tier.body_radii();
    let ry_px = ry * scale;
    let ry_i = ry_px.ceil() as i32;
    for dy in -ry_i..=ry_i {
        let v = dy as f32 / ry_px;
        if v.abs() > 1.0 {
            continue;
        }
        let mut half = rx * scale * (1.0 - v * v).sqrt();
        if view.tier == Tier::Teardrop {
            half *= 0.55 + 0.45 * (v + 1.0) / 2.0;
        }
        let half_i = half as i32;
        for dx in -half_i..=half_i {
            let edge = 1.0 - (dx as f32 / half.max(1.0)).abs();
            let a = 0.55 + 0.45 * edge;
            canvas.blend(cx as i32 + dx, cy as i32 + dy, BODY.with_alpha(a));
        }
    }

    // face
    let face_a = if face_dimmed(h) { 0.7 } else { 1.0 };
    let ink = INK.with_alpha(face_a);
    let eye_r = eye_radius(h, view.boosted) * scale * 0.6;
    for side in [-1.0f32, 1.0] {
        let (ex, ey) = to_px(side * rx * 0.35, -ry * 0.1);
        canvas.disc(ex, ey, eye_r.max(1.0), ink);
    }

    let depth = smile(h);
    let mouth_w = rx * 0.4;
    let steps = (mouth_w * 2.0 * scale).ceil().max(2.0) as i32;
    for i in 0..=steps {
        let u = i as f32 / steps as f32 * 2.0 - 1.0;
        let (mx, my) = to_px(u * mouth_w, ry * 0.3 + depth * 0.5 * (1.0 - u * u));
        canvas.blend(mx as i32, my as i32, ink);
        canvas.blend(mx as i32, my as i32 + 1, ink);
    }
}

/// Text-only creature for terminals without braille.
pub(crate) fn draw_creature_ascii(grid: &mut Grid, view: &PetView, cx: i32, cy: i32, color: bool) {
    let body: &[&str] = match view.tier {
        Tier::Teardrop => &["   .   ", "  / \\  ", " ( EE )", " ( MM )", "  `-'  "],
        Tier::Oval => &["  .--.  ", " /    \\ ", "| E  E |", "|  MM  |", " \\    / ", "  `--'  "],
        Tier::Blob => &[
            "   .---.   ",
            " .'     '. ",
            "/  E   E  \\",
            "|         |",
            "\\   MMM   /",
            " '._____.' ",
        ],
        Tier::Radiant => &[
            "    .-----.    ",
            "  .'       '.  ",
            " /   E   E   \\ ",
            "|             |",
            "|    MMMMM    |",
            " \\           / ",
            "  '.._____..'  ",
        ],
    };

    let eye = if view.boosted || view.health >= 75.0 {
        'O'
    } else if face_dimmed(view.health) {
        '-'
    } else {
        'o'
    };
    let mouth = match smile(view.health) {
        s if s > 2.0 => '\u{203F}',
        s if s < -2.0 => '^',
        _ => '_',
    };
    let fg = if !color {
        Color::White
    } else if view.boosted {
        Color::Yellow
    } else {
        Color::Magenta
    };

    let h = body.len() as i32;
    let w = body.iter().map(|l| l.chars().count()).max().unwrap_or(0) as i32;
    let (x0, y0) = (cx - w / 2, cy - h / 2);
    for (row, line) in body.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let ch = match ch {
                'E' => eye,
                'M' => mouth,
                c => c,
            };
            if ch != ' ' {
                grid.set_i32(x0 + col as i32, y0 + row as i32, Cell { ch, fg, bg: Color::Black });
            }
        }
    }

    if view.boosted {
        let spark = Cell {
            ch: '*',
            fg: if color { Color::Yellow } else { Color::White },
            bg: Color::Black,
        };
        for (dx, dy) in [(-2, 0), (w + 1, 0), (-1, h - 1), (w, h - 1), (w / 2, -1)] {
            grid.set_i32(x0 + dx, y0 + dy, spark);
        }
    }
}

/* -----------------------------
   Text panel
------------------------------ */

pub(crate) fn draw_text(grid: &mut Grid, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= grid.w || y >= grid.h {
            break;
        }
        grid.set(xx, y, Cell { ch, fg, bg: Color::Black });
    }
}

fn bar(pct: f64, width: usize) -> String {
    let fill = ((pct / 100.0).clamp(0.0, 1.0) * width as f64).round() as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { '·' });
    }
    s.push(']');
    s
}

fn stat_color(v: f64, color: bool) -> Color {
    match (color, v) {
        (false, _) => Color::White,
        (true, v) if v < 25.0 => Color::Red,
        (true, v) if v < 50.0 => Color::Yellow,
        _ => Color::Green,
    }
}

pub(crate) fn draw_panel(grid: &mut Grid, view: &PetView, settings: &Settings) {
    let color = settings.enable_color;
    let fg = Color::White;
    let pick = |c: Color| if color { c } else { Color::White };

    let title = format!("Lumipod  |  Day {}  |  Score {}", view.day, view.score);
    draw_text(grid, 1, 0, &title, fg);

    for (i, (stat, val)) in view.stats.iter().enumerate() {
        let line = format!("{:<8}{} {:>5.1}", stat.label(), bar(bar_fill_pct(*val), 14), val);
        draw_text(grid, 1, 2 + i as u16, &line, stat_color(*val, color));
    }
    let health = format!("health  {:>5.1}  ({:?})", view.health, view.tier);
    draw_text(grid, 1, 7, &health, fg);

    let daily = format!("Daily:  {}", view.daily_label());
    draw_text(
        grid,
        1,
        9,
        &daily,
        if view.reward_claimed_today { pick(Color::DarkGrey) } else { pick(Color::Cyan) },
    );
    let boosts = format!("Boosts: {} x {}", BOOST_NAME, view.boosts_owned);
    draw_text(grid, 1, 10, &boosts, fg);

    if view.boosted {
        let badge = format!(" {BOOST_NAME} (active) {}s ", view.boost_remaining_secs);
        draw_text(grid, 1, 12, &badge, pick(Color::Yellow));
    }

    if let Some(msg) = &view.notice {
        draw_text(grid, 1, grid.h.saturating_sub(3), msg, pick(Color::Cyan));
    }

    let y = grid.h.saturating_sub(1);
    let keys = "f feed | c clean | p play | r rest | d daily | ";
    draw_text(grid, 1, y, keys, fg);
    let boost_key = "b boost";
    let boost_fg = if view.can_use_boost { fg } else { pick(Color::DarkGrey) };
    let x = 1 + keys.chars().count() as u16;
    draw_text(grid, x, y, boost_key, boost_fg);
    draw_text(grid, x + boost_key.len() as u16, y, " | h help | q quit", fg);
}

pub(crate) fn draw_box(grid: &mut Grid, title: &str, body: &str) {
    let bw = 60.min(grid.w.saturating_sub(4));
    let bh = 16.min(grid.h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }
    let x0 = (grid.w - bw) / 2;
    let y0 = (grid.h - bh) / 2;
    let edge = |ch| Cell { ch, fg: Color::White, bg: Color::Black };

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let top_or_bottom = y == y0 || y == y0 + bh - 1;
            let side = x == x0 || x == x0 + bw - 1;
            let ch = match (top_or_bottom, side) {
                (true, true) => match (x == x0, y == y0) {
                    (true, true) => '┌',
                    (false, true) => '┐',
                    (true, false) => '└',
                    (false, false) => '┘',
                },
                (true, false) => '─',
                (false, true) => '│',
                (false, false) => ' ',
            };
            grid.set(x, y, edge(ch));
        }
    }

    draw_text(grid, x0 + 2, y0 + 1, title, Color::White);
    for (i, line) in body.lines().enumerate() {
        let yy = y0 + 3 + i as u16;
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(grid, x0 + 2, yy, line, Color::White);
    }
}

/* -----------------------------
   Terminal session
------------------------------ */

pub(crate) struct Screen {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: Grid,
    pub(crate) cur: Grid,
    pub(crate) canvas: Canvas,
}

impl Screen {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: Grid::new(cols, rows),
            cur: Grid::new(cols, rows),
            canvas: Canvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = Grid::new(c, r);
        self.cur = Grid::new(c, r);
        self.canvas = Canvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Writes only the cells that changed since the last frame.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}
