//! Half-block terminal renderer. The world is drawn into a pixel buffer two
//! pixels per character cell (foreground = upper half, background = lower
//! half) and letterboxed to keep the world's aspect ratio.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};

use crate::commentary::Commentary;
use crate::phase::Phase;
use crate::sim::Snapshot;

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    const fn dim(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }

    fn term(self) -> CColor {
        CColor::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

const FRAME: Rgb = Rgb(2, 6, 23);
const GRASS: Rgb = Rgb(115, 191, 46);
const DIRT: Rgb = Rgb(222, 216, 149);
const DIRT_DARK: Rgb = Rgb(208, 200, 116);
const PIPE_L: Rgb = Rgb(74, 122, 26);
const PIPE_M: Rgb = Rgb(100, 170, 40);
const PIPE_R: Rgb = Rgb(115, 191, 46);
const PIPE_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
const BIRD_Y: Rgb = Rgb(250, 204, 21);
const BIRD_HI: Rgb = Rgb(254, 240, 138);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(249, 115, 22);
const CLOUD: Rgb = Rgb(235, 245, 255);
const STAR: Rgb = Rgb(255, 255, 255);
const WHITE: Rgb = Rgb(255, 255, 255);
const GOLD: Rgb = Rgb(250, 204, 21);
const SHADOW: Rgb = Rgb(30, 30, 30);
const PANEL: Rgb = Rgb(241, 245, 249);
const PANEL_EDGE: Rgb = Rgb(203, 213, 225);

/// Sky gradient for the current score: day, dusk, then night.
pub fn sky_palette(score: u32) -> (Rgb, Rgb) {
    match score {
        0..=9 => (Rgb(125, 211, 252), Rgb(191, 219, 254)),
        10..=19 => (Rgb(251, 146, 60), Rgb(254, 240, 138)),
        _ => (Rgb(49, 46, 129), Rgb(107, 33, 168)),
    }
}

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![FRAME; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, FRAME);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn fill(&mut self, c: Rgb) {
        self.px.fill(c);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    /// Halves the brightness of a rectangle, for overlays.
    fn dim_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        for py in y.max(0)..(y + h).min(self.h as i32) {
            for px in x.max(0)..(x + w).min(self.w as i32) {
                let c = self.get(px as usize, py as usize);
                self.set(px, py, c.dim());
            }
        }
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = None;
        let mut prev_bg = None;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if prev_bg != Some(bot) {
                    queue!(out, style::SetBackgroundColor(bot.term()))?;
                    prev_bg = Some(bot);
                }
                if top == bot {
                    queue!(out, style::Print(' '))?;
                } else {
                    if prev_fg != Some(top) {
                        queue!(out, style::SetForegroundColor(top.term()))?;
                        prev_fg = Some(top);
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                prev_fg = None;
                prev_bg = None;
            }
        }
        queue!(out, style::ResetColor)?;
        Ok(())
    }
}

// ── 3x5 bitmap digits ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, d: u8, size: i32, fg: Rgb) {
    let glyph = &DIGITS[d as usize];
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32 * size;
                let py = y + row as i32 * size;
                buf.fill_rect(px + 1, py + 1, size, size, SHADOW);
                buf.fill_rect(px, py, size, size, fg);
            }
        }
    }
}

/// Width in pixels of `n` drawn at `size`.
fn number_width(n: u32, size: i32) -> i32 {
    let digits = n.to_string().len() as i32;
    digits * 4 * size - size // 3 per digit + 1 spacing
}

fn draw_number(buf: &mut PixelBuf, x: i32, y: i32, n: u32, size: i32, fg: Rgb) {
    for (i, ch) in n.to_string().bytes().enumerate() {
        draw_digit(buf, x + i as i32 * 4 * size, y, ch - b'0', size, fg);
    }
}

fn draw_number_centered(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, size: i32, fg: Rgb) {
    draw_number(buf, cx - number_width(n, size) / 2, y, n, size, fg);
}

// ── World → pixel mapping ───────────────────────────────────────────────────

/// Uniform scale from world units to buffer pixels, centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub ox: f64,
    pub oy: f64,
    pub scale: f64,
}

impl Viewport {
    pub fn fit(pw: usize, ph: usize, world_w: f64, world_h: f64) -> Self {
        let scale = (pw as f64 / world_w).min(ph as f64 / world_h);
        Self {
            ox: ((pw as f64 - world_w * scale) / 2.0).floor(),
            oy: ((ph as f64 - world_h * scale) / 2.0).floor(),
            scale,
        }
    }

    pub fn x(&self, wx: f64) -> i32 {
        (self.ox + wx * self.scale).round() as i32
    }

    pub fn y(&self, wy: f64) -> i32 {
        (self.oy + wy * self.scale).round() as i32
    }

    /// A world length in pixels, at least one.
    pub fn span(&self, w: f64) -> i32 {
        ((w * self.scale).round() as i32).max(1)
    }
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// Text drawn over the pixel frame, positioned in terminal cells.
struct Caption {
    col: u16,
    row: u16,
    text: String,
    fg: Rgb,
    bg: Rgb,
}

pub struct Renderer {
    buf: PixelBuf,
    /// Scroll offset of the ground stripes, world units.
    ground_x: f64,
    captions: Vec<Caption>,
}

impl Renderer {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            buf: PixelBuf::new(cols as usize, rows as usize * 2),
            ground_x: 0.0,
            captions: Vec::new(),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.buf.resize(cols as usize, rows as usize * 2);
    }

    /// Draws the snapshot and writes the frame to `out`.
    pub fn present(
        &mut self,
        out: &mut impl Write,
        snap: &Snapshot<'_>,
        commentary: &Commentary,
    ) -> io::Result<()> {
        if snap.phase == Phase::Active {
            self.ground_x += snap.speed;
        }
        self.captions.clear();
        self.draw(snap, commentary);
        self.buf.render(out)?;
        for caption in &self.captions {
            queue!(
                out,
                cursor::MoveTo(caption.col, caption.row),
                style::SetForegroundColor(caption.fg.term()),
                style::SetBackgroundColor(caption.bg.term()),
                style::Print(&caption.text),
                style::ResetColor
            )?;
        }
        out.flush()
    }

    fn draw(&mut self, snap: &Snapshot<'_>, commentary: &Commentary) {
        let cfg = snap.config;
        let view = Viewport::fit(
            self.buf.width(),
            self.buf.height(),
            cfg.world_width,
            cfg.world_height,
        );

        self.buf.fill(FRAME);
        self.draw_sky(snap, &view);
        self.draw_decor(snap, &view);
        self.draw_pipes(snap, &view);
        self.draw_ground(snap, &view);
        self.draw_bird(snap, &view);

        match snap.phase {
            Phase::Idle => self.draw_title(snap, &view),
            Phase::Active => self.draw_hud(snap, &view),
            Phase::Ended => self.draw_game_over(snap, &view, commentary),
        }
    }

    fn draw_sky(&mut self, snap: &Snapshot<'_>, view: &Viewport) {
        let (top, bot) = sky_palette(snap.score);
        let y0 = view.y(0.0);
        let y1 = view.y(snap.config.sky_height());
        let x0 = view.x(0.0);
        let x1 = view.x(snap.config.world_width);
        let span = (y1 - y0).max(1);
        for y in y0..y1 {
            let t = ((y - y0) * 256 / span) as u16;
            let c = Rgb::lerp(top, bot, t);
            for x in x0..x1 {
                self.buf.set(x, y, c);
            }
        }
    }

    fn draw_decor(&mut self, snap: &Snapshot<'_>, view: &Viewport) {
        if snap.score >= 20 {
            // Twinkling stars
            for (i, (wx, wy)) in [(40.0, 40.0), (320.0, 80.0), (200.0, 160.0), (110.0, 230.0)]
                .into_iter()
                .enumerate()
            {
                if (snap.frame / 20 + i as u64) % 3 != 0 {
                    self.buf.set(view.x(wx), view.y(wy), STAR);
                }
            }
        } else {
            for (wx, wy, size) in [(40.0, 80.0, 60.0), (300.0, 160.0, 40.0)] {
                let w = view.span(size);
                let h = view.span(size / 3.0);
                let x = view.x(wx);
                let y = view.y(wy);
                self.buf.fill_rect(x, y + h / 2, w, h, CLOUD);
                self.buf.fill_rect(x + w / 4, y, w / 2, h, CLOUD);
            }
        }
    }

    fn draw_pipes(&mut self, snap: &Snapshot<'_>, view: &Viewport) {
        let cfg = snap.config;
        let pw = view.span(cfg.obstacle_width);
        let cap_extra = view.span(3.0);
        let cap_h = view.span(20.0);
        let sky_bot = view.y(cfg.sky_height());
        let sky_top = view.y(0.0);

        for pipe in snap.obstacles {
            let px = view.x(pipe.x);
            let gap_top = view.y(pipe.gap_top as f64);
            let gap_bot = view.y((pipe.gap_top + cfg.gap_size) as f64);

            // Bodies
            for x in 0..pw {
                let c = pipe_shade(x, pw);
                for y in sky_top..gap_top - cap_h {
                    self.buf.set(px + x, y, c);
                }
                for y in (gap_bot + cap_h)..sky_bot {
                    self.buf.set(px + x, y, c);
                }
            }
            // Caps
            for x in -cap_extra..(pw + cap_extra) {
                let c = pipe_shade(x + cap_extra, pw + cap_extra * 2);
                for y in (gap_top - cap_h)..gap_top {
                    self.buf.set(px + x, y, c);
                }
                for y in gap_bot..(gap_bot + cap_h) {
                    self.buf.set(px + x, y, c);
                }
                self.buf.set(px + x, gap_top - 1, CAP_DARK);
                self.buf.set(px + x, gap_bot, CAP_DARK);
            }
        }
    }

    fn draw_ground(&mut self, snap: &Snapshot<'_>, view: &Viewport) {
        let cfg = snap.config;
        let gy = view.y(cfg.sky_height());
        let bottom = view.y(cfg.world_height);
        let x0 = view.x(0.0);
        let x1 = view.x(cfg.world_width);
        let stripe = view.span(10.0);
        let shift = (self.ground_x * view.scale) as i32;

        for x in x0..x1 {
            self.buf.set(x, gy, GRASS);
        }
        for y in (gy + 1)..bottom {
            for x in x0..x1 {
                let diagonal = (x - x0 + shift + (y - gy)).rem_euclid(stripe * 2) < stripe;
                self.buf.set(x, y, if diagonal { DIRT_DARK } else { DIRT });
            }
        }
    }

    fn draw_bird(&mut self, snap: &Snapshot<'_>, view: &Viewport) {
        let cfg = snap.config;
        let x = view.x(cfg.bird_x);
        let y = view.y(snap.bird.y);
        let s = view.span(cfg.bird_size);

        // Nose tips with velocity: up when rising, down when diving.
        let tilt = (snap.bird.vy / 4.0).clamp(-1.0, 1.0).round() as i32;

        self.buf.fill_rect(x, y, s, s, BIRD_Y);
        self.buf.fill_rect(x + 1, y, (s - 2).max(1), (s / 6).max(1), BIRD_HI);

        // Wing flaps every few frames.
        let wing_y = if snap.frame % 8 < 4 { y + s / 2 } else { y + s / 2 - 1 };
        self.buf
            .fill_rect(x, wing_y + tilt, (s / 2).max(1), (s / 4).max(1), BIRD_WING);

        // Eye
        let eye = (s / 4).max(1);
        let ex = x + s - eye - (s / 6).max(1);
        let ey = y + (s / 6).max(1);
        self.buf.fill_rect(ex, ey, eye, eye, BIRD_EYE);
        self.buf.set(ex + eye - 1, ey + eye - 1, BIRD_PUPIL);

        // Beak
        let beak_w = (s / 3).max(1);
        let beak_h = (s / 5).max(1);
        self.buf
            .fill_rect(x + s, y + s / 2 - beak_h / 2 + tilt, beak_w, beak_h, BIRD_BEAK);
    }

    fn digit_size(view: &Viewport) -> i32 {
        view.span(6.0).clamp(1, 3)
    }

    fn draw_hud(&mut self, snap: &Snapshot<'_>, view: &Viewport) {
        let size = Self::digit_size(view);
        let top = view.y(30.0);
        draw_number(&mut self.buf, view.x(30.0), top, snap.score, size * 2, WHITE);
        let best_x = view.x(370.0) - number_width(snap.best, size);
        draw_number(&mut self.buf, best_x, top, snap.best, size, GOLD);
    }

    fn panel(&mut self, view: &Viewport, wy: f64, wh: f64) -> (i32, i32, i32, i32) {
        let (x, y) = (view.x(40.0), view.y(wy));
        let (w, h) = (view.span(320.0), view.span(wh));
        self.buf.fill_rect(x - 1, y - 1, w + 2, h + 2, SHADOW);
        self.buf.fill_rect(x, y, w, h, PANEL_EDGE);
        self.buf.fill_rect(x + 1, y + 1, w - 2, h - 2, PANEL);
        (x, y, w, h)
    }

    fn caption(&mut self, cx: i32, py: i32, text: &str, fg: Rgb, bg: Rgb) {
        let width = text.chars().count() as i32;
        let col = (cx - width / 2).max(0);
        let row = (py / 2).max(0);
        self.captions.push(Caption {
            col: col as u16,
            row: row as u16,
            text: text.to_string(),
            fg,
            bg,
        });
    }

    fn draw_title(&mut self, snap: &Snapshot<'_>, view: &Viewport) {
        let (x0, y0) = (view.x(0.0), view.y(0.0));
        let (w, h) = (view.span(snap.config.world_width), view.span(snap.config.world_height));
        self.buf.dim_rect(x0, y0, w, h);

        let (px, py, pw, ph) = self.panel(view, 220.0, 120.0);
        let cx = px + pw / 2;
        self.caption(cx, py + ph / 4, "FLAPPY AI", Rgb(14, 165, 233), PANEL);
        self.caption(cx, py + ph / 2, "space / click to flap", Rgb(100, 116, 139), PANEL);
        if snap.best > 0 {
            draw_number_centered(&mut self.buf, cx, py + ph * 3 / 4, snap.best, 1, GOLD);
        }
    }

    fn draw_game_over(&mut self, snap: &Snapshot<'_>, view: &Viewport, commentary: &Commentary) {
        let (x0, y0) = (view.x(0.0), view.y(0.0));
        let (w, h) = (view.span(snap.config.world_width), view.span(snap.config.world_height));
        self.buf.dim_rect(x0, y0, w, h);

        let (px, py, pw, ph) = self.panel(view, 150.0, 260.0);
        let cx = px + pw / 2;
        let size = Self::digit_size(view);

        self.caption(cx, py + 4, "GAME OVER", Rgb(30, 41, 59), PANEL);

        let line = match commentary {
            Commentary::Idle => String::new(),
            Commentary::Pending => "The AI is thinking up a roast...".to_string(),
            Commentary::Ready(text) => format!("\"{text}\""),
        };
        let max_cols = (pw - 2).max(8) as usize;
        let mut row = py + ph / 4;
        for chunk in wrap(&line, max_cols) {
            self.caption(cx, row, &chunk, Rgb(51, 65, 85), PANEL);
            row += 2;
        }

        let digits_y = py + ph * 5 / 8;
        draw_number_centered(&mut self.buf, px + pw / 4, digits_y, snap.score, size, WHITE);
        draw_number_centered(&mut self.buf, px + pw * 3 / 4, digits_y, snap.best, size, GOLD);
        self.caption(px + pw / 4, digits_y - 3, "SCORE", Rgb(234, 88, 12), PANEL);
        self.caption(px + pw * 3 / 4, digits_y - 3, "BEST", Rgb(202, 138, 4), PANEL);

        self.caption(cx, py + ph - 4, "enter to retry, q to quit", Rgb(2, 132, 199), PANEL);
    }
}

fn pipe_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return PIPE_M;
    }
    let t = (x as f64 / (total_w - 1) as f64 * 256.0) as u16;
    if t < 64 {
        Rgb::lerp(PIPE_L, PIPE_M, (t * 4).min(256))
    } else if t < 100 {
        Rgb::lerp(PIPE_M, PIPE_HI, ((t - 64) * 7).min(256))
    } else if t < 160 {
        Rgb::lerp(PIPE_HI, PIPE_R, ((t - 100) * 4).min(256))
    } else {
        Rgb::lerp(PIPE_R, PIPE_L, ((t - 160) * 3).min(256))
    }
}

/// Greedy word wrap to at most `width` characters per line. Words longer
/// than a line are split across lines.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width) {
            let needed = if line.is_empty() { 0 } else { 1 } + piece.len();
            if !line.is_empty() && line.chars().count() + needed > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(piece);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_letterboxes_wide_terminals() {
        // 160x90 pixels, world 400x600: height-limited.
        let view = Viewport::fit(160, 90, 400.0, 600.0);
        assert!((view.scale - 0.15).abs() < 1e-9);
        assert_eq!(view.oy, 0.0);
        assert_eq!(view.ox, 50.0);
        assert_eq!(view.x(0.0), 50);
        assert_eq!(view.x(400.0), 110);
        assert_eq!(view.y(600.0), 90);
    }

    #[test]
    fn viewport_lengths_never_vanish() {
        let view = Viewport::fit(40, 30, 400.0, 600.0);
        assert_eq!(view.span(1.0), 1);
    }

    #[test]
    fn sky_changes_with_score() {
        assert_eq!(sky_palette(0), sky_palette(9));
        assert_ne!(sky_palette(9), sky_palette(10));
        assert_ne!(sky_palette(19), sky_palette(20));
        assert_eq!(sky_palette(20), sky_palette(500));
    }

    #[test]
    fn number_width_counts_digits() {
        assert_eq!(number_width(7, 1), 3);
        assert_eq!(number_width(42, 1), 7);
        assert_eq!(number_width(42, 2), 14);
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("nice try but the pipes were not impressed", 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
        assert_eq!(lines.join(" "), "nice try but the pipes were not impressed");
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn wrap_splits_words_longer_than_a_line() {
        let text = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA https://example.com/a/very/long/path";
        let lines = wrap(text, 12);
        assert!(lines.iter().all(|l| !l.is_empty() && l.chars().count() <= 12));
        let squashed: String = text.split_whitespace().collect();
        assert_eq!(lines.concat().replace(' ', ""), squashed);
        assert_eq!(lines[0], "AAAAAAAAAAAA");
        assert_eq!(wrap("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn half_block_output_has_one_line_per_two_rows() {
        let mut buf = PixelBuf::new(3, 4);
        buf.set(0, 0, WHITE);
        let mut out = Vec::new();
        buf.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), 1);
        assert!(text.contains('\u{2580}'));
    }
}
