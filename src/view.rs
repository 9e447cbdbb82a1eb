//! Screen composition for the two views. Pixel and glyph output belong to
//! whatever implements [`Renderer`]; this module only decides what goes where.

use core::fmt::Write;

use heapless::String;

use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::record::PersistedRecord;
use crate::state::Rect;

/// RGB565.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color(pub u16);

impl Color {
    pub const WHITE: Color = Color(0xFFFF);
    pub const BLACK: Color = Color(0x0000);
    pub const BLUE: Color = Color(0x001F);
}

pub const BACKGROUND: Color = Color::WHITE;
pub const BUTTON_FILL: Color = Color::BLUE;

/// Line height of the display font.
pub const FONT_HEIGHT: u16 = 16;

/// Display collaborator.
pub trait Renderer {
    fn write_string(&mut self, x: u16, y: u16, text: &str);
    /// Restrict the following writes and fills to a window.
    fn set_window(&mut self, x: u16, y: u16, w: u16, h: u16);
    /// Fill the current window.
    fn fill(&mut self, color: Color);
}

pub type Field = String<24>;

// ── Layout ────────────────────────────────────────────────────────────────────

pub const LIVE_TITLE: (u16, u16) = (94, 1);
pub const SPEED_ROW: u16 = 40;
pub const INCLINATION_ROW: u16 = 106;
pub const DISTANCE_ROW: u16 = 172;
pub const LABEL_X: u16 = 10;
pub const VALUE_X: u16 = 162;

pub const HISTORY_TITLE: (u16, u16) = (80, 1);
pub const TOTAL_DISTANCE_ROW: u16 = 40;
pub const AVERAGE_SPEED_ROW: u16 = 106;
/// History values sit one line below their label.
pub const HISTORY_VALUE_OFFSET: u16 = 20;

const BUTTON_LABEL_INSET: (u16, u16) = (16, 8);

// ── Value formatting ──────────────────────────────────────────────────────────

pub fn format_speed(kmh: f32) -> Field {
    let mut s = Field::new();
    let _ = write!(s, "{:04.1} KM/H", kmh.clamp(0.0, 99.9));
    s
}

pub fn format_inclination(deg: f32) -> Field {
    let mut s = Field::new();
    let _ = write!(s, "{:04.1}^", deg.clamp(-99.9, 99.9));
    s
}

pub fn format_distance(m: u32) -> Field {
    let mut s = Field::new();
    let _ = write!(s, "{:04} M", m);
    s
}

// ── Drawing ───────────────────────────────────────────────────────────────────

fn text<R: Renderer>(r: &mut R, x: u16, y: u16, s: &str) {
    r.set_window(x, y, SCREEN_WIDTH.saturating_sub(x), FONT_HEIGHT);
    r.write_string(x, y, s);
}

pub fn clear_screen<R: Renderer>(r: &mut R) {
    r.set_window(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT);
    r.fill(BACKGROUND);
}

pub fn draw_button<R: Renderer>(r: &mut R, rect: Rect, label: &str) {
    r.set_window(rect.x, rect.y, rect.w, rect.h);
    r.fill(BUTTON_FILL);
    text(r, rect.x + BUTTON_LABEL_INSET.0, rect.y + BUTTON_LABEL_INSET.1, label);
}

/// Static part of the Live view.
pub fn draw_live_screen<R: Renderer>(r: &mut R, record_button: Rect) {
    clear_screen(r);
    text(r, LIVE_TITLE.0, LIVE_TITLE.1, "CURRENT TRIP");
    text(r, LABEL_X, SPEED_ROW, "SPEED:");
    text(r, LABEL_X, INCLINATION_ROW, "INCLINATION:");
    text(r, LABEL_X, DISTANCE_ROW, "DISTANCE:");
    draw_button(r, record_button, "RECORD");
}

/// Redrawn on every cadence tick.
pub fn draw_live_values<R: Renderer>(r: &mut R, speed_kmh: f32, inclination_deg: f32, distance_m: u32) {
    text(r, VALUE_X, SPEED_ROW, &format_speed(speed_kmh));
    text(r, VALUE_X, INCLINATION_ROW, &format_inclination(inclination_deg));
    text(r, VALUE_X, DISTANCE_ROW, &format_distance(distance_m));
}

pub fn draw_history_screen<R: Renderer>(r: &mut R, session_button: Rect, record: &PersistedRecord) {
    clear_screen(r);
    text(r, HISTORY_TITLE.0, HISTORY_TITLE.1, "HISTORIC RECORDS");
    text(r, LABEL_X, TOTAL_DISTANCE_ROW, "TOTAL DISTANCE:");
    text(
        r,
        LABEL_X,
        TOTAL_DISTANCE_ROW + HISTORY_VALUE_OFFSET,
        &format_distance(record.total_distance_m),
    );
    text(r, LABEL_X, AVERAGE_SPEED_ROW, "AVERAGE SPEED:");
    text(
        r,
        LABEL_X,
        AVERAGE_SPEED_ROW + HISTORY_VALUE_OFFSET,
        &format_speed(record.avg_speed_kmh as f32),
    );
    draw_button(r, session_button, "SESION");
}
