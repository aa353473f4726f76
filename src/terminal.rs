// SPDX-License-Identifier: GPL-3.0-only

//! Terminal camera UI
//!
//! Renders the live preview with Unicode half-block characters (two pixel
//! rows per cell) and draws the controller's presentation state on top:
//! settings menu, flash icon, captured-image thumbnail, save button and
//! toast.

use crate::app::{CaptureController, CaptureState, LabelWeight, UiEvent, ViewState};
use crate::backends::camera::types::CameraFrame;
use crate::constants::ui;
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Widget},
};
use std::io::{self, stdout};
use std::time::Instant;
use tracing::info;

const HELP: &str =
    "space/p photo | v preview | s save | m menu | l live | h hi-res | r raw | f flash | c camera | q quit";

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Event(UiEvent),
    Quit,
}

/// Map a key press to an action
pub fn map_key(key: KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(KeyAction::Quit);
    }
    let event = match key.code {
        KeyCode::Char(' ') | KeyCode::Char('p') => UiEvent::TakePhoto,
        KeyCode::Char('v') => UiEvent::TogglePreview,
        KeyCode::Char('s') => UiEvent::Save,
        KeyCode::Char('m') => UiEvent::ToggleMenu,
        KeyCode::Char('l') => UiEvent::ToggleLive,
        KeyCode::Char('h') => UiEvent::ToggleHighResolution,
        KeyCode::Char('r') => UiEvent::ToggleRaw,
        KeyCode::Char('f') => UiEvent::ToggleFlash,
        KeyCode::Char('c') => UiEvent::ToggleCamera,
        KeyCode::Char('q') | KeyCode::Esc => return Some(KeyAction::Quit),
        _ => return None,
    };
    Some(KeyAction::Event(event))
}

/// Run the terminal UI until the user quits
pub fn run(mut controller: CaptureController) -> Result<(), Box<dyn std::error::Error>> {
    controller.load_camera();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut controller);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut CaptureController,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        controller.try_process_completions();
        let now = Instant::now();
        controller.tick(now);

        let preview = controller.latest_preview();
        terminal.draw(|f| draw(f, controller, preview.as_ref(), now))?;

        if !event::poll(ui::POLL_INTERVAL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match map_key(key) {
                Some(KeyAction::Quit) => break,
                Some(KeyAction::Event(event)) => controller.update(event),
                None => {}
            },
            Event::FocusLost => controller.update(UiEvent::Suspend),
            Event::FocusGained => controller.update(UiEvent::Resume),
            _ => {}
        }
    }

    info!("Terminal UI closed");
    Ok(())
}

fn draw(f: &mut Frame, controller: &CaptureController, preview: Option<&CameraFrame>, now: Instant) {
    let area = f.area();
    let camera_area = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1u16.min(area.height),
        ..area
    };

    match preview {
        Some(frame) => f.render_widget(HalfBlocks(frame), camera_area),
        None => f.render_widget(Placeholder(placeholder_text(controller)), camera_area),
    }

    let view = controller.view();
    let menu_alpha = view.menu.alpha(now);
    if menu_alpha > 0.05 {
        f.render_widget(
            Menu {
                view,
                alpha: menu_alpha,
            },
            menu_rect(camera_area),
        );
    }

    if view.thumbnail_visible
        && let Some(thumbnail) = &view.thumbnail
    {
        let rect = view.preview.rect(camera_area, now);
        f.render_widget(Clear, rect);
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(rect);
        f.render_widget(block, rect);
        f.render_widget(HalfBlocks(thumbnail), inner);

        if view.save_visible && !view.preview.is_animating(now) {
            buf_label(f, rect.x + 1, rect.y, " [s] Save ", Style::default().bg(Color::Blue));
        }
    }

    if controller.capture_state() == CaptureState::Requested {
        buf_label(
            f,
            camera_area.x + 1,
            camera_area.y,
            "● capturing",
            Style::default().fg(Color::Red),
        );
    }

    if let Some(toast) = &view.toast {
        let opacity = toast.opacity(now);
        if opacity > 0.0 {
            let width = (toast.text.chars().count() as u16 + 4).min(camera_area.width);
            let rect = Rect {
                x: camera_area.x + camera_area.width.saturating_sub(width) / 2,
                y: camera_area.y + camera_area.height / 4,
                width,
                height: 1u16.min(camera_area.height),
            };
            f.render_widget(Clear, rect);
            buf_label(
                f,
                rect.x,
                rect.y,
                &format!("  {}  ", toast.text),
                Style::default().fg(faded(Color::White, opacity)).bg(Color::Black),
            );
        }
    }

    f.render_widget(StatusBar { message: HELP }, status_area);
}

fn placeholder_text(controller: &CaptureController) -> &'static str {
    if controller.has_session() {
        "Waiting for camera..."
    } else {
        "No camera session"
    }
}

fn menu_rect(area: Rect) -> Rect {
    let width = 18u16.min(area.width);
    let height = 6u16.min(area.height);
    Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1u16.min(area.height),
        width,
        height,
    }
}

fn buf_label(f: &mut Frame, x: u16, y: u16, text: &str, style: Style) {
    let area = f.area();
    if x < area.x + area.width && y < area.y + area.height {
        f.buffer_mut().set_string(x, y, text, style);
    }
}

/// Scale an RGB color toward black by `alpha`
fn faded(color: Color, alpha: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (255, 255, 255),
    };
    let scale = |c: u8| (c as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

fn weight_style(weight: LabelWeight, alpha: f32) -> Style {
    let style = Style::default().fg(faded(Color::White, alpha));
    match weight {
        LabelWeight::Heavy => style.add_modifier(Modifier::BOLD),
        LabelWeight::Thin => style.add_modifier(Modifier::DIM),
    }
}

/// Anything that can be sampled as RGB pixels
trait PixelSource {
    fn dimensions(&self) -> (u32, u32);
    fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8);
}

impl PixelSource for CameraFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        self.pixel_at(x, y)
    }
}

impl PixelSource for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let [r, g, b, _] = self.get_pixel(x, y).0;
        (r, g, b)
    }
}

/// Renders an image using half-block characters, centered and aspect-fit
struct HalfBlocks<'a, P: PixelSource>(&'a P);

impl<P: PixelSource> Widget for HalfBlocks<'_, P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.0.dimensions();
        if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as u32 * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + area.width.saturating_sub(display_width) / 2;
        let y_offset = area.y + area.height.saturating_sub(display_height) / 2;
        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = ((tx as f64 * x_scale) as u32).min(width - 1);
                let src_top = ((ty as f64 * 2.0 * y_scale) as u32).min(height - 1);
                let src_bottom = (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(height - 1);

                let (tr, tg, tb) = self.0.rgb(src_x, src_top);
                let (br, bg, bb) = self.0.rgb(src_x, src_bottom);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(tr, tg, tb));
                    cell.set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }
    }
}

struct Placeholder(&'static str);

impl Widget for Placeholder {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let x = area.x + area.width.saturating_sub(self.0.len() as u16) / 2;
        let y = area.y + area.height / 2;
        if y < area.y + area.height && x < area.x + area.width {
            buf.set_string(x, y, self.0, Style::default());
        }
    }
}

/// Settings menu with label weights and the flash icon
struct Menu<'a> {
    view: &'a ViewState,
    alpha: f32,
}

impl Widget for Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(faded(Color::White, self.alpha)));
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = [
            (
                self.view.flash_icon.glyph(),
                Style::default().fg(faded(Color::Rgb(255, 214, 0), self.alpha)),
            ),
            ("RAW", weight_style(self.view.raw_label, self.alpha)),
            ("HI-RES", weight_style(self.view.high_resolution_label, self.alpha)),
            ("LIVE", weight_style(self.view.live_label, self.alpha)),
        ];
        for (row, (text, style)) in rows.into_iter().enumerate() {
            let y = inner.y + row as u16;
            if y >= inner.y + inner.height {
                break;
            }
            buf.set_stringn(inner.x, y, text, inner.width as usize, style);
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }
        buf.set_stringn(area.x, area.y, self.message, area.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_map() {
        assert_eq!(
            map_key(press(KeyCode::Char(' '))),
            Some(KeyAction::Event(UiEvent::TakePhoto))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('f'))),
            Some(KeyAction::Event(UiEvent::ToggleFlash))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('c'))),
            Some(KeyAction::Event(UiEvent::ToggleCamera))
        );
        assert_eq!(map_key(press(KeyCode::Char('q'))), Some(KeyAction::Quit));
        assert_eq!(map_key(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_ctrl_c_quits_instead_of_switching_camera() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key), Some(KeyAction::Quit));
    }

    #[test]
    fn test_half_blocks_fill_area() {
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        HalfBlocks(&image).render(area, &mut buf);
        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(10, 20, 30));
        assert_eq!(buf[(3, 1)].bg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn test_faded_scales_toward_black() {
        assert_eq!(faded(Color::White, 0.0), Color::Rgb(0, 0, 0));
        assert_eq!(faded(Color::Rgb(200, 100, 50), 0.5), Color::Rgb(100, 50, 25));
    }
}
