// SPDX-License-Identifier: GPL-3.0-only

//! Presentation state
//!
//! Everything the UI draws besides the live preview: label weights, the
//! flash icon, the toast and its fade timeline, the thumbnail and its
//! animated frame, the menu fade and the save button. Animations are
//! stored as a target plus the instant they started, and are sampled by
//! the renderer.

use crate::constants::{toast, ui};
use crate::flash::FlashIcon;
use image::RgbaImage;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// Font weight of a settings label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelWeight {
    #[default]
    Thin,
    Heavy,
}

impl LabelWeight {
    pub fn for_state(on: bool) -> Self {
        if on { LabelWeight::Heavy } else { LabelWeight::Thin }
    }
}

/// Transient status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn new(text: impl Into<String>, shown_at: Instant) -> Self {
        Self {
            text: text.into(),
            shown_at,
        }
    }

    pub fn opacity(&self, now: Instant) -> f32 {
        toast_opacity(now.saturating_duration_since(self.shown_at))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= toast::FADE_OUT_DELAY + toast::FADE_OUT
    }
}

/// Toast opacity `elapsed` after it was shown
///
/// Fades in over [`toast::FADE_IN`], holds, then fades out over
/// [`toast::FADE_OUT`] starting [`toast::FADE_OUT_DELAY`] after show.
pub fn toast_opacity(elapsed: Duration) -> f32 {
    if elapsed < toast::FADE_IN {
        return elapsed.as_secs_f32() / toast::FADE_IN.as_secs_f32();
    }
    if elapsed < toast::FADE_OUT_DELAY {
        return 1.0;
    }
    let fading = elapsed - toast::FADE_OUT_DELAY;
    if fading >= toast::FADE_OUT {
        return 0.0;
    }
    1.0 - fading.as_secs_f32() / toast::FADE_OUT.as_secs_f32()
}

fn progress(since: Option<Instant>, now: Instant, duration: Duration) -> f32 {
    match since {
        Some(start) => (now.saturating_duration_since(start).as_secs_f32() / duration.as_secs_f32())
            .clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// Thumbnail presentation: collapsed in the corner or expanded full screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewPresentation {
    pub expanded: bool,
    changed_at: Option<Instant>,
}

impl PreviewPresentation {
    pub fn toggle(&mut self, now: Instant) {
        self.expanded = !self.expanded;
        self.changed_at = Some(now);
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        progress(self.changed_at, now, ui::PREVIEW_ANIMATION) < 1.0
    }

    /// Frame of the thumbnail inside `area` at `now`
    pub fn rect(&self, area: Rect, now: Instant) -> Rect {
        let small = thumbnail_rect(area);
        let (from, to) = if self.expanded {
            (small, area)
        } else {
            (area, small)
        };
        lerp_rect(from, to, progress(self.changed_at, now, ui::PREVIEW_ANIMATION))
    }
}

/// Collapsed thumbnail frame: bottom-left corner, inset by the margin
pub fn thumbnail_rect(area: Rect) -> Rect {
    let width = ui::THUMBNAIL_WIDTH.min(area.width.saturating_sub(ui::THUMBNAIL_MARGIN));
    let height = ui::THUMBNAIL_HEIGHT.min(area.height.saturating_sub(ui::THUMBNAIL_MARGIN));
    Rect {
        x: area.x + ui::THUMBNAIL_MARGIN.min(area.width),
        y: (area.y + area.height).saturating_sub(ui::THUMBNAIL_MARGIN + height).max(area.y),
        width,
        height,
    }
}

fn lerp_rect(from: Rect, to: Rect, t: f32) -> Rect {
    let lerp = |a: u16, b: u16| (a as f32 + (b as f32 - a as f32) * t).round() as u16;
    Rect {
        x: lerp(from.x, to.x),
        y: lerp(from.y, to.y),
        width: lerp(from.width, to.width),
        height: lerp(from.height, to.height),
    }
}

/// Settings menu fade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuFade {
    pub visible: bool,
    changed_at: Option<Instant>,
}

impl Default for MenuFade {
    fn default() -> Self {
        Self {
            visible: true,
            changed_at: None,
        }
    }
}

impl MenuFade {
    pub fn toggle(&mut self, now: Instant) {
        self.visible = !self.visible;
        self.changed_at = Some(now);
    }

    pub fn alpha(&self, now: Instant) -> f32 {
        let t = progress(self.changed_at, now, ui::MENU_FADE);
        if self.visible { t } else { 1.0 - t }
    }
}

/// All presentation state owned by the controller
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub raw_label: LabelWeight,
    pub high_resolution_label: LabelWeight,
    pub live_label: LabelWeight,
    pub flash_icon: FlashIcon,
    pub toast: Option<Toast>,
    pub preview: PreviewPresentation,
    pub menu: MenuFade,
    pub thumbnail: Option<RgbaImage>,
    pub thumbnail_visible: bool,
    pub save_visible: bool,
}

impl ViewState {
    /// Show `text`, replacing any toast on screen and restarting the fade
    pub fn show_toast(&mut self, text: impl Into<String>, now: Instant) {
        self.toast = Some(Toast::new(text, now));
    }

    pub fn toast_text(&self) -> Option<&str> {
        self.toast.as_ref().map(|t| t.text.as_str())
    }

    /// Drop the toast once fully faded
    pub fn expire_toast(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| t.is_finished(now)) {
            self.toast = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_timeline() {
        assert_eq!(toast_opacity(Duration::ZERO), 0.0);
        assert!((toast_opacity(Duration::from_millis(500)) - 0.5).abs() < 1e-3);
        assert_eq!(toast_opacity(Duration::from_secs(1)), 1.0);
        assert_eq!(toast_opacity(Duration::from_millis(1999)), 1.0);
        assert!((toast_opacity(Duration::from_millis(2500)) - 0.5).abs() < 1e-3);
        assert_eq!(toast_opacity(Duration::from_secs(3)), 0.0);
        assert_eq!(toast_opacity(Duration::from_secs(10)), 0.0);
    }

    #[test]
    fn test_new_toast_replaces_and_restarts() {
        let start = Instant::now();
        let mut view = ViewState::default();
        view.show_toast("first", start);
        let later = start + Duration::from_millis(2500);
        view.show_toast("second", later);
        let toast = view.toast.as_ref().unwrap();
        assert_eq!(toast.text, "second");
        assert_eq!(toast.opacity(later), 0.0);
    }

    #[test]
    fn test_toast_expires_after_fade_out() {
        let start = Instant::now();
        let mut view = ViewState::default();
        view.show_toast("hello", start);
        view.expire_toast(start + Duration::from_secs(2));
        assert!(view.toast.is_some());
        view.expire_toast(start + Duration::from_secs(3));
        assert!(view.toast.is_none());
    }

    #[test]
    fn test_thumbnail_rect_sits_bottom_left() {
        let area = Rect::new(0, 0, 80, 24);
        let rect = thumbnail_rect(area);
        assert_eq!(rect, Rect::new(2, 12, 15, 10));
    }

    #[test]
    fn test_preview_animation_endpoints() {
        let area = Rect::new(0, 0, 80, 24);
        let start = Instant::now();
        let mut preview = PreviewPresentation::default();
        assert_eq!(preview.rect(area, start), thumbnail_rect(area));

        preview.toggle(start);
        assert_eq!(preview.rect(area, start), thumbnail_rect(area));
        assert!(preview.is_animating(start + Duration::from_millis(250)));
        assert_eq!(preview.rect(area, start + ui::PREVIEW_ANIMATION), area);

        let back = start + Duration::from_secs(1);
        preview.toggle(back);
        assert_eq!(preview.rect(area, back + ui::PREVIEW_ANIMATION), thumbnail_rect(area));
    }

    #[test]
    fn test_menu_fade_inverts_alpha() {
        let start = Instant::now();
        let mut menu = MenuFade::default();
        assert_eq!(menu.alpha(start), 1.0);
        menu.toggle(start);
        assert_eq!(menu.alpha(start), 1.0);
        assert_eq!(menu.alpha(start + ui::MENU_FADE), 0.0);
        menu.toggle(start + ui::MENU_FADE);
        assert_eq!(menu.alpha(start + ui::MENU_FADE * 2), 1.0);
    }

    #[test]
    fn test_label_weight_follows_state() {
        assert_eq!(LabelWeight::for_state(true), LabelWeight::Heavy);
        assert_eq!(LabelWeight::for_state(false), LabelWeight::Thin);
    }
}
