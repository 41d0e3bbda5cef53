//! Chrome layout: tab strip on top, navigation toolbar below.
//!
//! Pure geometry, no GL. The renderer draws from a [`ChromeLayout`] and the
//! window loop hit-tests clicks against the same layout, so what is drawn
//! and what is clickable never diverge.
//!
//! ```text
//! ┌──────────┬──────────┬───┐
//! │ Tab 1  x │ Tab 2  x │ + │                       tab strip
//! ├───┬───┬──┴┬───┬─────┴───┴──────────────────┬────┤
//! │ < │ > │ R │ H │ address bar                │ Go │  toolbar
//! └───┴───┴───┴───┴────────────────────────────┴────┘
//! ```

use crate::config::ChromeConfig;

/// Axis-aligned rectangle in physical pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Shrinks the rectangle by `d` on every side.
    pub fn inset(&self, d: f32) -> Self {
        Self::new(
            self.x + d,
            self.y + d,
            (self.w - 2.0 * d).max(0.0),
            (self.h - 2.0 * d).max(0.0),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarButton {
    Back,
    Forward,
    Reload,
    Home,
    NewTab,
    Go,
}

impl ToolbarButton {
    /// Buttons on the left of the address bar, in order.
    pub const NAVIGATION: [ToolbarButton; 4] = [Self::Back, Self::Forward, Self::Reload, Self::Home];

    pub fn label(self) -> &'static str {
        match self {
            Self::Back => "<",
            Self::Forward => ">",
            Self::Reload => "R",
            Self::Home => "H",
            Self::NewTab => "+",
            Self::Go => "Go",
        }
    }
}

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeHit {
    Tab(usize),
    CloseTab(usize),
    Button(ToolbarButton),
    UrlField,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabRects {
    pub tab: Rect,
    pub close: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChromeLayout {
    pub tab_strip: Rect,
    pub toolbar: Rect,
    pub tabs: Vec<TabRects>,
    pub new_tab: Rect,
    pub buttons: Vec<(ToolbarButton, Rect)>,
    pub go: Rect,
    pub url_field: Rect,
}

impl ChromeLayout {
    /// Lays out the chrome for a window `width` pixels wide with `tab_count` tabs.
    pub fn compute(width: u32, tab_count: usize, config: &ChromeConfig) -> Self {
        let width = width as f32;
        let strip_h = config.tab_strip_height as f32;
        let bar_h = config.toolbar_height as f32;
        let margin = config.bar_margin;
        let button_w = config.button_width;

        // ── Tab strip ──────────────────────────────────────────────────
        let tab_strip = Rect::new(0.0, 0.0, width, strip_h);
        let available = (width - button_w).max(0.0);
        let tab_w = if tab_count == 0 {
            0.0
        } else {
            config.tab_width.min(available / tab_count as f32)
        };
        let close_side = (strip_h - 2.0 * margin).max(0.0);

        let tabs = (0..tab_count)
            .map(|i| {
                let tab = Rect::new(i as f32 * tab_w, 0.0, tab_w, strip_h);
                let close = Rect::new(
                    (tab.right() - margin - close_side).max(tab.x),
                    margin,
                    close_side.min(tab_w),
                    close_side,
                );
                TabRects { tab, close }
            })
            .collect();
        let new_tab = Rect::new(tab_count as f32 * tab_w, 0.0, button_w, strip_h);

        // ── Toolbar ────────────────────────────────────────────────────
        let toolbar = Rect::new(0.0, strip_h, width, bar_h);
        let inner_y = strip_h + margin;
        let inner_h = (bar_h - 2.0 * margin).max(0.0);

        let mut x = margin;
        let buttons = ToolbarButton::NAVIGATION
            .iter()
            .map(|&button| {
                let rect = Rect::new(x, inner_y, button_w, inner_h);
                x += button_w + margin;
                (button, rect)
            })
            .collect();

        let go = Rect::new((width - margin - button_w).max(x), inner_y, button_w, inner_h);
        let url_field = Rect::new(x, inner_y, (go.x - margin - x).max(0.0), inner_h);

        Self {
            tab_strip,
            toolbar,
            tabs,
            new_tab,
            buttons,
            go,
            url_field,
        }
    }

    /// Total chrome height; the web view starts below it.
    pub fn height(&self) -> f32 {
        self.tab_strip.h + self.toolbar.h
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<ChromeHit> {
        if self.tab_strip.contains(x, y) {
            for (i, rects) in self.tabs.iter().enumerate() {
                if rects.close.contains(x, y) {
                    return Some(ChromeHit::CloseTab(i));
                }
                if rects.tab.contains(x, y) {
                    return Some(ChromeHit::Tab(i));
                }
            }
            if self.new_tab.contains(x, y) {
                return Some(ChromeHit::Button(ToolbarButton::NewTab));
            }
            return None;
        }

        if self.toolbar.contains(x, y) {
            if let Some((button, _)) = self.buttons.iter().find(|(_, r)| r.contains(x, y)) {
                return Some(ChromeHit::Button(*button));
            }
            if self.go.contains(x, y) {
                return Some(ChromeHit::Button(ToolbarButton::Go));
            }
            if self.url_field.contains(x, y) {
                return Some(ChromeHit::UrlField);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: u32, tabs: usize) -> ChromeLayout {
        ChromeLayout::compute(width, tabs, &ChromeConfig::default())
    }

    fn center(r: &Rect) -> (f32, f32) {
        (r.x + r.w / 2.0, r.y + r.h / 2.0)
    }

    #[test]
    fn test_height_is_strip_plus_toolbar() {
        let config = ChromeConfig::default();
        let l = layout(1024, 1);
        assert_eq!(
            l.height(),
            (config.tab_strip_height + config.toolbar_height) as f32
        );
    }

    #[test]
    fn test_every_navigation_button_is_hittable() {
        let l = layout(1024, 1);
        for (button, rect) in &l.buttons {
            let (x, y) = center(rect);
            assert_eq!(l.hit_test(x, y), Some(ChromeHit::Button(*button)));
        }
        let (x, y) = center(&l.go);
        assert_eq!(l.hit_test(x, y), Some(ChromeHit::Button(ToolbarButton::Go)));
    }

    #[test]
    fn test_url_field_between_buttons_and_go() {
        let l = layout(1024, 1);
        let last_button = l.buttons.last().unwrap().1;
        assert!(l.url_field.x >= last_button.right());
        assert!(l.url_field.right() <= l.go.x);
        let (x, y) = center(&l.url_field);
        assert_eq!(l.hit_test(x, y), Some(ChromeHit::UrlField));
    }

    #[test]
    fn test_tabs_and_close_buttons() {
        let l = layout(1024, 3);
        assert_eq!(l.tabs.len(), 3);
        for (i, rects) in l.tabs.iter().enumerate() {
            let (x, y) = center(&rects.close);
            assert_eq!(l.hit_test(x, y), Some(ChromeHit::CloseTab(i)));
            assert_eq!(l.hit_test(rects.tab.x + 2.0, y), Some(ChromeHit::Tab(i)));
        }
        let (x, y) = center(&l.new_tab);
        assert_eq!(l.hit_test(x, y), Some(ChromeHit::Button(ToolbarButton::NewTab)));
    }

    #[test]
    fn test_tabs_shrink_to_fit() {
        let l = layout(400, 10);
        let last = l.tabs.last().unwrap().tab;
        assert!(l.new_tab.right() <= 400.0 + f32::EPSILON);
        assert!(last.right() <= l.new_tab.x + f32::EPSILON);
    }

    #[test]
    fn test_no_tabs_still_has_new_tab_button() {
        let l = layout(800, 0);
        assert!(l.tabs.is_empty());
        let (x, y) = center(&l.new_tab);
        assert_eq!(l.hit_test(x, y), Some(ChromeHit::Button(ToolbarButton::NewTab)));
    }

    #[test]
    fn test_below_chrome_is_no_hit() {
        let l = layout(1024, 2);
        assert_eq!(l.hit_test(10.0, l.height() + 5.0), None);
    }

    #[test]
    fn test_empty_strip_area_is_no_hit() {
        let l = layout(1024, 1);
        assert_eq!(l.hit_test(1000.0, 5.0), None);
    }

    #[test]
    fn test_rect_inset_never_negative() {
        let r = Rect::new(0.0, 0.0, 4.0, 4.0).inset(5.0);
        assert_eq!((r.w, r.h), (0.0, 0.0));
    }
}
