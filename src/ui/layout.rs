use tui::layout::{Constraint, Layout, Rect, Size};
pub const TAB_BAR_HEIGHT: u16 = 3;
pub const LOG_PANE_HEIGHT: u16 = 8;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub tab_bar: [Rect; 2],
    pub banner: Rect,
    pub main: Rect,
    pub logs: Option<Rect>,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_banner: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_banner, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_banner: bool, show_logs: bool) -> Self {
        let tab_height = if full_screen { 0 } else { TAB_BAR_HEIGHT };
        let banner_height = u16::from(show_banner);
        let log_height = if show_logs { LOG_PANE_HEIGHT } else { 0 };

        let [tab, banner, main, logs] = Layout::vertical([
            Constraint::Length(tab_height),
            Constraint::Length(banner_height),
            Constraint::Fill(1),
            Constraint::Length(log_height),
        ])
        .areas(area);

        LayoutAreas {
            tab_bar: if full_screen { [Rect::ZERO, Rect::ZERO] } else { Self::split_tab_bar(tab) },
            banner,
            main,
            logs: show_logs.then_some(logs),
        }
    }

    fn split_tab_bar(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(75), Constraint::Percentage(25)]).areas(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_screen_hides_tab_bar() {
        let areas = LayoutAreas::from_rect(Rect::new(0, 0, 80, 24), true, false, false);
        assert_eq!(areas.tab_bar, [Rect::ZERO, Rect::ZERO]);
        assert_eq!(areas.main.height, 24);
        assert!(areas.logs.is_none());
    }

    #[test]
    fn banner_and_logs_take_rows_from_main() {
        let areas = LayoutAreas::from_rect(Rect::new(0, 0, 80, 24), false, true, true);
        assert_eq!(areas.banner.height, 1);
        assert_eq!(areas.logs.map(|r| r.height), Some(LOG_PANE_HEIGHT));
        assert_eq!(areas.main.height, 24 - TAB_BAR_HEIGHT - 1 - LOG_PANE_HEIGHT);
    }
}
