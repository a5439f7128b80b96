use iced::{
    widget::{button, column, container, row, text, Space},
    Background, Color, Element, Length, Theme,
};

/// Link kinds offered above the input box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Posts,
    Stories,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Posts, Tab::Stories];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Posts => "Posts",
            Tab::Stories => "Stories",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Tab::Posts => "https://www.instagram.com/p/...",
            Tab::Stories => "https://www.instagram.com/stories/username/...",
        }
    }
}

/// Colors and underline of a single tab
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabStyle {
    pub text_color: Color,
    pub underline_color: Color,
    pub underline_width: f32,
}

impl TabStyle {
    pub fn active() -> Self {
        Self {
            text_color: Color::from_rgb8(0x1C, 0x16, 0x0C),
            underline_color: Color::from_rgb8(0x01, 0x98, 0x63),
            underline_width: 4.0,
        }
    }

    pub fn inactive() -> Self {
        Self {
            text_color: Color::from_rgb8(0xA1, 0x82, 0x49),
            underline_color: Color::TRANSPARENT,
            underline_width: 3.0,
        }
    }
}

/// Row of tabs with exactly one of them current
pub struct TabBar {
    tabs: Vec<Tab>,
    current: usize,
}

impl Default for TabBar {
    fn default() -> Self {
        Self::new(Tab::Posts)
    }
}

impl TabBar {
    pub fn new(active: Tab) -> Self {
        let tabs = Tab::ALL.to_vec();
        let current = tabs.iter().position(|t| *t == active).unwrap_or(0);
        Self { tabs, current }
    }

    pub fn current(&self) -> Tab {
        self.tabs[self.current]
    }

    pub fn is_active(&self, tab: Tab) -> bool {
        self.current() == tab
    }

    pub fn style_of(&self, tab: Tab) -> TabStyle {
        if self.is_active(tab) {
            TabStyle::active()
        } else {
            TabStyle::inactive()
        }
    }

    /// Make `tab` current. Returns false if it already was (or isn't in the bar).
    pub fn select(&mut self, tab: Tab) -> bool {
        match self.tabs.iter().position(|t| *t == tab) {
            Some(index) if index != self.current => {
                tracing::debug!(from = ?self.current(), to = ?tab, "tab switched");
                self.current = index;
                true
            }
            _ => false,
        }
    }

    pub fn view(&self) -> Element<'_, Tab> {
        let tabs = self.tabs.iter().map(|&tab| -> Element<'static, Tab> {
            let style = self.style_of(tab);

            let label = button(text(tab.label()).size(14).color(style.text_color))
                .style(move |_theme: &Theme, _status| button::Style {
                    background: None,
                    text_color: style.text_color,
                    ..button::Style::default()
                })
                .padding([8, 4])
                .on_press(tab);

            let underline = container(
                Space::new()
                    .width(Length::Fill)
                    .height(Length::Fixed(style.underline_width)),
            )
            .style(move |_theme: &Theme| container::Style {
                background: Some(Background::Color(style.underline_color)),
                ..container::Style::default()
            });

            column![label, underline].width(Length::Shrink).into()
        });

        row(tabs).spacing(32).into()
    }
}
