// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use iced::widget::{button, container};
use iced::{Background, Border, Color, Shadow, Theme};

pub mod palette {
    use iced::Color;

    pub const BACKGROUND: Color = Color::from_rgb(0.12, 0.12, 0.12); // #1e1e1e
    pub const SURFACE: Color = Color::from_rgb(0.18, 0.18, 0.18); // #2d2d2d
    pub const ACCENT_BLUE: Color = Color::from_rgb(0.23, 0.51, 0.96); // #3b82f6
    pub const ACCENT_RED: Color = Color::from_rgb(0.94, 0.27, 0.27); // #ef4444
    pub const TEXT_PRIMARY: Color = Color::from_rgb(0.9, 0.9, 0.9);
    pub const TEXT_SECONDARY: Color = Color::from_rgb(0.6, 0.6, 0.6);
    pub const BORDER: Color = Color::from_rgb(0.25, 0.25, 0.25);

    /// Marker colors, cycled by layer index.
    pub const CATEGORY: [Color; 8] = [
        Color::from_rgb(0.94, 0.27, 0.27), // red
        Color::from_rgb(0.98, 0.45, 0.09), // orange
        Color::from_rgb(0.92, 0.70, 0.03), // amber
        Color::from_rgb(0.20, 0.70, 0.30), // green
        Color::from_rgb(0.02, 0.71, 0.83), // cyan
        Color::from_rgb(0.23, 0.51, 0.96), // blue
        Color::from_rgb(0.66, 0.33, 0.97), // violet
        Color::from_rgb(0.93, 0.29, 0.60), // pink
    ];
}

pub fn category_color(layer_index: usize) -> Color {
    palette::CATEGORY[layer_index % palette::CATEGORY.len()]
}

pub fn container_sidebar(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::BACKGROUND)),
        border: Border {
            color: palette::BORDER,
            width: 1.0,
            radius: 0.0.into(),
        },
        ..Default::default()
    }
}

pub fn container_card(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::SURFACE)),
        border: Border {
            color: palette::BORDER,
            width: 1.0,
            radius: 8.0.into(),
        },
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.5),
            offset: iced::Vector::new(0.0, 4.0),
            blur_radius: 12.0,
        },
        ..Default::default()
    }
}

pub fn swatch(color: Color) -> impl Fn(&Theme) -> container::Style {
    move |_theme| container::Style {
        background: Some(Background::Color(color)),
        border: Border {
            color: Color::BLACK,
            width: 1.0,
            radius: 3.0.into(),
        },
        ..Default::default()
    }
}

pub fn button_primary(_theme: &Theme, status: button::Status) -> button::Style {
    let base = button::Style {
        background: Some(Background::Color(palette::ACCENT_BLUE)),
        text_color: Color::WHITE,
        border: Border {
            radius: 6.0.into(),
            ..Default::default()
        },
        shadow: Shadow::default(),
    };

    match status {
        button::Status::Hovered => button::Style {
            background: Some(Background::Color(Color::from_rgb(0.3, 0.6, 1.0))),
            shadow: Shadow {
                color: Color::from_rgba(0.23, 0.51, 0.96, 0.6),
                offset: iced::Vector::new(0.0, 4.0),
                blur_radius: 12.0,
            },
            ..base
        },
        button::Status::Disabled => button::Style {
            background: Some(Background::Color(palette::SURFACE)),
            text_color: palette::TEXT_SECONDARY,
            ..base
        },
        _ => base,
    }
}

pub fn button_ghost(_theme: &Theme, status: button::Status) -> button::Style {
    let base = button::Style {
        background: None,
        text_color: palette::TEXT_SECONDARY,
        border: Border::default(),
        shadow: Shadow::default(),
    };

    match status {
        button::Status::Hovered => button::Style {
            text_color: palette::TEXT_PRIMARY,
            ..base
        },
        _ => base,
    }
}
