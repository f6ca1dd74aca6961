// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use event_atlas_core::config::AtlasConfig;
use event_atlas_core::{AtlasError, EventSession, FeedSource, LoadStatus};
use iced::widget::{button, checkbox, column, container, image, row, scrollable, stack, text};
use iced::{Element, Length, Task, Theme};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger,
};
use std::path::PathBuf;

mod map;
mod style;
use map::{MapView, TileManager};

const LOG_FILE: &str = "event_atlas.log";
const ICON_DIR: &str = "icons";

fn main() -> iced::Result {
    init_logging();
    iced::application("Event Atlas", App::update, App::view)
        .theme(|_| Theme::Dark)
        .run_with(App::new)
}

fn init_logging() {
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Info,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let root = event_atlas_core::get_config_root();
    let log_file = std::fs::create_dir_all(&root)
        .and_then(|_| std::fs::File::create(root.join(LOG_FILE)));
    match log_file {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
        Err(e) => eprintln!("Log file unavailable ({}), logging to terminal only", e),
    }

    let _ = CombinedLogger::init(loggers);
}

#[derive(Debug, Clone)]
enum Message {
    FeedLoaded(Result<Vec<u8>, String>),
    ToggleCategory(String, bool),
    SelectAll,
    SelectNone,
    ZoomToVisible,
    MapZoom {
        new_center: (f64, f64),
        new_zoom: f64,
    },
    MapResized((f32, f32)),
    SelectEvent(usize),
    HoverEvent(Option<usize>),
    ClosePopup,
}

struct App {
    session: EventSession,
    tile_manager: TileManager,
    icon_dir: PathBuf,
    map_zoom: f64,
    map_center: (f64, f64), // (lat, lon)
    map_size: Option<(f32, f32)>,
    selected_event: Option<usize>,
    hovered_event: Option<usize>,
}

/// Runs the blocking fetch off the UI executor.
async fn fetch_feed(source: FeedSource) -> Result<Vec<u8>, String> {
    let (tx, rx) = iced::futures::channel::oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(source.fetch().map_err(|e| e.to_string()));
    });
    rx.await
        .map_err(|_| "feed worker exited without a result".to_string())?
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let config = AtlasConfig::load().unwrap_or_else(|e| {
            log::error!("Config unreadable, using defaults: {}", e);
            AtlasConfig::default()
        });
        let feed = std::env::var("EVENT_ATLAS_FEED").unwrap_or_else(|_| config.feed.clone());
        let source = FeedSource::parse(&feed);

        let app = Self {
            session: EventSession::new(config.show_icons),
            icon_dir: event_atlas_core::get_config_root().join(ICON_DIR),
            map_zoom: config.initial_zoom,
            map_center: (config.initial_center[0], config.initial_center[1]),
            map_size: None,
            selected_event: None,
            hovered_event: None,
            tile_manager: TileManager::new(config),
        };

        log::info!("Loading events — source={}", source);
        (app, Task::perform(fetch_feed(source), Message::FeedLoaded))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::FeedLoaded(result) => {
                let fetched = result.map_err(AtlasError::FeedUnavailable);
                self.session.finish_load(fetched);
                self.selected_event = None;
                self.hovered_event = None;
                Task::none()
            }
            Message::ToggleCategory(row_id, checked) => {
                self.session.toggle_row(&row_id, checked);
                self.drop_hidden_selection();
                Task::none()
            }
            Message::SelectAll => {
                self.session.select_all();
                self.drop_hidden_selection();
                Task::none()
            }
            Message::SelectNone => {
                self.session.select_none();
                self.drop_hidden_selection();
                Task::none()
            }
            Message::ZoomToVisible => {
                if let (Some(bounds), Some((w, h))) = (self.session.zoom_target(), self.map_size) {
                    let (center, zoom) = map::fit_bounds(&bounds, w, h);
                    self.map_center = center;
                    self.map_zoom = zoom;
                }
                Task::none()
            }
            Message::MapZoom {
                new_center,
                new_zoom,
            } => {
                self.map_center = new_center;
                self.map_zoom = new_zoom;
                Task::none()
            }
            Message::MapResized(size) => {
                self.map_size = Some(size);
                Task::none()
            }
            Message::SelectEvent(index) => {
                self.selected_event = Some(index);
                Task::none()
            }
            Message::HoverEvent(index) => {
                self.hovered_event = index;
                Task::none()
            }
            Message::ClosePopup => {
                self.selected_event = None;
                Task::none()
            }
        }
    }

    /// Popups only stay open for markers still on the map.
    fn drop_hidden_selection(&mut self) {
        if let Some(index) = self.selected_event {
            let session = &self.session;
            let still_visible = session.event(index).is_some_and(|e| {
                session
                    .coordinator()
                    .is_visible(session.registry(), &e.category)
            });
            if !still_visible {
                self.selected_event = None;
            }
        }
        self.hovered_event = None;
    }

    fn view(&self) -> Element<'_, Message> {
        let map_view: Element<'_, Message> = MapView {
            markers: self
                .session
                .coordinator()
                .visible_markers(self.session.registry())
                .collect(),
            selected_event: self.selected_event,
            hovered_event: self.hovered_event,
            tile_manager: &self.tile_manager,
            zoom: self.map_zoom,
            center: self.map_center,
        }
        .into();

        let map_pane: Element<'_, Message> = match self.inspector() {
            Some(card) => stack![
                map_view,
                container(card).padding(16).align_right(Length::Fill)
            ]
            .into(),
            None => map_view,
        };

        row![self.sidebar(), map_pane]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn sidebar(&self) -> Element<'_, Message> {
        let status = self.session.status();
        let status_color = match status {
            LoadStatus::Failed => style::palette::ACCENT_RED,
            _ => style::palette::TEXT_SECONDARY,
        };
        let loaded = self.session.is_loaded();

        let action = |label: &'static str, msg: Message| {
            button(text(label).size(13))
                .padding([6, 10])
                .style(style::button_primary)
                .on_press_maybe(loaded.then_some(msg))
        };

        let mut rows = column![].spacing(6);
        for control in &self.session.panel().rows {
            let color = self
                .session
                .registry()
                .layer_of(&control.label)
                .map(|layer| style::category_color(layer.0))
                .unwrap_or(style::palette::TEXT_SECONDARY);

            let marker: Element<'_, Message> = match control.icon.map(|i| self.icon_dir.join(i)) {
                Some(path) if path.exists() => image(path).width(16).height(16).into(),
                _ => container(text(""))
                    .width(12)
                    .height(12)
                    .style(style::swatch(color))
                    .into(),
            };

            let id = control.id.clone();
            rows = rows.push(
                row![
                    checkbox("", control.checked)
                        .on_toggle(move |checked| Message::ToggleCategory(id.clone(), checked)),
                    marker,
                    text(control.label.clone()).size(14).width(Length::Fill),
                    text(control.count.to_string())
                        .size(13)
                        .color(style::palette::TEXT_SECONDARY),
                ]
                .spacing(8)
                .align_y(iced::Alignment::Center),
            );
        }

        let content = column![
            text("Event Atlas").size(20),
            text(status.to_string()).size(13).color(status_color),
            text(format!("Visible: {}", self.session.visible_count())).size(14),
            row![
                action("Select all", Message::SelectAll),
                action("Select none", Message::SelectNone),
            ]
            .spacing(6),
            action("Zoom to visible", Message::ZoomToVisible),
            scrollable(rows).height(Length::Fill),
        ]
        .spacing(12)
        .padding(16);

        container(content)
            .width(Length::Fixed(300.0))
            .height(Length::Fill)
            .style(style::container_sidebar)
            .into()
    }

    fn inspector(&self) -> Option<Element<'_, Message>> {
        let popup = self.session.popup(self.selected_event?)?;

        let mut body = column![row![
            text(popup.title.clone()).size(16).width(Length::Fill),
            button(text("×").size(14))
                .style(style::button_ghost)
                .on_press(Message::ClosePopup),
        ]
        .align_y(iced::Alignment::Center)]
        .spacing(4);

        // First line repeats the title shown in the header
        for line in popup.lines().into_iter().skip(1) {
            body = body.push(text(line).size(13).color(style::palette::TEXT_PRIMARY));
        }

        Some(
            container(body)
                .padding(12)
                .width(Length::Fixed(320.0))
                .style(style::container_card)
                .into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [20, 10] },
              "properties": { "title": "A", "category": "Piracy" } },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [30, -4] },
              "properties": { "title": "B", "category": "Smuggling" } }
        ]
    }"#;

    fn loaded_app() -> App {
        let mut session = EventSession::new(false);
        session.finish_load(Ok(FEED.as_bytes().to_vec()));
        App {
            session,
            tile_manager: TileManager::new(AtlasConfig::default()),
            icon_dir: PathBuf::new(),
            map_zoom: 2.0,
            map_center: (0.0, 0.0),
            map_size: None,
            selected_event: None,
            hovered_event: None,
        }
    }

    #[test]
    fn test_every_visibility_change_resets_hover() {
        let mut app = loaded_app();
        for msg in [
            Message::SelectAll,
            Message::SelectNone,
            Message::ToggleCategory("cat-piracy".to_string(), true),
        ] {
            app.hovered_event = Some(0);
            let _ = app.update(msg);
            assert!(app.hovered_event.is_none());
        }
    }

    #[test]
    fn test_hiding_a_category_closes_its_popup() {
        let mut app = loaded_app();
        let _ = app.update(Message::SelectEvent(0));

        let _ = app.update(Message::SelectAll);
        assert_eq!(app.selected_event, Some(0));

        let _ = app.update(Message::ToggleCategory("cat-smuggling".to_string(), false));
        assert_eq!(app.selected_event, Some(0));

        let _ = app.update(Message::ToggleCategory("cat-piracy".to_string(), false));
        assert!(app.selected_event.is_none());
    }
}
