use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use iced::{
    executor,
    widget::{self, column, image::Handle, row},
    Application, Color, Command, Length, Theme,
};

use crate::{
    api::{CatalogApi, Config, MtgApiClient},
    format,
    models::{AdminStats, ImageDownloadStats, MtgCard, MtgSet, SetStatus},
    store::{error_message, CatalogStore},
};

/// Display order for rarity groups; rarities the backend invents go last.
const RARITY_ORDER: &[&str] = &[
    "Mythic Rare",
    "Rare",
    "Uncommon",
    "Common",
    "Special",
    "Basic Land",
    "Unknown",
];

pub struct App {
    api: Arc<MtgApiClient>,
    store: CatalogStore,
    section: Section,
    search_text: String,
    latest_summary: Option<MtgSet>,
    admin_code: String,
    admin_stats: Option<AdminStats>,
    set_statuses: Vec<SetStatus>,
    image_stats: Option<ImageDownloadStats>,
    admin_output: String,
    image_cache: HashMap<String, Bytes>,
}

#[derive(Debug, Clone)]
pub enum Section {
    Sets,
    Latest,
    SetView,
    Admin,
}

#[derive(Debug, Clone)]
pub enum AppMessage {
    ChangeSection(Section),
    RefreshSets,
    SetsLoaded(u64, Result<Vec<MtgSet>, String>),
    ViewLatest,
    ViewSet(String),
    SetLoaded(u64, Result<MtgSet, String>),
    LatestSummaryLoaded(Option<MtgSet>),
    Search(String),
    ClearError,
    ResetStore,
    ImageLoaded(String, Option<Bytes>),
    AdminCodeChanged(String),
    SyncSet,
    SaveComplete,
    ForceSyncRealtime,
    DownloadImages,
    AdminActionDone(Result<String, String>),
    RefreshAdmin,
    AdminStatsLoaded(Result<AdminStats, String>),
    StatusesLoaded(Result<Vec<SetStatus>, String>),
    ImageStatsLoaded(Result<ImageDownloadStats, String>),
    DebugAllSets,
    DebugLatestDetection,
    DebugLoaded(Result<serde_json::Value, String>),
}

type AppElement<'a> = iced::Element<'a, AppMessage, Theme, iced::Renderer>;

impl Application for App {
    type Executor = executor::Default;
    type Message = AppMessage;
    type Theme = Theme;
    type Flags = Config;

    fn new(flags: Self::Flags) -> (Self, iced::Command<Self::Message>) {
        let api = Arc::new(MtgApiClient::new(flags));
        let mut store = CatalogStore::new(api.clone());

        let seq = store.begin_fetch();
        let sets_api = api.clone();
        let sets_command = Command::perform(
            async move {
                sets_api
                    .get_all_sets()
                    .await
                    .map_err(|e| error_message(&e, "Failed to load sets"))
            },
            move |res| AppMessage::SetsLoaded(seq, res),
        );

        let latest_api = api.clone();
        let latest_command = Command::perform(
            async move { latest_api.get_latest_set().await.ok() },
            AppMessage::LatestSummaryLoaded,
        );

        (
            Self {
                api,
                store,
                section: Section::Sets,
                search_text: String::new(),
                latest_summary: None,
                admin_code: String::new(),
                admin_stats: None,
                set_statuses: Vec::new(),
                image_stats: None,
                admin_output: String::new(),
                image_cache: HashMap::new(),
            },
            Command::batch([sets_command, latest_command]),
        )
    }

    fn title(&self) -> String {
        "mtg catalog".to_owned()
    }

    fn theme(&self) -> Self::Theme {
        Theme::Dark
    }

    fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
        match message {
            AppMessage::ChangeSection(section) => {
                if matches!(section, Section::Admin) {
                    self.section = section;
                    return self.refresh_admin();
                }
                self.section = section;
            }
            AppMessage::RefreshSets => {
                let seq = self.store.begin_fetch();
                let api = self.api.clone();
                return Command::perform(
                    async move {
                        api.get_all_sets()
                            .await
                            .map_err(|e| error_message(&e, "Failed to load sets"))
                    },
                    move |res| AppMessage::SetsLoaded(seq, res),
                );
            }
            AppMessage::SetsLoaded(seq, result) => self.store.finish_sets_fetch(seq, result),
            AppMessage::ViewLatest => {
                self.section = Section::Latest;
                self.search_text = String::new();
                let seq = self.store.begin_fetch();
                let api = self.api.clone();
                return Command::perform(
                    async move {
                        api.get_latest_set_with_cards()
                            .await
                            .map_err(|e| error_message(&e, "Failed to load the latest set"))
                    },
                    move |res| AppMessage::SetLoaded(seq, res),
                );
            }
            AppMessage::ViewSet(code) => {
                self.section = Section::SetView;
                self.search_text = String::new();
                let seq = self.store.begin_fetch();
                let api = self.api.clone();
                return Command::perform(
                    async move {
                        api.get_set_with_cards(&code)
                            .await
                            .map_err(|e| error_message(&e, &format!("Failed to load set {code}")))
                    },
                    move |res| AppMessage::SetLoaded(seq, res),
                );
            }
            AppMessage::SetLoaded(seq, result) => {
                self.store.finish_set_fetch(seq, result);
                return Command::batch(
                    self.store
                        .latest_set_cards()
                        .iter()
                        .filter(|c| {
                            c.image_url.is_some() && !self.image_cache.contains_key(&c.id)
                        })
                        .map(|c| {
                            let id = c.id.clone();
                            let url = c.image_url.clone().unwrap_or_default();
                            Command::perform(
                                async move { download_image(&id, &url).await },
                                |res| AppMessage::ImageLoaded(res.0, res.1),
                            )
                        }),
                );
            }
            AppMessage::LatestSummaryLoaded(set) => self.latest_summary = set,
            AppMessage::Search(query) => self.search_text = query,
            AppMessage::ClearError => self.store.clear_error(),
            AppMessage::ResetStore => {
                self.store.reset();
                self.search_text = String::new();
                self.image_cache = HashMap::new();
            }
            AppMessage::ImageLoaded(id, bytes) => {
                if let Some(b) = bytes {
                    self.image_cache.insert(id, b);
                }
            }
            AppMessage::AdminCodeChanged(code) => self.admin_code = code,
            AppMessage::SyncSet => {
                let api = self.api.clone();
                let code = self.admin_code.clone();
                return Command::perform(
                    async move {
                        api.sync_set(&code)
                            .await
                            .map_err(|e| error_message(&e, "Sync request failed"))
                    },
                    AppMessage::AdminActionDone,
                );
            }
            AppMessage::SaveComplete => {
                let api = self.api.clone();
                let code = self.admin_code.clone();
                return Command::perform(
                    async move {
                        api.save_complete_set(&code)
                            .await
                            .map_err(|e| error_message(&e, "Save request failed"))
                    },
                    AppMessage::AdminActionDone,
                );
            }
            AppMessage::ForceSyncRealtime => {
                let api = self.api.clone();
                let code = self.admin_code.clone();
                return Command::perform(
                    async move {
                        api.force_sync_realtime(&code)
                            .await
                            .map_err(|e| error_message(&e, "Realtime sync request failed"))
                    },
                    AppMessage::AdminActionDone,
                );
            }
            AppMessage::DownloadImages => {
                let api = self.api.clone();
                let code = self.admin_code.clone();
                return Command::perform(
                    async move {
                        api.download_set_images(&code)
                            .await
                            .map_err(|e| error_message(&e, "Image download request failed"))
                    },
                    AppMessage::AdminActionDone,
                );
            }
            AppMessage::AdminActionDone(result) => {
                self.admin_output = match result {
                    Ok(message) => message,
                    Err(message) => message,
                };
                return self.refresh_admin();
            }
            AppMessage::RefreshAdmin => return self.refresh_admin(),
            AppMessage::AdminStatsLoaded(result) => match result {
                Ok(stats) => self.admin_stats = Some(stats),
                Err(message) => self.admin_output = message,
            },
            AppMessage::StatusesLoaded(result) => match result {
                Ok(statuses) => self.set_statuses = statuses,
                Err(message) => self.admin_output = message,
            },
            AppMessage::ImageStatsLoaded(result) => match result {
                Ok(stats) => self.image_stats = Some(stats),
                Err(message) => self.admin_output = message,
            },
            AppMessage::DebugAllSets => {
                let api = self.api.clone();
                return Command::perform(
                    async move {
                        api.debug_all_sets()
                            .await
                            .map_err(|e| error_message(&e, "Debug request failed"))
                    },
                    AppMessage::DebugLoaded,
                );
            }
            AppMessage::DebugLatestDetection => {
                let api = self.api.clone();
                return Command::perform(
                    async move {
                        api.debug_latest_set_detection()
                            .await
                            .map_err(|e| error_message(&e, "Debug request failed"))
                    },
                    AppMessage::DebugLoaded,
                );
            }
            AppMessage::DebugLoaded(result) => {
                self.admin_output = match result {
                    Ok(value) => {
                        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
                    }
                    Err(message) => message,
                };
            }
        };

        iced::Command::none()
    }

    fn view(&self) -> iced::Element<'_, Self::Message, Self::Theme, iced::Renderer> {
        let btn_sets = widget::button("Sets")
            .width(Length::Fixed(100.))
            .on_press(AppMessage::ChangeSection(Section::Sets));
        let btn_latest = widget::button("Latest")
            .width(Length::Fixed(100.))
            .on_press(AppMessage::ViewLatest);
        let btn_admin = widget::button("Admin")
            .width(Length::Fixed(100.))
            .on_press(AppMessage::ChangeSection(Section::Admin));

        let mut nav = column!(btn_sets, btn_latest, btn_admin).spacing(5);
        if let Some(latest) = &self.latest_summary {
            nav = nav.push(widget::text(format!("Latest: {}", latest.code)).size(14));
        }

        let content = match self.section {
            Section::Sets => view_sets(self),
            Section::Latest | Section::SetView => view_focused_set(self),
            Section::Admin => view_admin(self),
        };

        let mut page = column!();
        if self.store.loading() {
            page = page.push(widget::text("Loading..."));
        }
        if let Some(error) = self.store.error() {
            let banner = row!(
                widget::text(error).style(Color::from_rgb(0.9, 0.3, 0.3)),
                widget::button("Dismiss").on_press(AppMessage::ClearError),
            )
            .spacing(10);
            page = page.push(banner);
        }
        page = page.push(content);

        row!(nav, page.spacing(10)).spacing(15).padding(10).into()
    }
}

impl App {
    fn refresh_admin(&self) -> Command<AppMessage> {
        let stats_api = self.api.clone();
        let statuses_api = self.api.clone();
        let images_api = self.api.clone();
        Command::batch([
            Command::perform(
                async move {
                    stats_api
                        .get_admin_stats()
                        .await
                        .map_err(|e| error_message(&e, "Failed to load stats"))
                },
                AppMessage::AdminStatsLoaded,
            ),
            Command::perform(
                async move {
                    statuses_api
                        .get_all_sets_status()
                        .await
                        .map_err(|e| error_message(&e, "Failed to load set statuses"))
                },
                AppMessage::StatusesLoaded,
            ),
            Command::perform(
                async move {
                    images_api
                        .image_download_stats()
                        .await
                        .map_err(|e| error_message(&e, "Failed to load image stats"))
                },
                AppMessage::ImageStatsLoaded,
            ),
        ])
    }
}

fn view_sets(app: &App) -> AppElement {
    let header = row!(
        widget::text(format!("{} sets", app.store.sets_count())).width(Length::Fill),
        widget::button("Refresh").on_press(AppMessage::RefreshSets),
    )
    .spacing(10);

    let rows = widget::scrollable(widget::column(
        app.store.sets().iter().map(view_set_row),
    ))
    .width(Length::Fill);

    column!(header, rows).spacing(10).into()
}

fn view_set_row(set: &MtgSet) -> AppElement {
    let release = set
        .release_date
        .as_deref()
        .map(format::format_date)
        .unwrap_or_default();
    let label = format!("{} ({}) — {} {}", set.name, set.code, set.set_type, release);
    let txt = widget::text(label).width(Length::Fill);
    let btn_view = widget::button("View").on_press(AppMessage::ViewSet(set.code.clone()));

    row!(txt, btn_view).spacing(10).into()
}

fn view_focused_set(app: &App) -> AppElement {
    let Some(set) = app.store.latest_set() else {
        return widget::text("No set loaded").into();
    };

    let title = widget::text(format!(
        "{} ({}) — {} cards",
        set.name,
        set.code,
        app.store.total_cards()
    ))
    .size(20);

    let search = widget::text_input("search cards...", &app.search_text)
        .on_input(AppMessage::Search);

    let cards = format::filter_cards(app.store.latest_set_cards(), &app.search_text);
    let groups = format::group_by_rarity(&cards);

    let mut listing = column!().spacing(8);
    for rarity in sorted_rarities(&groups) {
        let header = widget::text(format!("{} ({})", rarity, groups[&rarity].len()))
            .size(18)
            .style(hex_color(format::rarity_color(&rarity)));
        listing = listing.push(header);
        for card in &groups[&rarity] {
            listing = listing.push(view_card_row(app, card));
        }
    }

    column!(title, search, widget::scrollable(listing).width(Length::Fill))
        .spacing(10)
        .into()
}

fn view_card_row<'a>(app: &'a App, card: &MtgCard) -> AppElement<'a> {
    let img: AppElement = match app.image_cache.get(&card.id) {
        Some(bytes) => widget::image::<Handle>(Handle::from_memory(bytes.clone()))
            .content_fit(iced::ContentFit::ScaleDown)
            .height(100)
            .into(),
        None => widget::text("no image").width(Length::Fixed(70.)).into(),
    };

    let mana = format::format_mana_cost(card.mana_cost.as_deref());
    let name_line = if mana.is_empty() {
        card.name.clone()
    } else {
        format!("{}  {}", card.name, mana)
    };

    let mut info = column!(
        widget::text(name_line),
        widget::text(card.type_line.clone())
            .style(hex_color(format::type_color(&card.type_line))),
        widget::text(card.rarity.clone()).style(hex_color(format::rarity_color(&card.rarity))),
    );
    if let (Some(power), Some(toughness)) = (&card.power, &card.toughness) {
        info = info.push(widget::text(format!("{power}/{toughness}")).size(14));
    }

    row!(img, info).spacing(10).into()
}

fn view_admin(app: &App) -> AppElement {
    let mut stats = column!().spacing(4);
    if let Some(s) = &app.admin_stats {
        stats = stats.push(widget::text(format!(
            "{} sets ({} synced), {} cards, {} artists",
            s.total_sets, s.synced_sets, s.total_cards, s.distinct_artists
        )));
        stats = stats.push(widget::text(format!(
            "Images: {}/{} ({})",
            s.image_stats.downloaded,
            s.image_stats.total,
            format::format_percentage(s.image_stats.percentage)
        )));
    }
    if let Some(s) = &app.image_stats {
        stats = stats.push(widget::text(format!(
            "Downloader: {} done, {} pending of {}",
            s.downloaded_cards, s.pending_cards, s.total_cards
        )));
    }

    let code_input = widget::text_input("set code...", &app.admin_code)
        .on_input(AppMessage::AdminCodeChanged)
        .width(Length::Fixed(120.));
    let actions = row!(
        code_input,
        widget::button("Sync").on_press(AppMessage::SyncSet),
        widget::button("Save complete").on_press(AppMessage::SaveComplete),
        widget::button("Force realtime").on_press(AppMessage::ForceSyncRealtime),
        widget::button("Download images").on_press(AppMessage::DownloadImages),
    )
    .spacing(5);

    let tools = row!(
        widget::button("Refresh").on_press(AppMessage::RefreshAdmin),
        widget::button("Debug sets").on_press(AppMessage::DebugAllSets),
        widget::button("Debug latest").on_press(AppMessage::DebugLatestDetection),
        widget::button("Reset viewer").on_press(AppMessage::ResetStore),
    )
    .spacing(5);

    let statuses = widget::column(app.set_statuses.iter().map(view_status_row));

    let output = widget::scrollable(widget::text(&app.admin_output)).width(Length::Fill);

    column!(stats, actions, tools, statuses, output)
        .spacing(10)
        .into()
}

fn view_status_row(status: &SetStatus) -> AppElement {
    let synced = if status.cards_synced.unwrap_or(false) {
        "synced"
    } else {
        "not synced"
    };
    widget::text(format!(
        "{} ({}) — {} cards, {}, images {}",
        status.name,
        status.code,
        status.cards_count,
        synced,
        format::format_percentage(status.completion_percentage),
    ))
    .size(14)
    .into()
}

fn sorted_rarities(groups: &HashMap<String, Vec<MtgCard>>) -> Vec<String> {
    let mut rarities: Vec<String> = groups.keys().cloned().collect();
    rarities.sort_by_key(|r| {
        RARITY_ORDER
            .iter()
            .position(|known| *known == r.as_str())
            .unwrap_or(RARITY_ORDER.len())
    });
    rarities
}

fn hex_color(hex: &str) -> Color {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0x666666);
    Color::from_rgb8(
        ((value >> 16) & 0xff) as u8,
        ((value >> 8) & 0xff) as u8,
        (value & 0xff) as u8,
    )
}

async fn download_image(card_id: &str, image_url: &str) -> (String, Option<Bytes>) {
    let request = reqwest::get(image_url).await.ok();
    let img = match request {
        Some(res) => res.bytes().await.ok(),
        None => None,
    };
    (card_id.to_owned(), img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_and_recover() {
        let c = hex_color("#ff4500");
        assert!((c.r - 1.0).abs() < f32::EPSILON);
        assert_eq!(hex_color("junk"), hex_color("#666666"));
    }

    #[test]
    fn rarity_display_order_is_stable() {
        let mut groups: HashMap<String, Vec<MtgCard>> = HashMap::new();
        for rarity in ["Common", "Mythic Rare", "Oddity", "Rare"] {
            groups.insert(rarity.to_owned(), Vec::new());
        }
        assert_eq!(
            sorted_rarities(&groups),
            vec!["Mythic Rare", "Rare", "Common", "Oddity"]
        );
    }
}
