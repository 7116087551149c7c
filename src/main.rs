use app::App;
use iced::{Application, Settings};
use tracing_subscriber::EnvFilter;

use crate::api::Config;

mod api;
mod app;
mod format;
mod models;
mod store;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::with_flags(Config::from_env());

    App::run(settings)
}
