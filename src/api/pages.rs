//! Welcome message and server-rendered pages.

use std::sync::Arc;

use axum::{extract::State, response::Html, Json};
use rand::seq::SliceRandom;

use super::error::ApiError;
use super::mission_store::MissionStats;
use super::routes::AppState;
use super::types::MessageResponse;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const NEWS_TEMPLATE: &str = include_str!("../../templates/news.html");

pub const FUN_FACTS: &[&str] = &[
    "The sun is 330,000 times more massive than Earth!",
    "One day on Venus is longer than a year on Venus.",
    "The Milky Way has over 200 billion stars.",
    "Space is completely silent because there's no air.",
    "Jupiter's Great Red Spot is a massive storm that has raged for hundreds of years.",
];

pub async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to Space Nomad!"))
}

fn render_index(stats: &MissionStats, fun_fact: &str) -> String {
    INDEX_TEMPLATE
        .replace("{{total_missions}}", &stats.total.to_string())
        .replace("{{completed_missions}}", &stats.completed.to_string())
        .replace("{{ongoing_missions}}", &stats.ongoing.to_string())
        .replace("{{fun_fact}}", fun_fact)
}

/// Home page with mission counts and a random fact.
pub async fn read_home(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let stats = state.store.mission_stats().await?;
    let fun_fact = FUN_FACTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default();
    Ok(Html(render_index(&stats, fun_fact)))
}

pub async fn news() -> Html<&'static str> {
    Html(NEWS_TEMPLATE)
}
