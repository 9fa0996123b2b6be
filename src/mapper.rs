use crate::sanitize::{escape, truncate};
use crate::tmdb::{MediaType, SearchHit};
use tracing::debug;

pub const NO_TITLE: &str = "no title given";
pub const POSTER_SIZE: &str = "w92";

const TITLE_BYTES: usize = 100;
const DESCRIPTION_BYTES: usize = 100;
const THUMBNAIL_BYTES: usize = 100;
const BODY_BYTES: usize = 500;
const BODY_OVERVIEW_BYTES: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Markdown,
}

/// One inline article, every field already escaped and cut to size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayResult {
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub text: String,
    pub mode: RenderMode,
}

/// Movies carry `original_title`, tv shows `original_name`, anything else has no title.
pub fn select_title(hit: &SearchHit) -> &str {
    match hit.media_type {
        MediaType::Movie => hit.original_title.as_deref().unwrap_or_default(),
        MediaType::Tv => hit.original_name.as_deref().unwrap_or_default(),
        MediaType::Other => NO_TITLE,
    }
}

/// `<base><size><poster_path>`, e.g. `https://image.tmdb.org/t/p/w92/x.jpg`.
pub fn poster_url(image_base_url: &str, hit: &SearchHit) -> String {
    format!(
        "{}{}{}",
        image_base_url,
        POSTER_SIZE,
        hit.poster_path.as_deref().unwrap_or_default()
    )
}

/// Build the inline article for one hit: title, overview and poster link.
pub fn map_hit(hit: &SearchHit, image_base_url: &str) -> DisplayResult {
    let title = select_title(hit);
    let overview = hit.overview.as_deref().unwrap_or_default();
    let image_url = poster_url(image_base_url, hit);
    debug!(
        id = hit.id,
        title,
        poster = %image_url,
        vote_average = hit.vote_average,
        popularity = hit.popularity,
        "mapping search hit"
    );

    let body = format!(
        "{}\n{}\n{}",
        truncate(title, TITLE_BYTES),
        truncate(overview, BODY_OVERVIEW_BYTES),
        truncate(&image_url, THUMBNAIL_BYTES)
    );

    DisplayResult {
        text: escape(&body, BODY_BYTES),
        title: escape(title, TITLE_BYTES),
        description: escape(overview, DESCRIPTION_BYTES),
        thumbnail_url: escape(&image_url, THUMBNAIL_BYTES),
        mode: RenderMode::Markdown,
    }
}
