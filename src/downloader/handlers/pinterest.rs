use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::trace;
use url::Url;

use super::{LocatedMedia, MediaLocator};

static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("Invalid image selector"));
static VIDEO_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("video[src]").expect("Invalid video selector"));

/// Substrings that mark an `<img>` as the pin's media rather than page chrome.
const IMAGE_HINTS: &[&str] = &[".jpg", ".png", "pinimg.com"];

#[derive(Debug, Default)]
pub struct PinterestLocator;

impl MediaLocator for PinterestLocator {
    fn locate(&self, page_url: &Url, html: &str) -> LocatedMedia {
        let document = Html::parse_document(html);

        let image = document
            .select(&IMAGE_SELECTOR)
            .filter_map(|el| el.value().attr("src"))
            .find(|src| IMAGE_HINTS.iter().any(|hint| src.contains(hint)))
            .and_then(|src| absolutize(page_url, src));

        let video = document
            .select(&VIDEO_SELECTOR)
            .find_map(|el| el.value().attr("src"))
            .and_then(|src| absolutize(page_url, src));

        trace!(?image, ?video, "Located media");

        LocatedMedia { image, video }
    }
}

fn absolutize(page_url: &Url, src: &str) -> Option<Url> {
    let src = src.trim();
    if src.starts_with("//") {
        return Url::parse(&format!("https:{src}")).ok();
    }

    page_url.join(src).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://www.pinterest.com/pin/123/").expect("valid url")
    }

    #[test]
    fn picks_first_matching_image() {
        let html = r#"<html><body>
            <img src="/static/logo.svg">
            <img src="https://i.pinimg.com/originals/aa/bb/cc.webp">
            <img src="https://i.pinimg.com/736x/other.jpg">
        </body></html>"#;

        let found = PinterestLocator.locate(&page(), html);

        assert_eq!(
            found.image.map(String::from).as_deref(),
            Some("https://i.pinimg.com/originals/aa/bb/cc.webp")
        );
        assert!(found.video.is_none());
    }

    #[test]
    fn normalizes_protocol_relative_references() {
        let html = r#"<img src="//i.pinimg.com/x.jpg"><video src="//v.pinimg.com/v.mp4"></video>"#;

        let found = PinterestLocator.locate(&page(), html);

        assert_eq!(found.image.map(String::from).as_deref(), Some("https://i.pinimg.com/x.jpg"));
        assert_eq!(found.video.map(String::from).as_deref(), Some("https://v.pinimg.com/v.mp4"));
    }

    #[test]
    fn resolves_relative_references_against_page() {
        let html = r#"<video src="/media/clip.mp4"></video>"#;

        let found = PinterestLocator.locate(&page(), html);

        assert_eq!(
            found.video.map(String::from).as_deref(),
            Some("https://www.pinterest.com/media/clip.mp4")
        );
    }

    #[test]
    fn nothing_found_is_empty() {
        let found = PinterestLocator.locate(&page(), "<p>login required</p><video></video>");
        assert!(found.is_empty());
    }
}
