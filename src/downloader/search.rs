// Text search against the YouTube results page

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::models::SearchResult;
use super::traits::SearchIndex;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Scrapes the results page and returns the first video renderer
pub struct YoutubeSearch {
    client: Client,
    base_url: String,
}

impl YoutubeSearch {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_results_page(&self, query: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(format!("{}/results", self.base_url))
            .query(&[("search_query", query), ("hl", "es"), ("gl", "ES")])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl SearchIndex for YoutubeSearch {
    async fn top_match(&self, query: &str) -> Option<SearchResult> {
        match self.fetch_results_page(query).await {
            Ok(html) => {
                let found = parse_top_match(&html);
                if found.is_none() {
                    debug!("[Search] No video found for '{}'", query);
                }
                found
            }
            Err(e) => {
                warn!("[Search] '{}' failed: {}", query, e);
                None
            }
        }
    }
}

/// First `videoRenderer` in the page's embedded `ytInitialData`
pub(crate) fn parse_top_match(html: &str) -> Option<SearchResult> {
    lazy_static::lazy_static! {
        static ref INITIAL_DATA_RE: Regex =
            Regex::new(r"(?s)var ytInitialData\s*=\s*(\{.*?\});\s*</script>").unwrap();
    }

    let raw = INITIAL_DATA_RE.captures(html)?.get(1)?.as_str();
    let data: Value = serde_json::from_str(raw).ok()?;

    let sections = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")?
        .as_array()?;

    sections
        .iter()
        .filter_map(|section| section.pointer("/itemSectionRenderer/contents")?.as_array())
        .flatten()
        .find_map(|item| item.get("videoRenderer").and_then(video_from_renderer))
}

fn video_from_renderer(renderer: &Value) -> Option<SearchResult> {
    let video_id = renderer["videoId"].as_str()?.to_string();
    let title = renderer
        .pointer("/title/runs/0/text")
        .or_else(|| renderer.pointer("/title/simpleText"))?
        .as_str()?
        .to_string();

    Some(SearchResult {
        url: format!("https://www.youtube.com/watch?v={}", video_id),
        video_id,
        title,
        author: renderer
            .pointer("/ownerText/runs/0/text")
            .and_then(Value::as_str)
            .map(str::to_string),
        duration: renderer
            .pointer("/lengthText/simpleText")
            .and_then(Value::as_str)
            .map(str::to_string),
        thumbnail: renderer
            .pointer("/thumbnail/thumbnails")
            .and_then(Value::as_array)
            .and_then(|thumbs| thumbs.last())
            .and_then(|t| t["url"].as_str())
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(data: Value) -> String {
        format!(
            "<html><script nonce=\"x\">var ytInitialData = {};</script><script>var other = 1;</script></html>",
            data
        )
    }

    fn results(items: Value) -> Value {
        json!({
            "contents": {
                "twoColumnSearchResultsRenderer": {
                    "primaryContents": {
                        "sectionListRenderer": {
                            "contents": [
                                {"continuationItemRenderer": {}},
                                {"itemSectionRenderer": {"contents": items}}
                            ]
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_skips_non_video_items() {
        let html = page(results(json!([
            {"channelRenderer": {"channelId": "UC1"}},
            {"videoRenderer": {
                "videoId": "dQw4w9WgXcQ",
                "title": {"runs": [{"text": "Never Gonna Give You Up"}]},
                "ownerText": {"runs": [{"text": "Rick Astley"}]},
                "lengthText": {"simpleText": "3:33"},
                "thumbnail": {"thumbnails": [{"url": "https://i.ytimg.com/s.jpg"}, {"url": "https://i.ytimg.com/l.jpg"}]}
            }},
            {"videoRenderer": {"videoId": "second", "title": {"runs": [{"text": "Second"}]}}}
        ])));

        let found = parse_top_match(&html).unwrap();
        assert_eq!(found.video_id, "dQw4w9WgXcQ");
        assert_eq!(found.title, "Never Gonna Give You Up");
        assert_eq!(found.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(found.author.as_deref(), Some("Rick Astley"));
        assert_eq!(found.duration.as_deref(), Some("3:33"));
        assert_eq!(found.thumbnail.as_deref(), Some("https://i.ytimg.com/l.jpg"));
    }

    #[test]
    fn test_parse_without_videos_is_none() {
        assert!(parse_top_match(&page(results(json!([{"shelfRenderer": {}}])))).is_none());
        assert!(parse_top_match("<html>blocked</html>").is_none());
    }

    #[tokio::test]
    async fn test_top_match_queries_results_page() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/results")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("search_query".into(), "rick astley".into()),
                mockito::Matcher::UrlEncoded("gl".into(), "ES".into()),
            ]))
            .with_status(200)
            .with_body(page(results(json!([
                {"videoRenderer": {"videoId": "abc", "title": {"runs": [{"text": "Song"}]}}}
            ]))))
            .create_async()
            .await;

        let search = YoutubeSearch::new(Client::new(), &server.url());
        let found = search.top_match("rick astley").await.unwrap();
        assert_eq!(found.video_id, "abc");
        assert_eq!(found.author, None);
    }
}
