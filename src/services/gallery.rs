// src/services/gallery.rs

//! Remote gallery client.
//!
//! Issues the two requests the sync engine needs: a paginated listing of a
//! user's posts and a per-post detail lookup. Pacing between calls is the
//! caller's job; the client never sleeps.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    DetailResponse, ListingEntry, ListingPage, ListingResponse, PostDetail, RemoteConfig,
};
use crate::utils::{endpoint, http, unix_millis};

const LISTING_PATH: &str = "gallery/wap/share/user/post/list";
const DETAIL_PATH: &str = "gallery/wap/H5/post/getPostDetailById.do";

/// Read access to the remote gallery.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    /// Fetch one listing page. Pages are 1-based.
    async fn list_page(&self, page: u32) -> Result<ListingPage>;

    /// Fetch the full record for a post seen on the listing.
    async fn fetch_detail(&self, id: &str) -> Result<PostDetail>;
}

/// HTTP implementation of [`GalleryApi`].
pub struct GalleryClient {
    client: Client,
    base_url: String,
    user_id: String,
}

impl GalleryClient {
    /// Create a client with its own connection pool.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Self::with_client(client, config)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, config: &RemoteConfig) -> Result<Self> {
        let user_id = config.user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::config("remote.user_id is empty"));
        }
        Url::parse(&config.base_url)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            user_id: user_id.to_string(),
        })
    }

    /// Build the listing URL for `page` with a fresh timestamp.
    fn listing_url(&self, page: u32) -> Result<Url> {
        let path = format!("{}/{}.do", LISTING_PATH, self.user_id);
        let mut url = endpoint(&self.base_url, &path)?;
        let now = unix_millis().to_string();
        url.query_pairs_mut()
            .append_pair("dataFrom", "1")
            .append_pair("pageNo", &page.to_string())
            .append_pair("requestTime", &now)
            .append_pair("searchType", "4")
            .append_pair("t", &now);
        Ok(url)
    }

    fn detail_url(&self, id: &str) -> Result<Url> {
        let mut url = endpoint(&self.base_url, DETAIL_PATH)?;
        url.query_pairs_mut().append_pair("postId", id);
        Ok(url)
    }

    /// Decode a listing body.
    ///
    /// A missing or null `data`/`data.posts` is an empty page, which is how
    /// the service signals the end of the listing.
    pub(crate) fn parse_listing(body: &str, context: &str) -> Result<ListingPage> {
        let response: ListingResponse =
            serde_json::from_str(body).map_err(|e| AppError::decode(context, e))?;

        let posts = response
            .data
            .and_then(|data| data.posts)
            .unwrap_or_default();

        let entries = posts
            .into_iter()
            .map(ListingEntry::from)
            .filter(|entry| {
                if entry.id.trim().is_empty() {
                    log::debug!("Skipping listing entry without identifier ({})", context);
                    return false;
                }
                true
            })
            .collect();

        Ok(ListingPage::new(entries))
    }

    /// Decode a detail body. The `data.post` object is required.
    pub(crate) fn parse_detail(body: &str, context: &str) -> Result<PostDetail> {
        let response: DetailResponse =
            serde_json::from_str(body).map_err(|e| AppError::decode(context, e))?;

        response
            .data
            .and_then(|data| data.post)
            .ok_or_else(|| AppError::decode(context, "response has no data.post object"))
    }
}

#[async_trait]
impl GalleryApi for GalleryClient {
    async fn list_page(&self, page: u32) -> Result<ListingPage> {
        if page == 0 {
            return Err(AppError::validation("listing pages start at 1"));
        }

        let context = format!("listing page {page}");
        let url = self.listing_url(page)?;
        log::debug!("GET {}", url);

        let body = http::send_for_text(self.client.get(url), &context).await?;
        Self::parse_listing(&body, &context)
    }

    async fn fetch_detail(&self, id: &str) -> Result<PostDetail> {
        if id.trim().is_empty() {
            return Err(AppError::validation("post identifier is empty"));
        }

        let context = format!("post {id}");
        let url = self.detail_url(id)?;
        log::debug!("POST {}", url);

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        let body = http::send_for_text(request, &context).await?;
        Self::parse_detail(&body, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn client() -> GalleryClient {
        let config = RemoteConfig {
            base_url: "https://gallery.example.com".to_string(),
            user_id: "8675309".to_string(),
            ..RemoteConfig::default()
        };
        GalleryClient::new(&config).unwrap()
    }

    #[test]
    fn test_new_requires_user_id() {
        let config = RemoteConfig::default();
        assert!(GalleryClient::new(&config).is_err());
    }

    #[test]
    fn test_listing_url_carries_paging_and_timestamps() {
        let url = client().listing_url(3).unwrap();
        assert_eq!(
            url.path(),
            "/gallery/wap/share/user/post/list/8675309.do"
        );

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("dataFrom"), "1");
        assert_eq!(get("pageNo"), "3");
        assert_eq!(get("searchType"), "4");
        assert_eq!(get("requestTime"), get("t"));
        assert!(get("t").parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_detail_url() {
        let url = client().detail_url("42").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gallery.example.com/gallery/wap/H5/post/getPostDetailById.do?postId=42"
        );
    }

    #[test]
    fn test_parse_listing() {
        let body = r#"{
            "code": 0,
            "data": {
                "posts": [
                    {"postId": 101, "image": {"url": "https://img/101.jpg"}},
                    {"postId": "102"},
                    {"postId": ""},
                    {"postId": "   "}
                ]
            }
        }"#;

        let page = GalleryClient::parse_listing(body, "listing page 1").unwrap();
        let ids: Vec<&str> = page.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102"]);
        assert_eq!(page.entries[0].cover_url.as_deref(), Some("https://img/101.jpg"));
        assert!(page.has_more);
    }

    #[test]
    fn test_parse_listing_absent_data_is_empty_page() {
        for body in [r#"{}"#, r#"{"data": null}"#, r#"{"data": {"posts": null}}"#] {
            let page = GalleryClient::parse_listing(body, "listing page 9").unwrap();
            assert!(page.is_empty());
            assert!(!page.has_more);
        }
    }

    #[test]
    fn test_parse_listing_malformed_is_decode_error() {
        let err = GalleryClient::parse_listing("<html>busy</html>", "listing page 1").unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));

        let err =
            GalleryClient::parse_listing(r#"{"data": {"posts": {}}}"#, "listing page 1").unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }

    #[test]
    fn test_parse_detail() {
        let body = r#"{"data": {"post": {
            "postId": 5,
            "postTitle": "Harbor",
            "postDesc": "Morning fog",
            "userNick": "lens",
            "signature": "35mm",
            "images": ["https://img/5a.jpg", "https://img/5b.jpg"]
        }}}"#;

        let detail = GalleryClient::parse_detail(body, "post 5").unwrap();
        assert_eq!(detail.id, "5");
        assert_eq!(detail.title, "Harbor");
        assert_eq!(detail.description, "Morning fog");
        assert_eq!(detail.images.len(), 2);
    }

    #[test]
    fn test_parse_detail_without_post_is_decode_error() {
        let err = GalleryClient::parse_detail(r#"{"data": {}}"#, "post 5").unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_fetch_detail_rejects_empty_id() {
        let err = client().fetch_detail("  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_page_rejects_page_zero() {
        let err = client().list_page(0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    /// Accept one connection, answer it with `status` and `body`, and hand
    /// back the raw request head.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}"), server)
    }

    fn client_for(base_url: String) -> GalleryClient {
        let config = RemoteConfig {
            base_url,
            user_id: "8675309".to_string(),
            timeout_secs: 5,
            ..RemoteConfig::default()
        };
        GalleryClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_list_page_over_http() {
        let (base, server) = serve_once("200 OK", r#"{"data":{"posts":[{"postId":1}]}}"#).await;

        let page = client_for(base).list_page(1).await.unwrap();
        assert_eq!(page.entries, vec![ListingEntry::new("1")]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /gallery/wap/share/user/post/list/8675309.do?"));
        assert!(request.contains("pageNo=1"));
    }

    #[tokio::test]
    async fn test_fetch_detail_posts_form_request() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data":{"post":{"postId":42,"postTitle":"Pier","images":["https://img/42.jpg"]}}}"#,
        )
        .await;

        let detail = client_for(base).fetch_detail("42").await.unwrap();
        assert_eq!(detail.title, "Pier");
        assert_eq!(detail.images, vec!["https://img/42.jpg"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /gallery/wap/H5/post/getPostDetailById.do?postId=42 "));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("content-type: application/x-www-form-urlencoded")
        );
    }

    #[tokio::test]
    async fn test_server_error_status_is_transport_error() {
        let (base, server) = serve_once("500 Internal Server Error", "boom").await;

        let err = client_for(base).list_page(1).await.unwrap_err();
        assert!(
            matches!(&err, AppError::Transport { context, .. } if context == "listing page 1"),
            "unexpected error: {err:?}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(format!("http://{addr}"))
            .fetch_detail("7")
            .await
            .unwrap_err();
        assert!(
            matches!(&err, AppError::Transport { context, .. } if context == "post 7"),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_html_body_is_decode_error() {
        let (base, server) = serve_once("200 OK", "<html><body>busy</body></html>").await;

        let err = client_for(base).list_page(1).await.unwrap_err();
        assert!(
            matches!(&err, AppError::Decode { context, .. } if context == "listing page 1"),
            "unexpected error: {err:?}"
        );
        server.await.unwrap();
    }
}
