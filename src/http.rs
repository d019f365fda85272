//! Plain HTTP fetches, the non-browser path.
//!
//! Used by the fallback resolver (static document fetch) and the color
//! extractor (logo assets). Not a browser: no JS runs. Retries transport
//! errors and 5xx responses, honors `Retry-After` on 429.

use anyhow::Result;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

const MAX_RETRIES: u32 = 2;

/// A fetched document body.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Thin reqwest wrapper with a Chrome-like user agent.
#[derive(Clone)]
pub struct FetchClient {
    client: reqwest::Client,
}

impl FetchClient {
    /// Create a client with the given default timeout.
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// GET a text body with retry on 5xx and backoff on 429.
    pub async fn get_text(&self, url: &str, timeout_ms: u64) -> Result<Fetched> {
        let mut retries = 0u32;

        loop {
            let resp = self
                .client
                .get(url)
                .timeout(Duration::from_millis(timeout_ms))
                .send()
                .await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();
                    let final_url = r.url().to_string();

                    if status >= 500 && retries < MAX_RETRIES {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == 429 && retries < MAX_RETRIES {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                        continue;
                    }

                    let body = r.text().await.unwrap_or_default();
                    return Ok(Fetched {
                        final_url,
                        status,
                        body,
                    });
                }
                Err(e) => {
                    if retries < MAX_RETRIES {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let _ = FetchClient::new(10_000);
    }

    #[tokio::test]
    async fn test_get_text_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let client = FetchClient::new(5_000);
        let fetched = client
            .get_text(&format!("{}/page", server.uri()), 5_000)
            .await
            .expect("request failed");
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body, "hello");
    }

    #[tokio::test]
    async fn test_get_text_retries_5xx() {
        let server = MockServer::start().await;
        // Always 500: the client should retry, then surface the final status.
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = FetchClient::new(5_000);
        let fetched = client
            .get_text(&format!("{}/flaky", server.uri()), 5_000)
            .await
            .expect("request failed");
        assert_eq!(fetched.status, 500);
    }
}
