//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to serve a small review listing over HTTP and
//! drive the full pipeline end-to-end through the static page backend.

use review_harvest::config::{
    Config, OutputConfig, ScraperConfig, SelectorOverrides, TargetConfig,
};
use review_harvest::scraper::scrape;
use review_harvest::HarvestError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration pointed at the given seed URL
fn create_test_config(seed_url: &str, output_path: &str) -> Config {
    Config {
        target: TargetConfig {
            url: seed_url.to_string(),
            max_pages: 10,
        },
        scraper: ScraperConfig {
            min_request_interval: 10, // Very short for testing
            max_retries: 2,
            base_retry_delay: 10,
            max_retry_delay: 40,
            page_timeout: 5000,
            idle_timeout: 1000,
            settle_pause: 10,
        },
        output: OutputConfig {
            path: output_path.to_string(),
            checkpoint_interval: 50,
        },
        selectors: SelectorOverrides::default(),
    }
}

fn review_page(reviews: &str, next_href: Option<&str>) -> String {
    let next = next_href
        .map(|href| format!(r#"<a rel="next" href="{}">Next</a>"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>Reviews</title></head><body>
        <div class="reviews">{}</div>
        {}
        </body></html>"#,
        reviews, next
    )
}

fn review(rating: &str, text: &str, date: &str, reviewer: &str) -> String {
    format!(
        r#"<div class="review-item">
            <span class="rating">{}</span>
            <p class="review-text">{}</p>
            <span class="review-date">{}</span>
            <span class="reviewer-name">{}</span>
        </div>"#,
        rating, text, date, reviewer
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_scrape_across_two_pages() {
    let mock_server = MockServer::start().await;

    let page1 = review_page(
        &format!(
            "{}{}",
            review(
                "5 stars",
                "Excellent kettle, boils in under a minute.",
                "Jan 5, 2024",
                "alice"
            ),
            review(
                "4",
                "Solid value for the price point overall.",
                "2024-01-06",
                "bob"
            )
        ),
        Some("/reviews/page2"),
    );
    // Page 2 repeats bob's review (pagination raced a lazy load upstream)
    let page2 = review_page(
        &format!(
            "{}{}",
            review(
                "4",
                "Solid value for the price point overall.",
                "2024-01-06",
                "bob"
            ),
            review(
                "Rated 2 out of 5",
                "Handle snapped off within two weeks.",
                "2024-01-07",
                "carol"
            )
        ),
        None,
    );

    mount_page(&mock_server, "/reviews", page1).await;
    mount_page(&mock_server, "/reviews/page2", page2).await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("reviews.csv");
    let config = create_test_config(
        &format!("{}/reviews", mock_server.uri()),
        &output_path.to_string_lossy(),
    );

    let outcome = scrape(config).await.expect("scrape failed");

    assert_eq!(outcome.pages_processed, 2);
    assert_eq!(outcome.records.len(), 3, "duplicate must be dropped");

    // Discovery order: page order, then in-page order
    let reviewers: Vec<_> = outcome
        .records
        .iter()
        .map(|r| r.reviewer_name.as_str())
        .collect();
    assert_eq!(reviewers, vec!["alice", "bob", "carol"]);

    // Normalization happened end-to-end
    assert_eq!(outcome.records[0].rating, 5.0);
    assert_eq!(outcome.records[0].date, "2024-01-05");
    assert_eq!(outcome.records[2].rating, 2.0);

    // The exported file carries the fixed header and one row per record
    let content = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines[0], "rating,text,date,reviewerName,title,verified");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("5,Excellent kettle"));
}

#[tokio::test]
async fn test_empty_listing_exports_header_only() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/reviews",
        "<html><body><p>No reviews yet.</p></body></html>".to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("reviews.csv");
    let config = create_test_config(
        &format!("{}/reviews", mock_server.uri()),
        &output_path.to_string_lossy(),
    );

    let outcome = scrape(config).await.expect("empty page must not fail");

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.pages_processed, 0);
    assert!(outcome.has_errors(), "the absence should be recorded");

    let content = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(content, "rating,text,date,reviewerName,title,verified\n");
}

#[tokio::test]
async fn test_unreachable_seed_aborts_but_exports() {
    let mock_server = MockServer::start().await;
    // No mocks mounted: every request 404s

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("reviews.csv");
    let config = create_test_config(
        &format!("{}/reviews", mock_server.uri()),
        &output_path.to_string_lossy(),
    );

    let result = scrape(config).await;

    assert!(matches!(result, Err(HarvestError::Navigation { .. })));
    // Best-effort export still produced the header-only file
    let content = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(content, "rating,text,date,reviewerName,title,verified\n");
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let mock_server = MockServer::start().await;

    // First hit fails with a 500, subsequent hits serve the listing
    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/reviews",
        review_page(
            &review(
                "3",
                "Average battery life but a decent screen.",
                "2024-02-01",
                "dave",
            ),
            None,
        ),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("reviews.csv");
    let config = create_test_config(
        &format!("{}/reviews", mock_server.uri()),
        &output_path.to_string_lossy(),
    );

    let outcome = scrape(config).await.expect("retry should recover");

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].reviewer_name, "dave");
}

#[tokio::test]
async fn test_empty_second_page_stops_gracefully() {
    let mock_server = MockServer::start().await;

    // Page one advertises a next page that turns out to be empty
    mount_page(
        &mock_server,
        "/reviews",
        review_page(
            &review(
                "5",
                "Works exactly as described, fast shipping.",
                "2024-03-01",
                "erin",
            ),
            Some("/reviews/page2"),
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/reviews/page2",
        "<html><body><p>Nothing here.</p></body></html>".to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("reviews.csv");
    let config = create_test_config(
        &format!("{}/reviews", mock_server.uri()),
        &output_path.to_string_lossy(),
    );

    let outcome = scrape(config).await.expect("partial data must survive");

    // Page one's record is kept; page two logged its emptiness
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.pages_processed, 1);
    assert!(outcome.has_errors());
}

#[tokio::test]
async fn test_escaped_fields_survive_export() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/reviews",
        review_page(
            &review(
                "4",
                r#"Good, but the "deluxe" label is a stretch 👎"#,
                "2024-04-01",
                "frank",
            ),
            None,
        ),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("reviews.csv");
    let config = create_test_config(
        &format!("{}/reviews", mock_server.uri()),
        &output_path.to_string_lossy(),
    );

    scrape(config).await.expect("scrape failed");

    let content = std::fs::read_to_string(&output_path).unwrap();
    assert!(content.contains(r#""Good, but the ""deluxe"" label is a stretch 👎""#));
}
