//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small business directory and drive
//! full crawls against it end-to-end.

use std::sync::{Arc, Mutex};
use tradeline::config::{Config, ListingMode};
use tradeline::crawler::{run_crawl, CrawlObserver, Harvester, PageReport, StopHandle};
use tradeline::output::NOT_AVAILABLE;
use tradeline::{BusinessRecord, StopReason, TradelineError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock directory
fn create_test_config(server: &MockServer, mode: ListingMode) -> Config {
    let mut config = Config::default();
    config.directory.base_url = format!("{}/us", server.uri());
    config.directory.mode = mode;
    config.crawler.request_timeout_secs = 5;
    config
}

/// Resilient-mode listing page linking to the given detail slugs
fn listing_page(slugs: &[&str]) -> String {
    let links: String = slugs
        .iter()
        .map(|slug| format!(r#"<li><a href="/p/{slug}">view profile</a></li>"#))
        .collect();
    format!("<html><body><ul>{links}</ul></body></html>")
}

fn empty_listing_page() -> String {
    "<html><body><p>No businesses match your search.</p></body></html>".to_string()
}

/// Detail page carrying the phone number in embedded profile data
fn detail_page(phone: &str) -> String {
    format!(
        r#"<html><head><script>window.__PROFILE__ = {{"phone": "{phone}",
            "businessTypes": ["General Contractor"]}};</script></head>
            <body><h1>Profile</h1></body></html>"#
    )
}

fn blank_detail_page() -> String {
    "<html><body></body></html>".to_string()
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/us/ca"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, slug: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/p/{slug}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a listing page that must never be requested
async fn forbid_listing(server: &MockServer, page: u32) {
    Mock::given(method("GET"))
        .and(path("/us/ca"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["never-seen"])))
        .expect(0)
        .mount(server)
        .await;
}

async fn forbid_detail(server: &MockServer, slug: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/p/{slug}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("(555) 999-0000")))
        .expect(0)
        .mount(server)
        .await;
}

fn names(records: &[BusinessRecord]) -> Vec<Option<&str>> {
    records.iter().map(|r| r.name.as_deref()).collect()
}

/// Requests a stop once the given page has been settled
struct StopAfterPage {
    page: u32,
    completed: Mutex<Vec<u32>>,
    stopped_with: Mutex<Option<StopReason>>,
}

impl StopAfterPage {
    fn new(page: u32) -> Self {
        Self {
            page,
            completed: Mutex::new(Vec::new()),
            stopped_with: Mutex::new(None),
        }
    }
}

impl CrawlObserver for StopAfterPage {
    fn on_page_complete(&self, report: &PageReport, stop: &StopHandle) {
        self.completed.lock().unwrap().push(report.page);
        if report.page == self.page {
            stop.request_stop();
        }
    }

    fn on_stop(&self, reason: StopReason) {
        *self.stopped_with.lock().unwrap() = Some(reason);
    }
}

/// Requests a stop as soon as the first row is committed
#[derive(Default)]
struct StopOnFirstRecord {
    stop: Mutex<Option<StopHandle>>,
    rows_seen: Mutex<u32>,
}

impl CrawlObserver for StopOnFirstRecord {
    fn on_record(&self, _record: &BusinessRecord) {
        *self.rows_seen.lock().unwrap() += 1;
        if let Some(stop) = self.stop.lock().unwrap().as_ref() {
            stop.request_stop();
        }
    }
}

#[tokio::test]
async fn test_stop_after_third_page() {
    let mock_server = MockServer::start().await;

    let pages = [
        ["alpha-roofing", "bravo-electric"],
        ["charlie-concrete", "delta-drywall"],
        ["echo-excavation", "foxtrot-framing"],
    ];
    for (i, slugs) in pages.iter().enumerate() {
        mount_listing(&mock_server, i as u32 + 1, listing_page(slugs)).await;
        for (j, slug) in slugs.iter().enumerate() {
            mount_detail(&mock_server, slug, detail_page(&format!("(555) 010-00{i}{j}"))).await;
        }
    }
    forbid_listing(&mock_server, 4).await;

    let observer = Arc::new(StopAfterPage::new(3));
    let mut harvester = Harvester::new(create_test_config(&mock_server, ListingMode::Resilient))
        .with_observer(observer.clone());

    harvester.start("CA").expect("crawl should start");
    let outcome = harvester.wait().await.expect("crawl should finish");

    assert_eq!(outcome.reason, StopReason::UserRequested);
    assert_eq!(outcome.records.len(), 6);
    assert_eq!(harvester.snapshot().len(), 6);
    assert_eq!(outcome.stats.last_page_requested, 3);
    assert_eq!(*observer.completed.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(
        *observer.stopped_with.lock().unwrap(),
        Some(StopReason::UserRequested)
    );

    let first = &outcome.records[0];
    assert_eq!(first.name.as_deref(), Some("Alpha Roofing"));
    assert_eq!(first.phone.as_deref(), Some("(555) 010-0000"));
    assert_eq!(first.location.as_deref(), Some("CA"));
    assert_eq!(first.company_type.as_deref(), Some("General Contractor"));
    assert_eq!(first.trades_services.as_deref(), Some(NOT_AVAILABLE));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_empty_listing_ends_crawl() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, 1, listing_page(&["alpha-roofing", "bravo-electric"])).await;
    mount_listing(&mock_server, 2, listing_page(&["charlie-concrete", "delta-drywall"])).await;
    mount_listing(&mock_server, 3, empty_listing_page()).await;
    forbid_listing(&mock_server, 4).await;
    for slug in ["alpha-roofing", "bravo-electric", "charlie-concrete", "delta-drywall"] {
        mount_detail(&mock_server, slug, detail_page("+1 555 010 1000")).await;
    }

    let config = create_test_config(&mock_server, ListingMode::Resilient);
    let outcome = run_crawl(&config, "ca").await.unwrap();

    assert_eq!(outcome.reason, StopReason::DirectoryExhausted);
    assert_eq!(outcome.stats.last_page_requested, 3);
    assert_eq!(outcome.stats.pages_fetched, 3);
    assert_eq!(
        names(&outcome.records),
        vec![
            Some("Alpha Roofing"),
            Some("Bravo Electric"),
            Some("Charlie Concrete"),
            Some("Delta Drywall"),
        ]
    );

    mock_server.verify().await;
}

#[tokio::test]
async fn test_listing_failure_ends_crawl() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, 1, listing_page(&["alpha-roofing", "bravo-electric"])).await;
    Mock::given(method("GET"))
        .and(path("/us/ca"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    forbid_listing(&mock_server, 3).await;
    mount_detail(&mock_server, "alpha-roofing", detail_page("(555) 010-2000")).await;
    mount_detail(&mock_server, "bravo-electric", detail_page("(555) 010-2001")).await;

    let config = create_test_config(&mock_server, ListingMode::Resilient);
    let outcome = run_crawl(&config, "ca").await.unwrap();

    assert_eq!(outcome.reason, StopReason::DirectoryExhausted);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.stats.last_page_requested, 2);
    assert_eq!(outcome.stats.pages_fetched, 1);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_consecutive_empty_rows_stop_crawl() {
    let mock_server = MockServer::start().await;

    let blanks = ["blank-one", "blank-two", "blank-three", "blank-four", "blank-five"];
    let mut slugs = blanks.to_vec();
    slugs.extend(["after-stop", "never-fetched"]);

    mount_listing(&mock_server, 1, listing_page(&slugs)).await;
    forbid_listing(&mock_server, 2).await;
    for slug in blanks {
        mount_detail(&mock_server, slug, blank_detail_page()).await;
    }
    forbid_detail(&mock_server, "after-stop").await;
    forbid_detail(&mock_server, "never-fetched").await;

    let mut config = create_test_config(&mock_server, ListingMode::Resilient);
    config.crawler.concurrency = 1;
    config.crawler.empty_row_threshold = 4;

    let outcome = run_crawl(&config, "ca").await.unwrap();

    assert_eq!(outcome.reason, StopReason::EmptyThreshold { threshold: 4 });
    assert_eq!(outcome.records.len(), 4);
    assert!(outcome.records.iter().all(BusinessRecord::is_empty));
    assert_eq!(outcome.stats.placeholders, 4);
    assert_eq!(outcome.stats.detail_fetches, 5);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_placeholders_precede_next_record() {
    let mock_server = MockServer::start().await;

    let blanks = ["blank-one", "blank-two", "blank-three", "blank-four"];
    let mut slugs = blanks.to_vec();
    slugs.push("real-builder");

    mount_listing(&mock_server, 1, listing_page(&slugs)).await;
    mount_listing(&mock_server, 2, empty_listing_page()).await;
    for slug in blanks {
        mount_detail(&mock_server, slug, blank_detail_page()).await;
    }
    mount_detail(&mock_server, "real-builder", detail_page("(555) 010-3000")).await;

    // Default concurrency: completions may arrive in any order
    let config = create_test_config(&mock_server, ListingMode::Resilient);
    let outcome = run_crawl(&config, "ca").await.unwrap();

    assert_eq!(outcome.reason, StopReason::DirectoryExhausted);
    assert_eq!(
        names(&outcome.records),
        vec![None, None, None, None, Some("Real Builder")]
    );
    assert!(outcome.records[..4].iter().all(BusinessRecord::is_empty));
}

#[tokio::test]
async fn test_detail_failures_do_not_count_as_empty() {
    let mock_server = MockServer::start().await;

    let broken = ["broken-one", "broken-two", "broken-three", "broken-four", "broken-five"];
    let mut slugs = broken.to_vec();
    slugs.push("working-builder");

    mount_listing(&mock_server, 1, listing_page(&slugs)).await;
    mount_listing(&mock_server, 2, empty_listing_page()).await;
    for slug in broken {
        Mock::given(method("GET"))
            .and(path(format!("/p/{slug}")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
    }
    mount_detail(&mock_server, "working-builder", detail_page("(555) 010-4000")).await;

    let mut config = create_test_config(&mock_server, ListingMode::Resilient);
    config.crawler.concurrency = 1;
    config.crawler.empty_row_threshold = 4;

    let outcome = run_crawl(&config, "ca").await.unwrap();

    assert_eq!(outcome.reason, StopReason::DirectoryExhausted);
    assert_eq!(names(&outcome.records), vec![Some("Working Builder")]);
    assert_eq!(outcome.stats.detail_failures, 5);
    assert_eq!(outcome.stats.placeholders, 0);
}

#[tokio::test]
async fn test_duplicates_across_pages_fetched_once() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, 1, listing_page(&["alpha-roofing", "bravo-electric"])).await;
    mount_listing(&mock_server, 2, listing_page(&["bravo-electric", "charlie-concrete"])).await;
    mount_listing(&mock_server, 3, empty_listing_page()).await;
    mount_detail(&mock_server, "alpha-roofing", detail_page("(555) 010-5000")).await;
    mount_detail(&mock_server, "charlie-concrete", detail_page("(555) 010-5002")).await;
    Mock::given(method("GET"))
        .and(path("/p/bravo-electric"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("(555) 010-5001")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, ListingMode::Resilient);
    let outcome = run_crawl(&config, "ca").await.unwrap();

    assert_eq!(
        names(&outcome.records),
        vec![
            Some("Alpha Roofing"),
            Some("Bravo Electric"),
            Some("Charlie Concrete"),
        ]
    );
    assert_eq!(outcome.stats.duplicates_skipped, 1);
    assert_eq!(outcome.stats.distinct_names, 3);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_structured_listing_fields_pass_through() {
    let mock_server = MockServer::start().await;

    let listing = r#"<html><body>
        <div class="sc-eCstZk MuiBox-root">
          <a href="/p/acme-builders"><h2 data-test-id="business-name"><span>Acme Builders</span></h2></a>
          <span data-test-id="item-text">Fresno, CA</span>
          <span data-test-id="item-text">General Contractor</span>
          <span data-test-id="item-text">Commercial</span>
          <span data-test-id="item-text">Concrete</span>
        </div>
        <div class="sc-eCstZk MuiBox-root">
          <h2 data-test-id="business-name"><span>Bay Electric</span></h2>
          <span data-test-id="item-text">Oakland, CA</span>
          <span data-test-id="item-text">Specialty Contractor</span>
        </div>
        <div class="sc-eCstZk MuiBox-root">
          <a href="/p/coast-supply"><h2 data-test-id="business-name"><span>Coast Supply</span></h2></a>
          <span data-test-id="item-text">San Diego, CA</span>
        </div>
      </body></html>"#;

    mount_listing(&mock_server, 1, listing.to_string()).await;
    mount_listing(&mock_server, 2, empty_listing_page()).await;
    mount_detail(
        &mock_server,
        "acme-builders",
        r#"<html><body><a href="tel:+15550100002">+1 555 010 0002</a></body></html>"#.to_string(),
    )
    .await;
    mount_detail(&mock_server, "coast-supply", blank_detail_page()).await;

    let config = create_test_config(&mock_server, ListingMode::Structured);
    let outcome = run_crawl(&config, "ca").await.unwrap();
    let records = &outcome.records;

    assert_eq!(records.len(), 3);

    assert_eq!(records[0].name.as_deref(), Some("Acme Builders"));
    assert_eq!(records[0].phone.as_deref(), Some("+1 555 010 0002"));
    assert_eq!(records[0].location.as_deref(), Some("Fresno, CA"));
    assert_eq!(records[0].market_services.as_deref(), Some("Commercial"));
    assert_eq!(records[0].trades_services.as_deref(), Some("Concrete"));

    // No detail link: built from the listing alone
    assert_eq!(records[1].name.as_deref(), Some("Bay Electric"));
    assert_eq!(records[1].phone.as_deref(), Some(NOT_AVAILABLE));
    assert_eq!(records[1].company_type.as_deref(), Some("Specialty Contractor"));
    assert_eq!(records[1].market_services, None);

    // Location alone is no evidence
    assert!(records[2].is_empty());
    assert_eq!(outcome.stats.placeholders, 1);
}

#[tokio::test]
async fn test_page_limit() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, 1, listing_page(&["alpha-roofing"])).await;
    mount_listing(&mock_server, 2, listing_page(&["bravo-electric"])).await;
    forbid_listing(&mock_server, 3).await;
    mount_detail(&mock_server, "alpha-roofing", detail_page("(555) 010-6000")).await;
    mount_detail(&mock_server, "bravo-electric", detail_page("(555) 010-6001")).await;

    let mut config = create_test_config(&mock_server, ListingMode::Resilient);
    config.crawler.max_pages = Some(2);

    let outcome = run_crawl(&config, "ca").await.unwrap();

    assert_eq!(outcome.reason, StopReason::PageLimit { max_pages: 2 });
    assert_eq!(outcome.records.len(), 2);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_restart_begins_fresh() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, 1, listing_page(&["alpha-roofing", "bravo-electric"])).await;
    mount_listing(&mock_server, 2, empty_listing_page()).await;
    mount_detail(&mock_server, "alpha-roofing", detail_page("(555) 010-7000")).await;
    mount_detail(&mock_server, "bravo-electric", detail_page("(555) 010-7001")).await;

    let mut harvester = Harvester::new(create_test_config(&mock_server, ListingMode::Resilient));

    harvester.start("ca").unwrap();
    assert!(matches!(
        harvester.start("ca"),
        Err(TradelineError::AlreadyRunning)
    ));
    let first = harvester.wait().await.unwrap();
    assert_eq!(first.records.len(), 2);

    // Same names again: a reused dedup set would reject them all
    harvester.start("ca").unwrap();
    let second = harvester.wait().await.unwrap();
    assert_eq!(second.records.len(), 2);
    assert_eq!(second.stats.duplicates_skipped, 0);
    assert_eq!(harvester.snapshot().len(), 2);
}

#[tokio::test]
async fn test_stop_mid_page_discards_in_flight_results() {
    let mock_server = MockServer::start().await;

    let slugs = ["alpha-roofing", "bravo-electric", "charlie-concrete", "delta-drywall"];
    mount_listing(&mock_server, 1, listing_page(&slugs)).await;
    forbid_listing(&mock_server, 2).await;
    for (i, slug) in slugs.iter().enumerate() {
        mount_detail(&mock_server, slug, detail_page(&format!("(555) 010-800{i}"))).await;
    }

    // Default concurrency: all four detail fetches are dispatched together
    let observer = Arc::new(StopOnFirstRecord::default());
    let mut harvester = Harvester::new(create_test_config(&mock_server, ListingMode::Resilient))
        .with_observer(observer.clone());

    harvester.start("ca").unwrap();
    *observer.stop.lock().unwrap() = harvester.stop_handle();
    let outcome = harvester.wait().await.unwrap();

    assert_eq!(outcome.reason, StopReason::UserRequested);
    assert_eq!(names(&outcome.records), vec![Some("Alpha Roofing")]);
    assert_eq!(outcome.stats.discarded_after_stop, 3);
    assert!(outcome.stats.detail_fetches <= 4);
    assert_eq!(*observer.rows_seen.lock().unwrap(), 1);
    assert_eq!(harvester.snapshot().len(), 1);

    mock_server.verify().await;
}
