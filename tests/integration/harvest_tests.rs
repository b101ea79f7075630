//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers standing in for the
//! listing site and the blob container, and run the pipeline end-to-end.

use otomoto_harvester::config::{Config, CrawlConfig, FetchConfig, OutputConfig};
use otomoto_harvester::crawler::{
    run_harvest, FetchClient, FetchFailure, FetchResult, Harvester, LinkDiscoverer,
};
use otomoto_harvester::output::{MemorySink, UTF8_BOM};
use otomoto_harvester::state::StopReason;
use otomoto_harvester::Flag;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetch settings without delays so tests run fast
fn fast_fetch_config() -> FetchConfig {
    FetchConfig {
        min_delay_ms: 0,
        max_delay_ms: 0,
        backoff_base_ms: 1,
        backoff_max_ms: 10,
        max_retries: 3,
        timeout_secs: 5,
        ..FetchConfig::default()
    }
}

fn crawl_config(server: &MockServer, page_limit: Option<u32>) -> CrawlConfig {
    CrawlConfig {
        base_url: format!("{}/osobowe", server.uri()),
        listing_marker: "/osobowe/oferta/".to_string(),
        page_limit,
        ..CrawlConfig::default()
    }
}

fn search_page(server: &MockServer, ids: &[&str]) -> String {
    let anchors: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<article><a href="{}/osobowe/oferta/{}.html">Listing {}</a></article>"#,
                server.uri(),
                id,
                id
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", anchors)
}

fn listing_page(title: &str, price: &str, location: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="offer-title">{}</h1>
            <span class="offer-price__number">{}</span>
            <img data-testid="gallery-image-0" src="https://cdn.example/{}.jpg">
            <div><a href="/mapa">{}</a><p>Znajdź na mapie</p></div>
            <div data-testid="year"><p>Rok produkcji</p><p>2018</p></div>
            <div data-testid="no_accident"><p>Bezwypadkowy</p><p>Tak</p></div>
        </body></html>"#,
        title, price, title, location
    )
}

async fn mount_search_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/osobowe"))
        .and(query_param("page", page.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Any search page not mounted explicitly is an empty results page
async fn mount_empty_search_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/osobowe"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Brak wyników</body></html>"),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/osobowe/oferta/{}.html", id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn requested_pages(server: &MockServer) -> Vec<u32> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/osobowe")
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
        })
        .collect()
}

#[tokio::test]
async fn test_fetch_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .mount(&server)
        .await;

    let client = FetchClient::new(&fast_fetch_config()).unwrap();
    let result = client.fetch(&format!("{}/flaky", server.uri())).await;

    assert_eq!(result.body(), Some("<p>ok</p>"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let config = FetchConfig {
        max_retries: 2,
        ..fast_fetch_config()
    };
    let client = FetchClient::new(&config).unwrap();
    let result = client.fetch(&format!("{}/down", server.uri())).await;

    assert!(matches!(
        result,
        FetchResult::Failure(FetchFailure::RetriesExhausted {
            status: 502,
            attempts: 3
        })
    ));
}

#[tokio::test]
async fn test_fetch_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = FetchClient::new(&fast_fetch_config()).unwrap();
    let result = client.fetch(&format!("{}/gone", server.uri())).await;

    assert!(matches!(
        result,
        FetchResult::Failure(FetchFailure::Status(404))
    ));
}

#[tokio::test]
async fn test_fetch_sends_browser_headers() {
    let server = MockServer::start().await;
    let config = fast_fetch_config();

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header("user-agent", config.user_agent.as_str()))
        .and(header("accept-language", config.accept_language.as_str()))
        .and(header("referer", config.referer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = FetchClient::new(&config).unwrap();
    let result = client.fetch(&format!("{}/headers", server.uri())).await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_fetch_forces_configured_encoding() {
    let server = MockServer::start().await;

    // "Łódź" in ISO-8859-2, served without a charset
    Mock::given(method("GET"))
        .and(path("/latin2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xA3, 0xF3, 0x64, 0xBC]))
        .mount(&server)
        .await;

    let config = FetchConfig {
        encoding: "iso-8859-2".to_string(),
        ..fast_fetch_config()
    };
    let client = FetchClient::new(&config).unwrap();
    let result = client.fetch(&format!("{}/latin2", server.uri())).await;

    assert_eq!(result.body(), Some("Łódź"));
}

#[tokio::test]
async fn test_discovery_stops_after_three_empty_pages() {
    let server = MockServer::start().await;
    mount_search_page(&server, 1, search_page(&server, &["a", "b"])).await;
    mount_search_page(&server, 2, search_page(&server, &["b", "c"])).await;
    mount_empty_search_pages(&server).await;

    let client = FetchClient::new(&fast_fetch_config()).unwrap();
    let discoverer = LinkDiscoverer::new(&client, &crawl_config(&server, None)).unwrap();
    let discovery = discoverer.discover(1, None).await;

    assert_eq!(discovery.stop_reason, StopReason::EmptyPages);
    assert_eq!(discovery.pages_processed, 5);
    assert_eq!(discovery.urls.len(), 3);
    assert_eq!(requested_pages(&server).await, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_discovery_sends_sort_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/osobowe"))
        .and(query_param("search[order]", "created_at_first:desc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&server, &["a"])))
        .expect(2)
        .mount(&server)
        .await;

    let client = FetchClient::new(&fast_fetch_config()).unwrap();
    let discoverer = LinkDiscoverer::new(&client, &crawl_config(&server, None)).unwrap();
    let discovery = discoverer.discover(1, Some(2)).await;

    assert_eq!(discovery.stop_reason, StopReason::PageLimit);
    assert_eq!(discovery.urls.len(), 1);
}

#[tokio::test]
async fn test_discovery_skips_failed_pages() {
    let server = MockServer::start().await;
    mount_search_page(&server, 1, search_page(&server, &["a"])).await;
    Mock::given(method("GET"))
        .and(path("/osobowe"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    mount_search_page(&server, 3, search_page(&server, &["b"])).await;
    mount_empty_search_pages(&server).await;

    let client = FetchClient::new(&fast_fetch_config()).unwrap();
    let discoverer = LinkDiscoverer::new(&client, &crawl_config(&server, Some(4))).unwrap();
    let discovery = discoverer.discover(1, Some(4)).await;

    assert_eq!(discovery.pages_failed, 1);
    assert_eq!(discovery.urls.len(), 2);
    assert_eq!(requested_pages(&server).await, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_harvest_end_to_end_into_memory() {
    let server = MockServer::start().await;
    mount_search_page(&server, 1, search_page(&server, &["audi", "bmw", "missing"])).await;
    mount_listing(&server, "audi", listing_page("Audi A4", "93 800", "30-001 Kraków")).await;
    mount_listing(
        &server,
        "bmw",
        listing_page("BMW 320d", "120 500", "05-500 Piaseczno, piaseczyński, Mazowieckie"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/osobowe/oferta/missing.html"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let client = FetchClient::new(&fast_fetch_config()).unwrap();
    let mut harvester = Harvester::new(client, MemorySink::new(), &crawl_config(&server, Some(1)));
    let stats = harvester.run().await.unwrap();

    assert_eq!(stats.links_discovered, 3);
    assert_eq!(stats.listings_fetched, 2);
    assert_eq!(stats.listings_failed, 1);
    assert_eq!(stats.records_emitted, 2);

    let records = harvester.into_sink().into_records();
    assert_eq!(records.len(), 2);

    let audi = &records[0];
    assert_eq!(audi.title, "Audi A4");
    assert_eq!(audi.price, Some(93800.0));
    assert_eq!(audi.currency.as_deref(), Some("PLN"));
    assert_eq!(audi.location_city.as_deref(), Some("Kraków"));
    assert_eq!(audi.location_voivodeship.as_deref(), Some("Małopolskie"));
    assert_eq!(audi.image_urls, vec!["https://cdn.example/Audi A4.jpg"]);
    assert_eq!(audi.technical.year, Some(2018.0));
    assert_eq!(audi.technical.accident_free, Some(Flag::Yes));

    let bmw = &records[1];
    assert_eq!(bmw.location_city.as_deref(), Some("Piaseczno"));
    assert_eq!(bmw.location_district.as_deref(), Some("piaseczyński"));
    assert_eq!(bmw.location_voivodeship.as_deref(), Some("Mazowieckie"));
}

fn harvest_config(server: &MockServer, backup: &TempDir, container: Option<String>) -> Config {
    Config {
        fetch: fast_fetch_config(),
        crawl: crawl_config(server, Some(1)),
        output: OutputConfig {
            batch_size: 50,
            backup_dir: backup.path().to_string_lossy().into_owned(),
            blob_container_url: container,
        },
    }
}

async fn mount_single_listing_site(server: &MockServer) {
    mount_search_page(server, 1, search_page(server, &["fiat"])).await;
    mount_listing(server, "fiat", listing_page("Fiat 500", "32 500", "Gdańsk, Pomorskie")).await;
}

#[tokio::test]
async fn test_harvest_uploads_batch_to_blob_container() {
    let server = MockServer::start().await;
    mount_single_listing_site(&server).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/dumps/dump_\d{8}_\d{6}_batch_1\.csv$"))
        .and(query_param("sig", "secret"))
        .and(header("x-ms-blob-type", "BlockBlob"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let backup = TempDir::new().unwrap();
    let container = format!("{}/dumps?sv=2022-11-02&sig=secret", server.uri());
    let config = harvest_config(&server, &backup, Some(container));

    let stats = run_harvest(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.records_emitted, 1);
    assert_eq!(stats.batches_uploaded, 1);
    assert_eq!(stats.batches_saved_locally, 0);
    assert_eq!(std::fs::read_dir(backup.path()).unwrap().count(), 0);

    let uploads: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().starts_with("/dumps/"))
        .collect();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].body.starts_with(UTF8_BOM));
    let text = String::from_utf8_lossy(&uploads[0].body[UTF8_BOM.len()..]).into_owned();
    assert!(text.starts_with("link,title,description,image_urls,price"));
    assert!(text.contains("Fiat 500"));
    assert!(text.contains("Pomorskie"));
}

#[tokio::test]
async fn test_harvest_falls_back_to_local_backup() {
    let server = MockServer::start().await;
    mount_single_listing_site(&server).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/dumps/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backup = TempDir::new().unwrap();
    let container = format!("{}/dumps?sig=secret", server.uri());
    let config = harvest_config(&server, &backup, Some(container));

    let stats = run_harvest(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.batches_uploaded, 0);
    assert_eq!(stats.batches_saved_locally, 1);

    let files: Vec<_> = std::fs::read_dir(backup.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("dump_") && name.ends_with("_batch_1.csv"));

    let bytes = std::fs::read(&files[0]).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));
}

#[tokio::test]
async fn test_harvest_without_container_writes_locally() {
    let server = MockServer::start().await;
    mount_single_listing_site(&server).await;

    let backup = TempDir::new().unwrap();
    let config = harvest_config(&server, &backup, None);

    let stats = run_harvest(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.batches_saved_locally, 1);
    assert_eq!(std::fs::read_dir(backup.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_cancelled_harvest_fetches_nothing() {
    let server = MockServer::start().await;
    mount_single_listing_site(&server).await;

    let backup = TempDir::new().unwrap();
    let config = harvest_config(&server, &backup, None);

    let token = CancellationToken::new();
    token.cancel();
    let stats = run_harvest(&config, token).await.unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.records_emitted, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}
