use std::time::Duration;

use purchase_scraper::fixture::{ContainerFixture, RowFixture, UrlStep};
use purchase_scraper::{
    FixtureDriver, OrderSelectors, PageFixture, RecordField, ScrapeError, SessionConfig,
    SessionGate,
};

fn item(n: usize) -> RowFixture {
    RowFixture::complete(
        &format!("商品{}", n),
        "颜色分类:黑色 尺码:M",
        &format!("https://img.example.com/{}_80x80.jpg", n),
        "￥59.00",
        "交易成功",
    )
}

fn container(items: std::ops::Range<usize>) -> ContainerFixture {
    ContainerFixture {
        broken: false,
        rows: items.map(item).collect(),
    }
}

fn page(containers: Vec<ContainerFixture>, render_delay_ms: u64) -> PageFixture {
    PageFixture {
        url_timeline: vec![UrlStep {
            after_ms: 2_000,
            url: "https://i.taobao.com/my_taobao.htm".into(),
        }],
        links: vec!["已买到的宝贝".into()],
        render_delay_ms,
        containers,
        ..PageFixture::default()
    }
}

async fn ready_gate(fixture: PageFixture) -> SessionGate<FixtureDriver> {
    let driver = FixtureDriver::new(fixture, OrderSelectors::default());
    let mut gate = SessionGate::new(driver, SessionConfig::default());
    gate.establish_session().await.unwrap();
    gate
}

#[tokio::test(start_paused = true)]
async fn broken_container_is_isolated() {
    let mut broken = container(20..22);
    broken.broken = true;
    let fixture = page(
        vec![
            container(0..2),
            container(2..5),
            broken,
            container(5..6),
            container(6..8),
        ],
        0,
    );
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();

    let titles: Vec<_> = outcome.records.iter().map(|r| r.title.as_str()).collect();
    let expected: Vec<String> = (0..8).map(|n| format!("商品{}", n)).collect();
    assert_eq!(titles, expected);
    assert_eq!(outcome.containers_seen, 5);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].container, 2);
    assert!(outcome.failures[0].is_container_failure());
}

#[tokio::test(start_paused = true)]
async fn incomplete_item_is_skipped() {
    let mut first = container(0..3);
    first.rows[1].price = None;
    let fixture = page(vec![first, container(3..4)], 0);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();

    let titles: Vec<_> = outcome.records.iter().map(|r| r.title.clone()).collect();
    assert_eq!(titles, vec!["商品0", "商品2", "商品3"]);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.container, 0);
    // header is row 0, so the second item is row 2
    assert_eq!(failure.row, Some(2));
    assert_eq!(failure.field, Some(RecordField::Price));
}

#[tokio::test(start_paused = true)]
async fn fields_are_copied_verbatim() {
    let fixture = page(vec![container(7..8)], 0);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    let rec = &outcome.records[0];
    assert_eq!(rec.title, "商品7");
    assert_eq!(rec.specification, "颜色分类:黑色 尺码:M");
    assert_eq!(rec.image_url, "https://img.example.com/7_80x80.jpg");
    assert_eq!(rec.price, "￥59.00");
    assert_eq!(rec.status, "交易成功");
}

#[tokio::test(start_paused = true)]
async fn waits_for_progressive_render() {
    let fixture = page(vec![container(0..1)], 4_000);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn page_load_timeout_when_list_never_renders() {
    let fixture = page(vec![container(0..1)], 60_000);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let err = scraper.scrape(Duration::from_secs(10)).await.unwrap_err();
    assert!(matches!(
        err,
        ScrapeError::PageLoadTimeout { waited } if waited == Duration::from_secs(10)
    ));
    assert_eq!(err.reason(), "page_load_timeout");
}

#[tokio::test(start_paused = true)]
async fn header_only_container_yields_nothing() {
    let fixture = page(vec![ContainerFixture::default(), container(0..1)], 0);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.failures.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unreadable_field_is_reported_with_driver_reason() {
    let mut first = container(0..3);
    first.rows[0].unreadable = vec![RecordField::Status];
    let fixture = page(vec![first], 0);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();

    let titles: Vec<_> = outcome.records.iter().map(|r| r.title.clone()).collect();
    assert_eq!(titles, vec!["商品1", "商品2"]);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.row, Some(1));
    assert_eq!(failure.field, Some(RecordField::Status));
    assert!(failure.reason.contains("stale element reference"), "{}", failure.reason);
    assert_ne!(failure.reason, "element not found");
}

#[tokio::test(start_paused = true)]
async fn image_without_source_names_the_attribute() {
    let mut first = container(0..2);
    first.rows[1].image_url = None;
    first.rows[1].bare_image = true;
    let fixture = page(vec![first], 0);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.row, Some(2));
    assert_eq!(failure.field, Some(RecordField::ImageUrl));
    assert_eq!(failure.reason, "attribute `src` missing");
}

#[tokio::test(start_paused = true)]
async fn missing_image_element_is_element_not_found() {
    let mut first = container(0..1);
    first.rows[0].image_url = None;
    let fixture = page(vec![first], 0);
    let mut gate = ready_gate(fixture).await;
    let scraper = gate.order_scraper(OrderSelectors::default()).unwrap();
    let outcome = scraper.scrape(Duration::from_secs(10)).await.unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.failures[0].reason, "element not found");
}
