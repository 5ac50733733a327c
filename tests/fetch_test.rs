// Bounded fetcher against local servers: declared and streamed sizes.

use axum::body::{Body, Bytes};
use axum::routing::get;
use axum::Router;
use futures_util::stream;
use url::Url;

use cloudcv_backend::config::Config;
use cloudcv_backend::fetch::{BoundedFetcher, FetchError};

const LIMIT: u64 = 1024 * 1024;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Fixed-size body; axum sets Content-Length.
fn sized(len: usize) -> Router {
    Router::new().route("/blob", get(move || async move { vec![0xAB_u8; len] }))
}

/// `chunks` chunks of `chunk_len` bytes without a Content-Length.
fn chunked(chunks: usize, chunk_len: usize) -> Router {
    Router::new().route(
        "/blob",
        get(move || async move {
            let parts = (0..chunks).map(move |_| Ok::<_, std::io::Error>(Bytes::from(vec![1u8; chunk_len])));
            Body::from_stream(stream::iter(parts))
        }),
    )
}

fn fetcher() -> BoundedFetcher {
    BoundedFetcher::new(&Config::default()).unwrap()
}

fn url(base: &str, path: &str) -> Url {
    Url::parse(&format!("{base}{path}")).unwrap()
}

#[tokio::test]
async fn small_payload_is_returned_whole() {
    let base = serve(sized(5000)).await;
    let data = fetcher().fetch(&url(&base, "/blob"), LIMIT).await.unwrap();
    assert_eq!(data.len(), 5000);
    assert!(data.iter().all(|b| *b == 0xAB));
}

#[tokio::test]
async fn payload_exactly_at_limit_is_accepted() {
    let base = serve(chunked(16, 64 * 1024)).await;
    let data = fetcher().fetch(&url(&base, "/blob"), LIMIT).await.unwrap();
    assert_eq!(data.len() as u64, LIMIT);
}

#[tokio::test]
async fn streamed_payload_over_limit_is_rejected() {
    let base = serve(chunked(32, 64 * 1024)).await;
    let err = fetcher().fetch(&url(&base, "/blob"), LIMIT).await.unwrap_err();
    assert!(matches!(err, FetchError::TooLarge { limit } if limit == LIMIT));
}

#[tokio::test]
async fn declared_length_over_limit_is_rejected() {
    let base = serve(sized(2 * 1024 * 1024)).await;
    let err = fetcher().fetch(&url(&base, "/blob"), LIMIT).await.unwrap_err();
    assert!(matches!(err, FetchError::TooLarge { .. }));
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let base = serve(sized(10)).await;
    let err = fetcher().fetch(&url(&base, "/absent"), LIMIT).await.unwrap_err();
    assert!(matches!(err, FetchError::Status(s) if s.as_u16() == 404));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher()
        .fetch(&Url::parse(&format!("http://{addr}/blob")).unwrap(), LIMIT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
