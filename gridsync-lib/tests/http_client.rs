//! HTTP backend against a local server.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use gridsync_lib::GridClient;
use gridsync_lib::GridConfig;
use gridsync_lib::GridController;
use gridsync_lib::api::Backend;
use gridsync_lib::api::query;
use gridsync_lib::api::query::FilterPolicy;
use gridsync_lib::api::query::PaginationMetadata;
use gridsync_lib::api::query::QuerySpec;
use gridsync_lib::error::ApiError;
use gridsync_lib::model::Row;
use gridsync_lib::model::RowId;
use gridsync_lib::model::RowPatch;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;

// =============================================================================
// Test server
// =============================================================================

#[derive(Debug, Clone)]
struct Received {
    method: String,
    path: String,
    query: Option<String>,
    body: String,
}

impl Received {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

fn reply(status: u16, body: impl Into<String>) -> Reply {
    Reply {
        status,
        body: body.into(),
        delay: Duration::ZERO,
    }
}

type Handler = Arc<dyn Fn(&Received) -> Reply + Send + Sync>;

struct TestServer {
    base_url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl TestServer {
    async fn start(handler: impl Fn(&Received) -> Reply + Send + Sync + 'static) -> Self {
        let handler: Handler = Arc::new(handler);
        let received = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let log = received.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let handler = handler.clone();
                        let log = log.clone();
                        async move { Ok::<_, Infallible>(respond(req, &handler, &log).await) }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            received,
        }
    }

    fn client(&self) -> GridClient {
        GridClient::builder()
            .url(&self.base_url)
            .resource("users")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn respond(
    req: Request<Incoming>,
    handler: &Handler,
    log: &Mutex<Vec<Received>>,
) -> Response<Full<Bytes>> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let body = match req.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
        Err(_) => String::new(),
    };

    let received = Received {
        method,
        path,
        query,
        body,
    };
    let reply = handler(&received);
    log.lock().unwrap().push(received);

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    Response::builder()
        .status(reply.status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(reply.body)))
        .unwrap()
}

fn envelope(prev: Option<u32>, next: Option<u32>, data: Value) -> String {
    json!({
        "first": 1,
        "prev": prev,
        "next": next,
        "last": 3,
        "pages": 3,
        "items": 5,
        "data": data,
    })
    .to_string()
}

fn params(spec: QuerySpec) -> query::QueryParams {
    query::build(
        &spec,
        &PaginationMetadata::initial(2),
        &FilterPolicy::default(),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_page_sends_params_and_decodes_envelope() {
    let server = TestServer::start(|_| {
        reply(
            200,
            envelope(
                Some(1),
                Some(3),
                json!([
                    {"id": "u3", "name": "Cal", "createdAt": "2024-03-01T10:00:00Z"},
                    {"_id": "u4", "name": "Dee", "createdBy": {"_id": "a1", "email": "a@example.com"}}
                ]),
            ),
        )
    })
    .await;

    let page = server
        .client()
        .fetch_page(&params(
            QuerySpec::new()
                .page(2)
                .filter("role", "admin")
                .filter("name", "ca")
                .filter("gender", "all"),
        ))
        .await
        .unwrap();

    let request = &server.received()[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/users");
    assert_eq!(
        request.query.as_deref(),
        Some("_page=2&_per_page=2&role=admin")
    );

    let metadata = page.metadata();
    assert_eq!(metadata.current_page, 2);
    assert_eq!(metadata.page_size, 2);
    assert_eq!(metadata.total_items, 5);
    assert_eq!(metadata.total_pages, 3);
    assert_eq!(metadata.prev_page, Some(1));
    assert_eq!(metadata.next_page, Some(3));

    let ids: Vec<&str> = page.rows().iter().map(|r| r.id().as_str()).collect();
    assert_eq!(ids, ["u3", "u4"]);
    assert!(page.rows()[0].created_at().is_some());
    assert_eq!(page.rows()[1].created_by().unwrap().email, "a@example.com");
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let server = TestServer::start(|_| reply(404, r#"{"message": "Collection not found"}"#)).await;

    let err = server
        .client()
        .fetch_page(&params(QuerySpec::new()))
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        ApiError::Server { status: 404, message } if message == "Collection not found"
    ));
    assert_eq!(err.user_message(), "Collection not found");
}

#[tokio::test]
async fn test_envelope_without_pages_is_malformed() {
    let server = TestServer::start(|_| {
        reply(
            200,
            json!({"first": 1, "prev": null, "next": null, "last": 1, "items": 0, "data": []})
                .to_string(),
        )
    })
    .await;

    let err = server
        .client()
        .fetch_page(&params(QuerySpec::new()))
        .await
        .unwrap_err();

    assert!(err.is_malformed());
    assert!(err.to_string().contains("pages"));
}

#[tokio::test]
async fn test_create_posts_fields() {
    let server = TestServer::start(|received| {
        let mut row = received.json();
        row["id"] = json!("u9");
        reply(201, row.to_string())
    })
    .await;

    let row = server
        .client()
        .create(&RowPatch::new().set("name", "Bea").set("age", 40))
        .await
        .unwrap();

    assert_eq!(row.id().as_str(), "u9");
    assert_eq!(row.get_i64("age").unwrap(), Some(40));

    let request = &server.received()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/users");
    assert_eq!(request.json(), json!({"name": "Bea", "age": 40}));
}

#[tokio::test]
async fn test_update_puts_row_and_reads_echo() {
    let server = TestServer::start(|received| {
        if received.body.contains("silent") {
            reply(200, "")
        } else {
            reply(200, received.body.clone())
        }
    })
    .await;
    let client = server.client();

    let row = Row::new("u1").set("name", "Anna");
    let echo = client.update(&row).await.unwrap();
    assert_eq!(echo, Some(row));

    let silent = Row::new("u1").set("name", "silent");
    assert_eq!(client.update(&silent).await.unwrap(), None);

    let request = &server.received()[0];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/users/u1");
    assert_eq!(request.json(), json!({"id": "u1", "name": "Anna"}));
}

#[tokio::test]
async fn test_delete_encodes_id() {
    let server = TestServer::start(|_| reply(200, "{}")).await;

    server
        .client()
        .delete(&RowId::from("a b"))
        .await
        .unwrap();

    let request = &server.received()[0];
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.path, "/users/a%20b");
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = TestServer::start(|_| Reply {
        delay: Duration::from_secs(2),
        ..reply(200, "{}")
    })
    .await;
    let client = GridClient::builder()
        .url(&server.base_url)
        .resource("users")
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.delete(&RowId::from("u1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)));
}

#[tokio::test]
async fn test_shut_down_client_sends_nothing() {
    let server = TestServer::start(|_| reply(200, "{}")).await;
    let client = server.client();
    let clone = client.clone();

    client.shutdown();

    let err = clone.delete(&RowId::from("u1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Shutdown));
    assert!(!err.is_transport());
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_controller_over_http() {
    let server = TestServer::start(|_| {
        reply(
            200,
            envelope(None, Some(2), json!([{"id": "u1", "name": "Ann"}, {"id": "u2", "name": "Ben"}])),
        )
    })
    .await;
    let grid = GridController::new(
        Arc::new(server.client()),
        GridConfig::default().with_page_size(2),
    );

    grid.refetch().await.unwrap();

    let view = grid.view();
    assert!(view.confirmed);
    assert_eq!(view.pagination.current_page, 1);
    assert_eq!(view.pagination.total_pages, 3);
    assert_eq!(view.pagination.total_items, 5);
    assert_eq!(view.rows.len(), 2);
}
