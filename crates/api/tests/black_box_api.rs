use parcelhub_api::config::AppConfig;
use parcelhub_core::TenantId;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        parcelhub_observability::init();

        // Same router as prod (in-memory store), bound to an ephemeral port.
        let app = parcelhub_api::app::build_app(&AppConfig::default())
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A client bound to one account.
struct Account {
    client: reqwest::Client,
    base_url: String,
    tenant_id: TenantId,
}

impl Account {
    fn new(srv: &TestServer) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: srv.base_url.clone(),
            tenant_id: TenantId::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Account-Id", self.tenant_id.to_string())
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = self.request(method, path);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn create(&self, title: &str) -> Value {
        let (status, body) = self
            .send(reqwest::Method::POST, "/warehouses", Some(warehouse_body(title)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn list(&self) -> Vec<Value> {
        let (status, body) = self.send(reqwest::Method::GET, "/warehouses", None).await;
        assert_eq!(status, StatusCode::OK);
        body["items"].as_array().unwrap().clone()
    }
}

fn warehouse_body(title: &str) -> Value {
    json!({
        "name": title.to_lowercase(),
        "title": title,
        "contact_person": {
            "name": "Asha Rao",
            "phone": "+91 98765-43210",
            "email": "asha@example.com"
        },
        "address": {
            "full_address": "12 Dock Road",
            "city": "Pune",
            "state": "Maharashtra",
            "pincode": "411001",
            "country": "India"
        }
    })
}

fn id_of(w: &Value) -> String {
    w["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn account_required_for_warehouse_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/warehouses", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "account_required");

    let res = client
        .get(format!("{}/warehouses", srv.base_url))
        .header("X-Account-Id", "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_warehouse_becomes_default_and_active() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);

    assert!(acct.list().await.is_empty());

    let hq = acct.create("HQ").await;
    assert_eq!(hq["is_default"], true);
    assert_eq!(hq["is_active"], true);
    assert_eq!(hq["contact_person"]["phone"], "9876543210");
    assert_eq!(hq["created_at"], hq["updated_at"]);

    let items = acct.list().await;
    assert_eq!(items.len(), 1);
    assert_eq!(id_of(&items[0]), id_of(&hq));
}

#[tokio::test]
async fn validation_errors_name_every_field() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);

    let mut body = warehouse_body("HQ");
    body["contact_person"]["phone"] = json!("");
    body["address"]["pincode"] = json!("12");
    body["gstin"] = json!("not-a-gstin");

    let (status, err) = acct.send(reqwest::Method::POST, "/warehouses", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");

    let fields: Vec<&str> = err["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields.len(), 3);
    assert!(fields.contains(&"contact_person.phone"));
    assert!(fields.contains(&"address.pincode"));
    assert!(fields.contains(&"gstin"));
    assert!(acct.list().await.is_empty());
}

#[tokio::test]
async fn reassign_default_delete_old_then_deactivate_new_is_conflict() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);

    let a = acct.create("A").await;
    let b = acct.create("B").await;
    assert_eq!(b["is_default"], false);

    let (status, change) = acct
        .send(reqwest::Method::POST, &format!("/warehouses/{}/default", id_of(&b)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&change["default"]), id_of(&b));
    assert_eq!(id_of(&change["previous_default"]), id_of(&a));
    assert_eq!(change["previous_default"]["is_default"], false);

    let items = acct.list().await;
    assert_eq!(id_of(&items[0]), id_of(&b));
    assert_eq!(items.iter().filter(|w| w["is_default"] == true).count(), 1);

    let (status, deleted) = acct
        .send(reqwest::Method::DELETE, &format!("/warehouses/{}", id_of(&a)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], true);

    let (status, err) = acct
        .send(
            reqwest::Method::PUT,
            &format!("/warehouses/{}/active", id_of(&b)),
            Some(json!({ "active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "conflict");
}

#[tokio::test]
async fn deleting_default_with_other_active_is_conflict() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);

    let a = acct.create("A").await;
    acct.create("B").await;

    let (status, _) = acct
        .send(reqwest::Method::DELETE, &format!("/warehouses/{}", id_of(&a)), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(acct.list().await.len(), 2);
}

#[tokio::test]
async fn set_default_twice_is_idempotent() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);
    let a = acct.create("A").await;

    let path = format!("/warehouses/{}/default", id_of(&a));
    let (status, first) = acct.send(reqwest::Method::POST, &path, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = acct.send(reqwest::Method::POST, &path, None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first["default"], second["default"]);
    assert!(second["previous_default"].is_null());
}

#[tokio::test]
async fn update_rejects_flags_and_clears_optional_fields() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);
    let hq = acct.create("HQ").await;
    let path = format!("/warehouses/{}", id_of(&hq));

    let (status, err) = acct
        .send(reqwest::Method::PATCH, &path, Some(json!({ "is_default": false })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["fields"][0]["field"], "is_default");
    assert_eq!(err["fields"][0]["code"], "read_only");

    let (status, err) = acct
        .send(reqwest::Method::PATCH, &path, Some(json!({ "is_active": null })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["fields"][0]["field"], "is_active");
    assert_eq!(err["fields"][0]["code"], "read_only");

    let (status, updated) = acct
        .send(reqwest::Method::PATCH, &path, Some(json!({ "notes": "Dock 3", "title": "Head Office" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "Dock 3");
    assert_eq!(updated["title"], "Head Office");
    assert_eq!(updated["is_default"], true);

    let (status, cleared) = acct
        .send(reqwest::Method::PATCH, &path, Some(json!({ "notes": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["notes"].is_null());
    assert_eq!(cleared["title"], "Head Office");
}

#[tokio::test]
async fn other_accounts_get_not_found() {
    let srv = TestServer::spawn().await;
    let owner = Account::new(&srv);
    let intruder = Account::new(&srv);
    let hq = owner.create("HQ").await;
    let path = format!("/warehouses/{}", id_of(&hq));

    let (status, err) = intruder.send(reqwest::Method::GET, &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    let (status, _) = intruder.send(reqwest::Method::DELETE, &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(intruder.list().await.is_empty());
    assert_eq!(owner.list().await.len(), 1);
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);

    let (status, err) = acct.send(reqwest::Method::GET, "/warehouses/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_id");
}

#[tokio::test]
async fn pickup_defaults_and_referenced_warehouse_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);

    let (status, err) = acct
        .send(reqwest::Method::POST, "/warehouses/pickup", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{err}");

    let hq = acct.create("HQ").await;
    let (status, resolved) = acct
        .send(reqwest::Method::POST, "/warehouses/pickup", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&resolved["warehouse"]), id_of(&hq));
    assert_eq!(resolved["warehouse"]["shipment_count"], 1);
    assert!(resolved["shipment_ref"].is_string());

    let (status, err) = acct
        .send(reqwest::Method::DELETE, &format!("/warehouses/{}", id_of(&hq)), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["message"].as_str().unwrap().contains("deactivate"));
}

fn shipment_counts(items: &[Value]) -> Vec<(String, u64)> {
    items
        .iter()
        .map(|w| (id_of(w), w["shipment_count"].as_u64().unwrap()))
        .collect()
}

#[tokio::test]
async fn pickup_with_named_warehouse_uses_that_warehouse() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);
    let a = acct.create("A").await;
    let b = acct.create("B").await;

    let (status, resolved) = acct
        .send(
            reqwest::Method::POST,
            "/warehouses/pickup",
            Some(json!({ "warehouse_id": id_of(&b) })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{resolved}");
    assert_eq!(id_of(&resolved["warehouse"]), id_of(&b));
    assert_eq!(resolved["warehouse"]["shipment_count"], 1);

    let (_, a_now) = acct
        .send(reqwest::Method::GET, &format!("/warehouses/{}", id_of(&a)), None)
        .await;
    assert_eq!(a_now["shipment_count"], 0);
    assert_eq!(a_now["is_default"], true);
}

#[tokio::test]
async fn unreadable_pickup_body_records_nothing() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);
    acct.create("A").await;
    let b = acct.create("B").await;
    let before = shipment_counts(&acct.list().await);

    let named_b = json!({ "warehouse_id": id_of(&b) }).to_string();
    let cases = [
        (Some("application/json"), r#"{"warehouse_id": 42}"#.to_string()),
        (Some("application/json"), "{not json".to_string()),
        (Some("application/json"), json!({ "warehouseId": id_of(&b) }).to_string()),
        (None, named_b),
    ];

    for (content_type, body) in cases {
        let mut req = acct.request(reqwest::Method::POST, "/warehouses/pickup").body(body.clone());
        if let Some(content_type) = content_type {
            req = req.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], "validation_error", "{body}");
    }

    assert_eq!(shipment_counts(&acct.list().await), before);
}

#[tokio::test]
async fn pickup_refuses_inactive_and_unknown_warehouses() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);
    acct.create("A").await;
    let b = acct.create("B").await;

    let (status, _) = acct
        .send(
            reqwest::Method::PUT,
            &format!("/warehouses/{}/active", id_of(&b)),
            Some(json!({ "active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let before = shipment_counts(&acct.list().await);

    let (status, err) = acct
        .send(
            reqwest::Method::POST,
            "/warehouses/pickup",
            Some(json!({ "warehouse_id": id_of(&b) })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "conflict");

    let stranger = acct.create("C").await;
    let (status, _) = acct
        .send(reqwest::Method::DELETE, &format!("/warehouses/{}", id_of(&stranger)), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = acct
        .send(
            reqwest::Method::POST,
            "/warehouses/pickup",
            Some(json!({ "warehouse_id": id_of(&stranger) })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    assert_eq!(shipment_counts(&acct.list().await), before);
}

#[tokio::test]
async fn deleting_the_sole_warehouse_leaves_none() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);
    let hq = acct.create("HQ").await;

    let (status, _) = acct
        .send(reqwest::Method::DELETE, &format!("/warehouses/{}", id_of(&hq)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(acct.list().await.is_empty());

    let (status, _) = acct
        .send(reqwest::Method::GET, &format!("/warehouses/{}", id_of(&hq)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stream_notifies_only_the_owning_account() {
    let srv = TestServer::spawn().await;
    let acct = Account::new(&srv);
    let other = Account::new(&srv);

    let mut res = acct.request(reqwest::Method::GET, "/stream").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let elsewhere = other.create("Elsewhere").await;
    let hq = acct.create("HQ").await;

    let received = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let mut buf = String::new();
        while let Some(chunk) = res.chunk().await.unwrap() {
            buf.push_str(&String::from_utf8_lossy(&chunk));
            if buf.contains(&id_of(&hq)) {
                break;
            }
        }
        buf
    })
    .await
    .expect("no change notification within timeout");

    assert!(received.contains("event: warehouses.changed"));
    assert!(received.contains("warehouses.warehouse.created"));
    assert!(!received.contains(&id_of(&elsewhere)));
}
