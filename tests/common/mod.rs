// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use agrifund_client::api_client::ApiClient;
use agrifund_client::config::Config;
use agrifund_client::notify::MemorySink;
use agrifund_client::session::{Session, SessionUser, UserRole};
use agrifund_client::uploads::SelectedFile;

/// Everything the mock backend records, plus the failure switches tests can
/// flip mid-flow.
#[derive(Debug, Default)]
pub struct MockState {
    pub farmlands: Vec<Value>,
    pub seeded_investments: HashMap<Uuid, Value>,
    pub uploads: Vec<String>,
    pub created_investments: Vec<Value>,
    pub updated_investments: Vec<(Uuid, Value)>,
    pub created_farmlands: Vec<Value>,
    pub fail_uploads: bool,
    pub fail_create: bool,
    pub fail_farmlands: bool,
}

pub type SharedState = Arc<Mutex<MockState>>;

/// A running in-process stand-in for the AgriFund backend.
pub struct MockApi {
    pub base_url: String,
    pub state: SharedState,
}

impl MockApi {
    /// Client wired to this mock with a signed-in farmer session.
    pub fn client(&self) -> Arc<ApiClient> {
        let session = Arc::new(Session::anonymous());
        session.login(
            SessionUser {
                id: Uuid::new_v4(),
                name: "Nguyễn Văn An".to_string(),
                role: UserRole::Farmer,
            },
            "test-token",
        );
        Arc::new(ApiClient::new(
            &Config::with_base_url(self.base_url.clone()),
            session,
        ))
    }

    pub fn seed_farmland(&self, record: Value) {
        self.state.lock().expect("mock state").farmlands.push(record);
    }

    pub fn seed_investment(&self, id: Uuid, record: Value) {
        self.state
            .lock()
            .expect("mock state")
            .seeded_investments
            .insert(id, record);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.state.lock().expect("mock state").fail_uploads = fail;
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.state.lock().expect("mock state").fail_create = fail;
    }

    pub fn set_fail_farmlands(&self, fail: bool) {
        self.state.lock().expect("mock state").fail_farmlands = fail;
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state.lock().expect("mock state").uploads.clone()
    }

    pub fn created_investments(&self) -> Vec<Value> {
        self.state
            .lock()
            .expect("mock state")
            .created_investments
            .clone()
    }

    pub fn updated_investments(&self) -> Vec<(Uuid, Value)> {
        self.state
            .lock()
            .expect("mock state")
            .updated_investments
            .clone()
    }

    pub fn created_farmlands(&self) -> Vec<Value> {
        self.state
            .lock()
            .expect("mock state")
            .created_farmlands
            .clone()
    }
}

/// Binds the mock on an ephemeral port and serves it for the rest of the
/// test.
pub async fn spawn_mock_api() -> MockApi {
    let state = SharedState::default();
    let app = Router::new()
        .route("/farmlands", get(list_farmlands).post(create_farmland))
        .route("/upload/image", post(upload_image))
        .route("/farmer-investments", post(create_investment))
        .route(
            "/farmer-investments/:id",
            get(get_investment).patch(update_investment),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock api");
    });

    MockApi {
        base_url: format!("http://{addr}"),
        state,
    }
}

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn mk_sink() -> Arc<MemorySink> {
    Arc::new(MemorySink::new())
}

pub fn mk_file(name: &str, content_type: &str, size: usize) -> SelectedFile {
    SelectedFile {
        file_name: name.to_string(),
        content_type: content_type.to_string(),
        bytes: vec![0u8; size],
    }
}

pub fn mk_image(name: &str, size: usize) -> SelectedFile {
    mk_file(name, "image/jpeg", size)
}

/// A complete investment record the client can hydrate, with the fields edit
/// tests assert on.
pub fn sample_investment_record(id: Uuid) -> Value {
    json!({
        "id": id,
        "title": "Dự án A",
        "description": "Mở rộng vùng trồng cà phê",
        "investmentType": "EQUIPMENT_PURCHASE",
        "requestedAmount": 5_000_000,
        "minimumInvestment": 500_000,
        "expectedReturnRate": 12.5,
        "durationMonths": 18,
        "targetDate": "2026-09-01T00:00:00Z",
        "riskLevel": "HIGH",
        "riskFactors": ["hạn hán", "sâu bệnh"],
        "collateral": "Máy kéo",
        "images": ["https://cdn.agrifund.test/old.jpg"],
        "repaymentTerms": "Trả theo quý",
        "status": "PENDING_APPROVAL",
        "fundedAmount": 0,
        "createdAt": Utc::now(),
        "updatedAt": Utc::now(),
    })
}

/// A farmland record for the selector tests.
pub fn sample_farmland_record(id: Uuid, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "areaHectares": 2.5,
        "province": "Đắk Lắk",
        "commune": "Xã Ea Tu",
        "fullAddress": "Xã Ea Tu, Đắk Lắk",
        "soilType": "RED_BASALT",
        "images": [],
        "verificationLevel": "VERIFIED",
        "createdAt": Utc::now(),
        "updatedAt": Utc::now(),
    })
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message, "statusCode": status.as_u16() })))
}

/// Payload echoed back as a persisted record, the way the real backend does.
fn persisted_record(payload: &Value, id: Uuid, extra: &[(&str, Value)]) -> Value {
    let mut record = payload.clone();
    if let Some(map) = record.as_object_mut() {
        map.insert("id".to_string(), json!(id));
        map.insert("createdAt".to_string(), json!(Utc::now()));
        map.insert("updatedAt".to_string(), json!(Utc::now()));
        // Date-only inputs are stored as full timestamps.
        for key in ["targetDate", "fundingDeadline"] {
            if let Some(date) = map.get(key).and_then(Value::as_str) {
                if !date.contains('T') {
                    let stamp = format!("{date}T00:00:00Z");
                    map.insert(key.to_string(), json!(stamp));
                }
            }
        }
        for (key, value) in extra {
            map.insert((*key).to_string(), value.clone());
        }
    }
    record
}

async fn list_farmlands(
    State(state): State<SharedState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let guard = state.lock().expect("mock state");
    if guard.fail_farmlands {
        return Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Farmland service unavailable",
        ));
    }
    Ok(Json(Value::Array(guard.farmlands.clone())))
}

async fn create_farmland(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let mut guard = state.lock().expect("mock state");
    if guard.fail_create {
        return Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Farmland rejected by verification policy",
        ));
    }
    guard.created_farmlands.push(payload.clone());
    let record = persisted_record(
        &payload,
        Uuid::new_v4(),
        &[("verificationLevel", json!("UNVERIFIED"))],
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn upload_image(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if state.lock().expect("mock state").fail_uploads {
        return Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Storage unavailable",
        ));
    }
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| error_body(StatusCode::BAD_REQUEST, "Malformed multipart body"))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let mimetype = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| error_body(StatusCode::BAD_REQUEST, "Truncated upload"))?;
            let url = format!("https://cdn.agrifund.test/{filename}");
            state
                .lock()
                .expect("mock state")
                .uploads
                .push(filename.clone());
            return Ok(Json(json!({
                "url": url,
                "filename": filename,
                "size": bytes.len(),
                "mimetype": mimetype,
            })));
        }
    }
    Err(error_body(StatusCode::BAD_REQUEST, "Missing file field"))
}

async fn create_investment(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let mut guard = state.lock().expect("mock state");
    if guard.fail_create {
        return Err(error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Funding request rejected by risk policy",
        ));
    }
    guard.created_investments.push(payload.clone());
    let record = persisted_record(
        &payload,
        Uuid::new_v4(),
        &[("status", json!("PENDING_APPROVAL")), ("fundedAmount", json!(0))],
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_investment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let guard = state.lock().expect("mock state");
    match guard.seeded_investments.get(&id) {
        Some(record) => Ok(Json(record.clone())),
        None => Err(error_body(StatusCode::NOT_FOUND, "Investment not found")),
    }
}

async fn update_investment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut guard = state.lock().expect("mock state");
    guard.updated_investments.push((id, payload.clone()));
    let record = persisted_record(
        &payload,
        id,
        &[("status", json!("PENDING_APPROVAL")), ("fundedAmount", json!(0))],
    );
    Ok(Json(record))
}
