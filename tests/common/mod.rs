//! Stub ViaCEP and lead backend servers shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Maximum time any test is allowed to run before we consider it hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve `app` on a random port, return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

/// Postal codes the stub ViaCEP knows about. `00000000` answers after a
/// long delay; `50000000` answers 500.
#[derive(Default)]
pub struct ViaCepStub {
    pub calls: AtomicUsize,
}

async fn viacep(State(stub): State<Arc<ViaCepStub>>, Path(cep): Path<String>) -> impl IntoResponse {
    stub.calls.fetch_add(1, Ordering::SeqCst);
    match cep.as_str() {
        "80010010" => (
            StatusCode::OK,
            Json(json!({
                "cep": "80010-010",
                "logradouro": "Rua XV de Novembro",
                "bairro": "Centro",
                "localidade": "Curitiba",
                "uf": "PR",
            })),
        ),
        "01001000" => (
            StatusCode::OK,
            Json(json!({
                "cep": "01001-000",
                "logradouro": "Praça da Sé",
                "bairro": "Sé",
                "localidade": "São Paulo",
                "uf": "SP",
            })),
        ),
        "00000000" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, Json(json!({"erro": true})))
        }
        "50000000" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "boom"})),
        ),
        _ => (StatusCode::OK, Json(json!({"erro": true}))),
    }
}

pub async fn start_viacep() -> (String, Arc<ViaCepStub>) {
    let stub = Arc::new(ViaCepStub::default());
    let app = Router::new()
        .route("/ws/{cep}/json/", get(viacep))
        .with_state(Arc::clone(&stub));
    (format!("{}/ws", serve(app).await), stub)
}

/// Lead backend recording what it receives.
#[derive(Default)]
pub struct BackendStub {
    pub known_emails: Mutex<Vec<String>>,
    pub fail_submit: AtomicBool,
    pub check_calls: AtomicUsize,
    pub submitted: Mutex<Vec<Value>>,
    pub fetched: Mutex<Vec<String>>,
}

async fn formcheck(State(stub): State<Arc<BackendStub>>, Json(body): Json<Value>) -> impl IntoResponse {
    stub.check_calls.fetch_add(1, Ordering::SeqCst);
    let email = body["hospitalEmail"].as_str().unwrap_or_default().to_string();
    let exists = stub.known_emails.lock().unwrap().contains(&email);
    Json(json!({ "exists": exists }))
}

async fn create_lead(State(stub): State<Arc<BackendStub>>, Json(body): Json<Value>) -> impl IntoResponse {
    if stub.fail_submit.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "maintenance"})),
        );
    }
    let mut submitted = stub.submitted.lock().unwrap();
    submitted.push(body);
    (
        StatusCode::CREATED,
        Json(json!({ "lead": { "id": 40 + submitted.len() } })),
    )
}

async fn get_lead(State(stub): State<Arc<BackendStub>>, Path(id): Path<String>) -> impl IntoResponse {
    stub.fetched.lock().unwrap().push(id);
    Json(json!({
        "autoclaveRecommendations": [
            { "brand": "Baumer", "model": "HI VAC 360", "price": { "min": "R$ 250.000", "max": "R$ 310.000" } }
        ],
        "washerRecommendations": [
            { "brand": "Steelco", "models": ["DS 610", "DS 1000"], "price": 180000 }
        ]
    }))
}

pub async fn start_backend() -> (String, Arc<BackendStub>) {
    let stub = Arc::new(BackendStub::default());
    let app = Router::new()
        .route("/lead/formcheck", post(formcheck))
        .route("/lead", post(create_lead))
        .route("/lead/{id}", get(get_lead))
        .with_state(Arc::clone(&stub));
    (serve(app).await, stub)
}

/// A complete set of valid answers, keyed by field name, in form order.
pub fn answers(email: &str) -> Vec<(&'static str, String)> {
    [
        ("customer", "Maria Souza"),
        ("role", "Enfermeira chefe"),
        ("hospitalName", "Hospital São Lucas"),
        ("hospitalEmail", email),
        ("hospitalContact", "(41) 99876-5432"),
        ("cep", "80010-010"),
        ("number", "100"),
        ("businessMoment", "Outro momento"),
        ("hasClinicalEngineering", "sim"),
        ("clinicalEngineeringModel", "Terceirizada"),
        ("cmeStatus", "Já possuo"),
        ("cmeIntent", "Quero ampliar"),
        ("intervalCMEHour", "12,5"),
        ("processingTissue", "nao"),
        ("numberOfSurgery", "4"),
        ("numberSurgeryRoomDay", "6"),
        ("numberBedUTI", "10"),
        ("numberBedIntern", "80"),
        ("numberBedRPA", "6"),
        ("numberBedObs", "12"),
        ("numberBedHospitalDay", "0"),
    ]
    .into_iter()
    .map(|(field, value)| (field, value.to_string()))
    .collect()
}
