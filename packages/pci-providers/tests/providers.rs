use std::{
	net::SocketAddr,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Json, Router,
	extract::{Path, State},
	http::{HeaderMap, StatusCode},
	routing::{get, post},
};
use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use pci_providers::{
	TOKEN_TYPE_HEADER, completion, ner,
	search::{self, SearchQuery},
	statement::{self, Statement},
};

#[derive(Clone, Default)]
struct Recorded {
	bodies: Arc<Mutex<Vec<Value>>>,
	headers: Arc<Mutex<Vec<HeaderMap>>>,
	polls: Arc<AtomicUsize>,
}

async fn start(app: Router) -> SocketAddr {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener.");
	let addr = listener.local_addr().expect("Failed to read listener address.");

	tokio::spawn(async move {
		axum::serve(listener, app).await.expect("Test server failed.");
	});

	addr
}

fn warehouse(addr: SocketAddr) -> pci_config::Warehouse {
	pci_config::Warehouse {
		account_url: format!("http://{addr}"),
		token: "secret".to_string(),
		token_type: "KEYPAIR_JWT".to_string(),
		database: "PEDIATRIC_ML".to_string(),
		schema: "CLINICAL_DATA".to_string(),
		warehouse: "COMPUTE_WH".to_string(),
		role: Some("CLINICIAN".to_string()),
		timeout_ms: 5_000,
		poll_interval_ms: 10,
		default_headers: Map::new(),
	}
}

async fn record_statement(
	State(recorded): State<Recorded>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Json<Value> {
	recorded.bodies.lock().unwrap_or_else(|err| err.into_inner()).push(body.clone());
	recorded.headers.lock().unwrap_or_else(|err| err.into_inner()).push(headers);

	let sql = body["statement"].as_str().unwrap_or_default();
	let response = if sql.contains("COMPLETE") {
		serde_json::json!({
			"resultSetMetaData": { "rowType": [{ "name": "SUMMARY" }] },
			"data": [["Patients presented with febrile neutropenia."]]
		})
	} else {
		serde_json::json!({
			"resultSetMetaData": { "rowType": [{ "name": "PATIENT_ID" }, { "name": "MRN" }] },
			"data": [["42", "MRN00000042"]]
		})
	};

	Json(response)
}

#[test]
fn builds_bearer_and_token_type_headers() {
	let headers = pci_providers::auth_headers("secret", "OAUTH", &Map::new())
		.expect("Failed to build headers.");

	assert_eq!(headers.get(AUTHORIZATION).expect("Missing authorization header."), "Bearer secret");
	assert_eq!(headers.get(TOKEN_TYPE_HEADER).expect("Missing token type header."), "OAUTH");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-trace".to_string(), Value::from(1));

	assert!(pci_providers::auth_headers("secret", "OAUTH", &defaults).is_err());
}

#[tokio::test]
async fn executes_bound_statement_with_session_context() {
	let recorded = Recorded::default();
	let app = Router::new()
		.route("/api/v2/statements", post(record_statement))
		.with_state(recorded.clone());
	let addr = start(app).await;
	let cfg = warehouse(addr);
	let statement =
		Statement::new("SELECT PATIENT_ID, MRN FROM PATIENTS WHERE MRN = ?").bind_text("MRN'42");
	let rows = statement::execute(&cfg, &statement).await.expect("Statement failed.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].int("PATIENT_ID").expect("int"), Some(42));

	let bodies = recorded.bodies.lock().unwrap_or_else(|err| err.into_inner());

	assert_eq!(bodies[0]["database"], "PEDIATRIC_ML");
	assert_eq!(bodies[0]["role"], "CLINICIAN");
	assert_eq!(bodies[0]["bindings"]["1"]["value"], "MRN'42");

	let headers = recorded.headers.lock().unwrap_or_else(|err| err.into_inner());

	assert_eq!(headers[0].get("authorization").expect("Missing authorization."), "Bearer secret");
	assert_eq!(headers[0].get(TOKEN_TYPE_HEADER).expect("Missing token type."), "KEYPAIR_JWT");
}

#[tokio::test]
async fn completion_returns_summary_cell() {
	let recorded = Recorded::default();
	let app = Router::new()
		.route("/api/v2/statements", post(record_statement))
		.with_state(recorded.clone());
	let addr = start(app).await;
	let summary = completion::complete(&warehouse(addr), "llama3-70b", "Summarize 'this'.")
		.await
		.expect("Completion failed.");

	assert_eq!(summary.as_deref(), Some("Patients presented with febrile neutropenia."));

	let bodies = recorded.bodies.lock().unwrap_or_else(|err| err.into_inner());

	assert_eq!(bodies[0]["statement"], completion::COMPLETE_SQL);
	assert_eq!(bodies[0]["bindings"]["1"]["value"], "llama3-70b");
	assert_eq!(bodies[0]["bindings"]["2"]["value"], "Summarize 'this'.");
}

#[tokio::test]
async fn polls_pending_statement_until_complete() {
	async fn submit() -> (StatusCode, Json<Value>) {
		(StatusCode::ACCEPTED, Json(serde_json::json!({ "statementHandle": "h-1" })))
	}

	async fn status(
		State(recorded): State<Recorded>,
		Path(handle): Path<String>,
	) -> (StatusCode, Json<Value>) {
		assert_eq!(handle, "h-1");

		if recorded.polls.fetch_add(1, Ordering::SeqCst) < 2 {
			return (StatusCode::ACCEPTED, Json(serde_json::json!({ "statementHandle": "h-1" })));
		}

		(
			StatusCode::OK,
			Json(serde_json::json!({
				"resultSetMetaData": { "rowType": [{ "name": "ENTITIES" }] },
				"data": [["[]"]]
			})),
		)
	}

	let recorded = Recorded::default();
	let app = Router::new()
		.route("/api/v2/statements", post(submit))
		.route("/api/v2/statements/{handle}", get(status))
		.with_state(recorded.clone());
	let addr = start(app).await;
	let value = ner::predict(&warehouse(addr), "MODELS.BIOBERT_NER", "fever")
		.await
		.expect("Prediction failed.");

	assert_eq!(value, Value::String("[]".to_string()));
	assert_eq!(recorded.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn search_posts_structured_query_to_service_path() {
	async fn query(
		State(recorded): State<Recorded>,
		Path((database, schema, service)): Path<(String, String, String)>,
		Json(body): Json<Value>,
	) -> Json<Value> {
		assert_eq!(database, "PEDIATRIC_ML");
		assert_eq!(schema, "CLINICAL_DATA");
		assert_eq!(service, "CLINICAL_NOTES_SEARCH:query");

		recorded.bodies.lock().unwrap_or_else(|err| err.into_inner()).push(body);

		Json(serde_json::json!({
			"results": [{ "PATIENT_ID": "7", "NOTE_TYPE": "Progress Note" }]
		}))
	}

	let recorded = Recorded::default();
	let app = Router::new()
		.route(
			"/api/v2/databases/{database}/schemas/{schema}/cortex-search-services/{service}",
			post(query),
		)
		.with_state(recorded.clone());
	let addr = start(app).await;
	let request = SearchQuery {
		query: "fever \"and\" neutropenia".to_string(),
		columns: vec!["NOTE_TEXT".to_string(), "PATIENT_ID".to_string()],
		limit: 10,
		filter: Some(SearchQuery::eq_filter("NOTE_TYPE", "Progress Note")),
	};
	let hits = search::search(&warehouse(addr), "CLINICAL_NOTES_SEARCH", &request)
		.await
		.expect("Search failed.");

	assert_eq!(hits.len(), 1);

	let bodies = recorded.bodies.lock().unwrap_or_else(|err| err.into_inner());

	assert_eq!(bodies[0]["query"], "fever \"and\" neutropenia");
	assert_eq!(bodies[0]["limit"], 10);
	assert_eq!(bodies[0]["filter"]["@eq"]["NOTE_TYPE"], "Progress Note");
}

#[tokio::test]
async fn search_surfaces_http_failures() {
	async fn fail() -> StatusCode {
		StatusCode::INTERNAL_SERVER_ERROR
	}

	let app = Router::new().fallback(fail);
	let addr = start(app).await;
	let request = SearchQuery {
		query: "x".to_string(),
		columns: Vec::new(),
		limit: 1,
		filter: None,
	};

	assert!(search::search(&warehouse(addr), "CLINICAL_NOTES_SEARCH", &request).await.is_err());
}
