//! Integration tests for the thesis archive backend.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::query::Queries;
use crate::storage::FsBlobStore;
use crate::workflow::Workflow;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    blob_root: PathBuf,
    public_base: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let blob_root = temp_dir.path().join("blobs");
        let public_base = "http://files.test".to_string();

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Initialize blob store
        let blobs = Arc::new(FsBlobStore::new(blob_root.clone(), public_base.clone()));

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            blob_root: blob_root.clone(),
            public_base_url: public_base.clone(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let state = AppState {
            workflow: Arc::new(Workflow::new(repo.clone(), blobs)),
            queries: Arc::new(Queries::new(repo.clone())),
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            blob_root,
            public_base,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a student account and return its id.
    async fn create_student(&self, name: &str, email: &str, id_number: Option<&str>) -> i64 {
        let resp = self
            .client
            .post(self.url("/api/users"))
            .json(&json!({
                "name": name,
                "email": email,
                "password": "secret",
                "id_number": id_number
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_i64().unwrap()
    }

    /// Submit a thesis and return its id.
    async fn submit_thesis(&self, body: Value) -> i64 {
        let resp = self
            .client
            .post(self.url("/api/theses"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_i64().unwrap()
    }

    /// Decide on a thesis; returns the raw response.
    async fn decide(&self, thesis_id: i64, status: &str) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/theses/{}/decision", thesis_id)))
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap()
    }

    /// Respond to a collaboration request as the given user.
    async fn respond(&self, request_id: i64, user_id: i64, status: &str) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/collaboration-requests/{}", request_id)))
            .json(&json!({ "status": status, "user_id": user_id }))
            .send()
            .await
            .unwrap()
    }

    /// Pending collaboration requests addressed to a user.
    async fn pending_requests(&self, user_id: i64) -> Vec<Value> {
        let resp = self
            .client
            .get(self.url(&format!("/api/collaboration-requests?user_id={}", user_id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].as_array().unwrap().clone()
    }

    async fn get_thesis(&self, id: i64) -> Value {
        let resp = self
            .client
            .get(self.url(&format!("/api/theses/{}", id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }
}

fn thesis_payload(submitter: i64, title: &str, year: i64) -> Value {
    json!({
        "title": title,
        "author": "Test Author",
        "year": year,
        "college": "College of Arts and Sciences",
        "summary": "A summary.",
        "submitted_by": submitter
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Client without the API key
    let client = Client::new();
    let resp = client
        .get(fixture.url("/api/theses"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let client = Client::new();
    let resp = client
        .get(fixture.url("/api/theses"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/theses"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_submit_and_get_thesis() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let id = fixture
        .submit_thesis(thesis_payload(student, "Indoor Positioning", 2024))
        .await;

    let thesis = fixture.get_thesis(id).await;
    assert_eq!(thesis["title"], "Indoor Positioning");
    assert_eq!(thesis["status"], "pending");
    assert_eq!(thesis["awardee"], false);
    assert_eq!(thesis["featured"], false);
    assert_eq!(thesis["submitted_by"], student);
}

#[tokio::test]
async fn test_submit_validation_errors() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let mut payload = thesis_payload(student, "", 2024);
    payload["title"] = json!("   ");
    let resp = fixture
        .client
        .post(fixture.url("/api/theses"))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_consent_gate_blocks_then_releases() {
    let fixture = TestFixture::new().await;
    let submitter = fixture.create_student("Sam", "sam@test.edu", None).await;
    let alice = fixture
        .create_student("Alice", "alice@test.edu", Some("2021-001"))
        .await;
    let bob = fixture
        .create_student("Bob", "bob@test.edu", Some("2021-002"))
        .await;

    let mut payload = thesis_payload(submitter, "Joint Work", 2024);
    payload["collaborators"] = json!([
        { "id_number": "2021-001", "name": "Alice" },
        { "id_number": "2021-002", "name": "Bob" }
    ]);
    let thesis_id = fixture.submit_thesis(payload).await;

    // Both invitations undecided: decision is blocked with the pending count
    let resp = fixture.decide(thesis_id, "approved").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONSENT_INCOMPLETE");
    assert_eq!(body["error"]["details"]["pending_collaborator_count"], 2);

    // Alice accepts, Bob declines
    let alice_requests = fixture.pending_requests(alice).await;
    assert_eq!(alice_requests.len(), 1);
    let resp = fixture
        .respond(alice_requests[0]["id"].as_i64().unwrap(), alice, "accepted")
        .await;
    assert_eq!(resp.status(), 200);

    let bob_requests = fixture.pending_requests(bob).await;
    assert_eq!(bob_requests.len(), 1);
    let resp = fixture
        .respond(bob_requests[0]["id"].as_i64().unwrap(), bob, "declined")
        .await;
    assert_eq!(resp.status(), 200);

    // Gate released
    let resp = fixture.decide(thesis_id, "approved").await;
    assert_eq!(resp.status(), 200);

    let thesis = fixture.get_thesis(thesis_id).await;
    assert_eq!(thesis["status"], "approved");
    assert!(thesis["approval_date"].is_string());

    // Bob's decline removed him from the embedded list
    let collaborators = thesis["collaborators"].as_array().unwrap();
    assert_eq!(collaborators.len(), 1);
    assert_eq!(collaborators[0]["name"], "Alice");
}

#[tokio::test]
async fn test_decline_removes_matching_collaborator() {
    let fixture = TestFixture::new().await;
    let submitter = fixture.create_student("Sam", "sam@test.edu", None).await;
    let bob = fixture
        .create_student("Bob", "bob@test.edu", Some("2021-002"))
        .await;

    // Alice's id_number resolves to no account, so only Bob gets a request
    let mut payload = thesis_payload(submitter, "Joint Work", 2024);
    payload["collaborators"] = json!([
        { "id_number": "2021-001", "name": "Alice" },
        { "id_number": "2021-002", "name": "Bob" }
    ]);
    let thesis_id = fixture.submit_thesis(payload).await;

    let bob_requests = fixture.pending_requests(bob).await;
    assert_eq!(bob_requests.len(), 1);
    let resp = fixture
        .respond(bob_requests[0]["id"].as_i64().unwrap(), bob, "declined")
        .await;
    assert_eq!(resp.status(), 200);

    let thesis = fixture.get_thesis(thesis_id).await;
    let collaborators = thesis["collaborators"].as_array().unwrap();
    assert_eq!(collaborators.len(), 1);
    assert_eq!(collaborators[0]["id_number"], "2021-001");
    assert_eq!(collaborators[0]["name"], "Alice");
}

#[tokio::test]
async fn test_self_invitation_is_skipped() {
    let fixture = TestFixture::new().await;
    let submitter = fixture
        .create_student("Sam", "sam@test.edu", Some("2020-100"))
        .await;

    let mut payload = thesis_payload(submitter, "Solo Work", 2024);
    payload["collaborators"] = json!([
        { "id_number": "2020-100", "name": "Sam" }
    ]);
    let thesis_id = fixture.submit_thesis(payload).await;

    // No request was created for the submitter
    assert!(fixture.pending_requests(submitter).await.is_empty());

    // Embedded collaborators exist but zero requests are pending: gate passes
    let resp = fixture.decide(thesis_id, "approved").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_respond_requires_the_invited_collaborator() {
    let fixture = TestFixture::new().await;
    let submitter = fixture.create_student("Sam", "sam@test.edu", None).await;
    let alice = fixture
        .create_student("Alice", "alice@test.edu", Some("2021-001"))
        .await;
    let intruder = fixture
        .create_student("Mallory", "mallory@test.edu", None)
        .await;

    let mut payload = thesis_payload(submitter, "Joint Work", 2024);
    payload["collaborators"] = json!([{ "id_number": "2021-001", "name": "Alice" }]);
    fixture.submit_thesis(payload).await;

    let request_id = fixture.pending_requests(alice).await[0]["id"]
        .as_i64()
        .unwrap();

    let resp = fixture.respond(request_id, intruder, "accepted").await;
    assert_eq!(resp.status(), 401);

    // Still pending for Alice
    assert_eq!(fixture.pending_requests(alice).await.len(), 1);
}

#[tokio::test]
async fn test_respond_to_missing_request() {
    let fixture = TestFixture::new().await;
    let user = fixture.create_student("Sam", "sam@test.edu", None).await;

    let resp = fixture.respond(9999, user, "accepted").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_pending_requests_are_enriched() {
    let fixture = TestFixture::new().await;
    let submitter = fixture.create_student("Sam", "sam@test.edu", None).await;
    let alice = fixture
        .create_student("Alice", "alice@test.edu", Some("2021-001"))
        .await;

    let mut payload = thesis_payload(submitter, "Joint Work", 2023);
    payload["collaborators"] = json!([{ "id_number": "2021-001", "name": "Alice" }]);
    let thesis_id = fixture.submit_thesis(payload).await;

    let requests = fixture.pending_requests(alice).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["thesis"]["id"], thesis_id);
    assert_eq!(requests[0]["thesis"]["title"], "Joint Work");
    assert_eq!(requests[0]["thesis"]["year"], 2023);
    assert_eq!(requests[0]["requester"]["id"], submitter);
    assert_eq!(requests[0]["requester"]["name"], "Sam");
    assert_eq!(requests[0]["status"], "pending");
}

#[tokio::test]
async fn test_missing_user_id_on_request_listing() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/collaboration-requests"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_listing_order_year_then_id_desc() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let id1 = fixture
        .submit_thesis(thesis_payload(student, "Oldest", 2022))
        .await;
    let id2 = fixture
        .submit_thesis(thesis_payload(student, "Newest", 2024))
        .await;
    let id3 = fixture
        .submit_thesis(thesis_payload(student, "Middle", 2023))
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/theses"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let listed: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();

    assert_eq!(listed, vec![id2, id3, id1]);
}

#[tokio::test]
async fn test_search_matches_any_of_three_fields() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let mut payload = thesis_payload(student, "Campus Navigation", 2024);
    payload["summary"] = json!("Indoor positioning with BLE Beacon hardware.");
    let with_beacon = fixture.submit_thesis(payload).await;

    fixture
        .submit_thesis(thesis_payload(student, "Eco Tourism", 2023))
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/theses?search=beacon"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let results = body["data"].as_array().unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], with_beacon);
}

#[tokio::test]
async fn test_listing_filters() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let mut cas = thesis_payload(student, "CAS Work", 2024);
    cas["college"] = json!("College of Arts and Sciences");
    let cas_id = fixture.submit_thesis(cas).await;

    let mut con = thesis_payload(student, "CON Work", 2023);
    con["college"] = json!("College of Nursing");
    let con_id = fixture.submit_thesis(con).await;

    // Awardee flag on one of them
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/theses/{}/awardee", con_id)))
        .json(&json!({ "awardee": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/theses?college=College%20of%20Nursing"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], con_id);

    let resp = fixture
        .client
        .get(fixture.url("/api/theses?year=2024"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], cas_id);

    let resp = fixture
        .client
        .get(fixture.url("/api/theses?awardee=true"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], con_id);
}

#[tokio::test]
async fn test_pending_listing_annotates_counts() {
    let fixture = TestFixture::new().await;
    let submitter = fixture.create_student("Sam", "sam@test.edu", None).await;
    fixture
        .create_student("Alice", "alice@test.edu", Some("2021-001"))
        .await;

    let mut with_collab = thesis_payload(submitter, "Joint Work", 2024);
    with_collab["collaborators"] = json!([{ "id_number": "2021-001", "name": "Alice" }]);
    let joint_id = fixture.submit_thesis(with_collab).await;

    let solo_id = fixture
        .submit_thesis(thesis_payload(submitter, "Solo Work", 2023))
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/theses?status=pending"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let listed = body["data"].as_array().unwrap();

    for thesis in listed {
        if thesis["id"] == joint_id {
            assert_eq!(thesis["pending_collaborator_count"], 1);
        } else if thesis["id"] == solo_id {
            assert_eq!(thesis["pending_collaborator_count"], 0);
        }
    }

    // The annotation only appears on pending listings
    let resp = fixture
        .client
        .get(fixture.url("/api/theses"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"][0].get("pending_collaborator_count").is_none());
}

#[tokio::test]
async fn test_awardee_flag_is_idempotent() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;
    let id = fixture
        .submit_thesis(thesis_payload(student, "Awarded", 2024))
        .await;

    for _ in 0..2 {
        let resp = fixture
            .client
            .put(fixture.url(&format!("/api/theses/{}/awardee", id)))
            .json(&json!({ "awardee": true }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let thesis = fixture.get_thesis(id).await;
    assert_eq!(thesis["awardee"], true);
}

#[tokio::test]
async fn test_at_most_one_featured() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let first = fixture
        .submit_thesis(thesis_payload(student, "First", 2023))
        .await;
    let second = fixture
        .submit_thesis(thesis_payload(student, "Second", 2024))
        .await;
    assert_eq!(fixture.decide(first, "approved").await.status(), 200);
    assert_eq!(fixture.decide(second, "approved").await.status(), 200);

    for id in [first, second] {
        let resp = fixture
            .client
            .put(fixture.url(&format!("/api/theses/{}/featured", id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Last call wins; exactly one thesis is featured
    let resp = fixture
        .client
        .get(fixture.url("/api/theses"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let featured: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["featured"] == true)
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(featured, vec![second]);

    let resp = fixture
        .client
        .get(fixture.url("/api/theses/featured"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], second);
}

#[tokio::test]
async fn test_featured_permitted_on_non_approved() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;
    let pending = fixture
        .submit_thesis(thesis_payload(student, "Still Pending", 2024))
        .await;

    // Setting featured on a pending thesis is permitted...
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/theses/{}/featured", pending)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // ...but the featured endpoint only serves approved work
    let resp = fixture
        .client
        .get(fixture.url("/api/theses/featured"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_my_submissions_union() {
    let fixture = TestFixture::new().await;
    let u = fixture
        .create_student("U", "u@test.edu", Some("2021-010"))
        .await;
    let v = fixture.create_student("V", "v@test.edu", None).await;

    // U authors thesis A
    let a = fixture
        .submit_thesis(thesis_payload(u, "Authored by U", 2023))
        .await;

    // V authors thesis B with U invited; U accepts
    let mut payload = thesis_payload(v, "Authored by V", 2024);
    payload["collaborators"] = json!([{ "id_number": "2021-010", "name": "U" }]);
    let b = fixture.submit_thesis(payload).await;

    let request_id = fixture.pending_requests(u).await[0]["id"].as_i64().unwrap();
    assert_eq!(fixture.respond(request_id, u, "accepted").await.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/my-submissions/{}", u)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();

    // Both theses, each exactly once, id descending
    assert_eq!(ids, vec![b, a]);
}

#[tokio::test]
async fn test_college_stats_omit_zero_counts() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let mut cas1 = thesis_payload(student, "CAS One", 2024);
    cas1["college"] = json!("College of Arts and Sciences");
    let cas1_id = fixture.submit_thesis(cas1).await;

    let mut cas2 = thesis_payload(student, "CAS Two", 2023);
    cas2["college"] = json!("College of Arts and Sciences");
    let cas2_id = fixture.submit_thesis(cas2).await;

    let mut con = thesis_payload(student, "CON One", 2024);
    con["college"] = json!("College of Nursing");
    let con_id = fixture.submit_thesis(con).await;

    // A pending thesis in another college must not appear in the stats
    let mut cte = thesis_payload(student, "CTE Pending", 2024);
    cte["college"] = json!("College of Teacher Education");
    fixture.submit_thesis(cte).await;

    for id in [cas1_id, cas2_id, con_id] {
        assert_eq!(fixture.decide(id, "approved").await.status(), 200);
    }

    let resp = fixture
        .client
        .get(fixture.url("/api/college-stats"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let stats = body["data"].as_array().unwrap();

    assert_eq!(stats.len(), 2);
    for stat in stats {
        match stat["college"].as_str().unwrap() {
            "College of Arts and Sciences" => assert_eq!(stat["count"], 2),
            "College of Nursing" => assert_eq!(stat["count"], 1),
            other => panic!("Unexpected college in stats: {}", other),
        }
    }
}

#[tokio::test]
async fn test_delete_thesis_removes_blobs_and_row() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    // Seed blobs the way an upload would have left them
    tokio::fs::create_dir_all(&fixture.blob_root).await.unwrap();
    tokio::fs::write(fixture.blob_root.join("cover.png"), b"png")
        .await
        .unwrap();
    tokio::fs::write(fixture.blob_root.join("thesis.pdf"), b"pdf")
        .await
        .unwrap();

    let mut payload = thesis_payload(student, "With Files", 2024);
    payload["cover_image_url"] = json!(format!(
        "{}/research-files/cover.png",
        fixture.public_base
    ));
    payload["pdf_url"] = json!(format!("{}/research-files/thesis.pdf", fixture.public_base));
    let id = fixture.submit_thesis(payload).await;

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/theses/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(!fixture.blob_root.join("cover.png").exists());
    assert!(!fixture.blob_root.join("thesis.pdf").exists());

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/theses/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_delete_thesis_survives_missing_blobs() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;

    let mut payload = thesis_payload(student, "Phantom Files", 2024);
    payload["cover_image_url"] = json!(format!(
        "{}/research-files/never-uploaded.png",
        fixture.public_base
    ));
    let id = fixture.submit_thesis(payload).await;

    // Blob removal fails but the delete still succeeds
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/theses/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture.decide(9999, "approved").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = fixture
        .client
        .put(fixture.url("/api/theses/9999/awardee"))
        .json(&json!({ "awardee": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .put(fixture.url("/api/theses/9999/featured"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .delete(fixture.url("/api/theses/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .get(fixture.url("/api/theses/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_decision_status_must_be_terminal() {
    let fixture = TestFixture::new().await;
    let student = fixture.create_student("Sam", "sam@test.edu", None).await;
    let id = fixture
        .submit_thesis(thesis_payload(student, "Some Work", 2024))
        .await;

    let resp = fixture.decide(id, "pending").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_user_lifecycle() {
    let fixture = TestFixture::new().await;

    // Register
    let resp = fixture
        .client
        .post(fixture.url("/api/users"))
        .json(&json!({
            "name": "Alice",
            "email": "alice@test.edu",
            "password": "secret",
            "id_number": "2021-001"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let user_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["role"], "student");
    // The credential is never serialized
    assert!(body["data"].get("password").is_none());

    // Lookup by id number
    let resp = fixture
        .client
        .get(fixture.url("/api/users/by-id-number?id=2021-001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], user_id);
    assert_eq!(body["data"]["name"], "Alice");

    // Roster
    let resp = fixture
        .client
        .get(fixture.url("/api/users"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Profile edit
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/users/{}", user_id)))
        .json(&json!({ "name": "Alice Cruz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/users/by-id-number?id=2021-001"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Alice Cruz");

    // Empty update is rejected
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/users/{}", user_id)))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Delete
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/users/{}", user_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/users/by-id-number?id=2021-001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
