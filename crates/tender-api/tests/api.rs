//! # Router-Level Integration Tests
//!
//! Exercises the full request lifecycle — parse, permission, two-tier
//! validation, transition guards, side effects — against in-memory
//! state, with sessions provisioned through `StaticSessions`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tender_api::auth::StaticSessions;
use tender_api::state::{AppConfig, AppState};
use tender_core::{OpportunityId, Session, Timestamp, User, UserId, UserType};

const GOV: &str = "gov-token";
const ADMIN: &str = "admin-token";
const VENDOR1: &str = "vendor1-token";
const VENDOR2: &str = "vendor2-token";
const NO_TERMS_VENDOR: &str = "vendor3-token";

const OPPORTUNITIES: &str = "/api/opportunities/fixed-price";
const PROPOSALS: &str = "/api/proposals/fixed-price";

struct TestApp {
    state: AppState,
    router: axum::Router,
}

/// Build the test app. The closing hook's debounce window is zero so
/// every `/status` poll performs a real scan (the throttle test builds
/// its own app with a wide window).
fn test_app() -> TestApp {
    test_app_with_interval(Duration::ZERO)
}

fn test_app_with_interval(closing_interval: Duration) -> TestApp {
    let sessions = Arc::new(StaticSessions::default());
    let config = AppConfig {
        closing_interval,
        ..AppConfig::default()
    };
    let state = AppState::with_config(config, None, sessions.clone());

    let seed = |token: &str, user_type: UserType, terms: bool| {
        let user = User {
            id: UserId::new(),
            user_type,
            name: token.to_string(),
            email: None,
            active: true,
            accepted_terms_at: terms.then(Timestamp::now),
            created_at: Timestamp::now(),
        };
        state.store.insert_user(user.clone());
        sessions.insert(token, Session::for_user(user));
    };
    seed(GOV, UserType::Government, true);
    seed(ADMIN, UserType::Admin, true);
    seed(VENDOR1, UserType::Vendor, true);
    seed(VENDOR2, UserType::Vendor, true);
    seed(NO_TERMS_VENDOR, UserType::Vendor, false);

    let router = tender_api::app(state.clone());
    TestApp { state, router }
}

async fn request(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn valid_opportunity() -> Value {
    json!({
        "title": "Test Opportunity",
        "teaser": "Sample teaser",
        "remoteOk": false,
        "location": "Victoria",
        "reward": 70000,
        "skills": ["foo", "bar"],
        "description": "Sample description",
        "proposalDeadline": "2030-12-01",
        "assignmentDate": "2031-01-08",
        "startDate": "2031-01-15",
        "completionDate": "2031-02-15",
        "submissionInfo": "github.com",
        "acceptanceCriteria": "Sample acceptance criteria",
        "evaluationCriteria": "Sample evaluation criteria",
        "status": "DRAFT"
    })
}

fn valid_proposal(opportunity: &str) -> Value {
    json!({
        "opportunity": opportunity,
        "proposalText": "You should hire me",
        "additionalComments": "please",
        "proponent": {
            "tag": "individual",
            "value": {
                "legalName": "Andrea S",
                "email": "foo@bar.com",
                "phone": "222-222-2222",
                "street1": "1 street road",
                "city": "Saskatoon",
                "region": "SK",
                "mailCode": "V8Z 1T8",
                "country": "Canada"
            }
        },
        "status": "DRAFT"
    })
}

async fn create_opportunity(app: &TestApp, body: Value) -> String {
    let (status, value) = request(app, "POST", OPPORTUNITIES, Some(GOV), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {value}");
    value["id"].as_str().unwrap().to_string()
}

async fn publish(app: &TestApp, id: &str) -> (StatusCode, Value) {
    request(
        app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        Some(json!({"tag": "publish", "value": "Published"})),
    )
    .await
}

async fn submit_proposal(app: &TestApp, token: &str, opportunity: &str) -> String {
    let (status, value) = request(
        app,
        "POST",
        PROPOSALS,
        Some(token),
        Some(valid_proposal(opportunity)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "proposal create failed: {value}");
    let id = value["id"].as_str().unwrap().to_string();
    let (status, value) = request(
        app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(token),
        Some(json!({"tag": "submit", "value": "NoOp"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit failed: {value}");
    id
}

/// Push the deadline into the past and run the closing hook — the test
/// equivalent of waiting for the deadline to elapse.
async fn make_evaluatable(app: &TestApp, id: &str) {
    let oid = OpportunityId::from_uuid(uuid::Uuid::parse_str(id).unwrap());
    let past = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
    app.state
        .store
        .with_opportunity_mut(&oid, |o| o.fields.proposal_deadline = past)
        .expect("opportunity exists");
    let (status, _) = request(app, "GET", "/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

async fn opportunity_status(app: &TestApp, id: &str) -> String {
    let (status, value) =
        request(app, "GET", &format!("{OPPORTUNITIES}/{id}"), Some(GOV), None).await;
    assert_eq!(status, StatusCode::OK);
    value["status"].as_str().unwrap().to_string()
}

// ─── Opportunity creation ────────────────────────────────────────────

#[tokio::test]
async fn vendor_cannot_create_opportunity() {
    let app = test_app();
    let (status, _) = request(
        &app,
        "POST",
        OPPORTUNITIES,
        Some(VENDOR1),
        Some(valid_opportunity()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_cannot_create_opportunity() {
    let app = test_app();
    let (status, _) = request(&app, "POST", OPPORTUNITIES, None, Some(valid_opportunity())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gov_saves_valid_opportunity() {
    let app = test_app();
    let (status, value) = request(
        &app,
        "POST",
        OPPORTUNITIES,
        Some(GOV),
        Some(valid_opportunity()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(value["status"], "DRAFT");
    assert_eq!(value["kind"], "FIXED_PRICE");
}

#[tokio::test]
async fn invalid_draft_saves_but_invalid_published_does_not() {
    let app = test_app();

    // A past start date is fine in a draft (lenient tier)...
    let mut body = valid_opportunity();
    body["startDate"] = json!("1943-05-30");
    let (status, _) = request(&app, "POST", OPPORTUNITIES, Some(GOV), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    // ...but not when creating directly as published (strict tier).
    body["status"] = json!("PUBLISHED");
    let (status, value) = request(&app, "POST", OPPORTUNITIES, Some(GOV), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"]["details"]["startDate"].is_array());
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = test_app();
    let mut body = valid_opportunity();
    body["status"] = json!("INVALID");
    let (status, _) = request(&app, "POST", OPPORTUNITIES, Some(GOV), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Editing and publishing ──────────────────────────────────────────

#[tokio::test]
async fn draft_edits_tolerate_errors_and_publish_gates_on_them() {
    let app = test_app();
    let id = create_opportunity(&app, valid_opportunity()).await;

    // An invalid date saves into a draft.
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        Some(json!({"tag": "edit", "value": {"startDate": "1986-05-01"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Publishing the now-invalid draft fails with a field map, and the
    // status does not change.
    let (status, value) = publish(&app, &id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{value}");
    assert_eq!(opportunity_status(&app, &id).await, "DRAFT");

    // Repairing the draft lets publication through.
    let mut repair = valid_opportunity();
    repair.as_object_mut().unwrap().remove("status");
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        Some(json!({"tag": "edit", "value": repair})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, value) = publish(&app, &id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "PUBLISHED");
}

#[tokio::test]
async fn vendor_cannot_publish() {
    let app = test_app();
    let id = create_opportunity(&app, valid_opportunity()).await;
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(VENDOR1),
        Some(json!({"tag": "publish", "value": "Published"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn undeclared_edges_fail_without_changing_status() {
    let app = test_app();
    let id = create_opportunity(&app, valid_opportunity()).await;

    // Draft -> Suspended is not a declared edge, even for an admin.
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(ADMIN),
        Some(json!({"tag": "suspend", "value": "paused"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(opportunity_status(&app, &id).await, "DRAFT");
}

#[tokio::test]
async fn suspend_and_reactivate_are_admin_only() {
    let app = test_app();
    let id = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &id).await;

    let suspend = json!({"tag": "suspend", "value": "under review"});
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        Some(suspend.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, value) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(ADMIN),
        Some(suspend),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "SUSPENDED");

    // Reactivation uses the publish verb and is also admin-only.
    let (status, _) = publish(&app, &id).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, value) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(ADMIN),
        Some(json!({"tag": "publish", "value": "Reactivated"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "PUBLISHED");
}

#[tokio::test]
async fn addendum_requires_publication() {
    let app = test_app();
    let id = create_opportunity(&app, valid_opportunity()).await;

    let addendum = json!({"tag": "addAddendum", "value": "My First Addendum"});
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        Some(addendum.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    publish(&app, &id).await;
    let (status, value) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        Some(addendum),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["addenda"].as_array().unwrap().len(), 1);
}

// ─── Visibility ──────────────────────────────────────────────────────

#[tokio::test]
async fn vendors_see_only_public_opportunities() {
    let app = test_app();
    let published = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &published).await;
    let _draft = create_opportunity(&app, valid_opportunity()).await;

    let (_, value) = request(&app, "GET", OPPORTUNITIES, Some(GOV), None).await;
    assert_eq!(value.as_array().unwrap().len(), 2);

    let (_, value) = request(&app, "GET", OPPORTUNITIES, Some(VENDOR1), None).await;
    let listed = value.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], json!(published));

    // Anonymous readers get the public view too.
    let (_, value) = request(&app, "GET", OPPORTUNITIES, None, None).await;
    assert_eq!(value.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invisible_reads_are_not_found() {
    let app = test_app();
    let draft = create_opportunity(&app, valid_opportunity()).await;
    let (status, _) = request(
        &app,
        "GET",
        &format!("{OPPORTUNITIES}/{draft}"),
        Some(VENDOR1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Deletion ────────────────────────────────────────────────────────

#[tokio::test]
async fn only_drafts_can_be_deleted() {
    let app = test_app();
    let id = create_opportunity(&app, valid_opportunity()).await;

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(&app, "GET", &format!("{OPPORTUNITIES}/{id}"), Some(GOV), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &id).await;
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Proposals ───────────────────────────────────────────────────────

#[tokio::test]
async fn proposal_creation_requires_accepted_terms() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;

    let (status, _) = request(
        &app,
        "POST",
        PROPOSALS,
        Some(NO_TERMS_VENDOR),
        Some(valid_proposal(&opp)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "POST",
        PROPOSALS,
        Some(VENDOR1),
        Some(valid_proposal(&opp)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn accepting_terms_through_the_api_unlocks_proposals() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;

    // Find the terms-less vendor's own id via the users resource.
    let vendor_id = {
        let users = app.state.store.list_users();
        users
            .iter()
            .find(|u| u.name == NO_TERMS_VENDOR)
            .unwrap()
            .id
            .0
            .to_string()
    };
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{vendor_id}"),
        Some(NO_TERMS_VENDOR),
        Some(json!({"tag": "acceptTerms", "value": "NoOp"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        PROPOSALS,
        Some(NO_TERMS_VENDOR),
        Some(valid_proposal(&opp)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn one_proposal_per_vendor_per_opportunity() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;

    let (status, _) = request(
        &app,
        "POST",
        PROPOSALS,
        Some(VENDOR1),
        Some(valid_proposal(&opp)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = request(
        &app,
        "POST",
        PROPOSALS,
        Some(VENDOR1),
        Some(valid_proposal(&opp)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn vendor_edits_then_submits_then_withdraws() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;

    let (_, value) = request(
        &app,
        "POST",
        PROPOSALS,
        Some(VENDOR1),
        Some(valid_proposal(&opp)),
    )
    .await;
    let id = value["id"].as_str().unwrap().to_string();

    let mut edited = valid_proposal(&opp);
    edited["proposalText"] = json!("A sharper pitch");
    let (status, value) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(VENDOR1),
        Some(json!({"tag": "edit", "value": edited})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["proposalText"], "A sharper pitch");

    let (status, value) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(VENDOR1),
        Some(json!({"tag": "submit", "value": "NoOp"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "SUBMITTED");

    let (status, value) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(VENDOR1),
        Some(json!({"tag": "withdraw", "value": "NoOp"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "WITHDRAWN");
}

#[tokio::test]
async fn withdrawing_a_draft_is_a_permission_error() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;

    let (_, value) = request(
        &app,
        "POST",
        PROPOSALS,
        Some(VENDOR1),
        Some(valid_proposal(&opp)),
    )
    .await;
    let id = value["id"].as_str().unwrap();

    let (status, _) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(VENDOR1),
        Some(json!({"tag": "withdraw", "value": "NoOp"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn drafts_cannot_be_deleted_once_submitted() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let id = submit_proposal(&app, VENDOR1, &opp).await;

    let (status, _) = request(&app, "DELETE", &format!("{PROPOSALS}/{id}"), Some(VENDOR1), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Sealed bids ─────────────────────────────────────────────────────

#[tokio::test]
async fn staff_cannot_read_bids_of_an_open_opportunity() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    submit_proposal(&app, VENDOR1, &opp).await;
    submit_proposal(&app, VENDOR2, &opp).await;

    let (status, _) = request(
        &app,
        "GET",
        &format!("{PROPOSALS}?opportunity={opp}"),
        Some(GOV),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    make_evaluatable(&app, &opp).await;
    let (status, value) = request(
        &app,
        "GET",
        &format!("{PROPOSALS}?opportunity={opp}"),
        Some(GOV),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value.as_array().unwrap().len(), 2);
}

// ─── Scoring and awarding ────────────────────────────────────────────

#[tokio::test]
async fn scoring_requires_evaluation_phase() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let id = submit_proposal(&app, VENDOR1, &opp).await;

    let score = json!({"tag": "score", "value": 88});
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(score.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    make_evaluatable(&app, &opp).await;
    let (status, value) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(score),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "EVALUATED");
    assert_eq!(value["score"], json!(88.0));
}

#[tokio::test]
async fn score_precision_is_bounded() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let id = submit_proposal(&app, VENDOR1, &opp).await;
    make_evaluatable(&app, &opp).await;

    let (status, value) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(json!({"tag": "score", "value": 88.125})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"]["details"]["score"].is_array());
}

#[tokio::test]
async fn awarding_requires_a_scored_proposal() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let id = submit_proposal(&app, VENDOR1, &opp).await;
    make_evaluatable(&app, &opp).await;

    let (status, _) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(json!({"tag": "award", "value": "Awarded"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn award_settles_the_whole_opportunity() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let winner = submit_proposal(&app, VENDOR1, &opp).await;
    let loser = submit_proposal(&app, VENDOR2, &opp).await;
    make_evaluatable(&app, &opp).await;

    for id in [&winner, &loser] {
        let (status, _) = request(
            &app,
            "PUT",
            &format!("{PROPOSALS}/{id}"),
            Some(GOV),
            Some(json!({"tag": "score", "value": 88})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, value) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{winner}"),
        Some(GOV),
        Some(json!({"tag": "award", "value": "Awarded"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "AWARDED");

    // The parent opportunity and the sibling settle in the same stroke.
    assert_eq!(opportunity_status(&app, &opp).await, "AWARDED");
    let (_, value) = request(&app, "GET", &format!("{PROPOSALS}/{loser}"), Some(GOV), None).await;
    assert_eq!(value["status"], "NOT_AWARDED");
}

#[tokio::test]
async fn award_is_exclusive_per_opportunity() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let first = submit_proposal(&app, VENDOR1, &opp).await;
    let second = submit_proposal(&app, VENDOR2, &opp).await;
    make_evaluatable(&app, &opp).await;

    for id in [&first, &second] {
        request(
            &app,
            "PUT",
            &format!("{PROPOSALS}/{id}"),
            Some(GOV),
            Some(json!({"tag": "score", "value": 88})),
        )
        .await;
    }
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{first}"),
        Some(GOV),
        Some(json!({"tag": "award", "value": "Awarded"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A second award on the sibling is a conflict, not a second winner.
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{second}"),
        Some(GOV),
        Some(json!({"tag": "award", "value": "Awarded"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancellation_is_blocked_by_an_award() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let id = submit_proposal(&app, VENDOR1, &opp).await;
    make_evaluatable(&app, &opp).await;

    // No award yet: cancellation goes through on a fresh opportunity.
    let other = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &other).await;
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{other}"),
        Some(GOV),
        Some(json!({"tag": "cancel", "value": "Opportunity cancelled."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Award, then try to cancel.
    request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(json!({"tag": "score", "value": 90})),
    )
    .await;
    request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(json!({"tag": "award", "value": "Awarded"})),
    )
    .await;
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{opp}"),
        Some(GOV),
        Some(json!({"tag": "cancel", "value": "Opportunity cancelled."})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disqualification_needs_a_reason() {
    let app = test_app();
    let opp = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &opp).await;
    let id = submit_proposal(&app, VENDOR1, &opp).await;
    make_evaluatable(&app, &opp).await;

    let (status, _) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(json!({"tag": "disqualify", "value": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, value) = request(
        &app,
        "PUT",
        &format!("{PROPOSALS}/{id}"),
        Some(GOV),
        Some(json!({"tag": "disqualify", "value": "Disqualified for self-identification."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "DISQUALIFIED");
}

// ─── The closing hook ────────────────────────────────────────────────

#[tokio::test]
async fn closing_hook_is_idempotent_and_ignores_future_deadlines() {
    let app = test_app();

    // One opportunity with a future deadline stays untouched.
    let future = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &future).await;

    // One with an elapsed deadline closes exactly once.
    let due = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &due).await;
    submit_proposal(&app, VENDOR1, &due).await;
    let oid = OpportunityId::from_uuid(uuid::Uuid::parse_str(&due).unwrap());
    let past = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
    app.state
        .store
        .with_opportunity_mut(&oid, |o| o.fields.proposal_deadline = past)
        .unwrap();

    let (_, value) = request(&app, "GET", "/status", None, None).await;
    assert_eq!(value["closing"]["ran"], json!(true));
    assert_eq!(value["closing"]["closed"], json!(1));

    let (_, value) = request(&app, "GET", "/status", None, None).await;
    assert_eq!(value["closing"]["ran"], json!(true));
    assert_eq!(value["closing"]["closed"], json!(0));

    assert_eq!(opportunity_status(&app, &due).await, "EVALUATION");
    assert_eq!(opportunity_status(&app, &future).await, "PUBLISHED");

    // Submitted proposals moved under review with the close.
    let (_, proposals) = request(
        &app,
        "GET",
        &format!("{PROPOSALS}?opportunity={due}"),
        Some(GOV),
        None,
    )
    .await;
    assert_eq!(proposals[0]["status"], "UNDER_REVIEW");
}

#[tokio::test]
async fn closing_hook_polls_are_throttled() {
    let app = test_app_with_interval(Duration::from_secs(60));

    let (_, value) = request(&app, "GET", "/status", None, None).await;
    assert_eq!(value["closing"]["ran"], json!(true));

    // Inside the window the poll coalesces into a no-op.
    let (_, value) = request(&app, "GET", "/status", None, None).await;
    assert_eq!(value["closing"]["ran"], json!(false));
}

#[tokio::test]
async fn draft_with_past_deadline_publishes_then_closes() {
    // The end-to-end path: a draft whose deadline already elapsed is
    // repaired, published, and swept into evaluation by the hook.
    let app = test_app();

    let mut body = valid_opportunity();
    body["proposalDeadline"] = json!("2020-01-01");
    let id = create_opportunity(&app, body).await;

    let mut repair = valid_opportunity();
    repair["proposalDeadline"] = json!("2020-01-01");
    repair.as_object_mut().unwrap().remove("status");
    let (status, _) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{id}"),
        Some(GOV),
        Some(json!({"tag": "edit", "value": repair})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, value) = publish(&app, &id).await;
    assert_eq!(status, StatusCode::OK, "{value}");
    assert_eq!(value["status"], "PUBLISHED");

    let (_, value) = request(&app, "GET", "/status", None, None).await;
    assert_eq!(value["closing"]["closed"], json!(1));
    assert_eq!(opportunity_status(&app, &id).await, "EVALUATION");
}

// ─── Users ───────────────────────────────────────────────────────────

#[tokio::test]
async fn user_listing_is_admin_only() {
    let app = test_app();
    let (status, _) = request(&app, "GET", "/api/users", Some(VENDOR1), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, value) = request(&app, "GET", "/api/users", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn reactivation_is_admin_only() {
    let app = test_app();
    let vendor_id = app
        .state
        .store
        .list_users()
        .iter()
        .find(|u| u.name == VENDOR1)
        .unwrap()
        .id
        .0
        .to_string();

    let deactivate = json!({"tag": "deactivate", "value": "leaving"});
    let (status, value) = request(
        &app,
        "PUT",
        &format!("/api/users/{vendor_id}"),
        Some(VENDOR1),
        Some(deactivate),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["active"], json!(false));

    // A deactivated account cannot resurrect itself.
    let reactivate = json!({"tag": "reactivate", "value": "back"});
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{vendor_id}"),
        Some(VENDOR1),
        Some(reactivate.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, value) = request(
        &app,
        "PUT",
        &format!("/api/users/{vendor_id}"),
        Some(ADMIN),
        Some(reactivate),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["active"], json!(true));
}

// ─── Operational surface ─────────────────────────────────────────────

#[tokio::test]
async fn health_and_openapi_respond() {
    let app = test_app();
    let (status, _) = request(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, value) = request(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(value["info"]["title"].is_string());
}

#[tokio::test]
async fn metrics_reflect_store_contents() {
    let app = test_app();
    let id = create_opportunity(&app, valid_opportunity()).await;
    publish(&app, &id).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("tender_opportunities_total"));
    assert!(text.contains("PUBLISHED"));
}

#[tokio::test]
async fn malformed_bodies_are_structured_400s() {
    let app = test_app();
    let (status, value) = request(
        &app,
        "PUT",
        &format!("{OPPORTUNITIES}/{}", uuid::Uuid::new_v4()),
        Some(GOV),
        Some(json!({"tag": "fly", "value": "away"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"]["details"]["body"].is_array());
}
