mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

use barter_types::models::{Category, Condition, ProposalStatus};

struct Market {
    app: TestApp,
    owner: TestUser,
    bob: TestUser,
    carol: TestUser,
    target: i64,
    bob_ad: i64,
    carol_ad: i64,
}

fn market() -> Market {
    let app = TestApp::new();
    let owner = app.user("owner");
    let bob = app.user("bob");
    let carol = app.user("carol");
    let target = app.ad(&owner, "Road bike", Category::Other, Condition::Used);
    let bob_ad = app.ad(&bob, "Guitar", Category::Other, Condition::Used);
    let carol_ad = app.ad(&carol, "Camera", Category::Electronics, Condition::New);
    Market {
        app,
        owner,
        bob,
        carol,
        target,
        bob_ad,
        carol_ad,
    }
}

#[tokio::test]
async fn proposal_is_created_pending() {
    let m = market();

    let response = m
        .app
        .post(
            &format!("/ads/{}/proposals", m.target),
            Some(&m.bob),
            json!({ "ad_sender": m.bob_ad, "comment": "Guitar for your bike?" }),
        )
        .await;
    let message = expect_redirect(response, &format!("/ads/{}", m.target)).await;
    assert_eq!(message, "Exchange proposal sent.");

    let sent = body_json(m.app.get("/proposals", Some(&m.bob)).await).await;
    assert_eq!(sent["sent"].as_array().unwrap().len(), 1);
    assert_eq!(sent["sent"][0]["status"], "P");
    assert_eq!(sent["sent"][0]["status_display"], "Pending");
    assert_eq!(sent["sent"][0]["comment"], "Guitar for your bike?");
    assert_eq!(sent["sent"][0]["ad_sender"]["id"], m.bob_ad);
    assert_eq!(sent["sent"][0]["ad_receiver"]["id"], m.target);

    let received = body_json(m.app.get("/proposals", Some(&m.owner)).await).await;
    assert_eq!(received["received"].as_array().unwrap().len(), 1);
    assert_eq!(received["sent"], json!([]));
}

#[tokio::test]
async fn self_proposal_is_rejected() {
    let m = market();
    let second = m.app.ad(&m.owner, "Helmet", Category::Other, Condition::New);

    let response = m
        .app
        .post(
            &format!("/ads/{}/proposals", m.target),
            Some(&m.owner),
            json!({ "ad_sender": second }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["errors"]["non_field_errors"][0]
        .as_str()
        .unwrap()
        .contains("your own ad"));

    assert!(m.app.state.db.proposals_for_ad(m.target).unwrap().is_empty());
}

#[tokio::test]
async fn offering_someone_elses_ad_is_rejected() {
    let m = market();

    let response = m
        .app
        .post(
            &format!("/ads/{}/proposals", m.target),
            Some(&m.bob),
            json!({ "ad_sender": m.carol_ad }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["errors"]["ad_sender"].is_array());
}

#[tokio::test]
async fn missing_or_unknown_sender_ad_is_rejected() {
    let m = market();
    let path = format!("/ads/{}/proposals", m.target);

    for form in [json!({ "comment": "hi" }), json!({ "ad_sender": 9999 })] {
        let response = m.app.post(&path, Some(&m.bob), form).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["errors"]["ad_sender"].is_array());
    }
}

#[tokio::test]
async fn mistyped_sender_is_a_field_error() {
    let m = market();

    let response = m
        .app
        .post(
            &format!("/ads/{}/proposals", m.target),
            Some(&m.bob),
            json!({ "ad_sender": "abc" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["errors"]["ad_sender"][0], "Enter a valid value.");
    assert!(m.app.state.db.proposals_for_ad(m.target).unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_pending_proposal_is_rejected() {
    let m = market();
    m.app.proposal(&m.bob, m.bob_ad, m.target);

    let response = m
        .app
        .post(
            &format!("/ads/{}/proposals", m.target),
            Some(&m.bob),
            json!({ "ad_sender": m.bob_ad }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(m.app.state.db.proposals_for_ad(m.target).unwrap().len(), 1);
}

#[tokio::test]
async fn proposal_for_missing_ad_redirects_to_listing() {
    let m = market();

    let response = m
        .app
        .post("/ads/777/proposals", Some(&m.bob), json!({ "ad_sender": m.bob_ad }))
        .await;
    let message = expect_redirect(response, "/").await;
    assert_eq!(message, "Ad not found.");
}

#[tokio::test]
async fn accepting_rejects_competing_proposals() {
    let m = market();
    let dave = m.app.user("dave");
    let dave_ad = m.app.ad(&dave, "Kayak", Category::Other, Condition::Used);
    let other_target = m.app.ad(&m.owner, "Tent", Category::Other, Condition::Used);

    let winner = m.app.proposal(&m.bob, m.bob_ad, m.target);
    let loser_one = m.app.proposal(&m.carol, m.carol_ad, m.target);
    let loser_two = m.app.proposal(&dave, dave_ad, m.target);
    let unrelated = m.app.proposal(&m.carol, m.carol_ad, other_target);

    let response = m
        .app
        .post(
            &format!("/proposals/{winner}/status"),
            Some(&m.owner),
            json!({ "status": "A" }),
        )
        .await;
    let message = expect_redirect(response, "/proposals").await;
    assert!(message.contains("2 other pending proposals were rejected"));

    assert_eq!(m.app.status_of(winner), Some(ProposalStatus::Accepted));
    assert_eq!(m.app.status_of(loser_one), Some(ProposalStatus::Rejected));
    assert_eq!(m.app.status_of(loser_two), Some(ProposalStatus::Rejected));
    assert_eq!(m.app.status_of(unrelated), Some(ProposalStatus::Pending));
}

#[tokio::test]
async fn rejecting_touches_only_that_proposal() {
    let m = market();
    let first = m.app.proposal(&m.bob, m.bob_ad, m.target);
    let second = m.app.proposal(&m.carol, m.carol_ad, m.target);

    let response = m
        .app
        .post(
            &format!("/proposals/{first}/status"),
            Some(&m.owner),
            json!({ "status": "rejected" }),
        )
        .await;
    let message = expect_redirect(response, "/proposals").await;
    assert_eq!(message, "Proposal rejected.");

    assert_eq!(m.app.status_of(first), Some(ProposalStatus::Rejected));
    assert_eq!(m.app.status_of(second), Some(ProposalStatus::Pending));
}

#[tokio::test]
async fn only_receiver_can_respond() {
    let m = market();
    let id = m.app.proposal(&m.bob, m.bob_ad, m.target);

    for intruder in [&m.bob, &m.carol] {
        let response = m
            .app
            .post(
                &format!("/proposals/{id}/status"),
                Some(intruder),
                json!({ "status": "A" }),
            )
            .await;
        let message = expect_redirect(response, &format!("/proposals/{id}")).await;
        assert!(message.contains("no rights"));
    }

    assert_eq!(m.app.status_of(id), Some(ProposalStatus::Pending));
}

#[tokio::test]
async fn processed_proposal_cannot_change_again() {
    let m = market();
    let id = m.app.proposal(&m.bob, m.bob_ad, m.target);
    m.app
        .state
        .db
        .respond_to_proposal(id, ProposalStatus::Rejected)
        .unwrap();

    let response = m
        .app
        .post(
            &format!("/proposals/{id}/status"),
            Some(&m.owner),
            json!({ "status": "A" }),
        )
        .await;
    let message = expect_redirect(response, &format!("/proposals/{id}")).await;
    assert_eq!(message, "This proposal has already been processed.");
    assert_eq!(m.app.status_of(id), Some(ProposalStatus::Rejected));
}

#[tokio::test]
async fn pending_is_not_a_valid_response() {
    let m = market();
    let id = m.app.proposal(&m.bob, m.bob_ad, m.target);

    let response = m
        .app
        .post(
            &format!("/proposals/{id}/status"),
            Some(&m.owner),
            json!({ "status": "P" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn detail_is_private_to_both_parties() {
    let m = market();
    let id = m.app.proposal(&m.bob, m.bob_ad, m.target);

    let receiver = body_json(m.app.get(&format!("/proposals/{id}"), Some(&m.owner)).await).await;
    assert_eq!(receiver["can_respond"], true);
    assert_eq!(receiver["can_delete"], false);

    let sender = body_json(m.app.get(&format!("/proposals/{id}"), Some(&m.bob)).await).await;
    assert_eq!(sender["can_respond"], false);
    assert_eq!(sender["can_delete"], true);

    let message =
        expect_redirect(m.app.get(&format!("/proposals/{id}"), Some(&m.carol)).await, "/proposals").await;
    assert!(message.contains("no rights"));

    let message = expect_redirect(m.app.get("/proposals/4242", Some(&m.bob)).await, "/proposals").await;
    assert_eq!(message, "Proposal not found.");
}

#[tokio::test]
async fn list_filters_by_status() {
    let m = market();
    let accepted = m.app.proposal(&m.bob, m.bob_ad, m.target);
    m.app.proposal(&m.carol, m.carol_ad, m.target);
    m.app
        .state
        .db
        .respond_to_proposal(accepted, ProposalStatus::Accepted)
        .unwrap();

    let page = body_json(m.app.get("/proposals?status=A", Some(&m.owner)).await).await;
    assert_eq!(page["status"], "A");
    let received = page["received"].as_array().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["id"], accepted);

    let page = body_json(m.app.get("/proposals", Some(&m.owner)).await).await;
    assert_eq!(page["received"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn sender_deletes_after_confirmation() {
    let m = market();
    let id = m.app.proposal(&m.bob, m.bob_ad, m.target);

    let confirm = m.app.get(&format!("/proposals/{id}/delete"), Some(&m.bob)).await;
    assert_eq!(confirm.status(), StatusCode::OK);
    assert_eq!(body_json(confirm).await["id"], id);
    assert!(m.app.status_of(id).is_some());

    let response = m
        .app
        .post(&format!("/proposals/{id}/delete"), Some(&m.bob), json!({}))
        .await;
    let message = expect_redirect(response, "/proposals").await;
    assert_eq!(message, "Proposal deleted.");
    assert!(m.app.status_of(id).is_none());
}

#[tokio::test]
async fn only_sender_can_delete() {
    let m = market();
    let id = m.app.proposal(&m.bob, m.bob_ad, m.target);

    for intruder in [&m.owner, &m.carol] {
        let response = m
            .app
            .post(&format!("/proposals/{id}/delete"), Some(intruder), json!({}))
            .await;
        let message = expect_redirect(response, &format!("/proposals/{id}")).await;
        assert!(message.contains("no rights"));
    }
    assert!(m.app.status_of(id).is_some());
}

#[tokio::test]
async fn answered_proposal_cannot_be_deleted() {
    let m = market();
    let id = m.app.proposal(&m.bob, m.bob_ad, m.target);
    m.app
        .state
        .db
        .respond_to_proposal(id, ProposalStatus::Accepted)
        .unwrap();

    let response = m
        .app
        .post(&format!("/proposals/{id}/delete"), Some(&m.bob), json!({}))
        .await;
    expect_redirect(response, &format!("/proposals/{id}")).await;
    assert_eq!(m.app.status_of(id), Some(ProposalStatus::Accepted));
}
