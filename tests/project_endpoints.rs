mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

use common::{TestApp, id_of, project_uri, task_uri};

#[rstest]
#[tokio::test]
async fn create_project_round_trips_with_creator() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/projects",
            Some(&owner.token),
            Some(json!({
                "name": "Roadmap",
                "description": "Plans for the year",
                "created_by": owner.id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Project created successfully");
    let project = &body["project"];
    assert!(Uuid::parse_str(project["id"].as_str().unwrap()).is_ok());
    assert_eq!(project["name"], "Roadmap");
    assert_eq!(project["description"], "Plans for the year");
    assert_eq!(project["created_by_id"], owner.id.as_str());
    assert_eq!(
        project["creator"],
        json!({"id": owner.id, "name": "Owner", "email": "owner@example.com"})
    );

    let (status, fetched) = app
        .send(
            Method::GET,
            &project_uri(&id_of(project)),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&fetched["project"], project);
}

#[rstest]
#[case(json!({"description": "no name"}))]
#[case(json!({"name": "   "}))]
#[case(json!({"name": "Roadmap", "created_by": "not-a-uuid"}))]
#[tokio::test]
async fn create_project_validates_body(#[case] body: serde_json::Value) {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;

    let (status, response) = app
        .send(Method::POST, "/api/projects", Some(&owner.token), Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "VALIDATION_ERROR");
}

#[rstest]
#[tokio::test]
async fn create_project_rejects_unknown_creator() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/projects",
            Some(&owner.token),
            Some(json!({"name": "Ghost", "created_by": Uuid::now_v7().to_string()})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Provided created_by ID does not correspond to a valid user"
    );
}

#[rstest]
#[tokio::test]
async fn list_projects_only_returns_callers_projects() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let other = app.user("Other", "other@example.com").await;
    let first = app.project(&owner, "First").await;
    let second = app.project(&owner, "Second").await;
    app.project(&other, "Foreign").await;

    let (status, body) = app
        .send(Method::GET, "/api/projects", Some(&owner.token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Projects retrieved successfully");
    let ids: Vec<String> = body["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(id_of)
        .collect();
    assert_eq!(ids, vec![id_of(&first), id_of(&second)]);
}

#[rstest]
#[tokio::test]
async fn get_project_of_another_user_is_not_found() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let intruder = app.user("Intruder", "intruder@example.com").await;
    let project = app.project(&owner, "Private").await;

    let (foreign_status, foreign) = app
        .send(
            Method::GET,
            &project_uri(&id_of(&project)),
            Some(&intruder.token),
            None,
        )
        .await;
    let (missing_status, missing) = app
        .send(
            Method::GET,
            &project_uri(&Uuid::now_v7().to_string()),
            Some(&intruder.token),
            None,
        )
        .await;

    assert_eq!(foreign_status, StatusCode::NOT_FOUND);
    assert_eq!(missing_status, StatusCode::NOT_FOUND);
    assert_eq!(foreign, missing);
    assert_eq!(foreign["error"], "Project not found or you don't have access");
}

#[rstest]
#[tokio::test]
async fn malformed_project_id_is_bad_request() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;

    let (status, body) = app
        .send(
            Method::GET,
            &project_uri("not-a-uuid"),
            Some(&owner.token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid project ID format");
}

#[rstest]
#[tokio::test]
async fn update_project_patches_supplied_fields() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let project = app.project(&owner, "Draft").await;
    let uri = project_uri(&id_of(&project));

    let (status, renamed) = app
        .send(
            Method::PUT,
            &uri,
            Some(&owner.token),
            Some(json!({"name": "Final"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["message"], "Project updated successfully");
    assert_eq!(renamed["project"]["name"], "Final");
    assert_eq!(renamed["project"]["description"], project["description"]);
    assert_eq!(renamed["project"]["id"], project["id"]);
    assert_eq!(renamed["project"]["created_by_id"], owner.id.as_str());

    let (status, described) = app
        .send(
            Method::PUT,
            &uri,
            Some(&owner.token),
            Some(json!({"description": "Reviewed"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(described["project"]["name"], "Final");
    assert_eq!(described["project"]["description"], "Reviewed");
}

#[rstest]
#[case(json!({"description": ""}))]
#[case(json!({"description": "   "}))]
#[case(json!({"name": "Renamed", "description": ""}))]
#[tokio::test]
async fn update_project_with_empty_description_keeps_it(#[case] body: serde_json::Value) {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let project = app.project(&owner, "Draft").await;
    let uri = project_uri(&id_of(&project));

    let (status, updated) = app
        .send(Method::PUT, &uri, Some(&owner.token), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["project"]["description"], "Draft description");

    let (_, fetched) = app.send(Method::GET, &uri, Some(&owner.token), None).await;
    assert_eq!(fetched["project"]["description"], "Draft description");
}

#[rstest]
#[tokio::test]
async fn update_project_of_another_user_is_not_found() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let intruder = app.user("Intruder", "intruder@example.com").await;
    let project = app.project(&owner, "Private").await;
    let uri = project_uri(&id_of(&project));

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&intruder.token),
            Some(json!({"name": "Hijacked"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, unchanged) = app.send(Method::GET, &uri, Some(&owner.token), None).await;
    assert_eq!(unchanged["project"]["name"], "Private");
}

#[rstest]
#[tokio::test]
async fn malformed_update_of_another_users_project_is_not_found() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let intruder = app.user("Intruder", "intruder@example.com").await;
    let project = app.project(&owner, "Private").await;
    let uri = project_uri(&id_of(&project));

    let request = Request::builder()
        .method(Method::PUT)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", intruder.token))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send_request(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found or you don't have access");
}

#[rstest]
#[tokio::test]
async fn update_project_without_content_type_is_accepted() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let project = app.project(&owner, "Draft").await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri(project_uri(&id_of(&project)))
        .header(header::AUTHORIZATION, format!("Bearer {}", owner.token))
        .body(Body::from(json!({"name": "Final"}).to_string()))
        .unwrap();
    let (status, body) = app.send_request(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["name"], "Final");
}

#[rstest]
#[tokio::test]
async fn delete_project_cascades_to_tasks() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let project = app.project(&owner, "Doomed").await;
    let project_id = id_of(&project);
    let first = app.task(&owner, &project_id, "First").await;
    let second = app.task(&owner, &project_id, "Second").await;

    let (status, body) = app
        .send(
            Method::DELETE,
            &project_uri(&project_id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project deleted successfully");

    let (status, _) = app
        .send(
            Method::GET,
            &project_uri(&project_id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for task in [first, second] {
        let (status, _) = app
            .send(
                Method::GET,
                &task_uri(&project_id, &id_of(&task)),
                Some(&owner.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[rstest]
#[tokio::test]
async fn deleting_project_twice_is_not_found() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let project = app.project(&owner, "Once").await;
    let uri = project_uri(&id_of(&project));

    let (first, _) = app
        .send(Method::DELETE, &uri, Some(&owner.token), None)
        .await;
    let (second, _) = app
        .send(Method::DELETE, &uri, Some(&owner.token), None)
        .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn delete_project_of_another_user_is_not_found() {
    let app = TestApp::new();
    let owner = app.user("Owner", "owner@example.com").await;
    let intruder = app.user("Intruder", "intruder@example.com").await;
    let project = app.project(&owner, "Private").await;
    let uri = project_uri(&id_of(&project));

    let (status, _) = app
        .send(Method::DELETE, &uri, Some(&intruder.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::GET, &uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
}
