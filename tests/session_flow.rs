//! End-to-end: a real listener on an ephemeral port driven by GuideClient

mod common;

use std::sync::Arc;
use std::time::Duration;

use study_guide::StudyGuideError;
use study_guide::client::GuideClient;
use study_guide::clients::ChatModel;
use study_guide::guide::{ComponentRequest, GuideSession, StudyPreferences};
use study_guide::http::build_router;
use tempfile::TempDir;

use common::{RecordingModel, test_server};

async fn spawn_server(model: Arc<dyn ChatModel>) -> (String, TempDir) {
    let (server, dir) = test_server(model);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(server)).await.unwrap();
    });
    (format!("http://{addr}"), dir)
}

fn prefs() -> StudyPreferences {
    StudyPreferences {
        subject: "Statistics".to_string(),
        current_level: "intermediate".to_string(),
        time_available: "8".to_string(),
        learning_style: "reading/writing".to_string(),
        goal: "run my own A/B tests".to_string(),
    }
}

#[tokio::test]
async fn full_session_threads_responses_in_order() {
    let model = Arc::new(RecordingModel::default());
    let (url, _dir) = spawn_server(model.clone()).await;
    let client = GuideClient::new(url, Duration::from_secs(10)).unwrap();

    let mut session = GuideSession::new(prefs(), 4);
    let mut seen = Vec::new();
    let outcome = client
        .run_session(&mut session, |card| seen.push(card.title.clone()))
        .await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.cards.len(), 4);
    assert_eq!(
        seen,
        vec![
            "Foundations",
            "Building Skills",
            "Advanced Topics",
            "Review & Next Steps"
        ]
    );

    let calls = model.calls();
    assert_eq!(calls.len(), 4);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(call.history.len(), i);
        assert_eq!(call.history, session.responses()[..i].to_vec());
    }
}

#[tokio::test]
async fn session_stops_at_first_error() {
    let model = Arc::new(RecordingModel::failing_from(1));
    let (url, _dir) = spawn_server(model.clone()).await;
    let client = GuideClient::new(url, Duration::from_secs(10)).unwrap();

    let mut session = GuideSession::new(prefs(), 3);
    let outcome = client.run_session(&mut session, |_| {}).await;

    assert!(!outcome.is_complete());
    assert_eq!(outcome.cards.len(), 1);
    assert_eq!(session.completed_steps(), 1);
    match outcome.error {
        Some(StudyGuideError::Upstream { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // No request was made after the failing step
    assert_eq!(model.calls().len(), 2);
}

#[tokio::test]
async fn explain_round_trip() {
    let model = Arc::new(RecordingModel::default());
    let (url, _dir) = spawn_server(model).await;
    let client = GuideClient::new(url, Duration::from_secs(10)).unwrap();

    let text = client
        .explain(&ComponentRequest {
            component: "p-value".to_string(),
            subject: "Statistics".to_string(),
        })
        .await
        .unwrap();
    assert!(text.contains("p-value"));

    let err = client
        .explain(&ComponentRequest {
            component: "p-value".to_string(),
            subject: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StudyGuideError::Upstream { status: 400, .. }
    ));
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GuideClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let mut session = GuideSession::new(prefs(), 2);
    let outcome = client.run_session(&mut session, |_| {}).await;
    assert!(outcome.cards.is_empty());
    assert!(matches!(outcome.error, Some(StudyGuideError::Http { .. })));
}
