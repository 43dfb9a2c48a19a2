use parking_lot::Mutex;
use prefsync_model::{PreferenceKey, PreferenceSet};
use prefsync_service::{ClientConfig, HttpPreferencesService, PreferencesService, ServiceError};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

/// Local backend: GET returns the set, PATCH merges by key unless it
/// touches `pm_reports_email`, which is rejected with a message payload.
fn spawn_backend(initial: PreferenceSet) -> (SocketAddr, Arc<Mutex<PreferenceSet>>) {
    let state = Arc::new(Mutex::new(initial));

    let get_state = state.clone();
    let get = warp::path!("api" / "notification-preferences")
        .and(warp::get())
        .map(move || warp::reply::json(&*get_state.lock()));

    let patch_state = state.clone();
    let patch = warp::path!("api" / "notification-preferences")
        .and(warp::patch())
        .and(warp::body::json())
        .map(move |partial: PreferenceSet| {
            if partial.get(PreferenceKey::PmReportsEmail).is_some() {
                return warp::reply::with_status(
                    warp::reply::json(&serde_json::json!({ "message": "email delivery is disabled" })),
                    StatusCode::UNPROCESSABLE_ENTITY,
                );
            }
            let mut set = patch_state.lock();
            set.merge(&partial);
            warp::reply::with_status(warp::reply::json(&*set), StatusCode::OK)
        });

    let (addr, server) = warp::serve(get.or(patch)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, state)
}

fn client_for(addr: SocketAddr) -> HttpPreferencesService {
    let config = ClientConfig::new().with_base_url(format!("http://{addr}/api"));
    HttpPreferencesService::new(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_returns_full_set() {
    let initial = PreferenceSet::new()
        .with(PreferenceKey::EnableTodoReminders, false)
        .with(PreferenceKey::TodoRemindersSlack, true);
    let (addr, _) = spawn_backend(initial.clone());

    let fetched = client_for(addr).fetch().await.unwrap();
    assert_eq!(fetched, initial);
}

#[tokio::test]
async fn test_write_sends_partial_and_server_merges() {
    let (addr, state) = spawn_backend(PreferenceSet::uniform(false));
    let client = client_for(addr);

    let partial = PreferenceSet::new().with(PreferenceKey::EnableBudgetAlerts, true);
    let ack = client.write(partial).await.unwrap();

    assert_eq!(ack.keys, 1);
    let server = state.lock().clone();
    assert_eq!(server.get(PreferenceKey::EnableBudgetAlerts), Some(true));
    assert_eq!(server.get(PreferenceKey::BudgetAlertsSlack), Some(false));
    assert_eq!(server.len(), PreferenceKey::ALL.len());
}

#[tokio::test]
async fn test_error_payload_message_is_surfaced() {
    let (addr, _) = spawn_backend(PreferenceSet::uniform(false));
    let client = client_for(addr);

    let err = client
        .write(PreferenceSet::new().with(PreferenceKey::PmReportsEmail, true))
        .await
        .unwrap_err();

    assert_eq!(
        err.source,
        ServiceError::Rejected {
            status: 422,
            message: "email delivery is disabled".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let err = client_for(addr).fetch().await.unwrap_err();
    assert!(matches!(err.source, ServiceError::Transport(_)));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let config = ClientConfig::new().with_base_url("localhost:8000");
    assert!(HttpPreferencesService::new(&config).is_err());
}
