//! Behaviour tests for the API client against mock HTTP servers.
//!
//! Uses recording notifier/navigator doubles to observe side effects.

#[cfg(test)]
mod client_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use mockito::Matcher;
    use serde_json::{json, Value};

    use crate::api::account;
    use crate::api::types::LoginRequest;
    use crate::api::{ApiClient, ErrorKind};
    use crate::config::{ClientConfig, CredentialPlacement};
    use crate::navigate::{ConsoleNavigator, Navigator, ROOT_PATH};
    use crate::notify::{Notifier, Toast, ToastKind};
    use crate::session::{
        FileStore, MemoryStore, Session, SessionStatus, SessionStore, TOKEN_KEY, USER_KEY,
    };

    // ── Doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingNotifier {
        toasts: Mutex<Vec<Toast>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.toasts
                .lock()
                .unwrap()
                .iter()
                .map(|t| t.message.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, toast: &Toast) {
            self.toasts.lock().unwrap().push(toast.clone());
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        calls: AtomicUsize,
        rearms: AtomicUsize,
        target: Mutex<Option<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect_to_root(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.target.lock().unwrap() = Some(ROOT_PATH.to_string());
        }

        fn rearm(&self) {
            self.rearms.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        client: Arc<ApiClient>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness_with(config: ClientConfig, store: MemoryStore) -> Harness {
        let store = Arc::new(store);
        let session = Arc::new(Session::new(store.clone()));
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let client = ApiClient::new(&config, session, notifier.clone(), navigator.clone()).unwrap();
        Harness {
            client: Arc::new(client),
            store,
            notifier,
            navigator,
        }
    }

    fn harness(base: &str, store: MemoryStore) -> Harness {
        harness_with(ClientConfig::new(base), store)
    }

    /// Base URL of a port nothing listens on.
    fn dead_address() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }

    /// Base URL of a listener that accepts connections and never answers.
    async fn silent_address() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}/", addr)
    }

    // ── Auth header injection ────────────────────────────────────────────

    #[tokio::test]
    async fn test_credential_attached_when_present() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/user/get")
            .match_header("access-token", "tok-abc")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::with_credential("tok-abc"));
        let body = h.client.get("/user/get").await.unwrap();

        assert_eq!(body, json!({"ok": true}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_credential_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/user/login")
            .match_header("access-token", Matcher::Missing)
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"token":"t"}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::new());
        h.client
            .post("user/login", &json!({"email": "a@b.c", "password": "x"}))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_credential_read_fresh_each_request() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/screens")
            .match_header("access-token", "old")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let second = server
            .mock("GET", "/screens")
            .match_header("access-token", "new")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::with_credential("old"));
        h.client.get("screens").await.unwrap();
        h.store.set(TOKEN_KEY, "new").unwrap();
        h.client.get("screens").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_bearer_placement() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/playlists")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let config = ClientConfig {
            credential_placement: CredentialPlacement::Bearer,
            ..ClientConfig::new(&server.url())
        };
        let h = harness_with(config, MemoryStore::with_credential("tok"));
        h.client.get("playlists").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_file_store_credential_injected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/user/get")
            .match_header("access-token", "from-disk")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().join("session.json")));
        store.set(TOKEN_KEY, "from-disk").unwrap();
        let session = Arc::new(Session::new(store.clone()));
        let client = ApiClient::new(
            &ClientConfig::new(&server.url()),
            session,
            Arc::new(RecordingNotifier::default()),
            Arc::new(RecordingNavigator::default()),
        )
        .unwrap();

        client.get("user/get").await.unwrap();
        mock.assert_async().await;
    }

    // ── Envelope unwrapping ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_body_returned_unchanged() {
        let mut server = mockito::Server::new_async().await;
        let payload = json!({"data": {"screens": [{"id": 1, "name": "Lobby"}]}, "status": true});
        let _mock = server
            .mock("GET", "/screens")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-request-id", "abc")
            .with_body(payload.to_string())
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::new());
        assert_eq!(h.client.get("screens").await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/screens/9")
            .with_status(204)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::new());
        assert_eq!(h.client.delete("screens/9", &()).await.unwrap(), Value::Null);
    }

    // ── Session expiry ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_session_expired_clears_and_redirects() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user/get")
            .with_status(440)
            .with_body(r#"{"message":"Session expired"}"#)
            .create_async()
            .await;

        let store = MemoryStore::with_credential("tok");
        store.set(USER_KEY, r#"{"id":1}"#).unwrap();
        let h = harness(&server.url(), store);
        assert_eq!(h.client.session().status(), SessionStatus::Authenticated);

        let err = h.client.get("user/get").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::SessionExpired);
        assert_eq!(err.status, Some(440));
        assert!(h.store.is_empty());
        assert_eq!(h.client.session().status(), SessionStatus::Anonymous);
        assert_eq!(h.navigator.target.lock().unwrap().as_deref(), Some("/"));
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 1);
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_session_expiry_same_end_state() {
        const N: usize = 6;
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/media")
            .with_status(440)
            .expect(N)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::with_credential("tok"));
        let mut handles = Vec::new();
        for _ in 0..N {
            let client = h.client.clone();
            handles.push(tokio::spawn(async move { client.get("media").await }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err.kind, ErrorKind::SessionExpired);
        }

        mock.assert_async().await;
        assert!(h.store.is_empty());
        assert_eq!(h.client.session().status(), SessionStatus::Anonymous);
        assert_eq!(h.navigator.target.lock().unwrap().as_deref(), Some("/"));
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), N);
    }

    #[tokio::test]
    async fn test_custom_session_expired_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user/get")
            .with_status(419)
            .create_async()
            .await;

        let config = ClientConfig {
            session_expired_status: 419,
            ..ClientConfig::new(&server.url())
        };
        let h = harness_with(config, MemoryStore::with_credential("tok"));
        let err = h.client.get("user/get").await.unwrap_err();
        assert!(err.is_session_expired());
        assert!(h.store.is_empty());
    }

    // ── Network-error debounce ───────────────────────────────────────────

    #[tokio::test]
    async fn test_network_failure_is_rejected_not_falsy() {
        let h = harness(&dead_address(), MemoryStore::new());
        let err = h.client.get("screens").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.status, None);
        assert_eq!(h.notifier.messages(), vec!["No internet connection"]);
    }

    #[tokio::test]
    async fn test_timeout_is_network_failure() {
        let config = ClientConfig {
            timeout: Duration::from_millis(300),
            ..ClientConfig::new(&silent_address().await)
        };
        let h = harness_with(config, MemoryStore::with_credential("tok"));

        let err = h.client.get("screens").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.status, None);
        assert_eq!(h.notifier.messages(), vec!["No internet connection"]);
        // A slow backend is not an expired session
        assert_eq!(h.client.session().status(), SessionStatus::Authenticated);
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_network_burst_yields_one_toast_per_window() {
        let config = ClientConfig::new(&dead_address()).with_cooldown(Duration::from_millis(1500));
        let h = harness_with(config, MemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..8 {
            let client = h.client.clone();
            handles.push(tokio::spawn(async move {
                client.post("playlists", &json!({"n": i})).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap_err().is_network());
        }
        assert_eq!(h.notifier.messages().len(), 1);

        // Still inside the window
        assert!(h.client.get("screens").await.unwrap_err().is_network());
        assert_eq!(h.notifier.messages().len(), 1);

        tokio::time::sleep(Duration::from_millis(1700)).await;

        assert!(h.client.get("screens").await.unwrap_err().is_network());
        let toasts = h.notifier.toasts.lock().unwrap().clone();
        assert_eq!(toasts.len(), 2);
        assert!(toasts.iter().all(|t| t.kind == ToastKind::Error));
    }

    #[tokio::test]
    async fn test_clients_do_not_share_suppression() {
        let address = dead_address();
        let a = harness(&address, MemoryStore::new());
        let b = harness(&address, MemoryStore::new());

        a.client.get("x").await.unwrap_err();
        b.client.get("x").await.unwrap_err();

        assert_eq!(a.notifier.messages().len(), 1);
        assert_eq!(b.notifier.messages().len(), 1);
    }

    // ── Client and server errors ─────────────────────────────────────────

    #[tokio::test]
    async fn test_client_error_message_passthrough() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/user/login")
            .with_status(400)
            .with_body(r#"{"message":"Invalid email"}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::new());
        let err = h
            .client
            .post("user/login", &json!({"email": "nope"}))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::ClientError);
        assert_eq!(err.message, "Invalid email");
        assert_eq!(err.body, Some(json!({"message": "Invalid email"})));
        assert_eq!(h.notifier.messages(), vec!["Invalid email"]);
        assert_eq!(h.navigator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_is_client_error_without_logout() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/roles")
            .with_status(401)
            .with_body(r#"{"message":"Not allowed"}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::with_credential("tok"));
        let err = h.client.get("roles").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ClientError);
        assert_eq!(h.notifier.messages(), vec!["Not allowed"]);
        assert!(!h.store.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_silent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/playback-logs")
            .with_status(500)
            .with_body(r#"{"message":"boom"}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::with_credential("tok"));
        let err = h.client.get("playback-logs").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.status, Some(500));
        assert_eq!(err.message, "boom");
        assert!(h.notifier.messages().is_empty());
        assert!(!h.store.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/groups/404")
            .with_status(404)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::new());
        let err = h.client.get("groups/404").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.message, "Not Found");
        assert!(h.notifier.messages().is_empty());
    }

    // ── Verb coverage ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_every_verb_round_trips() {
        let mut server = mockito::Server::new_async().await;
        let payload = json!({"name": "Lobby screen", "orientation": "landscape", "tags": ["a", "b"]});

        let get = server
            .mock("GET", "/screens/1")
            .with_status(200)
            .with_body(r#"{"received":true}"#)
            .create_async()
            .await;
        let mut echoes = Vec::new();
        for method in ["POST", "PUT", "PATCH", "DELETE"] {
            echoes.push(
                server
                    .mock(method, "/screens/1")
                    .match_header("content-type", "application/json")
                    .match_body(Matcher::Json(payload.clone()))
                    .with_status(200)
                    .with_body(payload.to_string())
                    .create_async()
                    .await,
            );
        }

        let h = harness(&server.url(), MemoryStore::with_credential("tok"));
        assert_eq!(h.client.get("screens/1").await.unwrap(), json!({"received": true}));
        assert_eq!(h.client.post("screens/1", &payload).await.unwrap(), payload);
        assert_eq!(h.client.put("screens/1", &payload).await.unwrap(), payload);
        assert_eq!(h.client.patch("screens/1", &payload).await.unwrap(), payload);
        assert_eq!(h.client.delete("screens/1", &payload).await.unwrap(), payload);

        get.assert_async().await;
        for mock in echoes {
            mock.assert_async().await;
        }
    }

    // ── Account endpoints ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_login_and_store_persists_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/user/login")
            .match_body(Matcher::Json(json!({"email": "ops@example.com", "password": "pw"})))
            .with_status(200)
            .with_body(r#"{"data":{"token":"fresh","user":{"email":"ops@example.com"}}}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::new());
        let request = LoginRequest {
            email: "ops@example.com".into(),
            password: "pw".into(),
        };
        let response = account::login_and_store(&h.client, &request).await.unwrap();

        assert_eq!(response.access_token, "fresh");
        assert_eq!(h.navigator.rearms.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
        assert_eq!(h.client.session().status(), SessionStatus::Authenticated);
        assert_eq!(
            h.client.session().current_user(),
            Some(json!({"email": "ops@example.com"}))
        );
    }

    #[tokio::test]
    async fn test_login_rearms_redirect_after_expiry() {
        let mut server = mockito::Server::new_async().await;
        let _expired = server
            .mock("GET", "/screens")
            .with_status(440)
            .create_async()
            .await;
        let _login = server
            .mock("POST", "/user/login")
            .with_status(200)
            .with_body(r#"{"token":"again"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::with_credential("stale"));
        let session = Arc::new(Session::new(store.clone()));
        let navigator = Arc::new(ConsoleNavigator::new());
        let client = ApiClient::new(
            &ClientConfig::new(&server.url()),
            session,
            Arc::new(RecordingNotifier::default()),
            navigator.clone(),
        )
        .unwrap();

        assert!(client.get("screens").await.unwrap_err().is_session_expired());
        assert!(navigator.has_redirected());

        let request = LoginRequest {
            email: "ops@example.com".into(),
            password: "pw".into(),
        };
        account::login_and_store(&client, &request).await.unwrap();
        assert!(!navigator.has_redirected());
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("again"));

        // The next expiry redirects again
        assert!(client.get("screens").await.unwrap_err().is_session_expired());
        assert!(navigator.has_redirected());
    }

    #[tokio::test]
    async fn test_login_failure_leaves_session_anonymous() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/user/login")
            .with_status(401)
            .with_body(r#"{"message":"Wrong password"}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::new());
        let request = LoginRequest {
            email: "ops@example.com".into(),
            password: "bad".into(),
        };
        let err = account::login_and_store(&h.client, &request).await.unwrap_err();

        assert!(err.contains("Wrong password"));
        assert!(h.store.is_empty());
        assert_eq!(h.notifier.messages(), vec!["Wrong password"]);
    }

    #[tokio::test]
    async fn test_profile_uses_credential() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user/get")
            .match_header("access-token", "tok")
            .with_status(200)
            .with_body(r#"{"data":{"firstName":"Ada","role":"Admin"}}"#)
            .create_async()
            .await;

        let h = harness(&server.url(), MemoryStore::with_credential("tok"));
        let profile = account::get_profile(&h.client).await.unwrap();
        assert_eq!(profile["data"]["role"], "Admin");
    }
}
