#[cfg(test)]
pub mod test_helpers {
    use std::path::Path;
    use std::sync::Arc;

    use axum::Router;
    use axum_test::TestServer;

    use crate::{InMemoryStore, SharedStore, create_app, init_db};

    /// Creates a seeded in-memory store and its shared handle.
    pub async fn seeded_store() -> (Arc<InMemoryStore>, SharedStore) {
        let store = Arc::new(InMemoryStore::new());
        init_db(store.as_ref()).await.unwrap();
        let shared: SharedStore = store.clone();
        (store, shared)
    }

    /// Wraps a single resource router in a test server.
    pub fn serve(router: Router) -> TestServer {
        TestServer::new(router).unwrap()
    }

    /// Creates a test server for the whole application over a seeded in-memory store.
    pub async fn app_server() -> (TestServer, Arc<InMemoryStore>) {
        let (store, shared) = seeded_store().await;
        let app = create_app(shared, Path::new("static"));
        (serve(app), store)
    }
}
