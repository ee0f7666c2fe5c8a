//! Test utilities for the cluster state controller
//!
//! In-process stand-ins for the API server, so orchestration and watch loops
//! run against a real `kube::Client` without a cluster.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::service_fn;

/// A client whose requests never complete.
pub fn unresponsive_client() -> Client {
    let service = service_fn(|_req: Request<Body>| async {
        std::future::pending::<Result<Response<Body>, Infallible>>().await
    });
    Client::new(service, "default")
}

/// A client that answers every list request with `list` and leaves watch
/// requests hanging. The counter tracks how many lists were served.
pub fn listing_client(list: &serde_json::Value) -> (Client, Arc<AtomicUsize>) {
    let lists = Arc::new(AtomicUsize::new(0));
    let served = Arc::clone(&lists);
    let body = Arc::new(list.to_string());

    let service = service_fn(move |req: Request<Body>| {
        let served = Arc::clone(&served);
        let body = Arc::clone(&body);
        async move {
            let is_watch = req
                .uri()
                .query()
                .is_some_and(|query| query.contains("watch=true"));
            if is_watch {
                std::future::pending::<()>().await;
            }
            served.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(Response::new(Body::from(body.as_bytes().to_vec())))
        }
    });
    (Client::new(service, "default"), lists)
}
