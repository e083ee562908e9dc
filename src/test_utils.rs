// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory Kubernetes API server speaking just enough
//! of the REST protocol for the applier and the reconcilers.

use bytes::Bytes;
use http::{Method, Request, Response};
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

#[derive(Default)]
struct FakeState {
    objects: BTreeMap<String, Value>,
    collections: BTreeSet<String>,
    failures: Vec<(String, String, u16)>,
    requests: Vec<(String, String)>,
    ready_deployments: bool,
    resource_version: u64,
}

/// A stateful fake API server. Objects are stored under their full REST path.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object at the given path
    pub fn with_object(self, path: &str, object: Value) -> Self {
        self.set_object(path, object);
        self
    }

    /// Register one node per kubelet version, listable at /api/v1/nodes
    pub fn with_nodes(self, kubelet_versions: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.collections.insert("/api/v1/nodes".to_string());
            for (i, version) in kubelet_versions.iter().enumerate() {
                let name = format!("node-{}", i);
                state.objects.insert(
                    format!("/api/v1/nodes/{}", name),
                    json!({
                        "apiVersion": "v1",
                        "kind": "Node",
                        "metadata": { "name": name },
                        "status": { "nodeInfo": node_info(version) }
                    }),
                );
            }
        }
        self
    }

    /// Report every written Deployment as fully rolled out
    pub fn with_ready_deployments(self) -> Self {
        self.state.lock().unwrap().ready_deployments = true;
        self
    }

    /// Answer requests of `method` whose path starts with `prefix` with an error status
    pub fn fail(&self, method: &str, prefix: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((method.to_string(), prefix.to_string(), status));
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn object(&self, path: &str) -> Option<Value> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    pub fn set_object(&self, path: &str, object: Value) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(path.to_string(), object);
    }

    /// All requests received so far as (method, path)
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests of `method` whose path starts with `prefix`
    pub fn count(&self, method: &str, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, p)| m == method && p.starts_with(prefix))
            .count()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    /// Build a kube Client backed by this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "https://kubernetes.default.svc")
    }

    fn handle(&self, method: &Method, path: &str, body: &[u8]) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();
        state.requests.push((method.to_string(), path.to_string()));

        if let Some((_, _, status)) = state
            .failures
            .iter()
            .find(|(m, p, _)| m == method.as_str() && path.starts_with(p.as_str()))
        {
            let status = *status;
            return (status, status_json(status, "injected failure"));
        }

        let payload: Option<Value> = serde_json::from_slice(body).ok();

        match *method {
            Method::GET => {
                if let Some(object) = state.objects.get(path) {
                    return (200, object.clone());
                }
                if state.collections.contains(path) {
                    let prefix = format!("{}/", path);
                    let items: Vec<Value> = state
                        .objects
                        .iter()
                        .filter(|(p, _)| p.starts_with(&prefix) && !p[prefix.len()..].contains('/'))
                        .map(|(_, o)| o.clone())
                        .collect();
                    return (
                        200,
                        json!({ "apiVersion": "v1", "kind": "List", "metadata": {}, "items": items }),
                    );
                }
                (404, status_json(404, "not found"))
            }
            Method::POST => {
                let Some(mut object) = payload else {
                    return (400, status_json(400, "invalid body"));
                };
                let name = object["metadata"]["name"].as_str().unwrap_or_default().to_string();
                let object_path = format!("{}/{}", path, name);
                if state.objects.contains_key(&object_path) {
                    return (409, status_json(409, "already exists"));
                }
                state.resource_version += 1;
                object["metadata"]["uid"] = json!(format!("uid-{}", name));
                object["metadata"]["resourceVersion"] = json!(state.resource_version.to_string());
                strip_status(&mut object, None, state.ready_deployments, path);
                state.objects.insert(object_path, object.clone());
                (201, object)
            }
            Method::PUT => {
                let Some(mut object) = payload else {
                    return (400, status_json(400, "invalid body"));
                };
                let Some(existing) = state.objects.get(path).cloned() else {
                    return (404, status_json(404, "not found"));
                };
                state.resource_version += 1;
                object["metadata"]["uid"] = existing["metadata"]["uid"].clone();
                object["metadata"]["resourceVersion"] = json!(state.resource_version.to_string());
                strip_status(&mut object, existing.get("status"), state.ready_deployments, path);
                state.objects.insert(path.to_string(), object.clone());
                (200, object)
            }
            Method::PATCH => {
                let (object_path, status_only) = match path.strip_suffix("/status") {
                    Some(p) => (p.to_string(), true),
                    None => (path.to_string(), false),
                };
                let Some(patch) = payload else {
                    return (400, status_json(400, "invalid body"));
                };
                let Some(object) = state.objects.get_mut(&object_path) else {
                    return (404, status_json(404, "not found"));
                };
                if status_only {
                    merge(&mut object["status"], &patch["status"]);
                } else {
                    merge(object, &patch);
                }
                let object = object.clone();
                (200, object)
            }
            Method::DELETE => match state.objects.remove(path) {
                Some(_) => (
                    200,
                    json!({ "kind": "Status", "apiVersion": "v1", "status": "Success", "metadata": {} }),
                ),
                None => (404, status_json(404, "not found")),
            },
            _ => (405, status_json(405, "method not allowed")),
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        Box::pin(async move {
            let body: Bytes = req.into_body().collect_bytes().await?;
            let (status, payload) = server.handle(&method, &path, &body);
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&payload)?))
                .unwrap())
        })
    }
}

fn node_info(kubelet_version: &str) -> Value {
    json!({
        "architecture": "amd64",
        "bootID": "",
        "containerRuntimeVersion": "containerd://1.7.0",
        "kernelVersion": "6.1.0",
        "kubeProxyVersion": kubelet_version,
        "kubeletVersion": kubelet_version,
        "machineID": "",
        "operatingSystem": "linux",
        "osImage": "Linux",
        "systemUUID": ""
    })
}

/// API servers ignore status on writes; deployments optionally report ready replicas
fn strip_status(object: &mut Value, previous: Option<&Value>, ready: bool, path: &str) {
    let Some(map) = object.as_object_mut() else {
        return;
    };
    map.remove("status");
    if ready && path.contains("/deployments") {
        let replicas = map
            .get("spec")
            .and_then(|s| s.get("replicas"))
            .cloned()
            .unwrap_or(json!(1));
        map.insert(
            "status".to_string(),
            json!({ "replicas": replicas, "readyReplicas": replicas }),
        );
    } else if let Some(previous) = previous {
        map.insert("status".to_string(), previous.clone());
    }
}

fn merge(target: &mut Value, patch: &Value) {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(target), Some(patch)) => {
            for (key, value) in patch {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        _ => *target = patch.clone(),
    }
}

/// Build a Status failure body
pub fn status_json(code: u16, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": if code == 404 { "NotFound" } else { "InternalError" },
        "code": code
    })
}
