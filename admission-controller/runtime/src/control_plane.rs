use anyhow::{bail, Result};
use lb_admission_core::{
    Collection, CollectionQuery, ControlPlane, ControlPlaneError, Label, ObjectQuery, ObjectRef,
};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::{sync::Arc, time::Duration};

/// A fixed set of control plane connections.
///
/// Reference checks always use the last connection so that their caching
/// and rate limits stay aligned with the other subsystems sharing the pool.
#[derive(Clone)]
pub struct ClientPool {
    clients: Vec<Arc<dyn ControlPlane>>,
}

/// A control plane client speaking the REST API over HTTP.
#[derive(Clone, Debug)]
pub struct HttpControlPlane {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

// === impl ClientPool ===

impl ClientPool {
    pub fn new(clients: Vec<Arc<dyn ControlPlane>>) -> Result<Self> {
        if clients.is_empty() {
            bail!("at least one control plane client is required");
        }
        Ok(Self { clients })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn ControlPlane>> {
        self.clients.get(index)
    }

    /// The connection reserved for reference checks.
    pub fn reference_client(&self) -> &Arc<dyn ControlPlane> {
        &self.clients[self.clients.len() - 1]
    }
}

impl std::fmt::Debug for ClientPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPool")
            .field("clients", &self.clients.len())
            .finish()
    }
}

// === impl HttpControlPlane ===

impl HttpControlPlane {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<(String, String)>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, uri: &str) -> String {
        format!("{}{uri}", self.base_url)
    }

    fn request(&self, method: Method, uri: &str) -> reqwest::RequestBuilder {
        let req = self.http.request(method, self.url(uri));
        match &self.credentials {
            Some((user, password)) => req.basic_auth(user, Some(password)),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ControlPlaneError> {
        let rsp = req
            .send()
            .await
            .map_err(|e| ControlPlaneError::Transport(e.to_string()))?;
        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(ControlPlaneError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(rsp)
    }
}

#[async_trait::async_trait]
impl ControlPlane for HttpControlPlane {
    async fn get_collection(
        &self,
        query: &CollectionQuery,
    ) -> Result<Collection, ControlPlaneError> {
        let rsp = self.send(self.request(Method::GET, &query.uri())).await?;
        rsp.json::<Collection>()
            .await
            .map_err(|e| ControlPlaneError::Decode(e.to_string()))
    }

    async fn get(&self, query: &ObjectQuery) -> Result<Option<Value>, ControlPlaneError> {
        match self.send(self.request(Method::GET, &query.uri())).await {
            Ok(rsp) => {
                let value = rsp
                    .json::<Value>()
                    .await
                    .map_err(|e| ControlPlaneError::Decode(e.to_string()))?;
                Ok(Some(value).filter(|v| !v.is_null()))
            }
            Err(ControlPlaneError::Status { code, .. }) if code == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn update_labels(
        &self,
        object: &ObjectRef,
        labels: &[Label],
    ) -> Result<(), ControlPlaneError> {
        let uri = object.uri()?;
        let body = serde_json::json!({ "replace": { "labels": labels } });
        self.send(self.request(Method::PATCH, &uri).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control_plane() -> HttpControlPlane {
        HttpControlPlane::new("https://controller.example.com/", None, Duration::from_secs(1))
            .expect("client must build")
    }

    #[test]
    fn reference_names_are_matched_literally() {
        let cp = control_plane();
        let query = CollectionQuery::by_name("sslprofile", "prof#1");
        let url = reqwest::Url::parse(&cp.url(&query.uri())).expect("valid url");
        assert_eq!(url.path(), "/api/sslprofile");
        assert_eq!(url.fragment(), None);
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "prof#1".to_string()),
                ("fields".to_string(), "name,type,labels,created_by".to_string()),
            ]
        );

        let query = CollectionQuery::by_name("wafpolicy", "a&name=b+c");
        let url = reqwest::Url::parse(&cp.url(&query.uri())).expect("valid url");
        let names = url
            .query_pairs()
            .filter(|(k, _)| k == "name")
            .map(|(_, v)| v.into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a&name=b+c"]);
    }

    #[test]
    fn network_names_stay_in_one_path_segment() {
        let cp = control_plane();
        let query = ObjectQuery::new("network", "subnet/1?x").with_param("cloud_uuid", "cloud-1");
        let url = reqwest::Url::parse(&cp.url(&query.uri())).expect("valid url");
        assert_eq!(url.path(), "/api/network/subnet%2F1%3Fx");
        assert_eq!(
            url.query_pairs().into_owned().collect::<Vec<_>>(),
            vec![("cloud_uuid".to_string(), "cloud-1".to_string())]
        );
    }

    #[test]
    fn pool_requires_a_client() {
        assert!(ClientPool::new(vec![]).is_err());
        let pool = ClientPool::new(vec![Arc::new(control_plane()) as Arc<dyn ControlPlane>])
            .expect("pool must build");
        assert_eq!(pool.len(), 1);
    }
}
