use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

/// A page of results from a name-filtered collection query.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Collection {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub results: Vec<Value>,
}

/// The fields of a control plane object consulted during admission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteObject {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

/// Names an object on the control plane.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub object_type: String,
    pub name: String,
    pub uuid: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionQuery {
    pub object_type: String,
    pub name: String,
    pub fields: Vec<&'static str>,
}

/// Addresses a single object by name, as `/api/{type}/{name}?{params}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectQuery {
    pub object_type: String,
    pub name: String,
    pub params: Vec<(&'static str, String)>,
}

#[derive(Debug, thiserror::Error)]
pub enum ControlPlaneError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{0} has no uuid")]
    MissingUuid(String),
}

/// Access to the remote load-balancing control plane.
#[async_trait::async_trait]
pub trait ControlPlane: Send + Sync {
    async fn get_collection(&self, query: &CollectionQuery)
        -> Result<Collection, ControlPlaneError>;

    /// Fetches a single object. `None` when the object does not exist.
    async fn get(&self, query: &ObjectQuery) -> Result<Option<Value>, ControlPlaneError>;

    async fn update_labels(
        &self,
        object: &ObjectRef,
        labels: &[Label],
    ) -> Result<(), ControlPlaneError>;
}

// === impl Label ===

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// === impl CollectionQuery ===

impl CollectionQuery {
    /// Fields consumed by reference resolution.
    pub const REFERENCE_FIELDS: [&'static str; 4] = ["name", "type", "labels", "created_by"];

    pub fn by_name(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            name: name.into(),
            fields: Self::REFERENCE_FIELDS.to_vec(),
        }
    }

    /// The request path and query. Names are percent-encoded so that they
    /// are matched literally by the control plane.
    pub fn uri(&self) -> String {
        let mut uri = format!(
            "/api/{}?name={}",
            encode(&self.object_type),
            encode(&self.name)
        );
        if !self.fields.is_empty() {
            uri.push_str("&fields=");
            uri.push_str(&self.fields.join(","));
        }
        uri
    }
}

// === impl ObjectQuery ===

impl ObjectQuery {
    pub fn new(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    pub fn uri(&self) -> String {
        let mut uri = format!("/api/{}/{}", encode(&self.object_type), encode(&self.name));
        for (i, (key, value)) in self.params.iter().enumerate() {
            uri.push(if i == 0 { '?' } else { '&' });
            uri.push_str(key);
            uri.push('=');
            uri.push_str(&encode(value));
        }
        uri
    }
}

// === impl ObjectRef ===

impl ObjectRef {
    pub fn new(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            name: name.into(),
            uuid: None,
        }
    }

    pub fn with_uuid(mut self, uuid: Option<String>) -> Self {
        self.uuid = uuid;
        self
    }

    /// The UUID-keyed path used to modify the object.
    pub fn uri(&self) -> Result<String, ControlPlaneError> {
        let uuid = self
            .uuid
            .as_deref()
            .ok_or_else(|| ControlPlaneError::MissingUuid(self.name.clone()))?;
        Ok(format!("/api/{}/{}", encode(&self.object_type), encode(uuid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_query_uri() {
        let query = CollectionQuery::by_name("wafpolicy", "waf-1");
        assert_eq!(
            query.uri(),
            "/api/wafpolicy?name=waf-1&fields=name,type,labels,created_by"
        );
    }

    #[test]
    fn collection_query_escapes_names() {
        let query = CollectionQuery::by_name("sslprofile", "prof#1");
        assert_eq!(
            query.uri(),
            "/api/sslprofile?name=prof%231&fields=name,type,labels,created_by"
        );

        let query = CollectionQuery::by_name("wafpolicy", "a&name=b+c");
        assert_eq!(
            query.uri(),
            "/api/wafpolicy?name=a%26name%3Db%2Bc&fields=name,type,labels,created_by"
        );
    }

    #[test]
    fn object_query_escapes_path_and_params() {
        let query = ObjectQuery::new("network", "vip/1 #a").with_param("cloud_uuid", "cloud&1");
        assert_eq!(
            query.uri(),
            "/api/network/vip%2F1%20%23a?cloud_uuid=cloud%261"
        );
        assert_eq!(ObjectQuery::new("network", "vip").uri(), "/api/network/vip");
    }

    #[test]
    fn object_ref_uri_requires_uuid() {
        let object = ObjectRef::new("serviceenginegroup", "seg");
        assert!(matches!(object.uri(), Err(ControlPlaneError::MissingUuid(name)) if name == "seg"));

        let object = object.with_uuid(Some("seg-uuid".to_string()));
        assert_eq!(
            object.uri().expect("uuid is set"),
            "/api/serviceenginegroup/seg-uuid"
        );
    }

    #[test]
    fn remote_object_tolerates_sparse_records() {
        let obj: RemoteObject = serde_json::from_value(serde_json::json!({
            "name": "seg",
            "labels": [{"key": "clustername", "value": "c1"}],
        }))
        .expect("must parse");
        assert_eq!(obj.labels, Some(vec![Label::new("clustername", "c1")]));
        assert_eq!(obj.created_by, None);
    }
}
