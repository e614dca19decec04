use lb_admission_core::Label;
use std::{fmt, str::FromStr};

/// Holds the operator's view of the cluster and control plane it manages.
#[derive(Clone, Debug)]
pub struct ClusterInfo {
    /// The `created_by` identity this operator stamps on the control plane
    /// objects it creates.
    pub operator_identity: String,

    pub cloud_type: CloudType,

    /// Identifies the active cloud for UUID-keyed network lookups.
    pub cloud_uuid: String,

    /// How services are exposed to the load balancer.
    pub service_type: ServiceType,

    /// Whether the enhanced virtual hosting architecture is enabled.
    pub evh_enabled: bool,

    /// When set, placement-group labels are never applied.
    pub disable_static_route_sync: bool,

    /// The labels this operator expects on the placement groups it uses.
    pub seg_labels: Vec<Label>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CloudType {
    #[default]
    Vcenter,
    NoAccess,
    Aws,
    Gcp,
    Azure,
    Openstack,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ServiceType {
    #[default]
    ClusterIp,
    NodePort,
    NodePortLocal,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid {what}: {value}")]
pub struct ParseError {
    what: &'static str,
    value: String,
}

// === impl ClusterInfo ===

impl Default for ClusterInfo {
    fn default() -> Self {
        Self {
            operator_identity: "ako-default".to_string(),
            cloud_type: CloudType::default(),
            cloud_uuid: String::new(),
            service_type: ServiceType::default(),
            evh_enabled: false,
            disable_static_route_sync: false,
            seg_labels: Vec::new(),
        }
    }
}

impl ClusterInfo {
    pub fn is_public_cloud(&self) -> bool {
        self.cloud_type.is_public()
    }
}

// === impl CloudType ===

impl CloudType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vcenter => "vcenter",
            Self::NoAccess => "no-access",
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
            Self::Openstack => "openstack",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Aws | Self::Gcp | Self::Azure)
    }

    /// Public clouds that identify networks by UUID rather than by name.
    pub fn uses_network_ref(&self) -> bool {
        matches!(self, Self::Aws)
    }

    /// Public clouds that manage networks natively; network references are
    /// not checked at all.
    pub fn skips_network_check(&self) -> bool {
        matches!(self, Self::Azure)
    }
}

impl FromStr for CloudType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vcenter" => Ok(Self::Vcenter),
            "no-access" => Ok(Self::NoAccess),
            "aws" => Ok(Self::Aws),
            "gcp" => Ok(Self::Gcp),
            "azure" => Ok(Self::Azure),
            "openstack" => Ok(Self::Openstack),
            _ => Err(ParseError::new("cloud type", s)),
        }
    }
}

impl fmt::Display for CloudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl ServiceType ===

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterIp => "cluster-ip",
            Self::NodePort => "node-port",
            Self::NodePortLocal => "node-port-local",
        }
    }
}

impl FromStr for ServiceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cluster-ip" | "clusterip" => Ok(Self::ClusterIp),
            "node-port" | "nodeport" => Ok(Self::NodePort),
            "node-port-local" | "nodeportlocal" => Ok(Self::NodePortLocal),
            _ => Err(ParseError::new("service type", s)),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl ParseError ===

impl ParseError {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cloud_types() {
        assert_eq!("AWS".parse(), Ok(CloudType::Aws));
        assert_eq!("no-access".parse(), Ok(CloudType::NoAccess));
        assert!("oci".parse::<CloudType>().is_err());

        assert!(CloudType::Gcp.is_public());
        assert!(!CloudType::Gcp.uses_network_ref());
        assert!(!CloudType::Openstack.is_public());
    }

    #[test]
    fn parses_service_types() {
        assert_eq!("NodePort".parse(), Ok(ServiceType::NodePort));
        assert_eq!("node-port-local".parse(), Ok(ServiceType::NodePortLocal));
        assert!("LoadBalancer".parse::<ServiceType>().is_err());
    }
}
