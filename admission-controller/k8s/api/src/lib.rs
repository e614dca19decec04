#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod crd;
mod status;
mod watch;

pub use self::{
    crd::{
        AviInfraSetting, DestinationRule, Gateway, HostRule, HttpRule, MultiClusterIngress,
        ServiceImport, VirtualService,
    },
    status::{State, Status},
    watch::{Informer, WatchEvent},
};
pub use k8s_openapi::api::core::v1::{Namespace, Secret};
pub use kube::{
    api::{Api, ApiResource, DynamicObject, ObjectMeta, Patch, PatchParams, ResourceExt},
    runtime::watcher,
    Client, Error, Resource,
};

/// The API group of the load-balancer configuration resources.
pub const API_GROUP: &str = "ako.vmware.com";

/// The API group of the mesh-routing resources.
pub const MESH_API_GROUP: &str = "networking.istio.io";
