//! Typed payloads for the eight resource kinds this dispatch core handles.
//!
//! `Pod`/`ConfigMap`/`Secret`/`Node` are the stock `k8s_openapi` types. `Rule`,
//! `RuleEndpoint`, `Mission` and `EdgeCluster` are router/mission-plane kinds
//! whose CRDs live upstream of this core, modeled the same way
//! `spec::cert::ClusterIssuer` models a foreign CRD: a plain struct
//! implementing `k8s_openapi::Resource` + `Metadata` with an opaque spec body.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::{ClusterResourceScope, Metadata, NamespaceResourceScope, Resource};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Rule {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: serde_json::Value,
}

impl Resource for Rule {
    const API_VERSION: &'static str = "router.skate.io/v1";
    const GROUP: &'static str = "router.skate.io";
    const KIND: &'static str = "Rule";
    const VERSION: &'static str = "v1";
    const URL_PATH_SEGMENT: &'static str = "rules";
    type Scope = ClusterResourceScope;
}

impl Metadata for Rule {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleEndpoint {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: serde_json::Value,
}

impl Resource for RuleEndpoint {
    const API_VERSION: &'static str = "router.skate.io/v1";
    const GROUP: &'static str = "router.skate.io";
    const KIND: &'static str = "RuleEndpoint";
    const VERSION: &'static str = "v1";
    const URL_PATH_SEGMENT: &'static str = "ruleendpoints";
    type Scope = ClusterResourceScope;
}

impl Metadata for RuleEndpoint {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Mission {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: serde_json::Value,
}

impl Resource for Mission {
    const API_VERSION: &'static str = "mission.skate.io/v1";
    const GROUP: &'static str = "mission.skate.io";
    const KIND: &'static str = "Mission";
    const VERSION: &'static str = "v1";
    const URL_PATH_SEGMENT: &'static str = "missions";
    type Scope = NamespaceResourceScope;
}

impl Metadata for Mission {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// The payload of an edge-cluster reconcile-resync message: the full set of
/// missions the cloud believes should be running in that cluster.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MissionList {
    pub items: Vec<Mission>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EdgeClusterStatus {
    /// Mission names the edge cluster has reported as currently received.
    #[serde(default)]
    pub missions_in_edge: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EdgeCluster {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: EdgeClusterStatus,
}

impl Resource for EdgeCluster {
    const API_VERSION: &'static str = "mission.skate.io/v1";
    const GROUP: &'static str = "mission.skate.io";
    const KIND: &'static str = "EdgeCluster";
    const VERSION: &'static str = "v1";
    const URL_PATH_SEGMENT: &'static str = "edgeclusters";
    type Scope = ClusterResourceScope;
}

impl Metadata for EdgeCluster {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// The sum type dispatched sync loops fan a kind's events out over. Mirrors
/// the shape of `resource::SupportedResources`, narrowed to the eight kinds
/// this core actually handles and tagged by the `ResourceKind` each sync
/// loop is specialized for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResourceKind {
    Pod(k8s_openapi::api::core::v1::Pod),
    ConfigMap(k8s_openapi::api::core::v1::ConfigMap),
    Secret(k8s_openapi::api::core::v1::Secret),
    Node(k8s_openapi::api::core::v1::Node),
    Rule(Rule),
    RuleEndpoint(RuleEndpoint),
    Mission(Mission),
    MissionList(MissionList),
}

impl ResourceKind {
    /// The lowercase kind segment used in resource paths (`pod`, `configmap`, …).
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceKind::Pod(_) => "pod",
            ResourceKind::ConfigMap(_) => "configmap",
            ResourceKind::Secret(_) => "secret",
            ResourceKind::Node(_) => "node",
            ResourceKind::Rule(_) => "rule",
            ResourceKind::RuleEndpoint(_) => "ruleendpoint",
            ResourceKind::Mission(_) => "mission",
            ResourceKind::MissionList(_) => "missionlist",
        }
    }
}
