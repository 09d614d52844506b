//! Apply-order ranking of resource kinds.

use std::collections::HashMap;

/// Rank given to kinds the table does not know.
pub const DEFAULT_PRIORITY: usize = 1000;

/// The kind that must always be applied first.
pub const RESERVED_KIND: &str = "Namespace";

/// Kubernetes install order, dependencies before dependents.
pub const DEFAULT_APPLY_ORDER: &[&str] = &[
    "Namespace",
    "NetworkPolicy",
    "ResourceQuota",
    "LimitRange",
    "PodSecurityPolicy",
    "PodDisruptionBudget",
    "ServiceAccount",
    "Secret",
    "SecretList",
    "ConfigMap",
    "StorageClass",
    "PersistentVolume",
    "PersistentVolumeClaim",
    "CustomResourceDefinition",
    "ClusterRole",
    "ClusterRoleList",
    "ClusterRoleBinding",
    "ClusterRoleBindingList",
    "Role",
    "RoleList",
    "RoleBinding",
    "RoleBindingList",
    "Service",
    "DaemonSet",
    "Pod",
    "ReplicationController",
    "ReplicaSet",
    "Deployment",
    "HorizontalPodAutoscaler",
    "StatefulSet",
    "Job",
    "CronJob",
    "IngressClass",
    "Ingress",
    "APIService",
];

/// Immutable ranking of resource kinds by list position.
///
/// Position 0 belongs to the reserved kind. A different kind landing there
/// (a misconfigured table) is treated as unranked instead of jumping the queue.
#[derive(Debug, Clone)]
pub struct PriorityTable {
    positions: HashMap<String, usize>,
    reserved: String,
    unranked: usize,
}

impl PriorityTable {
    /// Builds a table from an ordered list of kinds and the reserved first kind.
    ///
    /// Duplicate kinds keep their first position.
    pub fn new<I, S>(order: I, reserved: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut positions = HashMap::new();
        let mut len = 0;
        for (i, kind) in order.into_iter().enumerate() {
            positions.entry(kind.into()).or_insert(i);
            len = i + 1;
        }

        Self {
            positions,
            reserved: reserved.into(),
            unranked: DEFAULT_PRIORITY.max(len),
        }
    }

    /// Builds a table from `order`, reserving the first slot for [`RESERVED_KIND`].
    pub fn with_order<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(order, RESERVED_KIND)
    }

    /// Returns the apply rank of `kind`; lower ranks apply first.
    pub fn rank(&self, kind: &str) -> usize {
        match self.positions.get(kind) {
            Some(0) if kind != self.reserved => self.unranked,
            Some(&position) => position,
            None => self.unranked,
        }
    }

    /// The sentinel rank shared by all unranked kinds.
    pub fn unranked(&self) -> usize {
        self.unranked
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self::with_order(DEFAULT_APPLY_ORDER.iter().copied())
    }
}
