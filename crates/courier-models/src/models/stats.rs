/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of events sharing one value of a grouping field.
///
/// Events without the field are counted under a `null` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub key: Option<String>,
    pub count: i64,
}

/// Aggregate view over all persisted events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total_logs: i64,
    pub by_service: Vec<GroupCount>,
    pub by_type: Vec<GroupCount>,
}

impl LogStats {
    /// Count for one key of the per-service grouping.
    pub fn service_count(&self, service: Option<&str>) -> i64 {
        self.by_service
            .iter()
            .find(|g| g.key.as_deref() == service)
            .map(|g| g.count)
            .unwrap_or(0)
    }
}
