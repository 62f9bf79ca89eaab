use crate::environment::{Environment, HttpRequest};
use crate::errors::CycleError;
use crate::types::{ConfigId, RolloutId};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RolloutsResponse {
    #[serde(default)]
    rollouts: Vec<RolloutRecord>,
}

// Only the fields the manager reads; createTime, createdBy and status are
// dropped by serde.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RolloutRecord {
    rollout_id: RolloutId,
    #[serde(default)]
    traffic_percent_strategy: TrafficPercentStrategy,
}

// A BTreeMap keeps the percentages ordered by config ID, so the forwarded
// list is deterministic for a given response.
#[derive(Debug, Default, Deserialize)]
struct TrafficPercentStrategy {
    #[serde(default)]
    percentages: BTreeMap<ConfigId, u32>,
}

/// The winning rollout: its ID and the configs it spreads traffic over.
#[derive(Debug, PartialEq)]
pub(crate) struct LatestRollout {
    pub rollout_id: RolloutId,
    pub percentages: Vec<(ConfigId, u32)>,
}

/// Lists rollouts for the service and picks the winner. The control plane
/// returns rollouts newest first, so the first entry in document order wins.
pub(crate) async fn fetch_latest_rollout<E: Environment>(
    env: &E,
    base_url: &str,
    service_name: &str,
) -> Result<LatestRollout, CycleError> {
    let url = format!("{base_url}/services/{service_name}/rollouts?filter=status=SUCCESS");
    let response = env.run_http_request(HttpRequest::get(url)).await?;

    if !response.status.is_success() {
        return Err(CycleError::HttpStatus(response.status));
    }

    let parsed: RolloutsResponse = serde_json::from_slice(&response.body)?;
    let newest = parsed
        .rollouts
        .into_iter()
        .next()
        .ok_or(CycleError::EmptyRollouts)?;

    Ok(LatestRollout {
        rollout_id: newest.rollout_id,
        percentages: newest
            .traffic_percent_strategy
            .percentages
            .into_iter()
            .collect(),
    })
}
