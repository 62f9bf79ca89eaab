use crate::environment::{Environment, HttpRequest};
use crate::errors::CycleError;
use crate::types::{ConfigId, ServiceConfig, WeightedConfig};
use bytes::Bytes;
use tokio::task::JoinSet;

/// Fans out one config fetch per referenced revision and aggregates
/// all-or-nothing: a single failed fetch fails the whole cycle, so the
/// consumer never sees a partial bundle. Output order follows the input's
/// `(config_id, percent)` list.
pub(crate) async fn assemble_configs<E: Environment>(
    env: &E,
    base_url: &str,
    service_name: &str,
    percentages: &[(ConfigId, u32)],
) -> Result<Vec<WeightedConfig>, CycleError> {
    let mut join_set = JoinSet::new();

    for (idx, (config_id, percent)) in percentages.iter().enumerate() {
        let env = env.clone();
        let url = format!("{base_url}/services/{service_name}/configs/{config_id}");
        let config_id = config_id.clone();
        let percent = *percent;

        join_set.spawn(async move {
            let result = fetch_one_config(&env, &url, &config_id).await;
            (idx, config_id, percent, result)
        });
    }

    let total = percentages.len();
    let mut fetched: Vec<Option<WeightedConfig>> = (0..total).map(|_| None).collect();
    let mut failed = 0usize;

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((idx, config_id, percent, Ok(payload))) => {
                fetched[idx] = Some(WeightedConfig {
                    config: ServiceConfig {
                        id: config_id,
                        payload,
                    },
                    percent,
                });
            }
            Ok((_, config_id, _, Err(e))) => {
                tracing::warn!(config_id = %config_id, error = %e, "service config fetch failed");
                failed += 1;
            }
            Err(e) => {
                tracing::error!("config fetch task panicked: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CycleError::PartialConfigFailure { failed, total });
    }

    Ok(fetched.into_iter().flatten().collect())
}

async fn fetch_one_config<E: Environment>(
    env: &E,
    url: &str,
    config_id: &str,
) -> Result<Bytes, CycleError> {
    let response = env.run_http_request(HttpRequest::get(url)).await?;

    if !response.status.is_success() {
        return Err(CycleError::HttpStatus(response.status));
    }
    if response.body.is_empty() {
        return Err(CycleError::EmptyConfig(config_id.to_string()));
    }

    Ok(response.body)
}
