use std::collections::HashMap;
use std::sync::Arc;

use medialift_core::models::ProviderKind;
use medialift_core::Config;

use crate::{MediaHubClient, ProviderClient, ProviderError, ProviderResult, VidShareClient};

/// Create a provider client based on configuration.
pub fn create_provider(
    kind: ProviderKind,
    config: &Config,
) -> ProviderResult<Arc<dyn ProviderClient>> {
    match kind {
        ProviderKind::MediaHub => {
            let cfg = config.mediahub.clone().ok_or_else(|| {
                ProviderError::Configuration(
                    "MediaHub credentials are not configured".to_string(),
                )
            })?;
            Ok(Arc::new(MediaHubClient::new(cfg)?))
        }
        ProviderKind::VidShare => {
            let cfg = config.vidshare.clone().ok_or_else(|| {
                ProviderError::Configuration(
                    "VidShare credentials are not configured".to_string(),
                )
            })?;
            Ok(Arc::new(VidShareClient::new(cfg)?))
        }
    }
}

/// Build clients for every provider with a credential block present.
pub fn configured_providers(
    config: &Config,
) -> ProviderResult<HashMap<ProviderKind, Arc<dyn ProviderClient>>> {
    let mut providers = HashMap::new();

    if config.mediahub.is_some() {
        providers.insert(
            ProviderKind::MediaHub,
            create_provider(ProviderKind::MediaHub, config)?,
        );
    }
    if config.vidshare.is_some() {
        providers.insert(
            ProviderKind::VidShare,
            create_provider(ProviderKind::VidShare, config)?,
        );
    }

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medialift_core::config::{MediaHubConfig, WorkerConfig};

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/medialift".to_string(),
            db_max_connections: 5,
            environment: "test".to_string(),
            worker: WorkerConfig::default(),
            mediahub: None,
            vidshare: None,
        }
    }

    #[test]
    fn unconfigured_provider_fails_with_configuration_error() {
        let config = base_config();
        assert!(matches!(
            create_provider(ProviderKind::MediaHub, &config),
            Err(ProviderError::Configuration(_))
        ));
        assert!(matches!(
            create_provider(ProviderKind::VidShare, &config),
            Err(ProviderError::Configuration(_))
        ));
        assert!(configured_providers(&config).unwrap().is_empty());
    }

    #[test]
    fn configured_provider_is_created_with_its_kind() {
        let mut config = base_config();
        config.mediahub = Some(MediaHubConfig {
            username: "editor".to_string(),
            password: "secret".to_string(),
            base_url: "https://api.mediahub.tv/v2".to_string(),
        });

        let providers = configured_providers(&config).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(
            providers[&ProviderKind::MediaHub].kind(),
            ProviderKind::MediaHub
        );
    }
}
