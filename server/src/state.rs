use std::sync::Arc;

use reqwest::Client;
use services::{CredentialClient, StoreClient};

use super::{config::Config, stats::Aggregator};

pub struct AppState {
    pub config: Config,
    pub credentials: CredentialClient,
    pub store: StoreClient,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Self::from_config(Config::load())
    }

    pub fn from_config(config: Config) -> Arc<Self> {
        let http = Client::new();

        let credentials = CredentialClient::new(
            http.clone(),
            config.credential_url.clone(),
            config.credential_key.clone(),
        );
        let store = StoreClient::new(
            http,
            config.store_url.clone(),
            config.store_key.clone(),
        );

        Arc::new(Self {
            config,
            credentials,
            store,
            aggregator: Aggregator::declared(),
        })
    }
}
