use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::ClientConfig;
use crate::notification::model::{Notification, NotifyError};
use crate::notification::store::NotificationStore;

/// HTTP implementation of the remote notification store.
///
/// All requests carry the configured bearer token; recipient scoping is the
/// server's job. Non-2xx responses surface as transport errors and are
/// handled by the callers' recovery rules (keep the cache, log, move on).
pub struct HttpNotificationStore {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpNotificationStore {
    pub fn new(config: &ClientConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, NotifyError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl NotificationStore for HttpNotificationStore {
    async fn fetch_unread(&self) -> Result<Vec<Notification>, NotifyError> {
        let url = self.endpoint("api/notifications/unread")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn mark_read(&self, key: i64) -> Result<(), NotifyError> {
        let url = self.endpoint(&format!("api/notifications/{}/read", key))?;
        self.client
            .post(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), NotifyError> {
        let url = self.endpoint("api/notifications/read-all")?;
        self.client
            .post(url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::new(
            "http://localhost:9500/".parse().unwrap(),
            "ws://localhost:9500/api/notifications/ws".parse().unwrap(),
            "token".to_string(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_endpoints_join_against_base_url() {
        let store = HttpNotificationStore::new(&config()).unwrap();
        assert_eq!(
            store.endpoint("api/notifications/unread").unwrap().as_str(),
            "http://localhost:9500/api/notifications/unread"
        );
        assert_eq!(
            store
                .endpoint("api/notifications/42/read")
                .unwrap()
                .as_str(),
            "http://localhost:9500/api/notifications/42/read"
        );
    }
}
