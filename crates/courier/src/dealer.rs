//! Top-level dealer façade: one service router per declared service.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use courier_core::{Message, MessagePath, MessagePolicy};

use crate::config::Config;
use crate::discovery::EndpointSnapshot;
use crate::handle::HandleFactory;
use crate::service::{Receiver, Service, ServiceInfo, ServiceTuning};
use crate::{DealerError, Result};

/// Client-side dealer.
///
/// Submits opaque payloads to named services and feeds discovery
/// snapshots to their routers. The set of services is fixed at
/// construction from configuration.
pub struct Dealer {
    services: HashMap<String, Service>,
    config: Config,
}

impl Dealer {
    /// Build a dealer from configuration, one router per declared
    /// service. Submissions to anything undeclared are rejected.
    pub fn new(config: Config, factory: Arc<dyn HandleFactory>) -> Self {
        let tuning = ServiceTuning {
            sweep_interval: config.sweep_interval(),
            prune_interval: config.prune_interval(),
        };
        let mut services = HashMap::new();
        for (name, service_config) in &config.services {
            let info = ServiceInfo {
                name: name.clone(),
                app: service_config.app.clone().unwrap_or_else(|| name.clone()),
            };
            tracing::info!(service = %info.name, app = %info.app, "starting service router");
            services.insert(
                name.clone(),
                Service::with_tuning(info, Arc::clone(&factory), tuning),
            );
        }
        Self { services, config }
    }

    pub fn app_name(&self) -> &str {
        &self.config.app_name
    }

    fn service(&self, name: &str) -> Result<&Service> {
        self.services
            .get(name)
            .ok_or_else(|| DealerError::UnknownService(name.to_string()))
    }

    /// Submit a payload to `service`/`handle`.
    ///
    /// A missing policy falls back to the service's configured default.
    /// The returned receiver is the consumer's handle on the streamed
    /// response; dropping it cancels interest.
    pub fn submit(
        &self,
        service: &str,
        handle: &str,
        payload: impl Into<Bytes>,
        policy: Option<MessagePolicy>,
    ) -> Result<Receiver> {
        let router = self.service(service)?;
        let policy = match policy {
            Some(policy) => policy,
            None => self.policy_for_service(service)?,
        };
        let message = Message::new(MessagePath::new(service, handle), payload.into(), policy);
        Ok(router.send_message(message))
    }

    /// The configured default policy for a service.
    pub fn policy_for_service(&self, service: &str) -> Result<MessagePolicy> {
        let service_config = self
            .config
            .services
            .get(service)
            .ok_or_else(|| DealerError::UnknownService(service.to_string()))?;
        Ok(service_config.default_policy())
    }

    /// Feed one discovery snapshot to a service's router.
    pub fn apply_snapshot(&self, service: &str, snapshot: &EndpointSnapshot) -> Result<()> {
        self.service(service)?.refresh_handles(snapshot);
        Ok(())
    }

    /// Messages currently stored for a service, in flight and unhandled
    /// combined.
    pub fn stored_messages_count(&self, service: &str) -> Result<usize> {
        Ok(self.service(service)?.stored_messages_count())
    }

    /// Delete one stored message by id, across every service.
    pub fn remove_stored_message(&self, uuid: &Uuid) -> bool {
        self.services
            .values()
            .any(|service| service.remove_stored_message(uuid))
    }
}
