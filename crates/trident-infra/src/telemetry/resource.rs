use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::env;
use trident_core::ServiceIdentity;

/// Resource descriptor attached to every span, metric point and log record.
pub fn build_resource(identity: &ServiceIdentity, environment: &str) -> Resource {
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.to_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let instance_id =
        env::var("OTEL_SERVICE_INSTANCE_ID").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

    Resource::new(vec![
        KeyValue::new(SERVICE_NAME, identity.service_name().to_string()),
        KeyValue::new(SERVICE_VERSION, identity.service_version().to_string()),
        KeyValue::new("deployment.environment", environment.to_string()),
        KeyValue::new("host.name", hostname),
        KeyValue::new("service.instance.id", instance_id),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(resource: &Resource, key: &str) -> Option<String> {
        resource
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_resource_carries_service_identity() {
        let identity = ServiceIdentity::new("svc-a", "1.2.3").unwrap();
        let resource = build_resource(&identity, "staging");

        assert_eq!(attribute(&resource, SERVICE_NAME).as_deref(), Some("svc-a"));
        assert_eq!(
            attribute(&resource, SERVICE_VERSION).as_deref(),
            Some("1.2.3")
        );
        assert_eq!(
            attribute(&resource, "deployment.environment").as_deref(),
            Some("staging")
        );
        assert!(attribute(&resource, "host.name").is_some());
        assert!(attribute(&resource, "service.instance.id").is_some());
    }
}
