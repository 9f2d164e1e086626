//! Configuration validation logic.

use std::collections::HashSet;

use http::Uri;

use crate::config::schema::ProxyConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a ProxyConfig for semantic correctness.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_connections == 0 {
        errors.push(ValidationError("max_connections must be > 0".to_string()));
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError(
            "health_check.interval_secs must be > 0".to_string(),
        ));
    }

    let mut matchers: HashSet<&str> = HashSet::new();
    for service in &config.services {
        if service.name.is_empty() {
            errors.push(ValidationError("service with empty name".to_string()));
        }
        if service.matcher.is_empty() {
            errors.push(ValidationError(format!(
                "service '{}' has an empty matcher",
                service.name
            )));
        }
        if !matchers.insert(service.matcher.as_str()) {
            errors.push(ValidationError(format!(
                "matcher '{}' is registered more than once",
                service.matcher
            )));
        }
        if service.replicas.is_empty() {
            errors.push(ValidationError(format!(
                "service '{}' has no replicas",
                service.name
            )));
        }

        for replica in &service.replicas {
            match replica.url.parse::<Uri>() {
                Ok(uri) if uri.scheme().is_some() && uri.host().is_some() => {}
                _ => errors.push(ValidationError(format!(
                    "service '{}' replica '{}' is not an absolute URL",
                    service.name, replica.url
                ))),
            }

            if let Some(weight) = replica.metadata.get("weight") {
                match weight.parse::<u32>() {
                    Ok(w) if w >= 1 => {}
                    _ => errors.push(ValidationError(format!(
                        "service '{}' replica '{}' has invalid weight '{}'",
                        service.name, replica.url, weight
                    ))),
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::*;
    use std::collections::HashMap;

    fn service(name: &str, matcher: &str, urls: &[&str]) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            matcher: matcher.to_string(),
            replicas: urls
                .iter()
                .map(|url| ReplicaConfig {
                    url: url.to_string(),
                    metadata: HashMap::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn accepts_valid_config() {
        let mut config = ProxyConfig::default();
        config
            .services
            .push(service("a", "/a", &["http://127.0.0.1:9090"]));

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_max_connections() {
        let mut config = ProxyConfig::default();
        config.max_connections = 0;
        config
            .services
            .push(service("a", "/a", &["http://127.0.0.1:9090"]));

        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("max_connections")));
    }

    #[test]
    fn rejects_duplicate_matchers() {
        let mut config = ProxyConfig::default();
        config
            .services
            .push(service("a", "/same", &["http://127.0.0.1:9090"]));
        config
            .services
            .push(service("b", "/same", &["http://127.0.0.1:9091"]));

        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("more than once")));
    }

    #[test]
    fn rejects_relative_url() {
        let mut config = ProxyConfig::default();
        config.services.push(service("a", "/a", &["127.0.0.1:9090"]));

        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("absolute URL")));
    }

    #[test]
    fn rejects_zero_weight() {
        let mut config = ProxyConfig::default();
        let mut svc = service("a", "/a", &["http://127.0.0.1:9090"]);
        svc.replicas[0]
            .metadata
            .insert("weight".to_string(), "0".to_string());
        config.services.push(svc);

        let errs = validate_config(&config).unwrap_err();
        assert!(errs.iter().any(|e| e.0.contains("invalid weight")));
    }
}
