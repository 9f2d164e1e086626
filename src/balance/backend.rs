//! Backend replica model.
//!
//! # Responsibilities
//! - Represent a single backend replica of a service
//! - Carry the liveness flag shared between balancer and health checker
//! - Expose per-replica metadata (notably `weight`)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use http::Uri;

use crate::config::ReplicaConfig;

/// One backend replica.
///
/// Constructed once per config version and never mutated afterwards, except
/// for the liveness flag: the health checker writes it, balancers read it.
#[derive(Debug)]
pub struct Backend {
    url: Uri,
    service: String,
    weight: u32,
    alive: AtomicBool,
    metadata: HashMap<String, String>,
}

impl Backend {
    /// Build a replica from its config entry. Fails when the URL does not
    /// parse; a URL without host or scheme is caught by config validation.
    pub fn new(replica: &ReplicaConfig, service: &str) -> Result<Self, http::uri::InvalidUri> {
        let url: Uri = replica.url.parse()?;
        let weight = meta_int_or(&replica.metadata, "weight", 1).max(1);

        Ok(Self {
            url,
            service: service.to_string(),
            weight,
            alive: AtomicBool::new(true),
            metadata: replica.metadata.clone(),
        })
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Selection weight, from `metadata["weight"]`, never below 1.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Flip liveness; returns the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }

    /// The `host:port` the health checker dials.
    pub fn probe_addr(&self) -> String {
        let host = self.url.host().unwrap_or("127.0.0.1");
        let port = self.url.port_u16().unwrap_or(80);
        format!("{host}:{port}")
    }

    /// Integer parse of `metadata[key]`, or `default` when the key is
    /// absent or unparsable.
    pub fn meta_int_or(&self, key: &str, default: u32) -> u32 {
        meta_int_or(&self.metadata, key, default)
    }
}

fn meta_int_or(metadata: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    metadata
        .get(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
