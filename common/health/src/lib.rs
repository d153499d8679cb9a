use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

/// Liveness tracking for the long-running parts of the sync service.
///
/// Every consumer loop, and the producer's librdkafka client, registers a
/// component and must keep reporting healthy before its deadline passes. The
/// process is live only while every registered component is: one wedged
/// topic loop is enough to fail the probe and get the pod restarted.
///
/// Readiness is a separate concern and should use its own registry.
#[derive(Default, Debug)]
pub struct HealthStatus {
    pub healthy: bool,
    pub components: HashMap<String, ComponentStatus>,
}

impl IntoResponse for HealthStatus {
    fn into_response(self) -> Response {
        let body = format!("{self:?}");
        match self.healthy {
            true => (StatusCode::OK, body),
            false => (StatusCode::INTERNAL_SERVER_ERROR, body),
        }
        .into_response()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ComponentStatus {
    /// Registered, has not reported yet
    Starting,
    /// Reported healthy, valid until the given instant
    HealthyUntil(Instant),
    /// Reported unhealthy
    Unhealthy,
    /// Missed its deadline
    Stalled,
}

impl ComponentStatus {
    pub fn is_healthy(&self) -> bool {
        match self {
            ComponentStatus::HealthyUntil(until) => *until > Instant::now(),
            _ => false,
        }
    }
}

type Components = Arc<RwLock<HashMap<String, ComponentStatus>>>;

#[derive(Clone)]
pub struct HealthHandle {
    component: String,
    deadline: Duration,
    components: Components,
}

impl HealthHandle {
    /// Must be called more often than the deadline given at registration.
    pub fn report_healthy(&self) {
        self.report_status(ComponentStatus::HealthyUntil(
            Instant::now() + self.deadline,
        ));
    }

    pub fn report_status(&self, status: ComponentStatus) {
        match self.components.write() {
            Ok(mut map) => {
                map.insert(self.component.clone(), status);
            }
            // The probe will fail on the next read, which restarts the process
            Err(_) => warn!("poisoned health registry lock"),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

#[derive(Clone)]
pub struct HealthRegistry {
    name: String,
    components: Components,
}

impl HealthRegistry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            components: Default::default(),
        }
    }

    /// Registers a component in the `Starting` state. The handle goes to the
    /// component so it can report on its own schedule.
    pub fn register(&self, component: impl Into<String>, deadline: Duration) -> HealthHandle {
        let handle = HealthHandle {
            component: component.into(),
            deadline,
            components: self.components.clone(),
        };
        handle.report_status(ComponentStatus::Starting);
        handle
    }

    /// Overall status across all registered components. Usable directly as
    /// an axum handler.
    pub fn get_status(&self) -> HealthStatus {
        let Ok(components) = self.components.read() else {
            warn!("{} health check failed: poisoned lock", self.name);
            return HealthStatus::default();
        };

        let now = Instant::now();
        let mut result = HealthStatus {
            healthy: !components.is_empty(),
            components: HashMap::with_capacity(components.len()),
        };

        for (name, status) in components.iter() {
            let effective = match status {
                ComponentStatus::HealthyUntil(until) if *until <= now => ComponentStatus::Stalled,
                other => *other,
            };
            if !matches!(effective, ComponentStatus::HealthyUntil(_)) {
                result.healthy = false;
            }
            result.components.insert(name.clone(), effective);
        }

        match result.healthy {
            true => info!("{} health check ok", self.name),
            false => warn!("{} health check failed: {:?}", self.name, result.components),
        }
        result
    }
}
