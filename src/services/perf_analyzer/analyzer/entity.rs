//! Entity type classification of transforms
//!
//! A transform is tagged by the kind of entity it builds, read from its id
//! (e.g. `entities-v1-latest-security_host_default`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Host,
    User,
    Service,
    Generic,
}

impl EntityType {
    pub const ALL: [EntityType; 4] =
        [EntityType::Host, EntityType::User, EntityType::Service, EntityType::Generic];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Host => "host",
            EntityType::User => "user",
            EntityType::Service => "service",
            EntityType::Generic => "generic",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Host => "Host",
            EntityType::User => "User",
            EntityType::Service => "Service",
            EntityType::Generic => "Generic",
        }
    }

    /// Samples each side needs before a latency comparison gets a status
    ///
    /// Service traffic is about 1% of the synthetic load, so its pool is small.
    pub fn min_comparison_samples(&self) -> u64 {
        match self {
            EntityType::Service => 3,
            _ => 10,
        }
    }
}

type Predicate = fn(&str) -> bool;

/// Ordered (predicate, category) rules; the first match wins
pub struct EntityClassifier {
    rules: Vec<(Predicate, EntityType)>,
}

impl EntityClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                ((|id: &str| id.contains("host")) as Predicate, EntityType::Host),
                ((|id: &str| id.contains("user")) as Predicate, EntityType::User),
                ((|id: &str| id.contains("service")) as Predicate, EntityType::Service),
                ((|id: &str| id.contains("generic")) as Predicate, EntityType::Generic),
            ],
        }
    }

    /// `None` leaves the transform out of every per-entity aggregate
    pub fn classify(&self, transform_id: &str) -> Option<EntityType> {
        self.rules
            .iter()
            .find(|(matches, _)| matches(transform_id))
            .map(|(_, entity)| *entity)
    }
}

impl Default for EntityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_transforms() {
        let classifier = EntityClassifier::new();
        assert_eq!(
            classifier.classify("entities-v1-latest-security_host_default"),
            Some(EntityType::Host)
        );
        assert_eq!(
            classifier.classify("entities-v1-latest-security_user_default"),
            Some(EntityType::User)
        );
        assert_eq!(
            classifier.classify("entities-v1-latest-security_service_default"),
            Some(EntityType::Service)
        );
        assert_eq!(
            classifier.classify("entities-v1-latest-security_generic_default"),
            Some(EntityType::Generic)
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Both "host" and "user" appear; host is checked first
        let classifier = EntityClassifier::new();
        assert_eq!(classifier.classify("user_on_host"), Some(EntityType::Host));
    }

    #[test]
    fn test_unclassified() {
        assert_eq!(EntityClassifier::new().classify("metrics-rollup"), None);
    }

    #[test]
    fn test_min_samples() {
        assert_eq!(EntityType::Service.min_comparison_samples(), 3);
        assert_eq!(EntityType::Host.min_comparison_samples(), 10);
        assert_eq!(EntityType::Generic.min_comparison_samples(), 10);
    }
}
