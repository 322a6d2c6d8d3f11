use rand::Rng;
use std::fmt;
use tracing::debug;

use super::config::BrokerConfig;
use super::error::SessionError;
use super::link::{BrokerLink, RumqttLink};

pub const IDENTITY_PREFIX: &str = "strudel";
/// Exclusive upper bound of the identity suffix
pub const SUFFIX_RANGE: u32 = 100_000;

/// Uniform pseudo-random suffix in `[0, SUFFIX_RANGE)`.
pub fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(0..SUFFIX_RANGE)
}

/// MQTT client id of one session, e.g. `strudel4711`.
///
/// Only meant to keep concurrent sessions from kicking each other off the
/// broker; collisions are unlikely, not impossible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn generate() -> Self {
        Self::from_suffix(random_suffix())
    }

    pub fn from_suffix(suffix: u32) -> Self {
        Self(format!("{}{}", IDENTITY_PREFIX, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints one fresh client handle per session.
pub trait ClientFactory: Send + Sync {
    /// Must not block and must not perform network I/O.
    fn create(&self) -> Result<Box<dyn BrokerLink>, SessionError>;
}

/// Factory for rumqttc-backed handles bound to one broker endpoint.
#[derive(Debug, Clone)]
pub struct BrokerClientFactory {
    config: BrokerConfig,
}

impl BrokerClientFactory {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}

impl ClientFactory for BrokerClientFactory {
    fn create(&self) -> Result<Box<dyn BrokerLink>, SessionError> {
        self.config
            .validate()
            .map_err(|e| SessionError::construction_failure(e.to_string()))?;

        let identity = ClientIdentity::generate();
        debug!("Created client {} for {}", identity, self.config);
        Ok(Box::new(RumqttLink::new(identity, self.config.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn suffix_stays_in_range() {
        for _ in 0..10_000 {
            assert!(random_suffix() < SUFFIX_RANGE);
        }
    }

    #[test]
    fn identity_has_prefix_and_numeric_suffix() {
        let identity = ClientIdentity::generate();
        let suffix = identity
            .as_str()
            .strip_prefix(IDENTITY_PREFIX)
            .expect("prefix");
        let value: u32 = suffix.parse().expect("numeric suffix");
        assert!(value < SUFFIX_RANGE);
        assert_eq!(ClientIdentity::from_suffix(7).as_str(), "strudel7");
    }

    #[test]
    fn identities_rarely_collide() {
        let identities: HashSet<_> = (0..100).map(|_| ClientIdentity::generate()).collect();
        // 100 draws from 100k values; a handful of collisions would already be suspicious
        assert!(identities.len() >= 95);
    }

    #[test]
    fn factory_hands_out_fresh_handles() {
        let factory = BrokerClientFactory::new(BrokerConfig::default());
        let first = factory.create().unwrap();
        let second = factory.create().unwrap();
        assert!(first.identity().as_str().starts_with(IDENTITY_PREFIX));
        assert!(second.identity().as_str().starts_with(IDENTITY_PREFIX));
    }

    #[test]
    fn malformed_address_is_a_construction_failure() {
        let factory = BrokerClientFactory::new(BrokerConfig {
            host: "not a host".to_string(),
            ..BrokerConfig::default()
        });
        match factory.create() {
            Err(SessionError::ConstructionFailure { cause }) => {
                assert!(cause.contains("not a host"))
            }
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("factory accepted a malformed host"),
        }
    }
}
