//! Unique identity generation.
//!
//! Every resource a run creates (origin, user, ring, service group) is
//! namespaced with a random token so concurrent or repeated runs against the
//! same host never collide. Uniqueness is probabilistic: there is no registry.

use uuid::Uuid;

/// Prefix for generated organization names.
pub const ORG_PREFIX: &str = "hab-test-org";
/// Prefix for generated origin names.
pub const ORIGIN_PREFIX: &str = "hab-test-origin";
/// Prefix for generated ring names.
pub const RING_PREFIX: &str = "hab-test-ring";
/// Prefix for generated service group names.
pub const SERVICE_GROUP_PREFIX: &str = "hab-test-sg";
/// Prefix for generated user names.
pub const USER_PREFIX: &str = "hab-test-user";

/// Returns a fresh 128-bit random token as 32 lowercase hex characters.
///
/// # Examples
///
/// ```
/// let a = hab_test::identity::unique_name();
/// let b = hab_test::identity::unique_name();
/// assert_eq!(a.len(), 32);
/// assert_ne!(a, b);
/// ```
#[must_use]
pub fn unique_name() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Returns `<prefix>-<token>`.
#[must_use]
pub fn prefixed(prefix: &str) -> String {
    format!("{prefix}-{}", unique_name())
}

/// The set of names a single run operates under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identities {
    org: String,
    origin: String,
    ring: String,
    service_group: String,
    user: String,
}

impl Identities {
    /// Generates a complete, independent set of names.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            org: prefixed(ORG_PREFIX),
            origin: prefixed(ORIGIN_PREFIX),
            ring: prefixed(RING_PREFIX),
            service_group: prefixed(SERVICE_GROUP_PREFIX),
            user: prefixed(USER_PREFIX),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn ring(&self) -> &str {
        &self.ring
    }

    pub fn service_group(&self) -> &str {
        &self.service_group
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// All names in a fixed order: org, origin, ring, service group, user.
    #[must_use]
    pub fn all(&self) -> [&str; 5] {
        [
            &self.org,
            &self.origin,
            &self.ring,
            &self.service_group,
            &self.user,
        ]
    }
}
