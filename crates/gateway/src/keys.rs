//! Reloadable API-key set.
//!
//! Accepted keys come from one env var (comma-separated). Only SHA-256
//! digests are held in memory, and presented keys are compared in constant
//! time. `reload` re-reads the env var under the single write lock so
//! operators can rotate credentials without a restart.

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use bait_domain::TraceEvent;

pub struct ApiKeySet {
    env_var: String,
    hashes: RwLock<Vec<[u8; 32]>>,
}

impl ApiKeySet {
    /// Load the key set from `env_var`. An unset or empty var yields an
    /// empty set, which means dev mode: all requests pass.
    pub fn from_env(env_var: &str) -> Self {
        let set = Self {
            env_var: env_var.to_owned(),
            hashes: RwLock::new(Vec::new()),
        };
        set.reload();
        set
    }

    /// Re-read the env var and replace the accepted set.
    pub fn reload(&self) -> usize {
        let hashes = std::env::var(&self.env_var)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| Sha256::digest(k.as_bytes()).into())
            .collect::<Vec<[u8; 32]>>();

        let count = hashes.len();
        *self.hashes.write() = hashes;

        TraceEvent::ApiKeysReloaded { key_count: count }.emit();
        count
    }

    /// True when no keys are configured (dev mode).
    pub fn is_open(&self) -> bool {
        self.hashes.read().is_empty()
    }

    /// Constant-time membership check for a presented key.
    pub fn check(&self, presented: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        self.hashes
            .read()
            .iter()
            .any(|h| bool::from(h.ct_eq(&digest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_configured_keys_and_rejects_others() {
        std::env::set_var("BAIT_TEST_KEYS_A", "alpha, beta");
        let keys = ApiKeySet::from_env("BAIT_TEST_KEYS_A");

        assert!(!keys.is_open());
        assert!(keys.check("alpha"));
        assert!(keys.check("beta"));
        assert!(!keys.check("gamma"));
        assert!(!keys.check(""));
    }

    #[test]
    fn unset_var_means_dev_mode() {
        std::env::remove_var("BAIT_TEST_KEYS_B");
        let keys = ApiKeySet::from_env("BAIT_TEST_KEYS_B");
        assert!(keys.is_open());
    }

    #[test]
    fn reload_picks_up_rotation() {
        std::env::set_var("BAIT_TEST_KEYS_C", "old-key");
        let keys = ApiKeySet::from_env("BAIT_TEST_KEYS_C");
        assert!(keys.check("old-key"));

        std::env::set_var("BAIT_TEST_KEYS_C", "new-key");
        assert!(keys.check("old-key"), "rotation applies only on reload");

        let count = keys.reload();
        assert_eq!(count, 1);
        assert!(keys.check("new-key"));
        assert!(!keys.check("old-key"));
    }
}
