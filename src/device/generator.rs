//! Seeded device identity generation
//!
//! Every value is drawn from a ChaCha20 stream keyed by the SHA-256 of the
//! seed, so a seed reproduces the same device on any host and any run.

use super::catalog::{BUILDS, DEVICES};
use super::descriptor::DeviceDescriptor;
use crate::Result;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Builder;

const HEX_POOL: &[u8; 16] = b"abcdef0123456789";

/// Synthetic device identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Hardware descriptor string picked from the catalog
    pub descriptor: String,
    /// `android-` followed by 16 lowercase hex characters
    pub device_id: String,
    /// Install id
    pub uuid: String,
    /// Phone id
    pub phone_id: String,
    /// Advertising id
    pub adid: String,
    /// Firmware build id
    pub build: String,
}

impl DeviceProfile {
    /// Derive the device for `seed`
    pub fn generate(seed: &str) -> Self {
        let mut rng = seeded_rng(seed);

        let descriptor = pick(&mut rng, DEVICES).to_string();
        let id: String = (0..16)
            .map(|_| HEX_POOL[rng.gen_range(0..HEX_POOL.len() as u32) as usize] as char)
            .collect();
        let uuid = random_guid(&mut rng);
        let phone_id = random_guid(&mut rng);
        let adid = random_guid(&mut rng);
        let build = pick(&mut rng, BUILDS).to_string();

        tracing::debug!("Generated device {} ({})", id, descriptor);

        Self {
            descriptor,
            device_id: format!("android-{id}"),
            uuid,
            phone_id,
            adid,
            build,
        }
    }

    /// Parsed view of the hardware descriptor
    pub fn parse_descriptor(&self) -> Result<DeviceDescriptor> {
        DeviceDescriptor::parse(&self.descriptor)
    }
}

/// Deterministic random source for `seed`
pub fn seeded_rng(seed: &str) -> ChaCha20Rng {
    let digest: [u8; 32] = Sha256::digest(seed.as_bytes()).into();
    ChaCha20Rng::from_seed(digest)
}

/// Version-4 shaped UUID derived from `seed`
pub fn seeded_guid(seed: &str) -> String {
    random_guid(&mut seeded_rng(seed))
}

fn random_guid<R: RngCore>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}

// u32 bounds keep the draw identical on 32- and 64-bit targets
fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len() as u32) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_is_deterministic() {
        let first = DeviceProfile::generate("my-seed");
        let second = DeviceProfile::generate("my-seed");
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_seed_is_accepted() {
        assert_eq!(DeviceProfile::generate(""), DeviceProfile::generate(""));
    }

    #[test]
    fn test_device_id_shape() {
        let device = DeviceProfile::generate("shape");
        let hex = device.device_id.strip_prefix("android-").unwrap();
        assert_eq!(hex.len(), 16);
        assert!(hex.bytes().all(|b| HEX_POOL.contains(&b)));
    }

    #[test]
    fn test_uuids_are_v4_and_distinct() {
        let device = DeviceProfile::generate("uuids");
        let ids = [&device.uuid, &device.phone_id, &device.adid];
        for id in ids {
            let parsed = uuid::Uuid::parse_str(id).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
            assert_eq!(id.to_lowercase(), *id);
        }
        assert_ne!(device.uuid, device.phone_id);
        assert_ne!(device.phone_id, device.adid);
    }

    #[test]
    fn test_values_come_from_catalog() {
        let device = DeviceProfile::generate("catalog");
        assert!(DEVICES.contains(&device.descriptor.as_str()));
        assert!(BUILDS.contains(&device.build.as_str()));
        assert!(device.parse_descriptor().is_ok());
    }

    #[test]
    fn test_distinct_seeds_yield_distinct_ids() {
        let ids: HashSet<String> = (0..500)
            .map(|i| DeviceProfile::generate(&format!("user-{i}")).device_id)
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_seeded_guid() {
        assert_eq!(seeded_guid("abc"), seeded_guid("abc"));
        assert_ne!(seeded_guid("abc"), seeded_guid("abd"));
        assert_eq!(
            uuid::Uuid::parse_str(&seeded_guid("abc"))
                .unwrap()
                .get_version_num(),
            4
        );
    }
}
