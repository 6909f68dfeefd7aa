//! Static catalogs the device generator picks from
//!
//! Descriptor format: `api/release; dpi; WxH; manufacturer; model; device; cpu`

/// Candidate hardware descriptors
pub const DEVICES: &[&str] = &[
    "24/7.0; 380dpi; 1080x1920; OnePlus; ONEPLUS A3010; OnePlus3T; qcom",
    "23/6.0.1; 640dpi; 1440x2392; LGE/lge; RS988; h1; h1",
    "24/7.0; 640dpi; 1440x2560; HUAWEI; LON-L29; HWLON; hi3660",
    "23/6.0.1; 640dpi; 1440x2560; ZTE; ZTE A2017U; ailsa_ii; qcom",
    "23/6.0.1; 640dpi; 1440x2560; samsung; SM-G935F; hero2lte; samsungexynos8890",
    "23/6.0.1; 640dpi; 1440x2560; samsung; SM-G930F; herolte; samsungexynos8890",
    "24/7.0; 480dpi; 1080x1920; samsung; SM-G920F; zeroflte; samsungexynos7420",
    "25/7.1.1; 440dpi; 1080x2030; Xiaomi/xiaomi; Mi Note 3; jason; qcom",
    "26/8.0.0; 480dpi; 1080x2076; samsung; SM-G950F; dreamlte; samsungexynos8895",
    "26/8.0.0; 560dpi; 1440x2792; samsung; SM-N950F; greatlte; samsungexynos8895",
    "27/8.1.0; 420dpi; 1080x2160; Google/google; Pixel 2; walleye; walleye",
    "28/9; 440dpi; 1080x2160; Xiaomi; MI 8; dipper; qcom",
];

/// Candidate firmware build identifiers
pub const BUILDS: &[&str] = &[
    "NMF26X", "MMB29M", "MRA58K", "NRD90M", "MMB29K", "IMM76D", "JDQ39", "JSS15J", "KOT49H",
    "KTU84P", "LMY47V", "NJH47F", "N2G47H", "OPR6.170623.013", "OPM1.171019.011", "PPR1.180610.009",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceDescriptor;

    #[test]
    fn test_every_catalog_device_parses() {
        for descriptor in DEVICES {
            let parsed = DeviceDescriptor::parse(descriptor);
            assert!(parsed.is_ok(), "failed to parse {descriptor}: {:?}", parsed);
        }
    }

    #[test]
    fn test_builds_not_empty() {
        assert!(!BUILDS.is_empty());
        assert!(BUILDS.iter().all(|b| !b.is_empty()));
    }
}
