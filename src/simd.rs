//! SIMD extension detection and selection

use std::fmt;

/// Vector instruction set level, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdLevel {
    Scalar,
    Sse41,
    Sse42,
    Avx,
    Avx2,
    Avx512,
}

impl SimdLevel {
    pub fn name(self) -> &'static str {
        match self {
            SimdLevel::Scalar => "SCALAR",
            SimdLevel::Sse41 => "SSE41",
            SimdLevel::Sse42 => "SSE42",
            SimdLevel::Avx => "AVX",
            SimdLevel::Avx2 => "AVX2",
            SimdLevel::Avx512 => "AVX512",
        }
    }

    /// Parse an extension id, case-insensitive; an empty id means "highest"
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_uppercase();
        match id.as_str() {
            "" => Some(SimdLevel::Avx512),
            "SCALAR" => Some(SimdLevel::Scalar),
            "SSE41" | "SSE4.1" => Some(SimdLevel::Sse41),
            "SSE42" | "SSE4.2" => Some(SimdLevel::Sse42),
            "AVX" => Some(SimdLevel::Avx),
            "AVX2" => Some(SimdLevel::Avx2),
            "AVX512" => Some(SimdLevel::Avx512),
            _ => None,
        }
    }

    /// Highest level the running CPU supports
    pub fn detect() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw") {
                SimdLevel::Avx512
            } else if is_x86_feature_detected!("avx2") {
                SimdLevel::Avx2
            } else if is_x86_feature_detected!("avx") {
                SimdLevel::Avx
            } else if is_x86_feature_detected!("sse4.2") {
                SimdLevel::Sse42
            } else if is_x86_feature_detected!("sse4.1") {
                SimdLevel::Sse41
            } else {
                SimdLevel::Scalar
            }
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        {
            SimdLevel::Scalar
        }
    }

    /// Level to use for a requested id: never above what the CPU supports
    pub fn select(id: &str) -> Option<Self> {
        Self::parse(id).map(|requested| requested.min(Self::detect()))
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
