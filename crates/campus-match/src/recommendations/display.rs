use super::domain::Candidate;
use super::normalizer::NameKey;
use super::tables::InstitutionTables;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a. Stable across runs and platforms, unlike `DefaultHasher`.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic in-band probability for an identity under its tier.
pub fn stable_band_probability(key: &NameKey, low: u8, high: u8) -> u8 {
    let width = u64::from(high.saturating_sub(low)) + 1;
    let offset = fnv1a64(key.as_str().as_bytes()) % width;
    // offset < width <= 256, and low + offset <= high
    low.saturating_add(offset as u8)
}

/// Keeps every shown probability inside its final tier's band.
pub fn normalize_display(candidates: &mut [Candidate], tables: &InstitutionTables) {
    for candidate in candidates.iter_mut() {
        let tier = candidate.tier;
        let in_band = candidate
            .admission_probability
            .is_some_and(|probability| tier.accepts(probability));
        if in_band {
            continue;
        }

        let (low, high) = tier.display_band();
        let key = tables.key_for(&candidate.name);
        let shown = stable_band_probability(&key, low, high);
        tracing::debug!(
            name = %candidate.name,
            tier = tier.label(),
            previous = ?candidate.admission_probability,
            shown,
            "normalized display probability"
        );
        candidate.admission_probability = Some(shown);
    }
}
