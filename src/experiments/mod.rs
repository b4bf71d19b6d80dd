/// Experiment configuration
pub mod configuration;
/// False positive rates of comparing estimates fitted on unequal sample sizes
pub mod imbalance;
/// Parameter recovery of the moment and maximum likelihood estimators
pub mod recovery;
/// Output directory handling, checkpoints and the order of the experiments
pub mod study;
/// Group-by-aggregate summaries of the result records
pub mod summary;

/// Derives an independent seed for a stream of random numbers, e.g. one cell or one
/// simulation, from the experiment seed and the coordinates of the stream (SplitMix64).
///
/// # Arguments
/// * `seed` - Experiment seed
/// * `coordinates` - Identifies the stream
///
pub fn derive_seed(seed: u64, coordinates: &[u64]) -> u64 {
    coordinates.iter().fold(split_mix(seed), |state, coordinate| {
        split_mix(state ^ split_mix(*coordinate))
    })
}

fn split_mix(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_seed() {
        assert_eq!(derive_seed(42, &[3, 20]), derive_seed(42, &[3, 20]));
        assert_ne!(derive_seed(42, &[3, 20]), derive_seed(42, &[20, 3]));
        assert_ne!(derive_seed(42, &[3, 20]), derive_seed(43, &[3, 20]));
        assert_ne!(derive_seed(42, &[0]), derive_seed(42, &[]));
    }
}
