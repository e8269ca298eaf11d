//! Size policy of the blur chain.
//!
//! A chain of `K` iterations walks down a mip pyramid and back up:
//! step `i` renders at downsample level `pingpong(i, K - 1)`, i.e. at
//! `(W >> (level + 1), H >> (level + 1))`. Everything here is pure.

use frost_core::BLUR_ITERATION_RANGE;
use serde::Serialize;

/// Mirror `i` around `max`: `0, 1, .., max, max - 1, ..`.
///
/// Values past `2 * max` are not meaningful and saturate at zero.
pub fn pingpong(i: u32, max: u32) -> u32 {
    if i > max {
        (2 * max).saturating_sub(i)
    } else {
        i
    }
}

/// Shape of a blur chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChainVariant {
    /// `2K` steps: down, back up, and a last step at source resolution.
    UpsampleToSource,
    /// `2K - 1` steps ending at half resolution.
    DownsampleOnly,
}

impl ChainVariant {
    /// Number of steps for `iterations` (already clamped) iterations.
    pub fn step_count(&self, iterations: u32) -> usize {
        let steps = match self {
            ChainVariant::UpsampleToSource => (2 * iterations).max(1),
            ChainVariant::DownsampleOnly => (2 * iterations).saturating_sub(1).max(1),
        };
        steps as usize
    }
}

/// One step of a planned chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlurStep {
    pub index: usize,
    /// Downsample level, `None` for a step at source resolution.
    pub level: Option<u32>,
    pub width: u32,
    pub height: u32,
    /// A dimension shifted to zero and was clamped to one.
    pub clamped: bool,
}

/// Clamp an iteration count into the supported range.
pub fn clamp_iterations(iterations: u32) -> u32 {
    let clamped = iterations.clamp(*BLUR_ITERATION_RANGE.start(), *BLUR_ITERATION_RANGE.end());
    if clamped != iterations {
        tracing::warn!(iterations, clamped, "blur iteration count out of range");
    }
    clamped
}

/// Size of one downsample level of a `width x height` source, each side at least 1.
///
/// Returns the size and whether clamping was needed.
pub fn level_size(width: u32, height: u32, level: u32) -> ((u32, u32), bool) {
    let shift = level + 1;
    let w = width.checked_shr(shift).unwrap_or(0);
    let h = height.checked_shr(shift).unwrap_or(0);
    ((w.max(1), h.max(1)), w == 0 || h == 0)
}

/// Plan every step of a chain over a `width x height` source.
pub fn plan_chain(width: u32, height: u32, iterations: u32, variant: ChainVariant) -> Vec<BlurStep> {
    let iterations = clamp_iterations(iterations);
    let count = variant.step_count(iterations);
    let max_level = iterations - 1;

    (0..count)
        .map(|index| {
            let full_size = variant == ChainVariant::UpsampleToSource && index == count - 1;
            if full_size {
                return BlurStep {
                    index,
                    level: None,
                    width,
                    height,
                    clamped: false,
                };
            }
            let level = pingpong(index as u32, max_level);
            let ((w, h), clamped) = level_size(width, height, level);
            if clamped {
                tracing::debug!(
                    step = index,
                    level,
                    source_width = width,
                    source_height = height,
                    "degenerate blur step size, clamped to {}x{}",
                    w,
                    h
                );
            }
            BlurStep {
                index,
                level: Some(level),
                width: w,
                height: h,
                clamped,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pingpong_sequence() {
        let levels: Vec<u32> = (0..5).map(|i| pingpong(i, 2)).collect();
        assert_eq!(levels, vec![0, 1, 2, 1, 0]);
        assert_eq!(pingpong(0, 0), 0);
    }

    #[test]
    fn test_step_counts() {
        for k in 1..=5 {
            assert_eq!(ChainVariant::UpsampleToSource.step_count(k), 2 * k as usize);
            assert_eq!(ChainVariant::DownsampleOnly.step_count(k), 2 * k as usize - 1);
        }
    }

    #[test]
    fn test_full_hd_three_iterations() {
        let steps = plan_chain(1920, 1080, 3, ChainVariant::UpsampleToSource);
        assert_eq!(steps.len(), 6);
        let levels: Vec<Option<u32>> = steps.iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![Some(0), Some(1), Some(2), Some(1), Some(0), None]);
        assert_eq!((steps[0].width, steps[0].height), (960, 540));
        assert_eq!((steps[1].width, steps[1].height), (480, 270));
        assert_eq!((steps[2].width, steps[2].height), (240, 135));
        assert_eq!((steps[3].width, steps[3].height), (480, 270));
        assert_eq!((steps[4].width, steps[4].height), (960, 540));
        assert_eq!((steps[5].width, steps[5].height), (1920, 1080));
    }

    #[test]
    fn test_downsample_only_ends_at_half_size() {
        let steps = plan_chain(1920, 1080, 3, ChainVariant::DownsampleOnly);
        assert_eq!(steps.len(), 5);
        let last = steps[4];
        assert_eq!(last.level, Some(0));
        assert_eq!((last.width, last.height), (960, 540));
    }

    #[test]
    fn test_single_iteration() {
        let up = plan_chain(256, 256, 1, ChainVariant::UpsampleToSource);
        assert_eq!(up.len(), 2);
        assert_eq!((up[0].width, up[0].height), (128, 128));
        assert_eq!((up[1].width, up[1].height), (256, 256));

        let down = plan_chain(256, 256, 1, ChainVariant::DownsampleOnly);
        assert_eq!(down.len(), 1);
        assert_eq!((down[0].width, down[0].height), (128, 128));
    }

    #[test]
    fn test_iterations_clamped() {
        assert_eq!(plan_chain(64, 64, 0, ChainVariant::UpsampleToSource).len(), 2);
        assert_eq!(plan_chain(64, 64, 9, ChainVariant::UpsampleToSource).len(), 10);
    }

    #[test]
    fn test_degenerate_sizes_clamped_to_one() {
        let steps = plan_chain(4, 2, 3, ChainVariant::DownsampleOnly);
        // level 2 of a 4x2 source shifts both sides to zero
        let deepest = steps[2];
        assert_eq!(deepest.level, Some(2));
        assert_eq!((deepest.width, deepest.height), (1, 1));
        assert!(deepest.clamped);
        assert!(!steps[0].clamped);
        assert_eq!((steps[1].width, steps[1].height), (1, 1));
        assert!(steps[1].clamped);
    }

    proptest! {
        #[test]
        fn prop_pingpong_symmetric(max in 0u32..64, d in 0u32..64) {
            prop_assume!(d <= max);
            prop_assert_eq!(pingpong(max - d, max), pingpong(max + d, max));
        }

        #[test]
        fn prop_pingpong_identity_below_max(max in 0u32..64, i in 0u32..64) {
            prop_assume!(i <= max);
            prop_assert_eq!(pingpong(i, max), i);
        }

        #[test]
        fn prop_chain_sizes(width in 1u32..4096, height in 1u32..4096, k in 1u32..=5) {
            let steps = plan_chain(width, height, k, ChainVariant::UpsampleToSource);
            prop_assert_eq!(steps.len(), 2 * k as usize);
            let last = steps[steps.len() - 1];
            prop_assert_eq!((last.width, last.height), (width, height));
            for step in &steps[..steps.len() - 1] {
                let level = step.level.unwrap_or(0);
                prop_assert!(level < k);
                prop_assert!(step.width >= 1 && step.height >= 1);
                prop_assert_eq!(step.width, (width >> (level + 1)).max(1));
            }
        }
    }
}
