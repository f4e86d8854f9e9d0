//! 16-bit to 8-bit intensity rescaling
//!
//! Depth and IR samples are 16-bit; displays and the video encoder want
//! 8-bit. The mapping is a linear rescale of `[lower, upper]` onto
//! `[0, 255]`, applied through a lookup table so repeated calls with the
//! same input are byte-identical.

use crate::error::PlayerError;

/// Map 16-bit samples to 8-bit
///
/// Bounds default to the observed minimum/maximum of `samples` when
/// omitted. Values at or below `lower` map to 0, at or above `upper` to
/// 255, and everything between linearly with rounding. Requires
/// `lower < upper`, otherwise fails with an invalid-range error.
pub fn normalize_u16(
    samples: &[u16],
    lower: Option<u16>,
    upper: Option<u16>,
) -> Result<Vec<u8>, PlayerError> {
    if samples.is_empty() {
        return Err(PlayerError::InvalidRange(
            "cannot normalize an empty image".to_string(),
        ));
    }

    let lower = match lower {
        Some(v) => v,
        None => samples.iter().copied().min().unwrap_or(0),
    };
    let upper = match upper {
        Some(v) => v,
        None => samples.iter().copied().max().unwrap_or(0),
    };

    if lower >= upper {
        return Err(PlayerError::InvalidRange(format!(
            "lower bound {} must be smaller than upper bound {}",
            lower, upper
        )));
    }

    let lut = build_lut(lower, upper);
    Ok(samples.iter().map(|&s| lut[s as usize]).collect())
}

/// Lookup table over the full 16-bit sample range
fn build_lut(lower: u16, upper: u16) -> Vec<u8> {
    let lower = u32::from(lower);
    let upper = u32::from(upper);
    let span = (upper - lower) as f64;

    (0u32..=u32::from(u16::MAX))
        .map(|v| {
            if v <= lower {
                0
            } else if v >= upper {
                255
            } else {
                ((v - lower) as f64 * 255.0 / span).round() as u8
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_bounds_map_to_full_range() {
        let out = normalize_u16(&[500, 2000], Some(500), Some(2000)).unwrap();
        assert_eq!(out, vec![0, 255]);
    }

    #[test]
    fn test_values_outside_bounds_saturate() {
        let out = normalize_u16(&[400, 2500], Some(500), Some(2000)).unwrap();
        assert_eq!(out, vec![0, 255]);
    }

    #[test]
    fn test_midpoint_rounds() {
        // (1250 - 500) / 1500 * 255 = 127.5
        let out = normalize_u16(&[1250], Some(500), Some(2000)).unwrap();
        assert!(out[0] == 127 || out[0] == 128);
    }

    #[test]
    fn test_default_bounds_use_image_min_max() {
        let out = normalize_u16(&[1200, 800, 4000], None, None).unwrap();
        assert_eq!(out[1], 0);
        assert_eq!(out[2], 255);
    }

    #[test]
    fn test_monotonic() {
        let samples: Vec<u16> = (0..=255).map(|v| v * 257).collect();
        let out = normalize_u16(&samples, Some(100), Some(60000)).unwrap();
        for pair in out.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_deterministic() {
        let samples: Vec<u16> = (0..1000).map(|v| (v * 37) % 65521).collect();
        let a = normalize_u16(&samples, Some(10), Some(60000)).unwrap();
        let b = normalize_u16(&samples, Some(10), Some(60000)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(matches!(
            normalize_u16(&[1, 2], Some(2000), Some(500)),
            Err(PlayerError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_equal_bounds_rejected() {
        assert!(matches!(
            normalize_u16(&[1, 2], Some(500), Some(500)),
            Err(PlayerError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_constant_image_with_default_bounds_rejected() {
        // min == max, the linear span collapses
        assert!(normalize_u16(&[700; 16], None, None).is_err());
    }

    #[test]
    fn test_empty_image_rejected() {
        assert!(normalize_u16(&[], None, None).is_err());
    }
}
