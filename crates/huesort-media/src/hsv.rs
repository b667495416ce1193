//! 8-bit RGB to HSV conversion.
//!
//! Bit-exact with OpenCV's `COLOR_RGB2HSV` for 8-bit images: hue in
//! half-degree units over `[0, 179]`, saturation and value over `[0, 255]`.
//! Divisions go through the same 12-bit fixed-point reciprocal tables, so
//! pixels on a threshold edge land on the same side OpenCV puts them.

const HSV_SHIFT: u32 = 12;
const HALF: i32 = 1 << (HSV_SHIFT - 1);

/// `round(n / d)` with ties to even, as `cvRound` does.
const fn div_round_even(n: i32, d: i32) -> i32 {
    let q = n / d;
    let r = n % d;
    if 2 * r > d || (2 * r == d && q % 2 == 1) {
        q + 1
    } else {
        q
    }
}

/// `SAT_DIV[v] = round((255 << 12) / v)`
const SAT_DIV: [i32; 256] = {
    let mut table = [0; 256];
    let mut i = 1;
    while i < 256 {
        table[i] = div_round_even(255 << HSV_SHIFT, i as i32);
        i += 1;
    }
    table
};

/// `HUE_DIV[diff] = round((180 << 12) / (6 * diff))`
const HUE_DIV: [i32; 256] = {
    let mut table = [0; 256];
    let mut i = 1;
    while i < 256 {
        table[i] = div_round_even(180 << HSV_SHIFT, 6 * i as i32);
        i += 1;
    }
    table
};

/// One pixel in HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert one sRGB pixel.
#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (ri, gi, bi) = (r as i32, g as i32, b as i32);
    let v = ri.max(gi).max(bi);
    let diff = v - ri.min(gi).min(bi);

    let s = (diff * SAT_DIV[v as usize] + HALF) >> HSV_SHIFT;

    // Sextant position scaled so a full turn is 6 * diff
    let sextant = if v == ri {
        gi - bi
    } else if v == gi {
        bi - ri + 2 * diff
    } else {
        ri - gi + 4 * diff
    };

    // Arithmetic shift floors negative values, then red-side hues wrap
    let mut h = (sextant * HUE_DIV[diff as usize] + HALF) >> HSV_SHIFT;
    if h < 0 {
        h += 180;
    }

    Hsv {
        h: h as u8,
        s: s as u8,
        v: v as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huesort_models::HUE_MAX;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv { h: 120, s: 255, v: 255 });
    }

    #[test]
    fn test_secondary_colors() {
        assert_eq!(rgb_to_hsv(255, 255, 0).h, 30);
        assert_eq!(rgb_to_hsv(0, 255, 255).h, 90);
        assert_eq!(rgb_to_hsv(255, 0, 255).h, 150);
    }

    #[test]
    fn test_named_reference_colors() {
        // orange
        assert_eq!(rgb_to_hsv(255, 165, 0).h, 19);
        // purple
        let purple = rgb_to_hsv(128, 0, 128);
        assert_eq!(purple.h, 150);
        assert_eq!(purple.v, 128);
        assert_eq!(purple.s, 255);
    }

    #[test]
    fn test_fixed_point_rounding() {
        assert_eq!(rgb_to_hsv(0, 1, 58).h, 120);
        assert_eq!(rgb_to_hsv(255, 0, 85).h, 170);
        assert_eq!(rgb_to_hsv(255, 0, 10).h, 179);
        // magenta lands on 150, not 151
        assert_eq!(rgb_to_hsv(255, 0, 255).h, 150);
    }

    #[test]
    fn test_reciprocal_tables() {
        assert_eq!(SAT_DIV[0], 0);
        assert_eq!(SAT_DIV[1], 255 << HSV_SHIFT);
        assert_eq!(SAT_DIV[58], 18008);
        assert_eq!(HUE_DIV[128], 960);
        assert_eq!(HUE_DIV[255], 482);
    }

    #[test]
    fn test_grays_have_no_saturation() {
        for level in [0u8, 1, 77, 128, 254, 255] {
            let hsv = rgb_to_hsv(level, level, level);
            assert_eq!(hsv.h, 0);
            assert_eq!(hsv.s, 0);
            assert_eq!(hsv.v, level);
        }
    }

    #[test]
    fn test_hue_just_below_red_wraps_high() {
        // Red dominant with blue > green lands at the top of the hue circle
        let hsv = rgb_to_hsv(255, 0, 10);
        assert!(hsv.h >= 170, "hue was {}", hsv.h);
        assert!(hsv.h <= HUE_MAX);
    }

    #[test]
    fn test_hue_never_exceeds_max() {
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(15) {
                for b in (0..=255u16).step_by(15) {
                    let hsv = rgb_to_hsv(r as u8, g as u8, b as u8);
                    assert!(hsv.h <= HUE_MAX, "({}, {}, {}) gave {}", r, g, b, hsv.h);
                }
            }
        }
    }
}
