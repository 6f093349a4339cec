//! Property tests for the core primitives.

use danmaku_core::animation::{Animation, Fade, fade_out_factor};
use danmaku_core::{FrameClock, Rgba};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    /// Splitting time into many small frames never changes where the clock ends up.
    #[test]
    fn clock_is_split_invariant(steps in proptest::collection::vec(0u64..50_000, 1..200)) {
        let mut fine = FrameClock::new();
        for &us in &steps {
            fine.advance(Duration::from_micros(us));
        }
        let mut coarse = FrameClock::new();
        coarse.advance(Duration::from_micros(steps.iter().sum()));
        prop_assert_eq!(fine.now(), coarse.now());
    }

    /// Fade values are monotone non-decreasing and stay in [0, 1].
    #[test]
    fn fade_is_monotone(dur_ms in 1u64..2_000, steps in proptest::collection::vec(0u64..100, 1..100)) {
        let mut fade = Fade::new(Duration::from_millis(dur_ms));
        let mut last = fade.value();
        for &ms in &steps {
            fade.tick(Duration::from_millis(ms));
            let v = fade.value();
            prop_assert!((0.0..=1.0).contains(&v));
            prop_assert!(v >= last);
            last = v;
        }
    }

    /// The fade-out factor is always a valid opacity.
    #[test]
    fn fade_out_factor_bounded(remaining in 0u64..5_000, window in 0u64..5_000) {
        let f = fade_out_factor(Duration::from_millis(remaining), Duration::from_millis(window));
        prop_assert!((0.0..=1.0).contains(&f));
    }

    /// Scaling alpha never changes the hue channels.
    #[test]
    fn scale_alpha_preserves_rgb(packed in any::<u32>(), factor in -1.0f32..2.0) {
        let c = Rgba(packed);
        let s = c.scale_alpha(factor);
        prop_assert_eq!((s.r(), s.g(), s.b()), (c.r(), c.g(), c.b()));
        prop_assert!(s.a() <= c.a());
    }

    /// Compositing anything over an opaque destination yields an opaque color.
    #[test]
    fn over_opaque_stays_opaque(src in any::<u32>(), r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let out = Rgba(src).over(Rgba::rgb(r, g, b));
        prop_assert_eq!(out.a(), 255);
    }
}
