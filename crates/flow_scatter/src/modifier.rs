//! Parametric modifiers that vary size, rotation, spacing and spread along a
//! curve, and the pure evaluators that compose them at a position `t`.
//!
//! Composition:
//! - [`ModifierKind::Size`] and [`ModifierKind::Spacing`] multiply.
//! - [`ModifierKind::Rotation`] adds (degrees).
//! - [`ModifierKind::Spread`] overrides; the last applicable modifier in list order wins.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::noise::lerp;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    Size,
    Rotation,
    Spacing,
    Spread,
}

/// Response function over the modifier's local position in `[0, 1]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseCurve {
    Constant(f32),
    Linear {
        from: f32,
        to: f32,
    },
    /// Piecewise-linear through `(t, value)` keys; held flat beyond the ends.
    Keyframes(Vec<(f32, f32)>),
    Sine {
        base: f32,
        amplitude: f32,
        cycles: f32,
        phase: f32,
    },
}

impl ResponseCurve {
    pub fn value(&self, t: f32) -> f32 {
        match self {
            ResponseCurve::Constant(v) => *v,
            ResponseCurve::Linear { from, to } => lerp(*from, *to, t),
            ResponseCurve::Keyframes(keys) => keyframe_value(keys, t),
            ResponseCurve::Sine {
                base,
                amplitude,
                cycles,
                phase,
            } => base + amplitude * (std::f32::consts::TAU * (t * cycles + phase)).sin(),
        }
    }
}

fn keyframe_value(keys: &[(f32, f32)], t: f32) -> f32 {
    let Some(&(first_t, first_v)) = keys.first() else {
        return 0.0;
    };
    if t <= first_t {
        return first_v;
    }
    for pair in keys.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t <= t1 {
            let span = t1 - t0;
            return if span > 0.0 {
                lerp(v0, v1, (t - t0) / span)
            } else {
                v1
            };
        }
    }
    keys.last().map(|&(_, v)| v).unwrap_or(first_v)
}

/// Sub-interval of the curve a modifier applies to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TRange {
    pub start: f32,
    pub end: f32,
}

impl Default for TRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl TRange {
    pub const FULL: TRange = TRange {
        start: 0.0,
        end: 1.0,
    };

    pub fn new(start: f32, end: f32) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    #[inline]
    pub fn contains(&self, t: f32) -> bool {
        t >= self.start && t <= self.end
    }

    /// Position of `t` within the range, in `[0, 1]`.
    pub fn local(&self, t: f32) -> f32 {
        let span = self.end - self.start;
        if span > 0.0 {
            ((t - self.start) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub enabled: bool,
    pub range: TRange,
    pub curve: ResponseCurve,
}

impl Modifier {
    pub fn new(kind: ModifierKind, curve: ResponseCurve) -> Self {
        Self {
            kind,
            enabled: true,
            range: TRange::FULL,
            curve,
        }
    }

    pub fn size(curve: ResponseCurve) -> Self {
        Self::new(ModifierKind::Size, curve)
    }

    pub fn rotation(curve: ResponseCurve) -> Self {
        Self::new(ModifierKind::Rotation, curve)
    }

    pub fn spacing(curve: ResponseCurve) -> Self {
        Self::new(ModifierKind::Spacing, curve)
    }

    pub fn spread(curve: ResponseCurve) -> Self {
        Self::new(ModifierKind::Spread, curve)
    }

    pub fn with_range(mut self, start: f32, end: f32) -> Self {
        self.range = TRange::new(start, end);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Value at curve position `t`, or `None` when disabled or out of range.
    pub fn value_at(&self, t: f32) -> Option<f32> {
        if !self.enabled || !self.range.contains(t) {
            return None;
        }
        let v = self.curve.value(self.range.local(t));
        v.is_finite().then_some(v)
    }
}

fn applicable(modifiers: &[Modifier], kind: ModifierKind, t: f32) -> impl Iterator<Item = f32> + '_ {
    modifiers
        .iter()
        .filter(move |m| m.kind == kind)
        .filter_map(move |m| m.value_at(t))
}

/// Product of enabled size modifiers at `t`; `1.0` when none apply.
pub fn size_multiplier(t: f32, modifiers: &[Modifier]) -> f32 {
    applicable(modifiers, ModifierKind::Size, t).product()
}

/// Sum of enabled rotation modifiers at `t` in degrees; `0.0` when none apply.
pub fn rotation_offset(t: f32, modifiers: &[Modifier]) -> f32 {
    applicable(modifiers, ModifierKind::Rotation, t).sum()
}

/// Product of enabled spacing modifiers at `t`; `1.0` when none apply.
pub fn spacing_multiplier(t: f32, modifiers: &[Modifier]) -> f32 {
    applicable(modifiers, ModifierKind::Spacing, t).product()
}

/// Smallest spacing multiplier used when turning spacing into density.
pub const MIN_SPACING_MULTIPLIER: f32 = 0.01;

/// `density` at `t` after spacing modifiers: a spacing multiplier of `m`
/// places `1 / m` times as many shapes.
pub fn spaced_density(t: f32, modifiers: &[Modifier], density: f32) -> f32 {
    density / spacing_multiplier(t, modifiers).abs().max(MIN_SPACING_MULTIPLIER)
}

/// Spread width at `t`: `base` unless an enabled spread modifier applies, in
/// which case the last one in list order replaces it.
pub fn spread_width(t: f32, modifiers: &[Modifier], base: f32) -> f32 {
    applicable(modifiers, ModifierKind::Spread, t).fold(base, |_, v| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_modifiers() {
        assert_eq!(size_multiplier(0.3, &[]), 1.0);
        assert_eq!(rotation_offset(0.3, &[]), 0.0);
        assert_eq!(spacing_multiplier(0.3, &[]), 1.0);
        assert_eq!(spread_width(0.3, &[], 12.0), 12.0);
    }

    #[test]
    fn spacing_scales_density_inversely() {
        let mods = vec![Modifier::spacing(ResponseCurve::Constant(0.5)).with_range(0.0, 0.5)];
        assert_eq!(spaced_density(0.25, &mods, 2.0), 4.0);
        assert_eq!(spaced_density(0.75, &mods, 2.0), 2.0);
        let zero = vec![Modifier::spacing(ResponseCurve::Constant(0.0))];
        assert_eq!(spaced_density(0.5, &zero, 1.0), 100.0);
    }

    #[test]
    fn sizes_multiply() {
        let mods = vec![
            Modifier::size(ResponseCurve::Constant(2.0)),
            Modifier::size(ResponseCurve::Constant(2.0)),
        ];
        for t in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(size_multiplier(t, &mods), 4.0);
        }
    }

    #[test]
    fn rotations_add() {
        let mods = vec![
            Modifier::rotation(ResponseCurve::Constant(10.0)),
            Modifier::rotation(ResponseCurve::Constant(-5.0)),
        ];
        assert_eq!(rotation_offset(0.7, &mods), 5.0);
    }

    #[test]
    fn spacing_multiplies() {
        let mods = vec![
            Modifier::spacing(ResponseCurve::Constant(0.5)),
            Modifier::spacing(ResponseCurve::Constant(3.0)),
        ];
        assert_eq!(spacing_multiplier(0.1, &mods), 1.5);
    }

    #[test]
    fn last_spread_wins() {
        let mods = vec![
            Modifier::spread(ResponseCurve::Constant(4.0)),
            Modifier::spread(ResponseCurve::Constant(9.0)),
        ];
        assert_eq!(spread_width(0.5, &mods, 1.0), 9.0);
    }

    #[test]
    fn disabled_and_out_of_range_modifiers_are_ignored() {
        let mods = vec![
            Modifier::spread(ResponseCurve::Constant(4.0)),
            Modifier::spread(ResponseCurve::Constant(9.0)).with_enabled(false),
            Modifier::size(ResponseCurve::Constant(3.0)).with_range(0.5, 1.0),
        ];
        assert_eq!(spread_width(0.5, &mods, 1.0), 4.0);
        assert_eq!(size_multiplier(0.25, &mods), 1.0);
        assert_eq!(size_multiplier(0.75, &mods), 3.0);
    }

    #[test]
    fn overlapping_spread_ranges_resolve_by_list_order() {
        let mods = vec![
            Modifier::spread(ResponseCurve::Constant(4.0)).with_range(0.0, 0.6),
            Modifier::spread(ResponseCurve::Constant(9.0)).with_range(0.4, 1.0),
        ];
        assert_eq!(spread_width(0.2, &mods, 1.0), 4.0);
        assert_eq!(spread_width(0.5, &mods, 1.0), 9.0);
        assert_eq!(spread_width(0.8, &mods, 1.0), 9.0);
    }

    #[test]
    fn response_curves_evaluate_over_local_t() {
        let m = Modifier::size(ResponseCurve::Linear { from: 1.0, to: 3.0 }).with_range(0.5, 1.0);
        assert_eq!(m.value_at(0.5), Some(1.0));
        assert_eq!(m.value_at(0.75), Some(2.0));
        assert_eq!(m.value_at(0.25), None);

        let keys = ResponseCurve::Keyframes(vec![(0.0, 0.0), (0.5, 10.0), (1.0, 0.0)]);
        assert_eq!(keys.value(0.25), 5.0);
        assert_eq!(keys.value(0.5), 10.0);
        assert_eq!(keys.value(2.0), 0.0);
        assert_eq!(ResponseCurve::Keyframes(vec![]).value(0.5), 0.0);

        let sine = ResponseCurve::Sine {
            base: 1.0,
            amplitude: 0.5,
            cycles: 1.0,
            phase: 0.0,
        };
        assert!((sine.value(0.25) - 1.5).abs() < 1e-5);
    }

    #[test]
    fn evaluators_are_pure() {
        let mods = vec![Modifier::size(ResponseCurve::Linear { from: 0.5, to: 2.0 })];
        assert_eq!(size_multiplier(0.3, &mods), size_multiplier(0.3, &mods));
    }
}
