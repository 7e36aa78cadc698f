/*
 * This file is part of Radctl.
 *
 * Copyright (C) 2025 Radctl contributors
 *
 * Radctl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Radctl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Radctl. If not, see <https://www.gnu.org/licenses/>.
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Duty floor applied when no explicit value is configured. Keeps the fan
/// motor from being commanded below its reliable spin-up threshold.
pub const DEFAULT_MIN_DUTY_PCT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("fan curve has no calibration points")]
pub struct EmptyCurveError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurvePoint {
    pub temp_c: i32,
    pub duty_pct: u8,
}

/// Sparse temperature→duty calibration curve. Points are kept sorted
/// ascending by temperature and unique per temperature; both invariants are
/// maintained by `set_point`, so range queries can binary-search directly.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FanCurve {
    points: Vec<CurvePoint>,
}

/// Where a query temperature landed relative to the calibration points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bracket {
    /// The query hit a calibration point; its duty is honored exactly.
    Exact(u8),
    /// Curve has a single point and the query missed it.
    SinglePoint(u8),
    /// Query below the lowest point; clamp to its duty.
    BelowRange(u8),
    /// Query above the highest point; clamp to its duty.
    AboveRange(u8),
    /// Genuine two-point bracket; interpolate. `low.temp_c != high.temp_c`
    /// by construction, so the slope is always finite.
    Segment { low: CurvePoint, high: CurvePoint },
}

impl FanCurve {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: &[(i32, u8)]) -> Self {
        let mut curve = Self::new();
        for &(temp_c, duty_pct) in points {
            curve.set_point(temp_c, duty_pct);
        }
        curve
    }

    /// Insert a calibration point, replacing any existing point at the same
    /// temperature. Duty is clamped to 100.
    pub fn set_point(&mut self, temp_c: i32, duty_pct: u8) {
        let duty_pct = duty_pct.min(100);
        match self.points.binary_search_by_key(&temp_c, |p| p.temp_c) {
            Ok(i) => self.points[i].duty_pct = duty_pct,
            Err(i) => self.points.insert(i, CurvePoint { temp_c, duty_pct }),
        }
    }

    pub fn remove_point(&mut self, temp_c: i32) -> bool {
        match self.points.binary_search_by_key(&temp_c, |p| p.temp_c) {
            Ok(i) => {
                self.points.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn bracket(&self, temp_c: i32) -> Result<Bracket, EmptyCurveError> {
        if self.points.is_empty() {
            return Err(EmptyCurveError);
        }
        if self.points.len() == 1 {
            let only = self.points[0];
            return Ok(if only.temp_c == temp_c {
                Bracket::Exact(only.duty_pct)
            } else {
                Bracket::SinglePoint(only.duty_pct)
            });
        }
        Ok(match self.points.binary_search_by_key(&temp_c, |p| p.temp_c) {
            Ok(i) => Bracket::Exact(self.points[i].duty_pct),
            Err(0) => Bracket::BelowRange(self.points[0].duty_pct),
            Err(i) if i == self.points.len() => {
                Bracket::AboveRange(self.points[i - 1].duty_pct)
            }
            Err(i) => Bracket::Segment {
                low: self.points[i - 1],
                high: self.points[i],
            },
        })
    }

    /// Duty percent for the given temperature.
    ///
    /// A temperature matching a calibration point returns that point's duty
    /// exactly. Outside the calibrated range the nearest point's duty is
    /// returned (no slope extrapolation). Between two points the duty is the
    /// linear interpolation
    /// `(h_duty - l_duty) / (h_temp - l_temp) * (t - l_temp) + l_duty`,
    /// rounded to the nearest percent. The result is never below
    /// `min_duty_pct`, whichever branch produced it.
    pub fn duty_at(&self, temp_c: i32, min_duty_pct: u8) -> Result<u8, EmptyCurveError> {
        let duty = match self.bracket(temp_c)? {
            Bracket::Exact(d)
            | Bracket::SinglePoint(d)
            | Bracket::BelowRange(d)
            | Bracket::AboveRange(d) => d,
            Bracket::Segment { low, high } => {
                let slope = f64::from(i32::from(high.duty_pct) - i32::from(low.duty_pct))
                    / f64::from(high.temp_c - low.temp_c);
                let v = slope * f64::from(temp_c - low.temp_c) + f64::from(low.duty_pct);
                v.round().clamp(0.0, 100.0) as u8
            }
        };
        Ok(duty.max(min_duty_pct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_curve() -> FanCurve {
        FanCurve::from_points(&[(20, 10), (40, 30), (60, 60)])
    }

    #[test]
    fn test_exact_match_returns_point_duty() {
        let curve = create_test_curve();
        assert_eq!(curve.duty_at(20, 0).unwrap(), 10);
        assert_eq!(curve.duty_at(40, 0).unwrap(), 30);
        assert_eq!(curve.duty_at(60, 0).unwrap(), 60);
    }

    #[test]
    fn test_linear_interpolation_between_points() {
        let curve = create_test_curve();
        // (60-30)/(60-40)*(50-40)+30 = 45
        assert_eq!(curve.duty_at(50, 0).unwrap(), 45);
        // (30-10)/(40-20)*(30-20)+10 = 20
        assert_eq!(curve.duty_at(30, 0).unwrap(), 20);
    }

    #[test]
    fn test_clamp_below_and_above_range() {
        let curve = create_test_curve();
        assert_eq!(curve.duty_at(10, 0).unwrap(), 10);
        assert_eq!(curve.duty_at(-40, 0).unwrap(), 10);
        assert_eq!(curve.duty_at(80, 0).unwrap(), 60);
        assert_eq!(curve.duty_at(1000, 0).unwrap(), 60);
    }

    #[test]
    fn test_spec_scenario_with_default_floor() {
        let curve = create_test_curve();
        assert_eq!(curve.duty_at(40, DEFAULT_MIN_DUTY_PCT).unwrap(), 30);
        assert_eq!(curve.duty_at(50, DEFAULT_MIN_DUTY_PCT).unwrap(), 45);
        assert_eq!(curve.duty_at(10, DEFAULT_MIN_DUTY_PCT).unwrap(), 10);
        assert_eq!(curve.duty_at(80, DEFAULT_MIN_DUTY_PCT).unwrap(), 60);
    }

    #[test]
    fn test_single_point_curve() {
        let curve = FanCurve::from_points(&[(30, 5)]);
        // Floor applies uniformly: a 5% point is pulled up to the 10% floor.
        assert_eq!(curve.duty_at(30, 10).unwrap(), 10);
        assert_eq!(curve.duty_at(-10, 10).unwrap(), 10);
        assert_eq!(curve.duty_at(90, 10).unwrap(), 10);
        // Without a floor the point is honored everywhere.
        assert_eq!(curve.duty_at(30, 0).unwrap(), 5);
        assert_eq!(curve.duty_at(90, 0).unwrap(), 5);
    }

    #[test]
    fn test_floor_applies_between_points() {
        let curve = FanCurve::from_points(&[(20, 0), (40, 4)]);
        for t in 20..=40 {
            assert!(curve.duty_at(t, 10).unwrap() >= 10, "temp {} below floor", t);
        }
    }

    #[test]
    fn test_output_bounded_by_curve_duties_without_floor() {
        let curve = FanCurve::from_points(&[(10, 35), (35, 15), (50, 80), (90, 40)]);
        for t in -20..=120 {
            let duty = curve.duty_at(t, 0).unwrap();
            assert!((15..=80).contains(&duty), "temp {} gave {}", t, duty);
        }
    }

    #[test]
    fn test_non_monotonic_duty_interpolates_locally() {
        // Duty dips between the first and second point; interpolation is
        // local to the bracket regardless of global shape.
        let curve = FanCurve::from_points(&[(20, 50), (40, 20), (60, 80)]);
        assert_eq!(curve.duty_at(30, 0).unwrap(), 35);
        assert_eq!(curve.duty_at(50, 0).unwrap(), 50);
    }

    #[test]
    fn test_negative_temperatures() {
        let curve = FanCurve::from_points(&[(-20, 10), (0, 30)]);
        assert_eq!(curve.duty_at(-20, 0).unwrap(), 10);
        assert_eq!(curve.duty_at(-10, 0).unwrap(), 20);
        assert_eq!(curve.duty_at(5, 0).unwrap(), 30);
    }

    #[test]
    fn test_idempotent_queries() {
        let curve = create_test_curve();
        for t in [-5, 20, 33, 50, 61, 200] {
            assert_eq!(curve.duty_at(t, 10), curve.duty_at(t, 10));
        }
    }

    #[test]
    fn test_empty_curve_is_an_error() {
        let curve = FanCurve::new();
        assert_eq!(curve.duty_at(50, 10), Err(EmptyCurveError));
    }

    #[test]
    fn test_set_point_keeps_order_and_uniqueness() {
        let mut curve = FanCurve::new();
        curve.set_point(60, 80);
        curve.set_point(20, 10);
        curve.set_point(40, 30);
        let temps: Vec<i32> = curve.points().iter().map(|p| p.temp_c).collect();
        assert_eq!(temps, vec![20, 40, 60]);

        // Re-inserting an existing temperature replaces the duty.
        curve.set_point(40, 55);
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.duty_at(40, 0).unwrap(), 55);
    }

    #[test]
    fn test_set_point_clamps_duty() {
        let mut curve = FanCurve::new();
        curve.set_point(50, 255);
        assert_eq!(curve.duty_at(50, 0).unwrap(), 100);
    }

    #[test]
    fn test_remove_point() {
        let mut curve = create_test_curve();
        assert!(curve.remove_point(40));
        assert!(!curve.remove_point(40));
        assert_eq!(curve.len(), 2);
        // Old midpoint now interpolates across the remaining bracket.
        assert_eq!(curve.duty_at(40, 0).unwrap(), 35);
    }

    #[test]
    fn test_serde_roundtrip() {
        let curve = create_test_curve();
        let json = serde_json::to_string(&curve).unwrap();
        let back: FanCurve = serde_json::from_str(&json).unwrap();
        assert_eq!(back, curve);
    }
}
