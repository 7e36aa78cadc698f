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

//! The periodic control loop: sample the temperature, debounce, look up the
//! curve, push the duty to the hardware. One tick per timer interval,
//! serially; ticks never overlap, and the active curve is snapshotted behind
//! an `Arc` so profile edits are only observed at tick boundaries.

use std::sync::Arc;

use thiserror::Error;

use crate::curve::{EmptyCurveError, FanCurve};
use crate::gpu::{GpuDevice, GpuError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanMode {
    /// Duty fixed by the user (or left to the hardware); ticks are no-ops.
    Manual,
    /// Duty driven from the curve on every temperature change.
    Automatic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Manual mode; the loop does not touch the hardware.
    Idle,
    /// Temperature identical to the previous tick; nothing written.
    Unchanged,
    /// Duty computed and written.
    Applied { temp_c: i32, duty_pct: u8 },
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    EmptyCurve(#[from] EmptyCurveError),
}

pub struct Sampler {
    curve: Arc<FanCurve>,
    min_duty_pct: u8,
    mode: FanMode,
    previous_temp: Option<i32>,
}

impl Sampler {
    pub fn new(curve: Arc<FanCurve>, min_duty_pct: u8) -> Self {
        Self {
            curve,
            min_duty_pct,
            mode: FanMode::Manual,
            previous_temp: None,
        }
    }

    pub fn mode(&self) -> FanMode {
        self.mode
    }

    pub fn curve(&self) -> &Arc<FanCurve> {
        &self.curve
    }

    /// Switch to curve-driven control. Rejected up front when the curve has
    /// no points; the loop must never start over an empty curve.
    pub fn enter_automatic(&mut self) -> Result<(), EmptyCurveError> {
        if self.curve.is_empty() {
            return Err(EmptyCurveError);
        }
        self.mode = FanMode::Automatic;
        self.previous_temp = None;
        Ok(())
    }

    /// Leave curve-driven control. Takes effect before the next tick's side
    /// effects; whoever owns the hardware decides what duty to leave behind.
    pub fn enter_manual(&mut self) {
        self.mode = FanMode::Manual;
        self.previous_temp = None;
    }

    /// Swap the active curve. The new curve is observed on the next tick;
    /// the debounce sentinel is reset so an unchanged temperature still
    /// picks up the new mapping.
    pub fn replace_curve(&mut self, curve: Arc<FanCurve>) {
        self.curve = curve;
        self.previous_temp = None;
    }

    /// One timer tick. Reads the temperature, suppresses the write when the
    /// reading is identical to the previous tick's, otherwise interpolates
    /// and applies. Errors propagate without retry; the previous reading is
    /// only advanced after a successful write, so the next scheduled tick
    /// is the retry.
    pub fn tick(&mut self, gpu: &mut dyn GpuDevice) -> Result<TickOutcome, TickError> {
        if self.mode != FanMode::Automatic {
            return Ok(TickOutcome::Idle);
        }

        let temp_c = gpu.read_temperature()?;
        if self.previous_temp == Some(temp_c) {
            return Ok(TickOutcome::Unchanged);
        }

        let duty_pct = self.curve.duty_at(temp_c, self.min_duty_pct)?;
        gpu.apply_fan_duty(duty_pct)?;
        self.previous_temp = Some(temp_c);
        Ok(TickOutcome::Applied { temp_c, duty_pct })
    }
}
