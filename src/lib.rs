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

//! Radctl - Monitoring and fan control for AMD Radeon GPUs on Linux
//!
//! This library provides the core functionality for reading GPU telemetry
//! through drm sysfs, interpolating user fan curves and driving the PWM
//! control loop.

pub mod app;
pub mod config;
pub mod curve;
pub mod events;
pub mod gpu;
pub mod logger;
pub mod sampler;
pub mod service;
pub mod system;
pub mod ui;
