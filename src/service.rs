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

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use crate::config::{load_saved_config, try_load_system_config, FanControlMode, SavedConfig};
use crate::gpu::RadeonGpu;
use crate::logger;
use crate::sampler::Sampler;

/// Headless mode: drive the fan from the configured curve until killed.
/// Hardware/fixed modes are one-shot applications, not a loop.
pub fn run_service() -> Result<()> {
    eprintln!("radctl: starting service mode");

    // Prefer the system profile (written by `radctl save`); fall back to
    // the invoking user's config.
    let cfg: SavedConfig = match try_load_system_config() {
        Ok(c) => c,
        Err(_) => load_saved_config()
            .ok_or_else(|| anyhow!("no usable config found (run `radctl save` first)"))?,
    };

    let mut gpu = match &cfg.card {
        Some(card) => RadeonGpu::open(card),
        None => RadeonGpu::open_default(),
    }
    .context("GPU discovery")?;

    match cfg.control_mode {
        FanControlMode::Hardware => {
            gpu.release_fan_to_auto()
                .context("release fan to hardware control")?;
            eprintln!("radctl: fan left in hardware automatic mode");
            return Ok(());
        }
        FanControlMode::Fixed => {
            gpu.set_fan_duty(cfg.fixed_duty_pct)
                .context("apply fixed duty")?;
            eprintln!("radctl: applied fixed duty {}%", cfg.fixed_duty_pct);
            return Ok(());
        }
        FanControlMode::Curve => {}
    }

    if !gpu.fan_control_available() {
        return Err(anyhow!("fan control not available on {}", gpu.card()));
    }

    let curve = cfg.active_curve().map_err(|e| anyhow!(e))?;
    let mut sampler = Sampler::new(Arc::new(curve), cfg.min_duty_pct);
    sampler
        .enter_automatic()
        .context("curve mode activation")?;

    eprintln!(
        "radctl: driving {} from profile '{}' every {}s",
        gpu.card(),
        cfg.active_profile,
        cfg.interval_secs
    );
    logger::log_event(
        "service_start",
        json!({
            "card": gpu.card(),
            "profile": cfg.active_profile,
            "interval_secs": cfg.interval_secs,
        }),
    );

    let interval = Duration::from_secs(cfg.interval_secs);
    let mut last = Instant::now() - interval;

    loop {
        let now = Instant::now();
        if now.duration_since(last) < interval {
            thread::sleep(Duration::from_millis(50));
            continue;
        }
        last = now;

        if let Err(e) = sampler.tick(&mut gpu) {
            // Skip this tick; the next scheduled one is the retry.
            eprintln!("radctl: tick error: {}", e);
            logger::log_event("tick_error", json!({ "error": e.to_string() }));
        }
    }
}
