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

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::config::{
    load_saved_config, save_user_config, try_load_system_config, FanControlMode, SavedConfig,
};
use crate::gpu::{GpuSnapshot, RadeonGpu};
use crate::logger;
use crate::sampler::{Sampler, TickOutcome};
use crate::system::{read_driver_name, read_kernel_version};

/// Graph window, in ticks.
pub const HISTORY_LEN: usize = 180;

pub struct App {
    pub last_refresh: Instant,
    pub refresh_interval: Duration,
    pub config: SavedConfig,
    pub gpu: Option<RadeonGpu>,
    pub sampler: Sampler,
    pub snapshot: GpuSnapshot,
    pub temp_history: VecDeque<u64>,
    pub sclk_history: VecDeque<u64>,
    pub control_mode: FanControlMode,
    pub fixed_duty_pct: u8,
    // power-state residency: "Core 1340 / Mem 2000 MHz" -> ticks observed
    pub pm_stats: HashMap<String, u64>,
    pub stats_ticks: u64,
    pub status: String,
    pub degraded: bool,
    pub dirty: bool,
    // header line
    pub gpu_label: String,
    pub kernel_version: String,
}

impl App {
    pub fn new() -> Self {
        let config = load_saved_config()
            .or_else(|| try_load_system_config().ok())
            .unwrap_or_default();

        let gpu = match &config.card {
            Some(card) => RadeonGpu::open(card).ok(),
            None => RadeonGpu::open_default().ok(),
        };

        // Load paths validate the config, so the active curve resolves; a
        // hand-edited file degrades to an empty curve, which curve mode
        // activation then refuses.
        let curve = config.active_curve().unwrap_or_default();
        let sampler = Sampler::new(Arc::new(curve), config.min_duty_pct);

        let gpu_label = match &gpu {
            Some(g) => {
                let driver = read_driver_name(g.device_dir()).unwrap_or_else(|| "?".into());
                match g.pci_id() {
                    Some(id) => format!("{} [{}] {}", g.card(), id, driver),
                    None => format!("{} {}", g.card(), driver),
                }
            }
            None => "no AMD GPU detected".to_string(),
        };

        let mut app = Self {
            last_refresh: Instant::now() - Duration::from_secs(10),
            refresh_interval: Duration::from_secs(config.interval_secs),
            control_mode: config.control_mode,
            fixed_duty_pct: config.fixed_duty_pct,
            config,
            gpu,
            sampler,
            snapshot: GpuSnapshot::default(),
            temp_history: VecDeque::with_capacity(HISTORY_LEN),
            sclk_history: VecDeque::with_capacity(HISTORY_LEN),
            pm_stats: HashMap::new(),
            stats_ticks: 0,
            status: String::from(
                "m: fan mode | +/-: fixed duty | [/]: profile | p: dpm state | l: perf level | s: save | q: quit",
            ),
            degraded: false,
            dirty: false,
            gpu_label,
            kernel_version: read_kernel_version(),
        };
        app.activate_saved_mode();
        app
    }

    /// Apply the configured fan mode once at startup. Hardware mode is left
    /// alone on purpose: the controller is already automatic after boot.
    fn activate_saved_mode(&mut self) {
        if self.gpu.is_none() {
            return;
        }
        match self.control_mode {
            FanControlMode::Curve => {
                if self.sampler.enter_automatic().is_err() {
                    self.control_mode = FanControlMode::Hardware;
                    self.status = "empty fan curve; staying in hardware mode".into();
                }
            }
            FanControlMode::Fixed => {
                let duty = self.fixed_duty_pct;
                self.apply_fixed_duty(duty);
            }
            FanControlMode::Hardware => {}
        }
    }

    /// Poll all telemetry and feed the graphs/stats. Called once per
    /// refresh interval and on manual refresh.
    pub fn refresh(&mut self) {
        if let Some(gpu) = &self.gpu {
            self.snapshot = gpu.snapshot();

            if let Some(t) = self.snapshot.temp_c {
                push_capped(&mut self.temp_history, t.max(0) as u64);
            }
            if let Some(clk) = self.snapshot.sclk_mhz {
                push_capped(&mut self.sclk_history, u64::from(clk));
            }

            if let (Some(sclk), Some(mclk)) = (self.snapshot.sclk_mhz, self.snapshot.mclk_mhz) {
                let key = format!("Core {} / Mem {} MHz", sclk, mclk);
                *self.pm_stats.entry(key).or_insert(0) += 1;
                self.stats_ticks += 1;
            }
        }
        self.last_refresh = Instant::now();
    }

    /// One control-loop tick. Errors degrade the status line and are logged;
    /// the next tick retries naturally.
    pub fn drive_fan(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else { return };
        match self.sampler.tick(gpu) {
            Ok(TickOutcome::Applied { temp_c, duty_pct }) => {
                self.degraded = false;
                self.status = format!("fan {}% @ {}°C", duty_pct, temp_c);
            }
            Ok(_) => {
                self.degraded = false;
            }
            Err(e) => {
                self.degraded = true;
                self.status = format!("fan control degraded: {}", e);
                logger::log_event("tick_error", json!({ "error": e.to_string() }));
            }
        }
    }

    pub fn cycle_control_mode(&mut self) {
        let next = match self.control_mode {
            FanControlMode::Hardware => FanControlMode::Fixed,
            FanControlMode::Fixed => FanControlMode::Curve,
            FanControlMode::Curve => FanControlMode::Hardware,
        };
        self.set_control_mode(next);
    }

    pub fn set_control_mode(&mut self, mode: FanControlMode) {
        match mode {
            FanControlMode::Curve => {
                if self.sampler.enter_automatic().is_err() {
                    self.status = "cannot enable curve mode: fan curve is empty".into();
                    return;
                }
                self.status = format!("curve mode ({})", self.config.active_profile);
            }
            FanControlMode::Fixed => {
                self.sampler.enter_manual();
                let duty = self.fixed_duty_pct;
                self.apply_fixed_duty(duty);
            }
            FanControlMode::Hardware => {
                self.sampler.enter_manual();
                if let Some(gpu) = &self.gpu {
                    match gpu.release_fan_to_auto() {
                        Ok(()) => self.status = "fan returned to hardware control".into(),
                        Err(e) => self.status = format!("hardware mode: {}", e),
                    }
                }
            }
        }
        self.control_mode = mode;
        self.config.control_mode = mode;
        self.dirty = true;
    }

    pub fn adjust_fixed_duty(&mut self, delta: i16) {
        if self.control_mode != FanControlMode::Fixed {
            return;
        }
        let duty = (i16::from(self.fixed_duty_pct) + delta).clamp(0, 100) as u8;
        self.fixed_duty_pct = duty;
        self.config.fixed_duty_pct = duty;
        self.dirty = true;
        self.apply_fixed_duty(duty);
    }

    fn apply_fixed_duty(&mut self, duty: u8) {
        if let Some(gpu) = &self.gpu {
            match gpu.set_fan_duty(duty) {
                Ok(()) => self.status = format!("fixed duty {}%", duty),
                Err(e) => self.status = format!("fixed duty {}%: {}", duty, e),
            }
        }
    }

    pub fn cycle_profile(&mut self, forward: bool) {
        let n = self.config.profiles.len();
        if n == 0 {
            return;
        }
        let current = self
            .config
            .profiles
            .iter()
            .position(|p| p.name == self.config.active_profile)
            .unwrap_or(0);
        let next = if forward { (current + 1) % n } else { (current + n - 1) % n };
        let profile = &self.config.profiles[next];
        self.config.active_profile = profile.name.clone();
        self.sampler.replace_curve(Arc::new(profile.to_curve()));
        self.dirty = true;
        self.status = format!("fan profile: {}", self.config.active_profile);
    }

    pub fn cycle_power_profile(&mut self) {
        let Some(gpu) = &self.gpu else { return };
        let next = match self.snapshot.power_profile {
            Some(p) => p.next(),
            None => {
                self.status = "power profile not readable".into();
                return;
            }
        };
        match gpu.set_power_profile(next) {
            Ok(()) => {
                self.snapshot.power_profile = Some(next);
                self.status = format!("power profile: {}", next.as_str());
            }
            Err(e) => self.status = format!("power profile: {}", e),
        }
    }

    pub fn cycle_performance_level(&mut self) {
        let Some(gpu) = &self.gpu else { return };
        let next = match self.snapshot.perf_level {
            Some(l) => l.next(),
            None => {
                self.status = "performance level not readable".into();
                return;
            }
        };
        match gpu.set_performance_level(next) {
            Ok(()) => {
                self.snapshot.perf_level = Some(next);
                self.status = format!("performance level: {}", next.as_str());
            }
            Err(e) => self.status = format!("performance level: {}", e),
        }
    }

    pub fn save(&mut self) {
        match save_user_config(&self.config) {
            Ok(()) => {
                self.dirty = false;
                self.status = "config saved".into();
            }
            Err(e) => self.status = format!("save failed: {}", e),
        }
    }

    /// Share of ticks spent in each power state, highest first.
    pub fn residency(&self) -> Vec<(String, f64)> {
        if self.stats_ticks == 0 {
            return Vec::new();
        }
        let mut out: Vec<(String, f64)> = self
            .pm_stats
            .iter()
            .map(|(k, v)| (k.clone(), *v as f64 * 100.0 / self.stats_ticks as f64))
            .collect();
        out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        out
    }
}

fn push_capped(buf: &mut VecDeque<u64>, value: u64) {
    if buf.len() == HISTORY_LEN {
        buf.pop_front();
    }
    buf.push_back(value);
}
