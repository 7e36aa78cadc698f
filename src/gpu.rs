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

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::json;
use thiserror::Error;

use crate::logger;

pub const DRM_ROOT: &str = "/sys/class/drm";
const DEBUGFS_DRI_ROOT: &str = "/sys/kernel/debug/dri";
const AMD_VENDOR_ID: &str = "0x1002";

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("read error: {0}")]
    Read(String),
    #[error("write error: {0}")]
    Write(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no AMD GPU found under /sys/class/drm")]
    NoDevice,
    #[error("fan control not available")]
    FanControlUnavailable,
}

fn read_err(path: &Path, e: io::Error) -> GpuError {
    GpuError::Read(format!("{}: {}", path.display(), e))
}

fn write_err(path: &Path, e: io::Error) -> GpuError {
    GpuError::Write(format!("{}: {}", path.display(), e))
}

fn parse_err(path: &Path, value: &str) -> GpuError {
    GpuError::Parse(format!("{}: '{}'", path.display(), value))
}

/// Hardware interface the control loop drives. One implementation per data
/// source; `RadeonGpu` is the sysfs-backed one.
#[cfg_attr(test, mockall::automock)]
pub trait GpuDevice {
    fn read_temperature(&self) -> Result<i32, GpuError>;
    fn apply_fan_duty(&mut self, duty_pct: u8) -> Result<(), GpuError>;
    fn fan_control_available(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerProfile {
    Battery,
    Balanced,
    Performance,
}

impl PowerProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerProfile::Battery => "battery",
            PowerProfile::Balanced => "balanced",
            PowerProfile::Performance => "performance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "battery" => Some(PowerProfile::Battery),
            "balanced" => Some(PowerProfile::Balanced),
            "performance" => Some(PowerProfile::Performance),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PowerProfile::Battery => PowerProfile::Balanced,
            PowerProfile::Balanced => PowerProfile::Performance,
            PowerProfile::Performance => PowerProfile::Battery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Auto,
    Low,
    High,
    Manual,
}

impl PerformanceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceLevel::Auto => "auto",
            PerformanceLevel::Low => "low",
            PerformanceLevel::High => "high",
            PerformanceLevel::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "auto" => Some(PerformanceLevel::Auto),
            "low" => Some(PerformanceLevel::Low),
            "high" => Some(PerformanceLevel::High),
            "manual" => Some(PerformanceLevel::Manual),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PerformanceLevel::Auto => PerformanceLevel::Low,
            PerformanceLevel::Low => PerformanceLevel::High,
            PerformanceLevel::High => PerformanceLevel::Auto,
            // Manual is only ever entered by external tooling; step back to auto.
            PerformanceLevel::Manual => PerformanceLevel::Auto,
        }
    }
}

/// One tick's worth of telemetry. Every field is optional; a node missing
/// from this card's sysfs tree simply stays None.
#[derive(Clone, Debug, Default)]
pub struct GpuSnapshot {
    pub temp_c: Option<i32>,
    pub fan_rpm: Option<u32>,
    pub fan_duty_pct: Option<u8>,
    pub sclk_mhz: Option<u32>,
    pub mclk_mhz: Option<u32>,
    pub vddc_mv: Option<u32>,
    pub load_pct: Option<u8>,
    pub power_profile: Option<PowerProfile>,
    pub perf_level: Option<PerformanceLevel>,
}

/// Values recovered from the driver's debugfs pm_info dump. Used as a
/// fallback when the dpm clock tables are absent (older radeon driver).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PmInfo {
    pub sclk_mhz: Option<u32>,
    pub mclk_mhz: Option<u32>,
    pub vddc_mv: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RadeonGpu {
    card: String,
    device_dir: PathBuf,
    hwmon_dir: Option<PathBuf>,
}

impl RadeonGpu {
    /// Build a handle from a drm device directory (`.../cardN/device`),
    /// resolving the chip's hwmon directory if one is registered.
    pub fn from_device_dir(card: &str, device_dir: PathBuf) -> Self {
        let hwmon_dir = resolve_hwmon_dir(&device_dir);
        Self {
            card: card.to_string(),
            device_dir,
            hwmon_dir,
        }
    }

    /// Enumerate AMD cards under `/sys/class/drm`.
    pub fn discover() -> Result<Vec<RadeonGpu>, GpuError> {
        Ok(discover_in(Path::new(DRM_ROOT)))
    }

    /// First AMD card in the system, the common single-GPU case.
    pub fn open_default() -> Result<RadeonGpu, GpuError> {
        Self::discover()?.into_iter().next().ok_or(GpuError::NoDevice)
    }

    /// Open a specific card by name ("card0").
    pub fn open(card: &str) -> Result<RadeonGpu, GpuError> {
        Self::discover()?
            .into_iter()
            .find(|g| g.card == card)
            .ok_or(GpuError::NoDevice)
    }

    pub fn card(&self) -> &str {
        &self.card
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    /// PCI id string like "1002:67DF" from the device uevent, for display.
    pub fn pci_id(&self) -> Option<String> {
        let uevent = read_trimmed(self.device_dir.join("uevent")).ok()?;
        for line in uevent.lines() {
            if let Some(id) = line.strip_prefix("PCI_ID=") {
                return Some(id.to_string());
            }
        }
        None
    }

    pub fn read_temperature(&self) -> Result<i32, GpuError> {
        let path = self.hwmon_file("temp1_input")?;
        let raw = read_trimmed(&path).map_err(|e| read_err(&path, e))?;
        let millideg = raw
            .parse::<i64>()
            .map_err(|_| parse_err(&path, &raw))?;
        Ok((millideg / 1000) as i32)
    }

    pub fn read_fan_rpm(&self) -> Result<u32, GpuError> {
        let path = self.hwmon_file("fan1_input")?;
        self.read_u64_at(&path).map(|v| v as u32)
    }

    pub fn read_fan_duty_pct(&self) -> Result<u8, GpuError> {
        let path = self.hwmon_file("pwm1")?;
        let raw = self.read_u64_at(&path)?;
        let max = self.pwm_max();
        Ok(((raw * 100 + max / 2) / max).min(100) as u8)
    }

    pub fn fan_control_available(&self) -> bool {
        match &self.hwmon_dir {
            Some(dir) => dir.join("pwm1").exists() && dir.join("pwm1_enable").exists(),
            None => false,
        }
    }

    /// Command a duty cycle. Forces the controller into manual mode first,
    /// then writes the raw value scaled by pwm1_max (255 when absent).
    pub fn set_fan_duty(&self, duty_pct: u8) -> Result<(), GpuError> {
        if !self.fan_control_available() {
            return Err(GpuError::FanControlUnavailable);
        }
        let dir = self.hwmon_dir.as_ref().ok_or(GpuError::FanControlUnavailable)?;
        let enable_path = dir.join("pwm1_enable");
        fs::write(&enable_path, "1").map_err(|e| write_err(&enable_path, e))?;

        let max = self.pwm_max();
        let raw = duty_to_raw(duty_pct, max);
        let pwm_path = dir.join("pwm1");
        fs::write(&pwm_path, raw.to_string()).map_err(|e| write_err(&pwm_path, e))?;

        logger::log_event(
            "pwm_write",
            json!({
                "card": self.card,
                "requested_pct": duty_pct,
                "written_raw": raw,
                "pwm_max": max,
            }),
        );
        Ok(())
    }

    /// Hand fan control back to the hardware's automatic controller.
    pub fn release_fan_to_auto(&self) -> Result<(), GpuError> {
        let path = self.hwmon_file("pwm1_enable")?;
        fs::write(&path, "2").map_err(|e| write_err(&path, e))?;
        logger::log_event("pwm_auto", json!({ "card": self.card }));
        Ok(())
    }

    pub fn read_sclk_mhz(&self) -> Result<u32, GpuError> {
        self.read_dpm_active("pp_dpm_sclk")
    }

    pub fn read_mclk_mhz(&self) -> Result<u32, GpuError> {
        self.read_dpm_active("pp_dpm_mclk")
    }

    pub fn read_load_pct(&self) -> Result<u8, GpuError> {
        let path = self.device_dir.join("gpu_busy_percent");
        self.read_u64_at(&path).map(|v| v.min(100) as u8)
    }

    pub fn read_vddc_mv(&self) -> Result<u32, GpuError> {
        let path = self.hwmon_file("in0_input")?;
        self.read_u64_at(&path).map(|v| v as u32)
    }

    pub fn read_power_profile(&self) -> Result<PowerProfile, GpuError> {
        let path = self.device_dir.join("power_dpm_state");
        let raw = read_trimmed(&path).map_err(|e| read_err(&path, e))?;
        PowerProfile::parse(&raw).ok_or_else(|| parse_err(&path, &raw))
    }

    pub fn set_power_profile(&self, profile: PowerProfile) -> Result<(), GpuError> {
        let path = self.device_dir.join("power_dpm_state");
        fs::write(&path, profile.as_str()).map_err(|e| write_err(&path, e))
    }

    pub fn read_performance_level(&self) -> Result<PerformanceLevel, GpuError> {
        let path = self.device_dir.join("power_dpm_force_performance_level");
        let raw = read_trimmed(&path).map_err(|e| read_err(&path, e))?;
        PerformanceLevel::parse(&raw).ok_or_else(|| parse_err(&path, &raw))
    }

    pub fn set_performance_level(&self, level: PerformanceLevel) -> Result<(), GpuError> {
        let path = self.device_dir.join("power_dpm_force_performance_level");
        fs::write(&path, level.as_str()).map_err(|e| write_err(&path, e))
    }

    /// Clock/voltage values from debugfs, when readable (root + mounted).
    pub fn read_pm_info(&self) -> Option<PmInfo> {
        let idx = self.card.strip_prefix("card")?;
        for name in ["amdgpu_pm_info", "radeon_pm_info"] {
            let path = Path::new(DEBUGFS_DRI_ROOT).join(idx).join(name);
            if let Ok(contents) = read_trimmed(&path) {
                return Some(parse_pm_info(&contents));
            }
        }
        None
    }

    /// Gather everything readable in one pass. Individual failures degrade
    /// to None so one missing node never blanks the whole dashboard.
    pub fn snapshot(&self) -> GpuSnapshot {
        let mut snap = GpuSnapshot {
            temp_c: self.read_temperature().ok(),
            fan_rpm: self.read_fan_rpm().ok(),
            fan_duty_pct: self.read_fan_duty_pct().ok(),
            sclk_mhz: self.read_sclk_mhz().ok(),
            mclk_mhz: self.read_mclk_mhz().ok(),
            vddc_mv: self.read_vddc_mv().ok(),
            load_pct: self.read_load_pct().ok(),
            power_profile: self.read_power_profile().ok(),
            perf_level: self.read_performance_level().ok(),
        };
        if snap.sclk_mhz.is_none() || snap.mclk_mhz.is_none() || snap.vddc_mv.is_none() {
            if let Some(pm) = self.read_pm_info() {
                snap.sclk_mhz = snap.sclk_mhz.or(pm.sclk_mhz);
                snap.mclk_mhz = snap.mclk_mhz.or(pm.mclk_mhz);
                snap.vddc_mv = snap.vddc_mv.or(pm.vddc_mv);
            }
        }
        snap
    }

    fn hwmon_file(&self, name: &str) -> Result<PathBuf, GpuError> {
        match &self.hwmon_dir {
            Some(dir) => Ok(dir.join(name)),
            None => Err(GpuError::Read(format!(
                "{}: no hwmon directory registered",
                self.device_dir.display()
            ))),
        }
    }

    fn pwm_max(&self) -> u64 {
        let Some(dir) = &self.hwmon_dir else { return 255 };
        match read_trimmed(dir.join("pwm1_max")) {
            Ok(s) => match s.parse::<u64>() {
                Ok(v) if v > 0 => v,
                _ => 255,
            },
            Err(_) => 255,
        }
    }

    fn read_dpm_active(&self, table: &str) -> Result<u32, GpuError> {
        let path = self.device_dir.join(table);
        let contents = read_trimmed(&path).map_err(|e| read_err(&path, e))?;
        parse_dpm_active_mhz(&contents).ok_or_else(|| parse_err(&path, &contents))
    }

    fn read_u64_at(&self, path: &Path) -> Result<u64, GpuError> {
        let raw = read_trimmed(path).map_err(|e| read_err(path, e))?;
        raw.parse::<u64>().map_err(|_| parse_err(path, &raw))
    }
}

impl GpuDevice for RadeonGpu {
    fn read_temperature(&self) -> Result<i32, GpuError> {
        RadeonGpu::read_temperature(self)
    }

    fn apply_fan_duty(&mut self, duty_pct: u8) -> Result<(), GpuError> {
        self.set_fan_duty(duty_pct)
    }

    fn fan_control_available(&self) -> bool {
        RadeonGpu::fan_control_available(self)
    }
}

/// Scan a drm class root for cards whose device reports the AMD vendor id.
pub fn discover_in(root: &Path) -> Vec<RadeonGpu> {
    let mut cards: Vec<String> = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for ent in entries.flatten() {
            let name = ent.file_name();
            let name = name.to_string_lossy().into_owned();
            // cardN only; skip connectors like card0-DP-1
            let Some(rest) = name.strip_prefix("card") else { continue };
            if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let vendor_path = root.join(&name).join("device").join("vendor");
            match read_trimmed(&vendor_path) {
                Ok(v) if v == AMD_VENDOR_ID => cards.push(name),
                _ => {}
            }
        }
    }
    cards.sort();
    cards
        .into_iter()
        .map(|card| {
            let device_dir = root.join(&card).join("device");
            RadeonGpu::from_device_dir(&card, device_dir)
        })
        .collect()
}

fn resolve_hwmon_dir(device_dir: &Path) -> Option<PathBuf> {
    let hwmon_root = device_dir.join("hwmon");
    let entries = fs::read_dir(hwmon_root).ok()?;
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs.into_iter().next()
}

fn read_trimmed<P: AsRef<Path>>(p: P) -> io::Result<String> {
    let mut s = String::new();
    fs::File::open(p)?.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}

fn duty_to_raw(duty_pct: u8, max: u64) -> u64 {
    u64::from(duty_pct.min(100)) * max / 100
}

/// Pick the active (starred) level out of a pp_dpm_sclk/mclk table:
/// ```text
/// 0: 300Mhz
/// 1: 1340Mhz *
/// ```
pub fn parse_dpm_active_mhz(table: &str) -> Option<u32> {
    for line in table.lines() {
        let line = line.trim();
        if !line.ends_with('*') {
            continue;
        }
        let rest = line.split(':').nth(1)?.trim();
        let freq = rest.trim_end_matches('*').trim().to_ascii_lowercase();
        let digits = freq.strip_suffix("mhz").unwrap_or(&freq).trim();
        return digits.parse::<u32>().ok();
    }
    None
}

/// Extract sclk/mclk/vddc from a debugfs pm_info dump. Tolerates both the
/// amdgpu format ("100 MHz (SCLK)") and the radeon format
/// ("current engine clock: 300780 kHz", "voltage: 850 mV").
pub fn parse_pm_info(contents: &str) -> PmInfo {
    let mut info = PmInfo::default();
    for line in contents.lines() {
        let lower = line.to_ascii_lowercase();
        if lower.contains("sclk") || lower.contains("engine clock") {
            if info.sclk_mhz.is_none() {
                info.sclk_mhz = parse_freq_mhz(&lower);
            }
        } else if lower.contains("mclk") || lower.contains("memory clock") {
            if info.mclk_mhz.is_none() {
                info.mclk_mhz = parse_freq_mhz(&lower);
            }
        } else if lower.contains("vddgfx") || lower.contains("vddc") || lower.contains("voltage") {
            if info.vddc_mv.is_none() {
                info.vddc_mv = parse_voltage_mv(&lower);
            }
        }
    }
    info
}

fn parse_freq_mhz(line: &str) -> Option<u32> {
    let toks: Vec<&str> = line.split_whitespace().collect();
    for (i, t) in toks.iter().enumerate() {
        if let Ok(v) = t.parse::<f64>() {
            match toks.get(i + 1) {
                Some(u) if u.starts_with("mhz") => return Some(v.round() as u32),
                Some(u) if u.starts_with("khz") => return Some((v / 1000.0).round() as u32),
                Some(u) if u.starts_with("ghz") => return Some((v * 1000.0).round() as u32),
                _ => continue,
            }
        }
    }
    None
}

fn parse_voltage_mv(line: &str) -> Option<u32> {
    let toks: Vec<&str> = line.split_whitespace().collect();
    for (i, t) in toks.iter().enumerate() {
        if let Ok(v) = t.parse::<f64>() {
            match toks.get(i + 1) {
                Some(u) if u.starts_with("mv") => return Some(v.round() as u32),
                Some(u) if u.starts_with('v') => return Some((v * 1000.0).round() as u32),
                _ => continue,
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Lay out a fake drm tree: cardN/device/{vendor,uevent,...} plus an
    /// hwmon chip directory with the usual amdgpu nodes.
    fn create_fake_card(root: &Path, card: &str, vendor: &str) -> PathBuf {
        let device = root.join(card).join("device");
        let hwmon = device.join("hwmon").join("hwmon3");
        fs::create_dir_all(&hwmon).unwrap();
        fs::write(device.join("vendor"), format!("{}\n", vendor)).unwrap();
        fs::write(device.join("uevent"), "DRIVER=amdgpu\nPCI_ID=1002:67DF\n").unwrap();
        fs::write(hwmon.join("temp1_input"), "45000\n").unwrap();
        fs::write(hwmon.join("fan1_input"), "1450\n").unwrap();
        fs::write(hwmon.join("pwm1"), "128\n").unwrap();
        fs::write(hwmon.join("pwm1_enable"), "2\n").unwrap();
        fs::write(hwmon.join("pwm1_max"), "255\n").unwrap();
        fs::write(hwmon.join("in0_input"), "850\n").unwrap();
        fs::write(device.join("gpu_busy_percent"), "37\n").unwrap();
        fs::write(device.join("power_dpm_state"), "balanced\n").unwrap();
        fs::write(device.join("power_dpm_force_performance_level"), "auto\n").unwrap();
        fs::write(
            device.join("pp_dpm_sclk"),
            "0: 300Mhz\n1: 608Mhz\n2: 1340Mhz *\n",
        )
        .unwrap();
        fs::write(device.join("pp_dpm_mclk"), "0: 300Mhz *\n1: 2000Mhz\n").unwrap();
        device
    }

    #[test]
    fn test_discover_filters_vendor_and_connectors() {
        let tmp = TempDir::new().unwrap();
        create_fake_card(tmp.path(), "card0", "0x1002");
        create_fake_card(tmp.path(), "card1", "0x10de");
        fs::create_dir_all(tmp.path().join("card0-DP-1")).unwrap();

        let gpus = discover_in(tmp.path());
        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].card(), "card0");
    }

    #[test]
    fn test_telemetry_reads() {
        let tmp = TempDir::new().unwrap();
        let device = create_fake_card(tmp.path(), "card0", "0x1002");
        let gpu = RadeonGpu::from_device_dir("card0", device);

        assert_eq!(gpu.read_temperature().unwrap(), 45);
        assert_eq!(gpu.read_fan_rpm().unwrap(), 1450);
        assert_eq!(gpu.read_fan_duty_pct().unwrap(), 50);
        assert_eq!(gpu.read_sclk_mhz().unwrap(), 1340);
        assert_eq!(gpu.read_mclk_mhz().unwrap(), 300);
        assert_eq!(gpu.read_load_pct().unwrap(), 37);
        assert_eq!(gpu.read_vddc_mv().unwrap(), 850);
        assert_eq!(gpu.read_power_profile().unwrap(), PowerProfile::Balanced);
        assert_eq!(gpu.read_performance_level().unwrap(), PerformanceLevel::Auto);
        assert_eq!(gpu.pci_id().as_deref(), Some("1002:67DF"));
    }

    #[test]
    fn test_set_fan_duty_forces_manual_and_scales() {
        let tmp = TempDir::new().unwrap();
        let device = create_fake_card(tmp.path(), "card0", "0x1002");
        let gpu = RadeonGpu::from_device_dir("card0", device.clone());
        assert!(gpu.fan_control_available());

        gpu.set_fan_duty(50).unwrap();
        let hwmon = device.join("hwmon").join("hwmon3");
        assert_eq!(fs::read_to_string(hwmon.join("pwm1_enable")).unwrap(), "1");
        assert_eq!(fs::read_to_string(hwmon.join("pwm1")).unwrap(), "127");

        gpu.release_fan_to_auto().unwrap();
        assert_eq!(fs::read_to_string(hwmon.join("pwm1_enable")).unwrap(), "2");
    }

    #[test]
    fn test_set_fan_duty_clamps_percent() {
        let tmp = TempDir::new().unwrap();
        let device = create_fake_card(tmp.path(), "card0", "0x1002");
        let gpu = RadeonGpu::from_device_dir("card0", device.clone());

        gpu.set_fan_duty(200).unwrap();
        let pwm = device.join("hwmon").join("hwmon3").join("pwm1");
        assert_eq!(fs::read_to_string(pwm).unwrap(), "255");
    }

    #[test]
    fn test_fan_control_unavailable_without_pwm_nodes() {
        let tmp = TempDir::new().unwrap();
        let device = create_fake_card(tmp.path(), "card0", "0x1002");
        let hwmon = device.join("hwmon").join("hwmon3");
        fs::remove_file(hwmon.join("pwm1_enable")).unwrap();

        let gpu = RadeonGpu::from_device_dir("card0", device);
        assert!(!gpu.fan_control_available());
        assert!(matches!(
            gpu.set_fan_duty(40),
            Err(GpuError::FanControlUnavailable)
        ));
    }

    #[test]
    fn test_snapshot_tolerates_missing_nodes() {
        let tmp = TempDir::new().unwrap();
        let device = create_fake_card(tmp.path(), "card0", "0x1002");
        fs::remove_file(device.join("gpu_busy_percent")).unwrap();
        fs::remove_file(device.join("pp_dpm_sclk")).unwrap();

        let gpu = RadeonGpu::from_device_dir("card0", device);
        let snap = gpu.snapshot();
        assert_eq!(snap.temp_c, Some(45));
        assert_eq!(snap.load_pct, None);
        assert_eq!(snap.sclk_mhz, None);
        assert_eq!(snap.mclk_mhz, Some(300));
    }

    #[test]
    fn test_parse_dpm_active_mhz() {
        assert_eq!(
            parse_dpm_active_mhz("0: 300Mhz\n1: 608Mhz\n2: 1340Mhz *"),
            Some(1340)
        );
        assert_eq!(parse_dpm_active_mhz("0: 300Mhz *\n1: 2000Mhz"), Some(300));
        assert_eq!(parse_dpm_active_mhz("0: 300Mhz\n1: 2000Mhz"), None);
        assert_eq!(parse_dpm_active_mhz(""), None);
    }

    #[test]
    fn test_parse_pm_info_amdgpu_format() {
        let dump = "\
GFX Clocks and Power:
\t300 MHz (MCLK)
\t850 MHz (SCLK)
\t987 mV (VDDGFX)
GPU Temperature: 46 C";
        let info = parse_pm_info(dump);
        assert_eq!(info.sclk_mhz, Some(850));
        assert_eq!(info.mclk_mhz, Some(300));
        assert_eq!(info.vddc_mv, Some(987));
    }

    #[test]
    fn test_parse_pm_info_radeon_format() {
        let dump = "\
default engine clock: 300000 kHz
current engine clock: 300780 kHz
default memory clock: 1000000 kHz
current memory clock: 150000 kHz
voltage: 850 mV
PCIE lanes: 16";
        let info = parse_pm_info(dump);
        assert_eq!(info.sclk_mhz, Some(300));
        assert_eq!(info.mclk_mhz, Some(1000));
        assert_eq!(info.vddc_mv, Some(850));
    }

    #[test]
    fn test_duty_to_raw() {
        assert_eq!(duty_to_raw(0, 255), 0);
        assert_eq!(duty_to_raw(50, 255), 127);
        assert_eq!(duty_to_raw(100, 255), 255);
        assert_eq!(duty_to_raw(100, 128), 128);
        assert_eq!(duty_to_raw(130, 255), 255);
    }

    #[test]
    fn test_power_profile_cycle_and_parse() {
        assert_eq!(PowerProfile::parse("balanced"), Some(PowerProfile::Balanced));
        assert_eq!(PowerProfile::parse("  performance\n"), Some(PowerProfile::Performance));
        assert_eq!(PowerProfile::parse("dynpm"), None);
        assert_eq!(PowerProfile::Battery.next(), PowerProfile::Balanced);
        assert_eq!(PowerProfile::Performance.next(), PowerProfile::Battery);
    }

    #[test]
    fn test_performance_level_parse() {
        assert_eq!(PerformanceLevel::parse("auto"), Some(PerformanceLevel::Auto));
        assert_eq!(PerformanceLevel::parse("manual"), Some(PerformanceLevel::Manual));
        assert_eq!(PerformanceLevel::parse("turbo"), None);
        assert_eq!(PerformanceLevel::Manual.next(), PerformanceLevel::Auto);
    }

    #[test]
    fn test_gpu_error_display() {
        let read = GpuError::Read("temp1_input: missing".into());
        assert!(format!("{}", read).contains("read error"));
        let write = GpuError::Write("pwm1: denied".into());
        assert!(format!("{}", write).contains("write error"));
        assert_eq!(
            format!("{}", GpuError::NoDevice),
            "no AMD GPU found under /sys/class/drm"
        );
    }
}
