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

use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::curve::{CurvePoint, FanCurve, DEFAULT_MIN_DUTY_PCT};

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FanControlMode {
    /// Leave the duty to the hardware's automatic controller.
    Hardware,
    /// Fixed duty set by the user; the loop does not touch the fan.
    Fixed,
    /// Curve-driven control loop.
    Curve,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FanProfile {
    pub name: String,
    pub points: Vec<CurvePoint>,
}

impl FanProfile {
    pub fn to_curve(&self) -> FanCurve {
        let pairs: Vec<(i32, u8)> = self.points.iter().map(|p| (p.temp_c, p.duty_pct)).collect();
        FanCurve::from_points(&pairs)
    }
}

fn default_profiles() -> Vec<FanProfile> {
    vec![FanProfile {
        name: "default".to_string(),
        points: vec![
            CurvePoint { temp_c: 30, duty_pct: 20 },
            CurvePoint { temp_c: 40, duty_pct: 30 },
            CurvePoint { temp_c: 50, duty_pct: 50 },
            CurvePoint { temp_c: 60, duty_pct: 70 },
            CurvePoint { temp_c: 70, duty_pct: 100 },
        ],
    }]
}

fn default_active_profile() -> String {
    "default".to_string()
}

// Matches the launch state of the hardware: automatic control until the
// user opts into a fixed duty or a curve.
fn default_control_mode() -> FanControlMode {
    FanControlMode::Hardware
}

fn default_fixed_duty() -> u8 {
    40
}

fn default_min_duty() -> u8 {
    DEFAULT_MIN_DUTY_PCT
}

fn default_interval_secs() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedConfig {
    #[serde(default = "default_profiles")]
    pub profiles: Vec<FanProfile>,
    #[serde(default = "default_active_profile")]
    pub active_profile: String,
    #[serde(default = "default_control_mode")]
    pub control_mode: FanControlMode,
    #[serde(default = "default_fixed_duty")]
    pub fixed_duty_pct: u8,
    /// Duty floor for curve output; keeps the fan from stalling.
    #[serde(default = "default_min_duty")]
    pub min_duty_pct: u8,
    /// Sampling cadence of the control loop and the TUI refresh, seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Optional card selector ("card0"); first AMD card when absent.
    #[serde(default)]
    pub card: Option<String>,
}

impl Default for SavedConfig {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            active_profile: default_active_profile(),
            control_mode: default_control_mode(),
            fixed_duty_pct: default_fixed_duty(),
            min_duty_pct: default_min_duty(),
            interval_secs: default_interval_secs(),
            card: None,
        }
    }
}

impl SavedConfig {
    pub fn profile(&self, name: &str) -> Option<&FanProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn active_curve(&self) -> Result<FanCurve, String> {
        let profile = self
            .profile(&self.active_profile)
            .ok_or_else(|| format!("active profile '{}' not found", self.active_profile))?;
        Ok(profile.to_curve())
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("radctl").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("radctl")
            .join("config.json");
    }
    PathBuf::from("/etc/radctl/config.json")
}

pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/radctl/profile.json")
}

pub fn load_saved_config() -> Option<SavedConfig> {
    let path = config_path();
    let data = fs::read_to_string(&path).ok()?;
    let cfg: SavedConfig = serde_json::from_str(&data).ok()?;
    validate_config(&cfg).ok()?;
    Some(cfg)
}

pub fn save_user_config(cfg: &SavedConfig) -> io::Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(cfg).unwrap_or_else(|_| "{}".to_string());
    fs::write(path, json)
}

pub fn write_system_config(cfg: &SavedConfig) -> io::Result<()> {
    validate_config(cfg).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let path = system_config_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(cfg).unwrap_or_else(|_| "{}".to_string());
    fs::write(&path, json)?;
    // Best-effort set permissions to 0644
    let perms = fs::Permissions::from_mode(0o644);
    let _ = fs::set_permissions(&path, perms);
    Ok(())
}

pub fn try_load_system_config() -> Result<SavedConfig, String> {
    let path = system_config_path();
    let data = fs::read_to_string(&path).map_err(|e| e.to_string())?;
    let cfg: SavedConfig = serde_json::from_str(&data).map_err(|e| format!("parse error: {}", e))?;
    validate_config(&cfg)?;
    Ok(cfg)
}

fn is_safe_name(s: &str) -> bool {
    if s.is_empty() || s.len() > 64 {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
}

pub fn validate_config(cfg: &SavedConfig) -> Result<(), String> {
    if cfg.profiles.is_empty() {
        return Err("at least one fan profile required".into());
    }
    if cfg.profiles.len() > 32 {
        return Err("too many fan profiles (max 32)".into());
    }
    for (i, p) in cfg.profiles.iter().enumerate() {
        if !is_safe_name(&p.name) {
            return Err(format!("invalid profile name in profile #{}", i + 1));
        }
        if cfg.profiles.iter().filter(|q| q.name == p.name).count() > 1 {
            return Err(format!("duplicate profile name '{}'", p.name));
        }
        if p.points.is_empty() {
            return Err(format!("profile '{}' has no curve points", p.name));
        }
        if p.points.len() > 32 {
            return Err(format!("profile '{}' has too many points (max 32)", p.name));
        }
        let mut last_t: Option<i32> = None;
        for point in &p.points {
            if point.duty_pct > 100 {
                return Err(format!("profile '{}': duty out of range (0..100)", p.name));
            }
            if let Some(t) = last_t {
                if point.temp_c <= t {
                    return Err(format!(
                        "profile '{}': points must be sorted by temperature and unique",
                        p.name
                    ));
                }
            }
            last_t = Some(point.temp_c);
        }
    }
    if cfg.profile(&cfg.active_profile).is_none() {
        return Err(format!("active profile '{}' not found", cfg.active_profile));
    }
    if cfg.fixed_duty_pct > 100 {
        return Err("fixed_duty_pct out of range (0..100)".into());
    }
    if cfg.min_duty_pct > 100 {
        return Err("min_duty_pct out of range (0..100)".into());
    }
    if cfg.interval_secs == 0 || cfg.interval_secs > 3600 {
        return Err("interval_secs out of range (1..3600)".into());
    }
    if let Some(card) = &cfg.card {
        let digits = card.strip_prefix("card").unwrap_or("");
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err("card must be of form 'cardN'".into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn create_test_config() -> SavedConfig {
        SavedConfig {
            profiles: vec![
                FanProfile {
                    name: "quiet".to_string(),
                    points: vec![
                        CurvePoint { temp_c: 20, duty_pct: 10 },
                        CurvePoint { temp_c: 40, duty_pct: 30 },
                        CurvePoint { temp_c: 60, duty_pct: 60 },
                    ],
                },
                FanProfile {
                    name: "aggressive".to_string(),
                    points: vec![
                        CurvePoint { temp_c: 30, duty_pct: 40 },
                        CurvePoint { temp_c: 60, duty_pct: 100 },
                    ],
                },
            ],
            active_profile: "quiet".to_string(),
            control_mode: FanControlMode::Curve,
            fixed_duty_pct: 40,
            min_duty_pct: 10,
            interval_secs: 1,
            card: Some("card0".to_string()),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = SavedConfig::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.min_duty_pct, 10);
        assert_eq!(cfg.interval_secs, 1);
        assert_eq!(cfg.control_mode, FanControlMode::Hardware);
        assert!(cfg.active_curve().is_ok());
    }

    #[test]
    fn test_validate_config_valid() {
        assert!(validate_config(&create_test_config()).is_ok());
    }

    #[test]
    fn test_validate_config_no_profiles() {
        let mut cfg = create_test_config();
        cfg.profiles.clear();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_duplicate_profile_names() {
        let mut cfg = create_test_config();
        cfg.profiles[1].name = "quiet".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_empty_curve_rejected() {
        let mut cfg = create_test_config();
        cfg.profiles[0].points.clear();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_unsorted_points() {
        let mut cfg = create_test_config();
        cfg.profiles[0].points = vec![
            CurvePoint { temp_c: 60, duty_pct: 60 },
            CurvePoint { temp_c: 20, duty_pct: 10 },
        ];
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_duplicate_temps() {
        let mut cfg = create_test_config();
        cfg.profiles[0].points = vec![
            CurvePoint { temp_c: 40, duty_pct: 20 },
            CurvePoint { temp_c: 40, duty_pct: 60 },
        ];
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_duty_out_of_range() {
        let mut cfg = create_test_config();
        cfg.profiles[0].points[0].duty_pct = 101;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_dangling_active_profile() {
        let mut cfg = create_test_config();
        cfg.active_profile = "missing".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_interval_bounds() {
        let mut cfg = create_test_config();
        cfg.interval_secs = 0;
        assert!(validate_config(&cfg).is_err());
        cfg.interval_secs = 3601;
        assert!(validate_config(&cfg).is_err());
        cfg.interval_secs = 5;
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_validate_config_bad_card_selector() {
        let mut cfg = create_test_config();
        cfg.card = Some("gpu0".to_string());
        assert!(validate_config(&cfg).is_err());
        cfg.card = Some("card".to_string());
        assert!(validate_config(&cfg).is_err());
        cfg.card = Some("card12".to_string());
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_validate_config_invalid_profile_name() {
        let mut cfg = create_test_config();
        cfg.profiles[0].name = "".to_string();
        assert!(validate_config(&cfg).is_err());
        cfg.profiles[0].name = "bad/name".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_active_curve_resolution() {
        let cfg = create_test_config();
        let curve = cfg.active_curve().unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.duty_at(50, 0).unwrap(), 45);
    }

    #[test]
    fn test_serde_roundtrip() {
        let cfg = create_test_config();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back: SavedConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.profiles, cfg.profiles);
        assert_eq!(back.active_profile, cfg.active_profile);
        assert_eq!(back.control_mode, cfg.control_mode);
        assert_eq!(back.card, cfg.card);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: SavedConfig = serde_json::from_str("{}").unwrap();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.active_profile, "default");
        assert_eq!(cfg.min_duty_pct, 10);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let res = serde_json::from_str::<SavedConfig>(r#"{"bogus": 1}"#);
        assert!(res.is_err());
    }

    #[test]
    #[serial]
    fn test_config_path_with_xdg() {
        std::env::set_var("XDG_CONFIG_HOME", "/custom/config");
        let path = config_path();
        assert!(path
            .to_string_lossy()
            .contains("/custom/config/radctl/config.json"));
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_config_path_with_home() {
        std::env::remove_var("XDG_CONFIG_HOME");
        std::env::set_var("HOME", "/home/testuser");
        let path = config_path();
        assert!(path
            .to_string_lossy()
            .contains("/home/testuser/.config/radctl/config.json"));
    }

    #[test]
    fn test_system_config_path() {
        assert_eq!(system_config_path(), PathBuf::from("/etc/radctl/profile.json"));
    }
}
