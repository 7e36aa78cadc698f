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
use std::process::Command;

/// Load the AMD display driver modules if they are not already present.
/// Harmless when built in or already loaded.
pub fn load_gpu_modules() {
    for module in ["amdgpu", "radeon"] {
        let _ = Command::new("modprobe").arg("-q").arg(module).output();
    }
}

pub fn read_kernel_version() -> String {
    fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Kernel driver bound to a drm device directory, from its uevent.
pub fn read_driver_name(device_dir: &std::path::Path) -> Option<String> {
    let uevent = fs::read_to_string(device_dir.join("uevent")).ok()?;
    for line in uevent.lines() {
        if let Some(drv) = line.strip_prefix("DRIVER=") {
            return Some(drv.trim().to_string());
        }
    }
    None
}
