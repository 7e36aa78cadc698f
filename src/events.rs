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

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

/// Keyboard dispatch. Returns Ok(true) when the app should exit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> anyhow::Result<bool> {
    let KeyEvent { code, modifiers, .. } = key_event;

    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(true);
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('m') => app.cycle_control_mode(),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => app.adjust_fixed_duty(5),
        KeyCode::Char('-') | KeyCode::Down => app.adjust_fixed_duty(-5),
        KeyCode::Char('[') => app.cycle_profile(false),
        KeyCode::Char(']') => app.cycle_profile(true),
        KeyCode::Char('p') => app.cycle_power_profile(),
        KeyCode::Char('l') => app.cycle_performance_level(),
        KeyCode::Char('s') => app.save(),
        KeyCode::Char('R') | KeyCode::Char('r') => app.refresh(),
        _ => {}
    }
    Ok(false)
}
