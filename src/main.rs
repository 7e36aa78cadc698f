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

mod app;
mod config;
mod curve;
mod events;
mod gpu;
mod logger;
mod sampler;
mod service;
mod system;
mod ui;

use std::io::stdout;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;

use app::App;
use config::{config_path, load_saved_config, write_system_config};
use events::handle_key_event;
use ui::ui;

fn main() -> anyhow::Result<()> {
    // Check if running as root
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("Error: radctl requires root privileges to control the fan and dpm state.");
        eprintln!(
            "Please run with: sudo {}",
            std::env::args().next().unwrap_or_else(|| "radctl".to_string())
        );
        std::process::exit(1);
    }

    let args: Vec<String> = std::env::args().collect();

    // Optional logging to /etc/radctl/logs.json
    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({
            "mode": "cli",
            "args": args,
        }));
    }

    // `radctl save` snapshots the user config to /etc/radctl/profile.json
    // so the service can pick it up, then exits
    if args.get(1).map(|s| s.as_str()) == Some("save") {
        match load_saved_config() {
            Some(saved) => {
                write_system_config(&saved)?;
                println!("Wrote config to /etc/radctl/profile.json");
                return Ok(());
            }
            None => {
                eprintln!(
                    "No user config found at {}. Adjust settings in the TUI first, then run: sudo radctl save",
                    config_path().display()
                );
                std::process::exit(1);
            }
        }
    }

    // Headless service mode: `radctl --service`
    if args.iter().any(|a| a == "--service") {
        system::load_gpu_modules();
        if logging_enabled {
            logger::log_event("service_mode", serde_json::json!({}));
        }
        return service::run_service();
    }

    system::load_gpu_modules();

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if logging_enabled {
        logger::log_event("tui_start", serde_json::json!({}));
    }
    let res = run_app(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
        if logging_enabled {
            logger::log_event("fatal_error", serde_json::json!({ "error": err.to_string() }));
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
) -> anyhow::Result<()> {
    let mut app = App::new();
    app.refresh();
    app.drive_fan();

    loop {
        // draw
        terminal.draw(|f| ui(f, &app))?;

        // tick
        let timeout = app
            .refresh_interval
            .saturating_sub(app.last_refresh.elapsed());
        if event::poll(timeout).unwrap_or(false) {
            if let Event::Key(key_event) = event::read()? {
                if handle_key_event(&mut app, key_event)? {
                    return Ok(());
                }
            }
        }

        if app.last_refresh.elapsed() >= app.refresh_interval {
            app.refresh();
            app.drive_fan();
        }
    }
}
