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

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Gauge, List, ListItem, Paragraph, Sparkline};

use crate::app::App;
use crate::config::FanControlMode;

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(3),
        ])
        .split(size);

    render_header(f, app, rows[0]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(11), Constraint::Length(9)])
        .split(cols[0]);
    render_telemetry(f, app, left[0]);
    render_fan_control(f, app, left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(cols[1]);
    render_temp_graph(f, app, right[0]);
    render_clock_graph(f, app, right[1]);
    render_residency(f, app, right[2]);

    render_status(f, app, rows[2]);
}

fn fmt_or_dash<T: std::fmt::Display>(v: Option<T>, unit: &str) -> String {
    match v {
        Some(v) => format!("{}{}", v, unit),
        None => "—".to_string(),
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(" radctl — {} — kernel {} ", app.gpu_label, app.kernel_version);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(header, area);
}

fn render_telemetry(f: &mut Frame, app: &App, area: Rect) {
    let s = &app.snapshot;
    let lines = vec![
        format!("Temperature    {}", fmt_or_dash(s.temp_c, " °C")),
        format!("GPU clock      {}", fmt_or_dash(s.sclk_mhz, " MHz")),
        format!("Memory clock   {}", fmt_or_dash(s.mclk_mhz, " MHz")),
        format!("GPU voltage    {}", fmt_or_dash(s.vddc_mv, " mV")),
        format!("GPU load       {}", fmt_or_dash(s.load_pct, " %")),
        format!("Fan speed      {}", fmt_or_dash(s.fan_rpm, " RPM")),
        format!("Fan duty       {}", fmt_or_dash(s.fan_duty_pct, " %")),
        format!(
            "DPM state      {}",
            s.power_profile.map(|p| p.as_str()).unwrap_or("—")
        ),
        format!(
            "Perf level     {}",
            s.perf_level.map(|l| l.as_str()).unwrap_or("—")
        ),
    ];
    let items: Vec<ListItem> = lines.into_iter().map(ListItem::new).collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" GPU "),
    );
    f.render_widget(list, area);
}

fn render_fan_control(f: &mut Frame, app: &App, area: Rect) {
    let mode = match app.control_mode {
        FanControlMode::Hardware => "hardware auto",
        FanControlMode::Fixed => "fixed",
        FanControlMode::Curve => "curve",
    };
    let mut title = format!(" Fan Control [{}] ", mode);
    if app.degraded {
        title = format!(" Fan Control [{}] (degraded) ", mode);
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if app.degraded {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        })
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let profile = Paragraph::new(format!(
        "profile: {}   floor: {}%   fixed: {}%",
        app.config.active_profile, app.config.min_duty_pct, app.fixed_duty_pct
    ));
    f.render_widget(profile, chunks[0]);

    let points: String = app
        .sampler
        .curve()
        .points()
        .iter()
        .map(|p| format!("{}°→{}%", p.temp_c, p.duty_pct))
        .collect::<Vec<_>>()
        .join("  ");
    let curve_line = Paragraph::new(points).style(Style::default().fg(Color::Gray));
    f.render_widget(curve_line, chunks[1]);

    let duty = app.snapshot.fan_duty_pct.unwrap_or(0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(duty.min(100)))
        .label(format!("duty {}%", duty));
    f.render_widget(gauge, chunks[2]);
}

fn render_temp_graph(f: &mut Frame, app: &App, area: Rect) {
    let data: Vec<u64> = app.temp_history.iter().copied().collect();
    let title = format!(
        " Temperature {} ",
        fmt_or_dash(app.snapshot.temp_c, " °C")
    );
    let spark = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title),
        )
        .style(Style::default().fg(Color::Yellow))
        .data(&data);
    f.render_widget(spark, area);
}

fn render_clock_graph(f: &mut Frame, app: &App, area: Rect) {
    let data: Vec<u64> = app.sclk_history.iter().copied().collect();
    let title = format!(" Core clock {} ", fmt_or_dash(app.snapshot.sclk_mhz, " MHz"));
    let spark = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title),
        )
        .style(Style::default().fg(Color::Magenta))
        .data(&data);
    f.render_widget(spark, area);
}

fn render_residency(f: &mut Frame, app: &App, area: Rect) {
    let mut items: Vec<ListItem> = app
        .residency()
        .into_iter()
        .take(8)
        .map(|(state, pct)| ListItem::new(format!("{:>5.1}%  {}", pct, state)))
        .collect();
    if items.is_empty() {
        items.push(ListItem::new("(no clock data yet)"));
    }
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" Power State Residency "),
    );
    f.render_widget(list, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let style = if app.degraded {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut text = app.status.clone();
    if app.dirty {
        text.push_str("  [unsaved]");
    }
    let status = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" Status "),
    );
    f.render_widget(status, area);
}
