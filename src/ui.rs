//! UI rendering for the terminal front-end.
//!
//! Everything drawn here comes from `App`, which is in turn fed by player
//! events and the settings store.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::App;
use crate::config::ControlsSettings;
use crate::player::TransportState;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("enter", "play selected");
    map.insert("space", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L is filled in from config.
    map.insert("+/-", "volume");
    map.insert("m", "mute");
    map.insert("s", "shuffle");
    map.insert("r", "repeat");
    map.insert("c", "crossfade");
    map.insert("n", "normalize");
    map.insert("e", "preset");
    map.insert("a", "play next");
    map.insert("x", "remove");
    map.insert("/", "search");
    map.insert("S", "stop");
    map.insert("C", "clear cache");
    map.insert("o", "next folder");
    map.insert("R", "rescan");
    map.insert("p", "pin folder");
    map.insert("F", "restart folder");
    map.insert("D", "forget folder");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "enter", "space", "h/l", "H/L", "+/-", "m", "s", "r", "c", "n", "e", "a", "x",
        "/", "S", "C", "o", "R", "p", "F", "D", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format seconds as `MM:SS`.
fn format_mmss(seconds: f64) -> String {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn status_text(app: &App) -> String {
    let p = &app.playback;
    let volume = if p.muted {
        "muted".to_string()
    } else {
        format!("{:.0}%", p.volume * 100.0)
    };
    let crossfade = if p.crossfade_seconds > 0.0 {
        format!("{:.0}s", p.crossfade_seconds)
    } else {
        "off".to_string()
    };

    let mut parts = vec![
        format!("VOL: {volume}"),
        format!("SHUFFLE: {}", on_off(p.shuffle)),
        format!("REPEAT: {}", p.repeat_mode),
        format!("XFADE: {crossfade}"),
        format!("NORMALIZE: {}", on_off(p.normalization)),
        format!("PRESET: {}", p.preset),
    ];
    if !app.follow_playback {
        parts.push("CURSOR: free-roam".to_string());
    }
    if app.folder.is_some() {
        let pin = if app.pinned { " [pinned]" } else { "" };
        parts.push(format!("DIR: {}{pin}", app.folder_label));
    }
    parts.join(" • ")
}

fn now_playing_text(app: &App) -> String {
    let state = match app.transport {
        TransportState::Playing => "▶",
        TransportState::Paused => "⏸",
        TransportState::Stopped => "■",
        TransportState::Error => "✖",
    };
    match &app.now_playing {
        Some(track) => format!("{state} {}", track.display),
        None => format!("{state} nothing playing"),
    }
}

/// Render the entire UI into `frame`.
pub fn draw(frame: &mut Frame, app: &App, controls: &ControlsSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(now_playing_text(app))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" localify ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let mut status = status_text(app);
    if let Some(msg) = &app.status {
        status.push('\n');
        status.push_str(msg);
    }
    let status_par = Paragraph::new(status)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let label = format!(
        "{} / {}",
        format_mmss(app.position),
        format_mmss(app.duration)
    );
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" position "))
        .ratio(app.progress_ratio())
        .label(label);
    frame.render_widget(gauge, chunks[2]);

    // Queue list
    {
        // Only build ListItems for the visible window, centred on the selection.
        let total = app.queue.len();
        let list_height = chunks[3].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = (start..end)
            .map(|i| {
                let track = &app.queue[i];
                if app.is_now_playing(i) {
                    ListItem::new(format!("♪ {}", track.display)).bold()
                } else {
                    ListItem::new(format!("  {}", track.display))
                }
            })
            .collect();

        let title = if app.search_mode {
            format!(" search: {}_ ", app.search_query)
        } else {
            format!(" queue ({total}) ")
        };
        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    let footer = Paragraph::new(controls_text(controls.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
