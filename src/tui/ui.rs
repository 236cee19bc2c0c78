use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};
use tui_logger::TuiLoggerWidget;

use crate::engine::game::Game;
use crate::engine::game_data::Rarity;
use crate::tui::app::{
    shop_items, App, Confirm, ShopItem, TAB_DASHBOARD, TAB_ENCYCLOPEDIA, TAB_INBOX, TAB_LOGS, TAB_PRESTIGE, TAB_SHOP,
};

pub fn draw(f: &mut Frame, app: &App, game: &Game) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3), // Header/Tabs
                Constraint::Min(0),    // Main Content
                Constraint::Length(1), // Status Bar
            ]
            .as_ref(),
        )
        .split(f.area());

    draw_header(f, app, game, chunks[0]);

    match app.tab_index {
        TAB_DASHBOARD => draw_dashboard(f, app, game, chunks[1]),
        TAB_SHOP => draw_shop(f, app, game, chunks[1]),
        TAB_ENCYCLOPEDIA => draw_encyclopedia(f, app, game, chunks[1]),
        TAB_PRESTIGE => draw_prestige(f, app, game, chunks[1]),
        TAB_INBOX => draw_inbox(f, app, game, chunks[1]),
        TAB_LOGS => draw_logs(f, chunks[1]),
        _ => {}
    }

    draw_status_bar(f, app, game, chunks[2]);

    if app.offline_report.is_some() {
        draw_offline_popup(f, app);
    }
}

fn rounded(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(title)
}

fn highlight() -> Style {
    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn rarity_color(rarity: Rarity) -> Color {
    match rarity {
        Rarity::Common => Color::Gray,
        Rarity::Rare => Color::Blue,
        Rarity::Epic => Color::Magenta,
        Rarity::Legendary => Color::Yellow,
        Rarity::Mythic => Color::Red,
    }
}

fn draw_header(f: &mut Frame, app: &App, game: &Game, area: Rect) {
    let unread = game.progress().unread_email_count();
    let titles: Vec<Line> = app
        .tabs
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if i == app.tab_index {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let label = if i == TAB_INBOX && unread > 0 { format!("{} ({})", t, unread) } else { t.clone() };
            Line::from(Span::styled(label, style))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(rounded(" Trawler's Empire "))
        .select(app.tab_index)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, game: &Game, area: Rect) {
    let (text, style) = match app.confirm {
        Some(Confirm::Prestige) => (
            " Prestige now? You keep your encyclopedia and gain permanent bonuses. (y/n) ".to_string(),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ),
        Some(Confirm::Reset) => (
            " Reset ALL progress, prestige included? This cannot be undone. (y/n) ".to_string(),
            Style::default().fg(Color::White).bg(Color::Red),
        ),
        None => (
            format!(
                " ${} | Q: Quit | TAB: Switch | C: Cast | S: Sell All | ENTER: Select | {} ",
                game.progress().money(),
                app.runtime()
            ),
            Style::default().fg(Color::Black).bg(Color::Green),
        ),
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_dashboard(f: &mut Frame, app: &App, game: &Game, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(chunks[0]);

    let p = game.progress();
    let location = game
        .catalog()
        .location(p.active_location_id())
        .map_or(p.active_location_id(), |l| l.name);
    let next_auto = game
        .next_auto_fish_in()
        .map_or("off".to_string(), |ms| format!("{:.1}s", ms as f64 / 1000.0));
    let label = |s: &'static str, c: Color| Span::styled(s, Style::default().fg(c));

    let stats_text = vec![
        Line::from(vec![label("Money:        ", Color::Yellow), Span::raw(format!("${}", p.money()))]),
        Line::from(vec![label("Fish Caught:  ", Color::Blue), Span::raw(p.total_fish_caught().to_string())]),
        Line::from(vec![label("Fishing Power:", Color::Green), Span::raw(format!(" {:.2}", p.fishing_power()))]),
        Line::from(vec![label("Auto Rate:    ", Color::Green), Span::raw(format!("{:.2}/5s (next {})", p.auto_fishing_rate(), next_auto))]),
        Line::from(vec![label("Location:     ", Color::Cyan), Span::raw(location)]),
        Line::from(vec![label("Prestige:     ", Color::Magenta), Span::raw(format!("{} ({})", p.prestige_level(), game.rank_title()))]),
        Line::from(vec![
            label("Last Catch:   ", Color::Red),
            Span::raw(
                game.session()
                    .last_caught
                    .as_ref()
                    .map_or("-".to_string(), |c| format!("{} (${})", c.fish_name, c.value)),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(stats_text).block(rounded(" Statistics ")), left_chunks[0]);

    let (cast_label, ratio) = if game.session().is_fishing {
        (format!("Casting at {}%", game.session().boat_position), game.cast_progress())
    } else {
        ("Press C to cast".to_string(), 0.0)
    };
    let gauge = Gauge::default()
        .block(rounded(" Line "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .label(cast_label)
        .ratio(ratio.clamp(0.0, 1.0));
    f.render_widget(gauge, left_chunks[1]);

    let inv_items: Vec<ListItem> = p
        .inventory()
        .iter()
        .map(|(name, count)| ListItem::new(format!("{:>5} x {}", count, name)))
        .collect();
    let inv_title = format!(" Inventory ({}) - ENTER sells stack ", p.inventory_total());
    let mut state = ListState::default().with_selected((!inv_items.is_empty()).then_some(app.selected));
    f.render_stateful_widget(
        List::new(inv_items).block(rounded(&inv_title)).highlight_style(highlight()),
        left_chunks[2],
        &mut state,
    );

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(chunks[1]);

    let activity: Vec<ListItem> = app
        .activity
        .iter()
        .rev()
        .take(30)
        .map(|l| {
            ListItem::new(Line::from(vec![
                Span::styled(">> ", Style::default().fg(Color::Blue)),
                Span::raw(l.clone()),
            ]))
        })
        .collect();
    f.render_widget(List::new(activity).block(rounded(" Recent Activity ")), right_chunks[0]);

    let roster = app.peers.lock();
    let now = game.now_ms();
    let mut peer_lines: Vec<ListItem> = roster
        .recent_catches(now)
        .into_iter()
        .map(|(id, c)| {
            ListItem::new(Span::styled(
                format!("{} caught a {}!", &id[..id.len().min(6)], c.fish_name),
                Style::default().fg(Color::Yellow),
            ))
        })
        .collect();
    peer_lines.extend(roster.peers().into_iter().map(|peer| {
        ListItem::new(format!(
            "{:<8} ${:<10} {} {}",
            &peer.client_id[..peer.client_id.len().min(8)],
            peer.data.money,
            peer.data.active_location_id,
            if peer.data.is_fishing { "(fishing)" } else { "" }
        ))
    }));
    let peers_title = format!(" Other Trawlers ({}) ", roster.len());
    f.render_widget(List::new(peer_lines).block(rounded(&peers_title)), right_chunks[1]);
}

fn draw_shop(f: &mut Frame, app: &App, game: &Game, area: Rect) {
    let p = game.progress();
    let catalog = game.catalog();
    let money = p.money();
    let price_style = |price: u64| {
        if price <= money {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let items: Vec<ListItem> = shop_items(catalog)
        .into_iter()
        .map(|item| match item {
            ShopItem::Upgrade(id) => {
                let def = catalog.upgrade(id);
                let state = p.upgrade(id);
                let (name, desc) = def.map_or((id, ""), |d| (d.name, d.description));
                let level = state.map_or(0, |u| u.level);
                let cost = state.map_or(0, |u| u.cost);
                let maxed = def.map_or(false, |d| d.is_maxed(level));
                let price = if maxed {
                    Span::styled("MAX".to_string(), Style::default().fg(Color::Cyan))
                } else {
                    Span::styled(format!("${}", cost), price_style(cost))
                };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("[Upgrade] {} (Lv {}) - {} ", name, level, desc)),
                    price,
                ]))
            }
            ShopItem::Location(id) => {
                let location = catalog.location(id);
                let name = location.map_or(id, |l| l.name);
                let price = location.map_or(0, |l| l.price);
                let status = if p.active_location_id() == id {
                    Span::styled("HERE".to_string(), Style::default().fg(Color::Cyan))
                } else if p.is_location_unlocked(id) {
                    Span::styled("travel".to_string(), Style::default().fg(Color::Green))
                } else {
                    Span::styled(format!("${}", price), price_style(price))
                };
                ListItem::new(Line::from(vec![Span::raw(format!("[Location] {} ", name)), status]))
            }
            ShopItem::BoatOption(slot, option_id) => {
                let option = catalog.boat_option(slot, option_id);
                let name = option.map_or(option_id, |o| o.name);
                let price = option.map_or(0, |o| o.price);
                let status = if p.boat_current(slot) == Some(option_id) {
                    Span::styled("EQUIPPED".to_string(), Style::default().fg(Color::Cyan))
                } else if p.owns_boat_option(slot, option_id) {
                    Span::styled("owned".to_string(), Style::default().fg(Color::Green))
                } else {
                    Span::styled(format!("${}", price), price_style(price))
                };
                ListItem::new(Line::from(vec![Span::raw(format!("[Boat:{}] {} ", slot.as_str(), name)), status]))
            }
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(app.selected));
    let title = format!(" Shop - ${} ", money);
    f.render_stateful_widget(List::new(items).block(rounded(&title)).highlight_style(highlight()), area, &mut state);
}

fn draw_encyclopedia(f: &mut Frame, app: &App, game: &Game, area: Rect) {
    let p = game.progress();
    let title = format!(
        " Encyclopedia - {}/{} discovered ({}%) ",
        p.discovered_count(),
        p.encyclopedia().len(),
        p.encyclopedia_completion()
    );
    if !p.encyclopedia_unlocked() {
        let text = Paragraph::new("Catch your first fish to unlock the encyclopedia.")
            .block(rounded(&title))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(text, area);
        return;
    }

    let items: Vec<ListItem> = p
        .encyclopedia()
        .values()
        .map(|e| {
            if e.discovered {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<10}", e.rarity.as_str()), Style::default().fg(rarity_color(e.rarity))),
                    Span::raw(format!(
                        "{:<20} {:<15} ${:<5} caught {:<6} best {:.1}kg / {:.1}cm",
                        e.name, e.location, e.value, e.caught, e.record.weight, e.record.length
                    )),
                ]))
            } else {
                ListItem::new(Span::styled(
                    format!("{:<10}??? ({})", e.rarity.as_str(), e.location),
                    Style::default().fg(Color::DarkGray),
                ))
            }
        })
        .collect();
    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(List::new(items).block(rounded(&title)).highlight_style(highlight()), area, &mut state);
}

fn draw_prestige(f: &mut Frame, _app: &App, game: &Game, area: Rect) {
    let p = game.progress();
    let reqs = &game.config().prestige.requirements;
    let current = game.prestige_bonuses();
    let next = crate::engine::prestige::PrestigeBonuses::for_level(p.prestige_level() + 1, &game.config().prestige.benefits);

    let check = |ok: bool| {
        if ok {
            Span::styled("[x] ", Style::default().fg(Color::Green))
        } else {
            Span::styled("[ ] ", Style::default().fg(Color::Red))
        }
    };

    let text = vec![
        Line::from(Span::styled(
            format!("Level {} - {}", p.prestige_level(), game.rank_title()),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Requirements:"),
        Line::from(vec![check(p.money() >= reqs.min_money), Span::raw(format!("${} / ${}", p.money(), reqs.min_money))]),
        Line::from(vec![
            check(p.total_fish_caught() >= reqs.min_fish_caught),
            Span::raw(format!("{} / {} fish caught", p.total_fish_caught(), reqs.min_fish_caught)),
        ]),
        Line::from(vec![
            check(p.unlocked_location_count() >= reqs.min_locations_unlocked),
            Span::raw(format!("{} / {} locations", p.unlocked_location_count(), reqs.min_locations_unlocked)),
        ]),
        Line::from(vec![
            check(p.encyclopedia_completion() >= reqs.min_encyclopedia_completion),
            Span::raw(format!("{}% / {}% encyclopedia", p.encyclopedia_completion(), reqs.min_encyclopedia_completion)),
        ]),
        Line::from(""),
        Line::from(format!(
            "Current bonuses: +{:.2} power, +{:.2} auto, +{:.0}% fish value",
            current.fishing_power,
            current.auto_fishing,
            current.fish_value * 100.0
        )),
        Line::from(format!(
            "Next level:      +{:.2} power, +{:.2} auto, +{:.0}% fish value, ${} starting money",
            next.fishing_power,
            next.auto_fishing,
            next.fish_value * 100.0,
            next.starting_money
        )),
        Line::from(""),
        Line::from(Span::styled(
            "P: Prestige | R: Reset all progress",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(text).block(rounded(" Prestige ")), area);
}

fn draw_inbox(f: &mut Frame, app: &App, game: &Game, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let emails = game.progress().emails();
    let items: Vec<ListItem> = emails
        .iter()
        .map(|e| {
            let style = if e.read { Style::default().fg(Color::DarkGray) } else { Style::default().add_modifier(Modifier::BOLD) };
            ListItem::new(Span::styled(format!("{} {}", if e.read { " " } else { "*" }, e.subject), style))
        })
        .collect();
    let mut state = ListState::default().with_selected((!items.is_empty()).then_some(app.selected));
    f.render_stateful_widget(List::new(items).block(rounded(" Inbox ")).highlight_style(highlight()), chunks[0], &mut state);

    let body = match emails.get(app.selected) {
        Some(e) => vec![
            Line::from(Span::styled(e.subject.clone(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(format!("From: {} <{}>", e.sender, e.sender_email)),
            Line::from(format!("Date: {}", e.date)),
            Line::from(""),
        ]
        .into_iter()
        .chain(e.content.lines().map(|l| Line::from(l.to_string())))
        .collect(),
        None => vec![Line::from("No messages")],
    };
    f.render_widget(Paragraph::new(body).block(rounded(" Message ")).wrap(Wrap { trim: false }), chunks[1]);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let widget = TuiLoggerWidget::default()
        .block(rounded(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::DarkGray))
        .output_target(false);
    f.render_widget(widget, area);
}

fn draw_offline_popup(f: &mut Frame, app: &App) {
    let Some(report) = &app.offline_report else {
        return;
    };
    let area = centered(f.area(), 50, 30);
    let text = vec![
        Line::from(Span::styled("Welcome back, Captain!", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(format!("You were away for {}.", report.time_away_label)),
        Line::from(format!("Your auto-fishers caught {} fish", report.fish_gained)),
        Line::from(format!("and the overflow sold for ${}.", report.money_gained)),
        Line::from(""),
        Line::from(Span::styled("ESC to close", Style::default().fg(Color::DarkGray))),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text).block(rounded(" While You Were Away ")).wrap(Wrap { trim: true }),
        area,
    );
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
