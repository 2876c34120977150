use arena_core::{Agent, ArchitecturePlan, Message, Roster};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Paints text in an agent's hex color; unparseable colors leave it plain.
pub fn paint(text: &str, hex: &str) -> ColoredString {
    match parse_hex(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

pub fn swatch(hex: &str) -> ColoredString {
    paint("●", hex)
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

pub fn print_message(message: &Message) {
    println!(
        "{} {} {}",
        format_millis(message.timestamp).dimmed(),
        paint(&format!("{:>9}:", message.agent_name), &message.color).bold(),
        message.content
    );
}

pub fn agents_table(agents: &[Agent]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Agent").fg(comfy_table::Color::Cyan),
            Cell::new("Role").fg(comfy_table::Color::Cyan),
            Cell::new("Color").fg(comfy_table::Color::Cyan),
            Cell::new("Id").fg(comfy_table::Color::Cyan),
        ]);

    for agent in agents {
        let color = match parse_hex(&agent.color) {
            Some((r, g, b)) => Cell::new(&agent.color).fg(comfy_table::Color::Rgb { r, g, b }),
            None => Cell::new(&agent.color),
        };
        table.add_row(vec![
            Cell::new(&agent.name),
            Cell::new(agent.role.as_str()),
            color,
            Cell::new(&agent.id),
        ]);
    }
    table
}

pub fn print_roster(roster: &Roster) {
    println!("{}", "Team".cyan().bold());
    println!("{}", agents_table(&roster.agents));

    let hub = roster
        .links
        .first()
        .and_then(|l| roster.agents.iter().find(|a| a.id == l.source))
        .map(|a| a.name.as_str())
        .unwrap_or("none");
    println!(
        "  {} {} links, hub: {}",
        "→".blue(),
        roster.links.len(),
        hub.bold()
    );
}

pub fn print_plan(plan: &ArchitecturePlan) {
    println!();
    println!("{}", "Architecture Plan".cyan().bold());
    println!("{}", "═".repeat(50).dimmed());
    println!("  {:<12} {}", "Project:".bold(), plan.project_name);
    println!("  {:<12} {}", "Overview:".bold(), plan.overview);
    println!();
    println!("  {}", "Components".yellow().bold());
    for component in &plan.components {
        println!("    • {}", component);
    }
    println!();
    println!("  {:<12} {}", "Stack:".bold(), plan.tech_stack.join(", "));
    println!("  {:<12} {}", "Timeline:".bold(), plan.timeline);
}
