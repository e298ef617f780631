use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static GLOBE: Emoji<'_, '_> = Emoji("🌐 ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_link(label: &str, url: &str) {
    println!(
        "  {} {}: {}",
        GLOBE,
        style(label).bold(),
        style(url).underlined().cyan()
    );
}

pub fn print_banner() {
    // Gradient: #818cf8 → #22d3ee across the wordmark
    let word = "workflow-hub";
    let from: (u8, u8, u8) = (129, 140, 248);
    let to: (u8, u8, u8) = (34, 211, 238);
    let steps = word.chars().count().max(2) as u32 - 1;

    println!();
    print!("  ");
    for (i, ch) in word.chars().enumerate() {
        let (r, g, b) = lerp_color(from, to, i as u32 * 1000 / steps);
        print!("\x1b[1;38;2;{};{};{}m{}", r, g, b, ch);
    }
    println!("\x1b[0m");
    println!("  \x1b[38;2;34;211;238mTemplates, connectors and analytics for your workflow engine.\x1b[0m\n");
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: u32) -> (u8, u8, u8) {
    let r = (a.0 as u32 * (1000 - t) + b.0 as u32 * t) / 1000;
    let g = (a.1 as u32 * (1000 - t) + b.1 as u32 * t) / 1000;
    let b_val = (a.2 as u32 * (1000 - t) + b.2 as u32 * t) / 1000;
    (r as u8, g as u8, b_val as u8)
}

enum GuideLine {
    Command(String, String),
    Status(String, String),
    Text(String),
    Info(String),
    Warn(String),
    Blank,
}

/// A titled block of terminal output, built up line by line and printed once.
pub struct GuideSection {
    title: String,
    lines: Vec<GuideLine>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Command(name.to_string(), description.to_string()));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(GuideLine::Status(label.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Text(msg.to_string()));
        self
    }

    pub fn info(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Info(msg.to_string()));
        self
    }

    pub fn warn(mut self, msg: &str) -> Self {
        self.lines.push(GuideLine::Warn(msg.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(GuideLine::Blank);
        self
    }

    pub fn print(&self) {
        println!("\n {}", style(&self.title).bold().underlined());
        for line in &self.lines {
            match line {
                GuideLine::Command(name, description) => {
                    println!(
                        "   {} {}",
                        style(format!("{:<24}", name)).green(),
                        style(description).dim()
                    )
                }
                GuideLine::Status(label, value) => {
                    println!("  {} {}: {}", GEAR, style(label).bold().cyan(), value)
                }
                GuideLine::Text(msg) => println!("   {}", msg),
                GuideLine::Info(msg) => println!("  {} {}", INFO_ICON, style(msg).blue()),
                GuideLine::Warn(msg) => println!("  {} {}", WARN_ICON, style(msg).yellow()),
                GuideLine::Blank => println!(),
            }
        }
    }
}
