use monitor_core::plan::{PanelSummary, PlanSummary, ResourceSummary};

/// Box-drawn tables for `monitor panels`.
pub struct PlanTable {
    id_width: usize,
    label_width: usize,
    key_width: usize,
    target_width: usize,
}

const POSITION_WIDTH: usize = 2;
const KIND_WIDTH: usize = 14;
const SECS_WIDTH: usize = 8;
const ADAPTER_WIDTH: usize = 7;

impl PlanTable {
    pub fn new(summary: &PlanSummary) -> Self {
        let id_width = summary
            .panels
            .iter()
            .map(|p| p.id.chars().count())
            .max()
            .unwrap_or(2)
            .clamp(2, 24);
        let label_width = summary
            .panels
            .iter()
            .map(|p| p.label.chars().count())
            .max()
            .unwrap_or(5)
            .clamp(5, 30);
        let key_width = summary
            .resources
            .iter()
            .map(|r| r.key.chars().count())
            .max()
            .unwrap_or(3)
            .clamp(8, 40);

        Self {
            id_width,
            label_width,
            key_width,
            target_width: 50,
        }
    }

    fn panel_widths(&self) -> [usize; 6] {
        [
            POSITION_WIDTH,
            self.id_width,
            self.label_width,
            KIND_WIDTH,
            SECS_WIDTH,
            self.key_width,
        ]
    }

    fn resource_widths(&self) -> [usize; 5] {
        [
            self.key_width,
            ADAPTER_WIDTH,
            SECS_WIDTH,
            SECS_WIDTH,
            self.target_width,
        ]
    }

    pub fn print_panels(&self, panels: &[PanelSummary]) {
        let widths = self.panel_widths();
        println!("{}", border(&widths, '┌', '┬', '┐'));
        println!(
            "{}",
            row(&widths, &["#", "ID", "Label", "Kind", "Interval", "Resources"])
        );
        println!("{}", border(&widths, '├', '┼', '┤'));
        for panel in panels {
            let interval = format!("{}s", panel.refresh_interval_secs);
            let position = panel.position.to_string();
            let mut keys = panel.resources.iter();
            let first = keys.next().map(String::as_str).unwrap_or("-");
            println!(
                "{}",
                row(
                    &widths,
                    &[
                        position.as_str(),
                        panel.id.as_str(),
                        panel.label.as_str(),
                        panel.kind,
                        interval.as_str(),
                        first,
                    ]
                )
            );
            // One row per extra resource, so long overview lists stay readable
            for key in keys {
                println!("{}", row(&widths, &["", "", "", "", "", key.as_str()]));
            }
        }
        println!("{}", border(&widths, '└', '┴', '┘'));
    }

    pub fn print_resources(&self, resources: &[ResourceSummary]) {
        let widths = self.resource_widths();
        println!("{}", border(&widths, '┌', '┬', '┐'));
        println!(
            "{}",
            row(&widths, &["Key", "Adapter", "Interval", "Timeout", "Target"])
        );
        println!("{}", border(&widths, '├', '┼', '┤'));
        for resource in resources {
            let interval = format!("{}s", resource.interval_secs);
            let timeout = format!("{}s", resource.timeout_secs);
            println!(
                "{}",
                row(
                    &widths,
                    &[
                        resource.key.as_str(),
                        resource.adapter.as_str(),
                        interval.as_str(),
                        timeout.as_str(),
                        resource.target.as_str(),
                    ]
                )
            );
        }
        println!("{}", border(&widths, '└', '┴', '┘'));
    }
}

fn border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, cells.join(&middle.to_string()), right)
}

fn row(widths: &[usize], cells: &[&str]) -> String {
    let cells: Vec<String> = widths
        .iter()
        .zip(cells)
        .map(|(width, cell)| format!(" {} ", truncate(cell, *width)))
        .collect();
    format!("│{}│", cells.join("│"))
}

/// Truncate a string to a maximum display width, adding "..." if truncated.
///
/// Uses character count (not byte count) to safely handle UTF-8 strings.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        format!("{:<width$}", s, width = max_len)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_len)
    }
}
