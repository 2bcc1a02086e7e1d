//! Body renderers, one per panel kind.
//!
//! Each takes the cached value for one resource key and returns the lines
//! describing it. Fields are looked up under their snake_case name first and
//! then under the names `docker stats --format '{{json .}}'` and the AWS CLI
//! emit, so adapters can pass raw tool output through.

use serde_json::{Map, Value};

use crate::panels::content::{ContentLine, Tone};
use crate::panels::errors::RenderError;

fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| object.get(*name))
        .filter(|value| !value.is_null())
}

fn text(object: &Map<String, Value>, names: &[&str]) -> Option<String> {
    match field(object, names)? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts `12.5`, `"12.5"` and `"12.5%"`.
fn percent(object: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    match field(object, names)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn objects<'a>(
    key: &str,
    value: &'a Value,
    expected: &'static str,
) -> Result<Vec<&'a Map<String, Value>>, RenderError> {
    let items = value
        .as_array()
        .ok_or_else(|| RenderError::shape(key, expected))?;
    items
        .iter()
        .map(|item| item.as_object().ok_or_else(|| RenderError::shape(key, expected)))
        .collect()
}

fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}

fn name_width(names: &[String]) -> usize {
    names.iter().map(|n| n.chars().count()).max().unwrap_or(0) + 2
}

pub(crate) fn empty(what: &str) -> Vec<ContentLine> {
    vec![ContentLine::text(format!("no {} reported", what), Tone::Muted)]
}

fn health_tone(status: &str) -> Tone {
    match status.to_ascii_lowercase().as_str() {
        "healthy" | "ok" | "up" | "pass" | "passing" | "running" | "true" => Tone::Good,
        "degraded" | "warn" | "warning" | "timeout" | "starting" | "pending" => Tone::Warning,
        _ => Tone::Critical,
    }
}

/// Array of `{name, status, latency_ms?, detail?}`.
pub fn service_health(key: &str, value: &Value) -> Result<Vec<ContentLine>, RenderError> {
    const EXPECTED: &str = "an array of {name, status} objects";
    let services = objects(key, value, EXPECTED)?;
    if services.is_empty() {
        return Ok(empty("services"));
    }

    let names: Vec<String> = services
        .iter()
        .map(|s| text(s, &["name", "service"]).ok_or_else(|| RenderError::shape(key, EXPECTED)))
        .collect::<Result<_, _>>()?;
    let width = name_width(&names);

    let mut lines = Vec::with_capacity(services.len());
    for (service, name) in services.iter().zip(&names) {
        let status = text(service, &["status", "state"]).unwrap_or_else(|| "unknown".to_string());
        let mut line = ContentLine::new()
            .push(pad(name, width), Tone::Normal)
            .push(pad(&status, 12), health_tone(&status));
        if let Some(latency) = field(service, &["latency_ms"]).and_then(Value::as_u64) {
            line = line.push(format!("{:>6}ms", latency), Tone::Muted);
        }
        if let Some(detail) = text(service, &["detail", "message"]) {
            line = line.push(format!("  {}", detail), Tone::Muted);
        }
        lines.push(line);
    }
    Ok(lines)
}

/// Array of `{id, name?, state, type?, private_ip?}`.
pub fn infrastructure(key: &str, value: &Value) -> Result<Vec<ContentLine>, RenderError> {
    const EXPECTED: &str = "an array of {id, state} objects";
    let instances = objects(key, value, EXPECTED)?;
    if instances.is_empty() {
        return Ok(empty("instances"));
    }

    let labels: Vec<String> = instances
        .iter()
        .map(|i| {
            let id = text(i, &["id", "InstanceId"]).ok_or_else(|| RenderError::shape(key, EXPECTED))?;
            Ok(match text(i, &["name", "Name"]) {
                Some(name) => format!("{} ({})", name, id),
                None => id,
            })
        })
        .collect::<Result<_, RenderError>>()?;
    let width = name_width(&labels);

    let mut lines = Vec::with_capacity(instances.len());
    for (instance, label) in instances.iter().zip(&labels) {
        let state = text(instance, &["state", "State"]).unwrap_or_else(|| "unknown".to_string());
        let tone = match state.as_str() {
            "running" => Tone::Good,
            "pending" | "stopping" | "shutting-down" => Tone::Warning,
            "stopped" => Tone::Muted,
            _ => Tone::Critical,
        };
        let mut line = ContentLine::new()
            .push(pad(label, width), Tone::Normal)
            .push(pad(&state, 14), tone);
        if let Some(kind) = text(instance, &["type", "InstanceType"]) {
            line = line.push(pad(&kind, 12), Tone::Muted);
        }
        if let Some(ip) = text(instance, &["private_ip", "PrivateIpAddress"]) {
            line = line.push(ip, Tone::Muted);
        }
        lines.push(line);
    }
    Ok(lines)
}

fn usage_tone(percent: Option<f64>) -> Tone {
    match percent {
        Some(p) if p >= 90.0 => Tone::Critical,
        Some(p) if p >= 70.0 => Tone::Warning,
        Some(_) => Tone::Normal,
        None => Tone::Muted,
    }
}

fn format_percent(percent: Option<f64>) -> String {
    percent.map_or_else(|| "-".to_string(), |p| format!("{:.1}%", p))
}

/// Array of `{name, status?, cpu_percent?, mem_usage?, mem_percent?}`.
pub fn containers(key: &str, value: &Value) -> Result<Vec<ContentLine>, RenderError> {
    const EXPECTED: &str = "an array of {name} container objects";
    let rows = objects(key, value, EXPECTED)?;
    if rows.is_empty() {
        return Ok(empty("containers"));
    }

    let names: Vec<String> = rows
        .iter()
        .map(|c| text(c, &["name", "Name", "Names"]).ok_or_else(|| RenderError::shape(key, EXPECTED)))
        .collect::<Result<_, _>>()?;
    let width = name_width(&names);

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        ContentLine::new()
            .push(pad("NAME", width), Tone::Heading)
            .push(pad("CPU", 9), Tone::Heading)
            .push(pad("MEM", 9), Tone::Heading)
            .push("USAGE", Tone::Heading),
    );
    for (container, name) in rows.iter().zip(&names) {
        let cpu = percent(container, &["cpu_percent", "CPUPerc"]);
        let mem = percent(container, &["mem_percent", "MemPerc"]);
        let mut line = ContentLine::new()
            .push(pad(name, width), Tone::Normal)
            .push(pad(&format_percent(cpu), 9), usage_tone(cpu))
            .push(pad(&format_percent(mem), 9), usage_tone(mem))
            .push(
                text(container, &["mem_usage", "MemUsage"]).unwrap_or_else(|| "-".to_string()),
                Tone::Muted,
            );
        if let Some(status) = text(container, &["status", "Status"]) {
            line = line.push(format!("  {}", status), Tone::Muted);
        }
        lines.push(line);
    }
    Ok(lines)
}

fn slot_line(name: &str, slot: Option<&Map<String, Value>>, active: bool) -> ContentLine {
    let marker = if active { "▶ " } else { "  " };
    let mut line = ContentLine::new().push(
        format!("{}{:<7}", marker, name),
        if active { Tone::Heading } else { Tone::Normal },
    );

    let Some(slot) = slot else {
        return line.push("not deployed", Tone::Muted);
    };

    line = line.push(
        pad(&text(slot, &["version", "image"]).unwrap_or_else(|| "-".to_string()), 24),
        Tone::Normal,
    );
    match field(slot, &["healthy"]) {
        Some(Value::Bool(true)) => line.push("healthy", Tone::Good),
        Some(Value::Bool(false)) => line.push("unhealthy", Tone::Critical),
        _ => match text(slot, &["status"]) {
            Some(status) => {
                let tone = health_tone(&status);
                line.push(status, tone)
            }
            None => line.push("unknown", Tone::Muted),
        },
    }
}

/// Object `{active, blue: {version?, healthy?}, green: {...}}`.
pub fn blue_green(key: &str, value: &Value) -> Result<Vec<ContentLine>, RenderError> {
    const EXPECTED: &str = "an object with an 'active' slot";
    let object = value
        .as_object()
        .ok_or_else(|| RenderError::shape(key, EXPECTED))?;
    let active = text(object, &["active", "active_slot"])
        .ok_or_else(|| RenderError::shape(key, EXPECTED))?
        .to_ascii_lowercase();

    let slot = |name: &str| field(object, &[name]).and_then(Value::as_object);

    Ok(vec![
        ContentLine::new()
            .push("active slot: ", Tone::Muted)
            .push(active.clone(), Tone::Heading),
        slot_line("blue", slot("blue"), active == "blue"),
        slot_line("green", slot("green"), active == "green"),
    ])
}
