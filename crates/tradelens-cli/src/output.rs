use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use tradelens_core::Envelope;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<String, CliError> {
    let mut out = String::new();
    let generated_at = envelope
        .meta
        .generated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| envelope.meta.generated_at.to_string());

    out.push_str(&format!("request_id  : {}\n", envelope.meta.request_id));
    out.push_str(&format!("schema      : {}\n", envelope.meta.schema_version));
    out.push_str(&format!("generated_at: {generated_at}\n"));
    out.push_str(&format!("latency_ms  : {}\n", envelope.meta.latency_ms));
    out.push_str(&format!("cache_hit   : {}\n", envelope.meta.cache_hit));

    if !envelope.meta.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &envelope.meta.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    if let Some(report) = envelope.data.as_object().filter(|data| data.contains_key("series")) {
        render_report(&mut out, report);
    } else if !envelope.data.is_null() {
        out.push_str("data:\n");
        for line in serde_json::to_string_pretty(&envelope.data)?.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }

    if !envelope.errors.is_empty() {
        out.push_str("errors:\n");
        for error in &envelope.errors {
            out.push_str(&format!("  - {}: {}\n", error.code, error.message));
        }
    }

    Ok(out)
}

fn render_report(out: &mut String, report: &serde_json::Map<String, Value>) {
    if let Some(title) = report.get("title").and_then(Value::as_str) {
        out.push_str(&format!("\n{title}\n"));
    }

    let empty = serde_json::Map::new();
    let series = report.get("series").and_then(Value::as_object).unwrap_or(&empty);
    let yoy = report.get("yoy").and_then(Value::as_object).unwrap_or(&empty);

    out.push_str(&format!("\n{:<8}  {:>18}  {:>10}\n", "date", "value", "yoy_%"));
    for (date, value) in series {
        let growth = yoy
            .get(date)
            .and_then(Value::as_f64)
            .map(|growth| format!("{growth:.2}"))
            .unwrap_or_else(|| String::from("-"));
        out.push_str(&format!(
            "{:<8}  {:>18.0}  {:>10}\n",
            date,
            value.as_f64().unwrap_or_default(),
            growth
        ));
    }

    if let Some(breakdown) = report.get("breakdown").and_then(Value::as_array) {
        out.push_str(&format!("\n{:<60}  {:>18}\n", "product", "value"));
        for entry in breakdown {
            let label = entry.get("label").and_then(Value::as_str).unwrap_or_default();
            let value = entry.get("value").and_then(Value::as_f64).unwrap_or_default();
            out.push_str(&format!("{:<60}  {:>18.0}\n", truncate(label, 60), value));
        }
    }

    if let Some(children) = report.get("children").and_then(Value::as_object) {
        if !children.is_empty() {
            out.push_str(&format!("\n{:<10}  description\n", "code"));
            for (code, description) in children {
                out.push_str(&format!(
                    "{:<10}  {}\n",
                    code,
                    description.as_str().unwrap_or_default()
                ));
            }
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut cut = text.chars().take(width.saturating_sub(3)).collect::<String>();
    cut.push_str("...");
    cut
}
