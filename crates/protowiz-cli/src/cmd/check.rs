use std::path::Path;

use anyhow::Result;
use protowiz_core::model::ServiceRecord;
use serde::Serialize;
use termcolor::Color;

use super::load_descriptor;
use crate::output;

#[derive(Debug, Serialize)]
pub struct CheckOut<'a> {
    pub status: &'static str,
    pub services: &'a [ServiceRecord],
    pub messages: Vec<&'a str>,
}

pub fn run(descriptor: &Path) -> Result<()> {
    let (registry, cfg) = load_descriptor(descriptor)?;
    let graph = protowiz_core::check(&registry, &cfg)?;

    if output::is_json() {
        let out = CheckOut {
            status: protowiz_core::GenerationStatus::OK,
            services: &graph.records,
            messages: graph.messages.iter().map(|m| m.name.as_str()).collect(),
        };
        return output::print(&out);
    }

    for record in &graph.records {
        output::status_line(
            "service",
            Color::Cyan,
            &format!(
                "{} -> {} ({} methods, {} models)",
                record.service_name,
                record.short_name,
                record.methods.len(),
                record.referenced_models.len()
            ),
        )?;
    }
    output::status_line(
        "ok",
        Color::Green,
        &format!(
            "{} services, {} messages",
            graph.records.len(),
            graph.messages.len()
        ),
    )?;
    Ok(())
}
