//! CLI presentation: text and json formatters per command.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

use crate::blueprint::PRESETS;
use crate::config::SiteConfig;
use crate::pipeline::GenerationOutput;

pub fn format_preset_table(format: &str) -> Result<String, serde_json::Error> {
    if format == "json" {
        let rows: Vec<_> = PRESETS
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "name": p.name,
                    "structure": p.structure.as_str(),
                    "requiredClasses": p.required_classes,
                    "sectionTypes": p.section_types,
                })
            })
            .collect();
        return serde_json::to_string_pretty(&rows);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Id", "Name", "Structure", "Density", "Align", "Required classes"]);
    for preset in PRESETS {
        table.add_row(vec![
            preset.id.to_string(),
            preset.name.to_string(),
            preset.structure.as_str().to_string(),
            preset.density.as_str().to_string(),
            preset.align.as_str().to_string(),
            preset.required_classes.join(" "),
        ]);
    }
    Ok(format!("Composition presets ({})\n\n{}", PRESETS.len(), table))
}

/// Effective configuration with the api key masked.
pub fn format_config(config: &SiteConfig, format: &str) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some("***".to_string());
    }
    match format {
        "json" => Ok(serde_json::to_string_pretty(&shown)?),
        _ => Ok(toml::to_string_pretty(&shown)?),
    }
}

/// One-screen summary printed when the site JSON went to a file.
pub fn format_generation_summary(output: &GenerationOutput) -> String {
    let sections: usize = output
        .pages
        .iter()
        .map(|p| p.content.len().saturating_sub(1))
        .sum();
    let mut s = format!(
        "Generated {} page(s), {} section(s), {} component(s)\n  Stunning score: {}/100",
        output.pages.len(),
        sections,
        output.components.len(),
        output.report.score.total
    );
    if let Some(ref request_id) = output.request_id {
        s.push_str(&format!(
            "\n  Request id: {} ({} section(s) resumed)",
            request_id, output.resumed_sections
        ));
    }
    if !output.errors.is_empty() {
        s.push_str(&format!("\n\nErrors ({}):", output.errors.len()));
        for e in &output.errors {
            s.push_str(&format!("\n  - {}", e));
        }
    }
    if !output.report.issues.is_empty() {
        s.push_str(&format!("\n\nPostcheck issues ({}):", output.report.issues.len()));
        for issue in &output.report.issues {
            s.push_str(&format!("\n  - {}", issue));
        }
    }
    s
}
