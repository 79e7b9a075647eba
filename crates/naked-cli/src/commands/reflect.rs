//! `naked reflect`: build a metamodel and summarise it.

use std::path::Path;

use naked_metamodel::{Menu, MenuItem, Metamodel, Specification};
use serde_json::json;

use crate::output::StyledOutput;

pub fn execute(
    model: &Path,
    config: Option<&Path>,
    parallel: bool,
    as_json: bool,
    out: &mut StyledOutput,
) -> anyhow::Result<()> {
    let metamodel = super::build_metamodel(model, config, parallel)?;
    if as_json {
        out.line(&serde_json::to_string_pretty(&summary_json(&metamodel))?);
    } else {
        print_summary(&metamodel, out);
    }
    out.flush();
    Ok(())
}

/// Markers shown next to a type name
pub fn tags(spec: &Specification) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if spec.is_service() {
        tags.push("service");
    }
    if spec.is_view_model() {
        tags.push("view model");
    }
    if spec.is_parseable() {
        tags.push("parseable");
    }
    if spec.is_abstract() {
        tags.push("abstract");
    }
    tags
}

fn summary_json(metamodel: &Metamodel) -> serde_json::Value {
    let specifications: Vec<_> = metamodel
        .all_specifications()
        .iter()
        .map(|spec| {
            json!({
                "name": spec.full_name(),
                "tags": tags(spec),
                "fields": spec.fields().len(),
                "actions": spec.actions().len(),
                "contributed_actions": spec.contributed_actions().len(),
                "finder_actions": spec.finder_actions().len(),
            })
        })
        .collect();
    json!({
        "specifications": specifications,
        "services": metamodel.services(),
        "menus": metamodel.menus(),
    })
}

fn print_summary(metamodel: &Metamodel, out: &mut StyledOutput) {
    out.success(&format!("Reflected {} specifications", metamodel.len()));
    out.line(&format!(
        " ({} services, {} menus)",
        metamodel.services().len(),
        metamodel.menus().len()
    ));

    let specs = metamodel.all_specifications();
    let width = specs.iter().map(|s| s.full_name().len()).max().unwrap_or(0);
    for spec in &specs {
        out.plain("  ");
        out.bold(&format!("{:<width$}", spec.full_name(), width = width));
        out.plain(&format!(
            "  {} fields, {} actions",
            spec.fields().len(),
            spec.actions().len()
        ));
        let tags = tags(spec);
        if !tags.is_empty() {
            out.plain("  ");
            out.info(&format!("[{}]", tags.join(", ")));
        }
        out.newline();
    }

    if !metamodel.menus().is_empty() {
        out.newline();
        out.line("Menus:");
        for menu in metamodel.menus() {
            print_menu(menu, 1, out);
        }
    }
}

fn print_menu(menu: &Menu, depth: usize, out: &mut StyledOutput) {
    let indent = "  ".repeat(depth);
    out.plain(&indent);
    out.bold(&menu.name);
    out.newline();
    for item in &menu.items {
        match item {
            MenuItem::Action {
                service,
                action,
                name,
            } => out.line(&format!("{}  {} ({}::{})", indent, name, service, action)),
            MenuItem::SubMenu(sub) => print_menu(sub, depth + 1, out),
        }
    }
}
