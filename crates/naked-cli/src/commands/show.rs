//! `naked show`: describe one specification in detail.

use std::path::Path;
use std::sync::Arc;

use naked_metamodel::{FacetHolder, SpecKind, Specification};

use crate::output::StyledOutput;

pub fn execute(
    model: &Path,
    config: Option<&Path>,
    type_name: &str,
    as_json: bool,
    out: &mut StyledOutput,
) -> anyhow::Result<()> {
    let metamodel = super::build_metamodel(model, config, false)?;
    let spec = metamodel.specification(type_name)?;
    if as_json {
        out.line(&serde_json::to_string_pretty(&*spec)?);
    } else {
        print_spec(&spec, out);
    }
    out.flush();
    Ok(())
}

fn facet_list(spec: &Specification) -> String {
    spec.facet_kinds()
        .iter()
        .map(|k| format!("{:?}", k))
        .collect::<Vec<_>>()
        .join(", ")
}

fn signature(action: &Specification) -> String {
    let parameters: Vec<String> = action
        .parameters()
        .iter()
        .filter_map(|p| p.as_parameter())
        .map(|p| format!("{}: {}", p.name, p.parameter_type))
        .collect();
    let returns = action
        .as_action()
        .map(|a| a.return_type.to_string())
        .unwrap_or_default();
    format!("{}({}) -> {}", action.member_name(), parameters.join(", "), returns)
}

fn print_spec(spec: &Specification, out: &mut StyledOutput) {
    out.bold(spec.full_name());
    out.line(&format!(" ({})", spec.name()));
    let tags = super::reflect::tags(spec);
    if !tags.is_empty() {
        out.info(&format!("  [{}]", tags.join(", ")));
        out.newline();
    }
    if !spec.description().is_empty() {
        out.line(&format!("  {}", spec.description()));
    }
    out.line(&format!("  Facets: {}", facet_list(spec)));

    let (properties, collections): (Vec<&Arc<Specification>>, Vec<&Arc<Specification>>) = spec
        .fields()
        .iter()
        .partition(|f| f.kind() == SpecKind::Property);
    print_fields("Properties", &properties, out);
    print_fields("Collections", &collections, out);

    print_actions("Actions", spec.actions(), out);
    print_actions("Contributed actions", spec.contributed_actions(), out);
    print_actions("Finder actions", spec.finder_actions(), out);
}

fn print_fields(heading: &str, fields: &[&Arc<Specification>], out: &mut StyledOutput) {
    if fields.is_empty() {
        return;
    }
    out.line(&format!("  {}:", heading));
    for field in fields {
        let value_type = field.value_type().map(|t| t.to_string()).unwrap_or_default();
        out.plain(&format!("    {}: {}", field.member_name(), value_type));
        out.info(&format!("  [{}]", facet_list(field)));
        out.newline();
    }
}

fn print_actions(heading: &str, actions: &[Arc<Specification>], out: &mut StyledOutput) {
    if actions.is_empty() {
        return;
    }
    out.line(&format!("  {}:", heading));
    for action in actions {
        out.plain(&format!("    {}", signature(action)));
        if let Some(action) = action.as_action() {
            out.info(&format!("  on {}", action.owner));
        }
        out.newline();
    }
}
