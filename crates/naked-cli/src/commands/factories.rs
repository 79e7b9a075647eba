//! `naked factories`: list the standard facet factory chain.

use naked_metamodel::{FacetFactorySet, FeatureType};

use crate::output::StyledOutput;

const FEATURES: [(FeatureType, &str); 6] = [
    (FeatureType::OBJECTS, "objects"),
    (FeatureType::INTERFACES, "interfaces"),
    (FeatureType::PROPERTIES, "properties"),
    (FeatureType::COLLECTIONS, "collections"),
    (FeatureType::ACTIONS, "actions"),
    (FeatureType::ACTION_PARAMETERS, "parameters"),
];

/// Element kinds a feature set covers, by name
pub fn feature_names(features: FeatureType) -> Vec<&'static str> {
    FEATURES
        .iter()
        .filter(|(feature, _)| features.contains(*feature))
        .map(|(_, name)| *name)
        .collect()
}

pub fn execute(prefixes_only: bool, out: &mut StyledOutput) -> anyhow::Result<()> {
    let set = FacetFactorySet::standard();
    if prefixes_only {
        let mut prefixes: Vec<&str> = set
            .factories()
            .iter()
            .flat_map(|f| f.prefixes().iter().copied())
            .collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        for prefix in prefixes {
            out.line(prefix);
        }
        out.flush();
        return Ok(());
    }

    out.success(&format!("{} facet factories", set.len()));
    out.newline();
    for factory in set.factories() {
        out.plain(&format!("  {:>3}  ", factory.numeric_order()));
        out.bold(&format!("{:<42}", factory.name()));
        out.info(&feature_names(factory.feature_types()).join(", "));
        if !factory.prefixes().is_empty() {
            out.plain(&format!("  [{}]", factory.prefixes().join(", ")));
        }
        out.newline();
    }
    out.flush();
    Ok(())
}
