//! The JSON definition file the CLI consumes: a subject descriptor, a
//! grammar expression, and the generation options.

use serde::{Deserialize, Serialize};
use typeweave_core::{FluentBuilder, SubjectSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub subject: SubjectSpec,
    /// Regex-like grammar expression over the subject's methods.
    pub grammar: String,
    /// Name of the generated factory function.
    #[serde(default)]
    pub start: Option<String>,
    /// Declared exit type wrapping the entry capability interface.
    #[serde(default)]
    pub fluent_type: Option<String>,
    /// Extra interface names the generated types extend and implement.
    #[serde(default)]
    pub implement: Vec<String>,
    /// Cloning operation; registering one switches the wrapper to
    /// persistent chains.
    #[serde(default)]
    pub cloner: Option<String>,
    /// Methods dropped from the fluent chain.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Run the whole pipeline for one definition: catalog, builder options,
/// textual grammar, normalization, compilation.
pub fn generate(definition: &Definition) -> Result<String, String> {
    let mut builder = FluentBuilder::new(&definition.subject).map_err(|e| e.to_string())?;
    for method in &definition.exclude {
        builder = builder.exclude(method).map_err(|e| e.to_string())?;
    }
    if let Some(cloner) = &definition.cloner {
        builder = builder.cloner(cloner).map_err(|e| e.to_string())?;
    }
    if let Some(start) = &definition.start {
        builder = builder.start(start);
    }
    if let Some(fluent_type) = &definition.fluent_type {
        builder = builder.fluent_type(fluent_type);
    }
    for interface in &definition.implement {
        builder = builder.implement(interface);
    }
    let builder =
        typeweave_syntax::apply(builder, &definition.grammar).map_err(|e| e.to_string())?;
    builder.optimize().generate().map_err(|e| e.to_string())
}
