//! The member catalog: the single source of truth about which operations
//! the subject type offers, how their signatures print, and which of
//! them end the chain.
//!
//! Rust has no runtime reflection, so the catalog is fed an explicit
//! [`SubjectSpec`] descriptor. The descriptor is plain serde data and
//! doubles as the CLI's JSON input format.
//!
//! Display names are normalized once over the whole catalog: a type
//! prints as its bare simple name unless two distinct qualified types
//! share that simple name among the catalogued parameters, in which case
//! the qualified name is used for every occurrence of that simple name.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ConfigurationError, Error, ResolutionError};

/// Describes the subject type whose methods the fluent chain forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSpec {
    /// Subject type name, qualified if needed (`orders.Order`).
    pub name: String,
    pub methods: Vec<MethodSpec>,
}

/// One candidate operation of the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    /// Parameter type names, qualified where the subject's own API is.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default = "default_return_type")]
    pub returns: String,
}

fn default_return_type() -> String {
    "void".to_string()
}

/// Catalog entry: the operation plus its compilation-scoped flags.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub spec: MethodSpec,
    pub display_params: Vec<String>,
    pub display_return: String,
    /// The operation ends the chain and returns the real composed result.
    pub chain_terminal: bool,
    /// Toggled by explicit include/exclude; excluded operations forward
    /// without chaining.
    pub included: bool,
    /// Set the first time the grammar actually uses the operation.
    pub referenced: bool,
}

/// Indexed, overload-aware view of the subject's operations.
#[derive(Debug, Clone)]
pub struct MethodCatalog {
    subject: String,
    subject_display: String,
    /// Keyed by normalized signature; BTreeMap iteration gives the
    /// lexicographic emission order required for reproducible output.
    entries: BTreeMap<String, MethodEntry>,
    /// Raw type atom to display atom.
    type_map: BTreeMap<String, String>,
    needs_wrapper_interface: bool,
}

/// Strip the dotted qualifier from a type name.
fn simple(atom: &str) -> &str {
    atom.rsplit('.').next().unwrap_or(atom)
}

/// The individual type names a possibly-generic type string is built of.
fn atoms(type_name: &str) -> impl Iterator<Item = &str> {
    type_name
        .split(['<', '>', ','])
        .map(str::trim)
        .filter(|a| !a.is_empty())
}

impl MethodCatalog {
    pub fn from_spec(spec: &SubjectSpec) -> Result<Self, Error> {
        let mut param_atoms: BTreeSet<&str> = BTreeSet::new();
        let mut all_atoms: BTreeSet<&str> = BTreeSet::new();
        for m in &spec.methods {
            for p in &m.params {
                param_atoms.extend(atoms(p));
                all_atoms.extend(atoms(p));
            }
            all_atoms.extend(atoms(&m.returns));
        }
        all_atoms.extend(atoms(&spec.name));

        // Simple names claimed by more than one distinct parameter type
        // stay qualified everywhere.
        let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();
        let mut multiple: BTreeSet<&str> = BTreeSet::new();
        for atom in &param_atoms {
            let s = simple(atom);
            match claimed.get(s) {
                Some(first) if *first != *atom => {
                    multiple.insert(s);
                }
                Some(_) => {}
                None => {
                    claimed.insert(s, *atom);
                }
            }
        }

        let mut type_map = BTreeMap::new();
        for atom in all_atoms {
            let s = simple(atom);
            let display = if multiple.contains(s) { atom } else { s };
            if display != atom {
                type_map.insert(atom.to_string(), display.to_string());
            }
        }

        let subject_display = map_type(&type_map, &spec.name);
        let needs_wrapper_interface = spec
            .methods
            .iter()
            .flat_map(|m| m.params.iter())
            .any(|p| p == &spec.name);

        let mut entries = BTreeMap::new();
        for m in &spec.methods {
            let display_params: Vec<String> =
                m.params.iter().map(|p| map_type(&type_map, p)).collect();
            let display_return = map_type(&type_map, &m.returns);
            let signature = format!("{}({})", m.name, display_params.join(","));
            let entry = MethodEntry {
                spec: m.clone(),
                display_params,
                display_return,
                chain_terminal: false,
                included: true,
                referenced: false,
            };
            if entries.insert(signature.clone(), entry).is_some() {
                return Err(ConfigurationError::DuplicateMethod { signature }.into());
            }
        }

        Ok(MethodCatalog {
            subject: spec.name.clone(),
            subject_display,
            entries,
            type_map,
            needs_wrapper_interface,
        })
    }

    /// The subject type name as given in the descriptor.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The subject type name as it prints in generated code.
    pub fn subject_display(&self) -> &str {
        &self.subject_display
    }

    /// True iff any catalogued operation takes a parameter of the subject
    /// type itself. Such parameters must be declared with the umbrella
    /// capability type, because callers never hold the concrete subject.
    pub fn needs_wrapper_interface(&self) -> bool {
        self.needs_wrapper_interface
    }

    /// Normalize a raw type string for display.
    pub fn display_type(&self, raw: &str) -> String {
        map_type(&self.type_map, raw)
    }

    /// Find the signature key for a bare name or full signature, without
    /// marking the operation referenced.
    pub fn find(&self, name: &str) -> Result<String, ResolutionError> {
        if name.contains('(') {
            let key = self.display_type(name);
            if self.entries.contains_key(&key) {
                return Ok(key);
            }
            return Err(ResolutionError::MethodNotFound {
                name: name.to_string(),
                subject: self.subject.clone(),
            });
        }
        let prefix = format!("{}(", name);
        let mut found = None;
        for key in self.entries.keys() {
            if key.starts_with(&prefix) {
                if found.is_some() {
                    return Err(ResolutionError::AmbiguousMethod {
                        name: name.to_string(),
                        subject: self.subject.clone(),
                    });
                }
                found = Some(key.clone());
            }
        }
        found.ok_or_else(|| ResolutionError::MethodNotFound {
            name: name.to_string(),
            subject: self.subject.clone(),
        })
    }

    /// Resolve a call name and mark the operation referenced.
    pub fn resolve(&mut self, name: &str) -> Result<String, ResolutionError> {
        let key = self.find(name)?;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.referenced = true;
        }
        Ok(key)
    }

    pub fn entry(&self, signature: &str) -> Option<&MethodEntry> {
        self.entries.get(signature)
    }

    /// Drop an operation from the fluent chain. The wrapper still
    /// forwards it, but without returning the chain handle.
    pub fn exclude(&mut self, name: &str) -> Result<(), Error> {
        let key = match self.find(name) {
            Ok(key) => key,
            Err(ResolutionError::MethodNotFound { name, subject }) => {
                return Err(ConfigurationError::UnknownExclusion { name, subject }.into());
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.included = false;
        }
        Ok(())
    }

    /// Put an operation back into the fluent chain. Marks it referenced.
    pub fn include(&mut self, name: &str) -> Result<(), Error> {
        let key = self.resolve(name)?;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.included = true;
        }
        Ok(())
    }

    /// Flag an operation as a legal last call of the chain. Called by
    /// exit-type resolution, not by grammar authors.
    pub fn mark_chain_terminal(&mut self, name: &str) -> Result<String, ResolutionError> {
        let key = self.resolve(name)?;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.chain_terminal = true;
        }
        Ok(key)
    }

    /// Signatures of every operation the grammar referenced, in the
    /// lexicographic order the wrapper emits them.
    pub fn referenced_signatures(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.referenced)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Clear the compilation-scoped flags so the catalog can seed
    /// another compilation over the same subject.
    pub fn reset_references(&mut self) {
        for entry in self.entries.values_mut() {
            entry.referenced = false;
            entry.chain_terminal = false;
        }
    }
}

fn map_type(type_map: &BTreeMap<String, String>, raw: &str) -> String {
    // Longest raw names first so a qualified name is never clipped by a
    // shorter mapping that happens to be its substring.
    let mut mappings: Vec<(&String, &String)> = type_map.iter().collect();
    mappings.sort_by_key(|(raw, _)| std::cmp::Reverse(raw.len()));
    let mut out = raw.to_string();
    for (from, to) in mappings {
        out = out.replace(from.as_str(), to);
    }
    out
}
