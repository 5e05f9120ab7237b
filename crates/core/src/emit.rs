//! TypeScript source emission.
//!
//! [`TsWriter`] is a small indentation-managed writer for block
//! structured output; the free functions format one operation in its
//! three emitted shapes: the interface declaration, the wrapper method
//! head, and the forwarding call on the underlying subject.
//!
//! Parameters of the subject's own type are declared as the
//! [`WRAPPER_INTERFACE`] capability and unwrapped at the call site,
//! because callers never hold the concrete subject, only a
//! capability-typed handle.

use crate::catalog::{MethodCatalog, MethodEntry};

/// Name of the generated wrapper class.
pub const WRAPPER_CLASS: &str = "Wrapper";
/// Name of the empty capability interface standing in for subject-typed
/// parameters.
pub const WRAPPER_INTERFACE: &str = "WrapperInterface";

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct TsWriter {
    out: String,
    depth: usize,
}

impl TsWriter {
    pub fn new() -> Self {
        TsWriter::default()
    }

    /// One indented line.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Open a block: `head {` and one level of indentation.
    pub fn open(&mut self, head: &str) {
        self.line(&format!("{} {{", head));
        self.depth += 1;
    }

    pub fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    /// Append pre-rendered text verbatim.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// `name(arg1: T1, arg2: T2): Return` for the given operation.
fn method_head(catalog: &MethodCatalog, entry: &MethodEntry, return_type: &str) -> String {
    let params: Vec<String> = entry
        .spec
        .params
        .iter()
        .zip(&entry.display_params)
        .enumerate()
        .map(|(i, (raw, display))| {
            let declared = if raw.as_str() == catalog.subject() {
                WRAPPER_INTERFACE
            } else {
                display.as_str()
            };
            format!("arg{}: {}", i + 1, declared)
        })
        .collect();
    format!(
        "{}({}): {}",
        entry.spec.name,
        params.join(", "),
        return_type
    )
}

/// The operation as an interface member declaration.
pub fn interface_method(catalog: &MethodCatalog, entry: &MethodEntry, return_type: &str) -> String {
    format!("{};", method_head(catalog, entry, return_type))
}

/// The operation as a wrapper method head, ready for `TsWriter::open`.
pub fn wrapper_method(catalog: &MethodCatalog, entry: &MethodEntry, return_type: &str) -> String {
    method_head(catalog, entry, return_type)
}

/// The call expression forwarded to the subject: `name(arg1, ...)`,
/// unwrapping capability-typed arguments back to the subject.
pub fn forwarding_call(catalog: &MethodCatalog, entry: &MethodEntry) -> String {
    let args: Vec<String> = entry
        .spec
        .params
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            if raw.as_str() == catalog.subject() {
                format!("(arg{} as {}).that", i + 1, WRAPPER_CLASS)
            } else {
                format!("arg{}", i + 1)
            }
        })
        .collect();
    format!("{}({})", entry.spec.name, args.join(", "))
}
