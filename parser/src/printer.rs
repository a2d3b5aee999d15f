//! Canonical document printing.
//!
//! The printed text is what the network executor sends as `documentText`; it
//! parses back to an equal AST (spans aside).

use crate::ast::*;
use std::fmt::{self, Write};

impl Operation {
    /// Render this operation as compact document text.
    pub fn to_document_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.keyword())?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        if !self.variables.is_empty() {
            f.write_str("(")?;
            for (i, def) in self.variables.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "${}: {}", def.name, def.type_ref)?;
                if let Some(default) = &def.default {
                    write!(f, " = {}", default)?;
                }
            }
            f.write_str(")")?;
        }
        write!(f, " {}", self.selection)
    }
}

impl fmt::Display for SelectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for field in &self.fields {
            write!(f, " {}", field)?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{}: ", alias)?;
        }
        f.write_str(&self.name)?;
        write_arguments(f, &self.arguments)?;
        for directive in &self.directives {
            write!(f, " @{}", directive.name)?;
            write_arguments(f, &directive.arguments)?;
        }
        if let Some(selection) = &self.selection {
            write!(f, " {}", selection)?;
        }
        Ok(())
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Argument]) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    f.write_str("(")?;
    for (i, arg) in arguments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", arg.name, arg.value)?;
    }
    f.write_str(")")
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Variable(name) => write!(f, "${}", name),
            ArgValue::Null => f.write_str("null"),
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(fl) => write!(f, "{:?}", fl),
            ArgValue::String(s) => {
                f.write_char('"')?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => f.write_char(c)?,
                    }
                }
                f.write_char('"')
            }
            ArgValue::Enum(name) => f.write_str(name),
            ArgValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ArgValue::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: {}", key, value)?;
                }
                f.write_str(" }")
            }
        }
    }
}
