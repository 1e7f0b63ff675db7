//! Variable expansion for user-supplied configuration fields.
//!
//! Pattern, track, percentage and release-notes fields may reference build
//! environment variables as `$NAME` or `${NAME}`. Expansion happens before
//! any validation; unknown variables expand to the empty string.

use std::collections::BTreeMap;

/// The build environment used for variable expansion.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    pub fn from_process_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Add a variable, builder-style.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Expand `$NAME` and `${NAME}` references in `raw`.
    ///
    /// A `$` not followed by a variable name is kept literally.
    pub fn expand(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            match chars.peek() {
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if closed {
                        out.push_str(self.get(&name).unwrap_or(""));
                    } else {
                        // Unterminated reference: keep the raw text.
                        out.push_str("${");
                        out.push_str(&name);
                    }
                }
                Some(&c) if c.is_ascii_alphanumeric() || c == '_' => {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(self.get(&name).unwrap_or(""));
                }
                _ => out.push('$'),
            }
        }

        out
    }
}
