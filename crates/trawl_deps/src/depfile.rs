//! Make-format dependency file rendering.
//!
//! Renders the flat file-dependency list as `target: prereq prereq ...` with
//! backslash line continuations, the format conventional build tools consume.
//! This format cannot represent explicit module files; module information is
//! intentionally dropped by callers using it.

/// Maximum output column before a line continuation is emitted.
const WRAP_COLUMN: usize = 78;

/// Options controlling dependency-file output, communicated by the front
/// end from the compile command's `-MT`/`-MP`-style flags.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DepFileOptions {
    /// Rule targets. Rendered in order, space-separated.
    pub targets: Vec<String>,
    /// Emit an empty phony rule for every prerequisite except the first,
    /// so deleting a header does not break incremental builds.
    pub phony_targets: bool,
}

impl DepFileOptions {
    /// Creates options with a single target and no phony rules.
    pub fn target(name: impl Into<String>) -> Self {
        Self {
            targets: vec![name.into()],
            phony_targets: false,
        }
    }
}

/// Renders a dependency file for the given prerequisites.
pub fn render(opts: &DepFileOptions, deps: &[String]) -> String {
    let mut out = String::new();

    let mut column = 0;
    for (i, target) in opts.targets.iter().enumerate() {
        let target = escape(target);
        if i > 0 {
            out.push(' ');
            column += 1;
        }
        out.push_str(&target);
        column += target.len();
    }
    out.push(':');
    column += 1;

    for dep in deps {
        let dep = escape(dep);
        if column + dep.len() + 1 > WRAP_COLUMN {
            out.push_str(" \\\n  ");
            column = 2;
        } else {
            out.push(' ');
            column += 1;
        }
        out.push_str(&dep);
        column += dep.len();
    }
    out.push('\n');

    if opts.phony_targets {
        for dep in deps.iter().skip(1) {
            out.push('\n');
            out.push_str(&escape(dep));
            out.push_str(":\n");
        }
    }

    out
}

/// Escapes characters that are significant to make: spaces, `#`, and `$`.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ' ' => out.push_str("\\ "),
            '#' => out.push_str("\\#"),
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}
