//! Scenario file loading
//!
//! Plain text, one directive per line, sequence number = line position
//! (1-based). A line whose first `;`-field is `skip` runs a step with the
//! receiver torn down; any other line is the literal output the receiver
//! must produce for that step, terminator included.

use std::path::Path;

use crate::common::{Error, Result};

/// Marker field opening a skip directive.
const SKIP_MARKER: &str = "skip";
/// Receiver output carries at least this many `;`-separated fields.
const MIN_FIELDS: usize = 4;

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// The receiver must produce exactly this line, terminator included.
    Assert { expected: String },
    /// The receiver is torn down for this step; nothing is read.
    Skip,
}

/// An ordered sequence of directives loaded from one scenario file.
#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub directives: Vec<Directive>,
}

impl Scenario {
    /// Load and validate a scenario file.
    ///
    /// An assert line that cannot split into [`MIN_FIELDS`] fields could
    /// never match real receiver output, so it is rejected here, before
    /// any process is spawned.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ScenarioParse {
            path: path.display().to_string(),
            line: 0,
            reason: e.to_string(),
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::parse(name, &content, path)
    }

    fn parse(name: String, content: &str, path: &Path) -> Result<Self> {
        let mut directives = Vec::new();

        for (i, line) in content.split_inclusive('\n').enumerate() {
            let body = strip_terminator(line);
            if body.split(';').next() == Some(SKIP_MARKER) {
                directives.push(Directive::Skip);
                continue;
            }

            let fields = body.split(';').count();
            if fields < MIN_FIELDS {
                return Err(Error::ScenarioParse {
                    path: path.display().to_string(),
                    line: i + 1,
                    reason: format!(
                        "expected at least {MIN_FIELDS} `;`-separated fields, found {fields}"
                    ),
                });
            }
            directives.push(Directive::Assert {
                expected: line.to_string(),
            });
        }

        if directives.is_empty() {
            return Err(Error::ScenarioParse {
                path: path.display().to_string(),
                line: 1,
                reason: "scenario file is empty".to_string(),
            });
        }

        Ok(Self { name, directives })
    }
}

/// Strip exactly one trailing `\n` or `\r\n`; interior bytes are untouched.
fn strip_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(l) => l.strip_suffix('\r').unwrap_or(l),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Scenario> {
        Scenario::parse("test".to_string(), content, Path::new("test.scenario"))
    }

    #[test]
    fn assert_lines_keep_their_terminator() {
        let s = parse("1;alice;verified;1\r\n2;alice;verified;2\r\n").unwrap();
        assert_eq!(s.directives.len(), 2);
        assert_eq!(
            s.directives[0],
            Directive::Assert {
                expected: "1;alice;verified;1\r\n".to_string()
            }
        );
    }

    #[test]
    fn skip_marker_opens_a_skip_directive() {
        let s = parse("1;alice;verified;1\r\nskip;receiver offline\r\n1;alice;verified;3\r\n")
            .unwrap();
        assert_eq!(s.directives[1], Directive::Skip);
        assert_eq!(s.directives.len(), 3);
    }

    #[test]
    fn bare_skip_is_accepted() {
        let s = parse("skip\n").unwrap();
        assert_eq!(s.directives[0], Directive::Skip);
    }

    #[test]
    fn too_few_fields_is_rejected_with_line_number() {
        let err = parse("1;alice;verified;1\r\n1;alice\r\n").unwrap_err();
        match err {
            Error::ScenarioParse { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("fields"), "reason: {reason}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(parse("").is_err());
    }

    #[test]
    fn blank_line_is_rejected() {
        assert!(parse("1;a;b;c\n\n1;a;b;c\n").is_err());
    }

    #[test]
    fn final_line_without_newline_is_kept_verbatim() {
        let s = parse("1;alice;verified;x").unwrap();
        assert_eq!(
            s.directives[0],
            Directive::Assert {
                expected: "1;alice;verified;x".to_string()
            }
        );
    }
}
