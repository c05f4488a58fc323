//! Cheap model statistics for display.
//!
//! Counts come from line prefixes of the raw source, not from the parser's
//! triangulation, so they can disagree with the uploaded mesh on malformed
//! or unusual input (tabs between fields, continuations, short faces).

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModelSummary {
    /// Lines starting with `"v "`.
    pub vertices: usize,
    /// Lines starting with `"f "`.
    pub faces: usize,
    /// Sum over face lines of `corners - 2`, corners being the fields after
    /// `f` split on single spaces.
    pub triangles: usize,
}

impl ModelSummary {
    pub fn from_source(source: &str) -> Self {
        let mut summary = Self::default();
        for line in source.split('\n') {
            if line.starts_with("v ") {
                summary.vertices += 1;
            } else if line.starts_with("f ") {
                summary.faces += 1;
                let corners = line.split(' ').count() - 1;
                summary.triangles += corners.saturating_sub(2);
            }
        }
        summary
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vertices: {}  Faces: {}  Triangles: {}",
            self.vertices, self.faces, self.triangles
        )
    }
}
