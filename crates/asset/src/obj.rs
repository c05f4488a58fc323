//! OBJ parser: positions, texture coordinates, normals and polygon faces.
//!
//! Parsing is best-effort. Anomalies are collected as [`Diagnostic`]s and
//! never abort the parse; coordinates that fail to parse become NaN so the
//! caller can reject the geometry once it is analyzed.

use std::{
    borrow::Cow,
    collections::HashMap,
    fmt,
    fs::File,
    io::{BufRead, BufReader, Read},
    ops::Range,
    path::Path,
};

use anyhow::{Context, Result};

use crate::mesh::{IndexData, MeshBuffers, MeshVertex};
use crate::summary::ModelSummary;

/// Parsed mesh plus everything the parser noticed on the way.
#[derive(Clone, Debug, Default)]
pub struct ParsedObj {
    pub mesh: MeshBuffers,
    pub diagnostics: Vec<Diagnostic>,
    /// Line-count statistics of the source text.
    pub summary: ModelSummary,
}

/// Category of a non-fatal parser anomaly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Directive the parser does not handle (`g`, `s`, `usemtl`, ...).
    UnsupportedDirective,
    /// Coordinate field missing or not a number; stored as NaN.
    InvalidNumeric,
    /// Face index sub-field that is not an integer.
    InvalidIndex,
    /// Face index past the end of its attribute array.
    IndexOutOfRange,
    /// Face with fewer than three corners.
    DegenerateFace,
    /// More distinct vertices than a 32-bit index can address.
    TooManyVertices,
}

/// One parser anomaly, tied to a 1-based logical line.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {:?}: {}", self.line, self.kind, self.message)
    }
}

/// Identity of an emitted vertex: 0-based position/texcoord/normal indices.
///
/// `position` is `None` when the position sub-field could not be parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexKey {
    pub position: Option<i64>,
    pub texcoord: Option<i64>,
    pub normal: Option<i64>,
}

#[derive(Clone, Copy, Debug)]
struct Corner {
    key: VertexKey,
    line: usize,
}

/// Attribute arrays and face records, as scanned from the source.
#[derive(Default)]
struct RawGeometry {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    corners: Vec<Corner>,
    faces: Vec<Range<usize>>,
}

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<ParsedObj> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.as_ref().display()))?;
    load_obj_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read OBJ file: {}", path.as_ref().display()))
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
///
/// The whole input is buffered first; line continuations may span reads.
pub fn load_obj_from_reader<R: BufRead>(mut reader: R) -> Result<ParsedObj> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .context("OBJ source is not valid UTF-8 text")?;
    Ok(parse_obj(&contents))
}

/// Parse OBJ text into deduplicated, fan-triangulated buffers.
pub fn parse_obj(source: &str) -> ParsedObj {
    let mut diagnostics = Vec::new();
    let joined = join_continuations(source);
    let raw = scan(&joined, &mut diagnostics);
    let mesh = assemble(&raw, &mut diagnostics);
    let summary = ModelSummary::from_source(source);

    if !diagnostics.is_empty() {
        log::info!(
            "OBJ parsed with {} diagnostic(s): {} vertices, {} triangles",
            diagnostics.len(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
    }

    ParsedObj {
        mesh,
        diagnostics,
        summary,
    }
}

/// Collapse `\` + whitespace-containing-a-newline into one space.
///
/// The whitespace run after the backslash is consumed up to and including its
/// last line break; a backslash not followed by one is kept verbatim.
fn join_continuations(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let ws_len = after.len() - after.trim_start().len();
        match after[..ws_len].rfind('\n') {
            Some(nl) => {
                out.push(' ');
                rest = &after[nl + 1..];
            }
            None => {
                out.push('\\');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn scan(text: &str, diagnostics: &mut Vec<Diagnostic>) -> RawGeometry {
    let mut raw = RawGeometry::default();

    for (line_idx, line) in text.split('\n').enumerate() {
        let line_no = line_idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate", diagnostics);
                let y = parse_f32(parts.next(), line_no, "y coordinate", diagnostics);
                let z = parse_f32(parts.next(), line_no, "z coordinate", diagnostics);
                raw.positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate", diagnostics);
                let v = parse_f32(parts.next(), line_no, "v coordinate", diagnostics);
                raw.texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate", diagnostics);
                let ny = parse_f32(parts.next(), line_no, "ny coordinate", diagnostics);
                let nz = parse_f32(parts.next(), line_no, "nz coordinate", diagnostics);
                raw.normals.push([nx, ny, nz]);
            }
            "f" => {
                let start = raw.corners.len();
                for token in parts {
                    let key = parse_corner(token, line_no, diagnostics);
                    raw.corners.push(Corner { key, line: line_no });
                }
                let end = raw.corners.len();
                if end - start < 3 {
                    push_diagnostic(
                        diagnostics,
                        line_no,
                        DiagnosticKind::DegenerateFace,
                        format!("face has {} corner(s), need at least 3", end - start),
                    );
                    raw.corners.truncate(start);
                    continue;
                }
                raw.faces.push(start..end);
            }
            // Object names and material libraries carry nothing we render.
            "o" | "mtllib" => {}
            other => {
                log::debug!("Ignoring unsupported OBJ line {}: '{}'", line_no, trimmed);
                diagnostics.push(Diagnostic {
                    line: line_no,
                    kind: DiagnosticKind::UnsupportedDirective,
                    message: format!("unsupported directive '{other}'"),
                });
            }
        }
    }

    raw
}

/// Resolve faces into emitted vertices and triangle indices.
fn assemble(raw: &RawGeometry, diagnostics: &mut Vec<Diagnostic>) -> MeshBuffers {
    let mut unique: HashMap<VertexKey, u32> = HashMap::new();
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut ordinals: Vec<u32> = Vec::new();

    'faces: for face in &raw.faces {
        let corners = &raw.corners[face.clone()];
        // Triangulate fan
        for tri in 1..(corners.len() - 1) {
            let mut triangle = [0u32; 3];
            for (slot, corner) in [corners[0], corners[tri], corners[tri + 1]]
                .into_iter()
                .enumerate()
            {
                triangle[slot] = match unique.get(&corner.key) {
                    Some(&idx) => idx,
                    None => {
                        let Some(idx) = next_ordinal(vertices.len()) else {
                            push_diagnostic(
                                diagnostics,
                                corner.line,
                                DiagnosticKind::TooManyVertices,
                                format!(
                                    "too many vertices in OBJ (>{}); remaining faces dropped",
                                    u32::MAX
                                ),
                            );
                            break 'faces;
                        };
                        vertices.push(resolve_vertex(raw, corner, diagnostics));
                        unique.insert(corner.key, idx);
                        idx
                    }
                };
            }
            ordinals.extend_from_slice(&triangle);
        }
    }

    MeshBuffers::new(vertices, IndexData::from_ordinals(ordinals))
}

/// Ordinal for the vertex emitted after `emitted` others, if it fits in `u32`.
fn next_ordinal(emitted: usize) -> Option<u32> {
    u32::try_from(emitted).ok()
}

fn resolve_vertex(raw: &RawGeometry, corner: Corner, diagnostics: &mut Vec<Diagnostic>) -> MeshVertex {
    let key = corner.key;
    let position = match key.position {
        Some(i) => match lookup(&raw.positions, i) {
            Some(p) => p,
            None => {
                push_diagnostic(
                    diagnostics,
                    corner.line,
                    DiagnosticKind::IndexOutOfRange,
                    format!(
                        "position index {} out of range (len={})",
                        i + 1,
                        raw.positions.len()
                    ),
                );
                [f32::NAN; 3]
            }
        },
        None => [f32::NAN; 3],
    };

    let uv = resolve_optional(
        &raw.texcoords,
        key.texcoord,
        MeshVertex::DEFAULT_UV,
        "texcoord",
        corner.line,
        diagnostics,
    );
    let normal = resolve_optional(
        &raw.normals,
        key.normal,
        MeshVertex::DEFAULT_NORMAL,
        "normal",
        corner.line,
        diagnostics,
    );

    MeshVertex::new(position, normal, uv)
}

/// Attribute lookup with the default for absent, negative or missing data.
fn resolve_optional<const N: usize>(
    values: &[[f32; N]],
    index: Option<i64>,
    default: [f32; N],
    what: &str,
    line_no: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> [f32; N] {
    match index {
        Some(i) if i >= 0 && !values.is_empty() => lookup(values, i).unwrap_or_else(|| {
            push_diagnostic(
                diagnostics,
                line_no,
                DiagnosticKind::IndexOutOfRange,
                format!("{what} index {} out of range (len={})", i + 1, values.len()),
            );
            default
        }),
        _ => default,
    }
}

fn lookup<const N: usize>(values: &[[f32; N]], index: i64) -> Option<[f32; N]> {
    usize::try_from(index)
        .ok()
        .and_then(|i| values.get(i).copied())
}

fn parse_f32(
    value: Option<&str>,
    line_no: usize,
    what: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> f32 {
    let Some(token) = value else {
        push_diagnostic(
            diagnostics,
            line_no,
            DiagnosticKind::InvalidNumeric,
            format!("missing {what}"),
        );
        return f32::NAN;
    };
    token.parse::<f32>().unwrap_or_else(|_| {
        push_diagnostic(
            diagnostics,
            line_no,
            DiagnosticKind::InvalidNumeric,
            format!("failed to parse {what} from '{token}'"),
        );
        f32::NAN
    })
}

/// Split `pos[/tex[/norm]]` into a key of 0-based indices.
fn parse_corner(token: &str, line_no: usize, diagnostics: &mut Vec<Diagnostic>) -> VertexKey {
    let mut split = token.split('/');
    let position = split
        .next()
        .and_then(|value| parse_index(value, token, line_no, diagnostics));
    let texcoord = match split.next() {
        Some(value) if !value.is_empty() => parse_index(value, token, line_no, diagnostics),
        _ => None,
    };
    let normal = match split.next() {
        Some(value) if !value.is_empty() => parse_index(value, token, line_no, diagnostics),
        _ => None,
    };

    VertexKey {
        position,
        texcoord,
        normal,
    }
}

fn parse_index(
    value: &str,
    token: &str,
    line_no: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<i64> {
    match value.parse::<i64>().map(|raw| raw.checked_sub(1)) {
        Ok(Some(index)) => Some(index),
        Ok(None) => {
            push_diagnostic(
                diagnostics,
                line_no,
                DiagnosticKind::IndexOutOfRange,
                format!("index '{value}' in face element '{token}' is out of range"),
            );
            None
        }
        Err(_) => {
            push_diagnostic(
                diagnostics,
                line_no,
                DiagnosticKind::InvalidIndex,
                format!("invalid index '{value}' in face element '{token}'"),
            );
            None
        }
    }
}

fn push_diagnostic(
    diagnostics: &mut Vec<Diagnostic>,
    line: usize,
    kind: DiagnosticKind,
    message: String,
) {
    log::warn!("OBJ line {}: {}", line, message);
    diagnostics.push(Diagnostic {
        line,
        kind,
        message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::IndexWidth;
    use std::collections::HashSet;

    fn kinds(parsed: &ParsedObj) -> Vec<DiagnosticKind> {
        parsed.diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let parsed = parse_obj(src);
        assert_eq!(parsed.mesh.vertices.len(), 3);
        assert_eq!(parsed.mesh.indices.len(), 3);
        assert!(parsed.mesh.is_valid());
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.mesh.vertices[1].uv, [1.0, 0.0]);
    }

    #[test]
    fn bare_triangle_yields_identity_indices() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3");
        let mesh = &parsed.mesh;
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices.to_vec(), vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.index_width(), IndexWidth::Narrow);
    }

    #[test]
    fn quad_is_fan_triangulated() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4");
        // (1,2,3) and (1,3,4) in 1-based source terms.
        assert_eq!(parsed.mesh.indices.to_vec(), vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(parsed.mesh.vertex_count(), 4);
    }

    #[test]
    fn ngon_emits_k_minus_two_triangles() {
        for k in 3..10usize {
            let mut src = String::new();
            for i in 0..k {
                let a = i as f32 / k as f32 * std::f32::consts::TAU;
                src.push_str(&format!("v {} {} 0\n", a.cos(), a.sin()));
            }
            src.push('f');
            for i in 1..=k {
                src.push_str(&format!(" {i}"));
            }
            let parsed = parse_obj(&src);
            assert_eq!(parsed.mesh.indices.len(), 3 * (k - 2), "k = {k}");
            assert_eq!(parsed.mesh.triangle_count(), k - 2);
        }
    }

    #[test]
    fn corner_without_normal_gets_default_normal() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 0.5 0.5\nvn 1 0 0\nf 1/1/1 2/1/1 3/2";
        let parsed = parse_obj(src);
        let v = parsed.mesh.vertices[2];
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v.uv, [0.5, 0.5]);
        assert_eq!(parsed.mesh.vertices[0].normal, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn position_and_normal_only_corners() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 1 0\nf 1//1 2//1 3//1";
        let parsed = parse_obj(src);
        assert!(parsed.diagnostics.is_empty());
        for v in &parsed.mesh.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
            assert_eq!(v.uv, [0.0, 0.0]);
        }
    }

    #[test]
    fn shared_keys_map_to_one_vertex() {
        let src = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
vn 0 0 -1
f 1//1 2//1 3//1
f 1//1 3//1 4//1
f 1//2 3//2 2//2
";
        let parsed = parse_obj(src);
        let mesh = &parsed.mesh;

        // Same position with a different normal is a different vertex.
        assert_eq!(mesh.vertex_count(), 7);

        let keys: Vec<(usize, usize)> = vec![
            (1, 1), (2, 1), (3, 1),
            (1, 1), (3, 1), (4, 1),
            (1, 2), (3, 2), (2, 2),
        ];
        let distinct: HashSet<_> = keys.iter().collect();
        assert_eq!(distinct.len(), mesh.vertex_count());

        let indices = mesh.indices.to_vec();
        for (a, ka) in keys.iter().enumerate() {
            for (b, kb) in keys.iter().enumerate() {
                assert_eq!(ka == kb, indices[a] == indices[b], "corners {a} and {b}");
            }
        }
    }

    #[test]
    fn emission_follows_first_encounter_order() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 4 2 3\nf 1 2 3";
        let parsed = parse_obj(src);
        let positions = parsed.mesh.positions();
        assert_eq!(
            positions,
            vec![[1.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]
        );
        assert_eq!(parsed.mesh.indices.to_vec(), vec![0, 1, 2, 3, 1, 2]);
    }

    #[test]
    fn indices_stay_in_bounds() {
        let src = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
f 1 2 3 4 5
f 5 4 3
f 2 3 5 1
";
        let mesh = parse_obj(src).mesh;
        assert_eq!(mesh.indices.len() % 3, 0);
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|i| i < count));
    }

    #[test]
    fn comments_objects_and_materials_are_skipped_silently() {
        let src = "# comment\nmtllib scene.mtl\no Cube\n\n   \nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3";
        let parsed = parse_obj(src);
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.mesh.vertex_count(), 3);
    }

    #[test]
    fn unknown_directives_are_reported_not_fatal() {
        let src = "g group\ns 1\nusemtl red\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3";
        let parsed = parse_obj(src);
        assert_eq!(
            kinds(&parsed),
            vec![DiagnosticKind::UnsupportedDirective; 3]
        );
        assert_eq!(parsed.diagnostics[0].line, 1);
        assert_eq!(parsed.mesh.indices.len(), 3);
    }

    #[test]
    fn invalid_coordinate_becomes_nan() {
        let parsed = parse_obj("v 0 abc 0\nv 1 0 0\nv 0 1 0\nf 1 2 3");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::InvalidNumeric]);
        assert!(parsed.mesh.vertices[0].position[1].is_nan());
    }

    #[test]
    fn missing_coordinate_becomes_nan() {
        let parsed = parse_obj("v 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::InvalidNumeric]);
        assert!(parsed.mesh.vertices[0].position[2].is_nan());
    }

    #[test]
    fn out_of_range_position_is_nan() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 7");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::IndexOutOfRange]);
        assert!(parsed.mesh.vertices[2].position.iter().all(|c| c.is_nan()));
    }

    #[test]
    fn negative_or_missing_attribute_indices_use_defaults() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.3 0.3\nvn 1 0 0\nf 1/0/0 2/-1/-1 3";
        let parsed = parse_obj(src);
        assert!(parsed.diagnostics.is_empty());
        for v in &parsed.mesh.vertices {
            assert_eq!(v.uv, [0.0, 0.0]);
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn attribute_index_without_data_uses_defaults() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2/1/1 3/1/1");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn out_of_range_attribute_index_falls_back() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 1 0\nf 1//1 2//1 3//9");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::IndexOutOfRange]);
        assert_eq!(parsed.mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn garbage_indices_are_reported() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/x 2 3");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::InvalidIndex]);
        assert_eq!(parsed.mesh.vertices[0].uv, [0.0, 0.0]);

        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 ?");
        assert!(kinds(&parsed).contains(&DiagnosticKind::InvalidIndex));
        assert!(parsed.mesh.vertices[2].position[0].is_nan());
    }

    #[test]
    fn lowest_index_is_reported_not_wrapped() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -9223372036854775808 2 3");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::IndexOutOfRange]);
        assert_eq!(parsed.mesh.vertex_count(), 3);
        assert!(parsed.mesh.vertices[0].position[0].is_nan());

        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/-9223372036854775808 2 3");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::IndexOutOfRange]);
        assert_eq!(parsed.mesh.vertices[0].uv, MeshVertex::DEFAULT_UV);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn ordinals_stop_at_u32_range() {
        assert_eq!(next_ordinal(0), Some(0));
        assert_eq!(next_ordinal(u32::MAX as usize), Some(u32::MAX));
        assert_eq!(next_ordinal(u32::MAX as usize + 1), None);
    }

    #[test]
    fn summary_travels_with_the_mesh() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        assert_eq!(
            (parsed.summary.vertices, parsed.summary.faces, parsed.summary.triangles),
            (4, 1, 2)
        );
    }

    #[test]
    fn short_faces_emit_nothing() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\nf");
        assert_eq!(kinds(&parsed), vec![DiagnosticKind::DegenerateFace; 2]);
        assert!(parsed.mesh.indices.is_empty());
        assert!(parsed.mesh.vertices.is_empty());
    }

    #[test]
    fn faces_may_reference_later_vertices() {
        let parsed = parse_obj("f 1 2 3\nv 0 0 0\nv 1 0 0\nv 0 1 0");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.mesh.vertices[1].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn line_continuations_are_joined() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 \\\n 4 \\  \r\n3";
        let parsed = parse_obj(src);
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.mesh.indices.to_vec(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn join_keeps_lone_backslashes() {
        assert_eq!(join_continuations("a\\b"), "a\\b");
        assert_eq!(join_continuations("a \\\n\n b"), "a   b");
        assert!(matches!(join_continuations("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn crlf_input_parses() {
        let parsed = parse_obj("v 0 0 0\r\nv 1 0 0\r\nv 0 1 0\r\nf 1 2 3\r\n");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.mesh.indices.len(), 3);
    }

    #[test]
    fn large_meshes_switch_to_wide_indices() {
        // A strip of quads: 2 * 11_000 vertices, 10_999 quads -> 65_994 indices.
        let columns = 11_000;
        let mut src = String::new();
        for x in 0..columns {
            src.push_str(&format!("v {x} 0 0\nv {x} 1 0\n"));
        }
        for x in 0..columns - 1 {
            let a = 2 * x + 1;
            src.push_str(&format!("f {} {} {} {}\n", a, a + 2, a + 3, a + 1));
        }
        let mesh = parse_obj(&src).mesh;
        assert_eq!(mesh.indices.len(), 6 * (columns - 1));
        assert_eq!(mesh.index_width(), IndexWidth::Wide);
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|i| i < count));
    }

    #[test]
    fn reader_and_str_agree() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let from_reader = load_obj_from_reader(std::io::Cursor::new(src)).expect("read");
        assert_eq!(from_reader.mesh, parse_obj(src).mesh);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_obj_from_path("/definitely/not/here.obj").unwrap_err();
        assert!(format!("{err:#}").contains("not/here.obj"));
    }
}
