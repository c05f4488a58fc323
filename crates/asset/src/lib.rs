//! Asset loading: OBJ mesh parsing, geometry analysis and model statistics.

pub mod bounds;
pub mod mesh;
pub mod obj;
pub mod summary;

pub use bounds::{BoundingBox, analyze};
pub use mesh::{IndexData, IndexWidth, MeshBuffers, MeshVertex};
pub use obj::{
    Diagnostic, DiagnosticKind, ParsedObj, load_obj_from_path, load_obj_from_reader, parse_obj,
};
pub use summary::ModelSummary;
