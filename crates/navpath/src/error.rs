use thiserror::Error;

/// Invalid mesh input. These are precondition violations of the mesh producer; a graph is never
/// built from input that triggers one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavMeshError {
    #[error("index buffer length {0} is not a multiple of 3")]
    IndexCountNotMultipleOfThree(usize),

    #[error("triangle {triangle} references vertex {index}, but only {vertex_count} vertices exist")]
    VertexIndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("{areas} area ids supplied for {triangles} triangles")]
    AreaCountMismatch { triangles: usize, areas: usize },

    #[error("edge ({a}, {b}) is shared by more than two triangles (third owner: triangle {triangle})")]
    NonManifoldEdge { a: u32, b: u32, triangle: usize },
}

pub type Result<T> = std::result::Result<T, NavMeshError>;
