//! 几何工具：三角网格与网格相交测试

mod intersect;
mod trimesh;

pub use intersect::{edge_triangle_intersect, meshes_intersect, triangles_intersect, Aabb, EPSILON};
pub use trimesh::TriMesh;
