//! Scene graph nodes
//!
//! Nodes live in one flat `Vec` owned by the asset; children are indices into
//! it.

use glam::{Mat4, Quat, Vec3};

/// Translation / rotation / scale triple. Absent parts fall back to zero,
/// identity and one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trs {
    pub translation: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
}

impl Trs {
    /// `T * R * S`
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.unwrap_or(Vec3::ONE),
            self.rotation.unwrap_or(Quat::IDENTITY),
            self.translation.unwrap_or(Vec3::ZERO),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeTransform {
    Matrix(Mat4),
    Trs(Trs),
}

impl Default for NodeTransform {
    fn default() -> Self {
        NodeTransform::Trs(Trs::default())
    }
}

impl NodeTransform {
    pub fn local_matrix(&self) -> Mat4 {
        match self {
            NodeTransform::Matrix(matrix) => *matrix,
            NodeTransform::Trs(trs) => trs.matrix(),
        }
    }

    /// Current transform as TRS. A matrix is decomposed.
    pub fn to_trs(&self) -> Trs {
        match *self {
            NodeTransform::Trs(trs) => trs,
            NodeTransform::Matrix(matrix) => {
                let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
                Trs {
                    translation: Some(translation),
                    rotation: Some(rotation),
                    scale: Some(scale),
                }
            }
        }
    }

    /// Edit the TRS components in place. A matrix transform is decomposed
    /// first and the node stays TRS from then on.
    pub fn update_trs(&mut self, edit: impl FnOnce(&mut Trs)) {
        let mut trs = self.to_trs();
        edit(&mut trs);
        *self = NodeTransform::Trs(trs);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: Option<String>,
    pub children: Vec<usize>,
    pub transform: NodeTransform,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    /// World transform written by the last propagation pass.
    pub world_transform: Mat4,
}

impl Node {
    pub fn new(transform: NodeTransform) -> Self {
        Self {
            transform,
            world_transform: Mat4::IDENTITY,
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<usize>) -> Self {
        self.children = children;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}
