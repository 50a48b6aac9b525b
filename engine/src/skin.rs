//! Skinning resolver
//!
//! Refreshes one joint matrix per joint after transform propagation.

use std::fmt;
use std::str::FromStr;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::node::Node;

/// How a joint matrix is composed from the propagated node transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JointMatrixFormula {
    /// `world(joint)`
    #[default]
    World,
    /// `world(joint) * inverse_bind`
    WorldInverseBind,
    /// `inverse(world(skeleton)) * world(joint) * inverse_bind`
    SkeletonRelative,
}

impl JointMatrixFormula {
    pub fn as_str(self) -> &'static str {
        match self {
            JointMatrixFormula::World => "world",
            JointMatrixFormula::WorldInverseBind => "world-inverse-bind",
            JointMatrixFormula::SkeletonRelative => "skeleton-relative",
        }
    }
}

impl fmt::Display for JointMatrixFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JointMatrixFormula {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "world" => Ok(JointMatrixFormula::World),
            "world-inverse-bind" => Ok(JointMatrixFormula::WorldInverseBind),
            "skeleton-relative" => Ok(JointMatrixFormula::SkeletonRelative),
            other => Err(format!(
                "unknown joint matrix formula '{other}' (expected world, world-inverse-bind or skeleton-relative)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    pub name: Option<String>,
    pub joints: Vec<usize>,
    /// One per joint; identity when the document has none
    pub inverse_bind_matrices: Vec<Mat4>,
    pub skeleton: Option<usize>,
    joint_matrices: Vec<Mat4>,
}

impl Skin {
    pub fn new(
        name: Option<String>,
        joints: Vec<usize>,
        inverse_bind_matrices: Vec<Mat4>,
        skeleton: Option<usize>,
    ) -> Self {
        let joint_matrices = vec![Mat4::IDENTITY; joints.len()];
        Self {
            name,
            joints,
            inverse_bind_matrices,
            skeleton,
            joint_matrices,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Joint matrices from the last [`Skin::update_joint_matrices`] call,
    /// parallel to `joints`.
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// True when any inverse-bind matrix differs from identity.
    pub fn has_bind_offsets(&self) -> bool {
        self.inverse_bind_matrices
            .iter()
            .any(|m| !m.abs_diff_eq(Mat4::IDENTITY, 1e-6))
    }

    /// Recompute joint matrices from propagated world transforms.
    pub fn update_joint_matrices(&mut self, nodes: &[Node], formula: JointMatrixFormula) {
        let world = |index: usize| nodes.get(index).map_or(Mat4::IDENTITY, |n| n.world_transform);
        let skeleton_inverse = match (formula, self.skeleton) {
            (JointMatrixFormula::SkeletonRelative, Some(root)) => Some(world(root).inverse()),
            _ => None,
        };

        for (i, &joint) in self.joints.iter().enumerate() {
            let joint_world = world(joint);
            let inverse_bind = self
                .inverse_bind_matrices
                .get(i)
                .copied()
                .unwrap_or(Mat4::IDENTITY);
            self.joint_matrices[i] = match formula {
                JointMatrixFormula::World => joint_world,
                JointMatrixFormula::WorldInverseBind => joint_world * inverse_bind,
                JointMatrixFormula::SkeletonRelative => match skeleton_inverse {
                    Some(root_inverse) => root_inverse * joint_world * inverse_bind,
                    None => joint_world * inverse_bind,
                },
            };
        }
    }
}
