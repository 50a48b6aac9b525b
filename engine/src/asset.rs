//! Asset aggregate: one imported model with its node tree, uploaded meshes,
//! skins, animations, placement and clock.
//!
//! Per frame the steps run in a fixed order: [`Asset::animate`],
//! [`Asset::calculate_locals`], [`Asset::update_joint_matrices`],
//! [`Asset::render`]. [`Asset::tick`] runs all four.

use glam::{Mat4, Vec3};

use crate::animation::{self, Animation, AnimationClock};
use crate::backend::{DrawSink, RenderBackend};
use crate::config::AnimationConfig;
use crate::import::ImportedScene;
use crate::mesh::Mesh;
use crate::node::Node;
use crate::render;
use crate::skin::{JointMatrixFormula, Skin};

/// World placement of a whole asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub location: Vec3,
    pub axis: Vec3,
    pub angle_degrees: f32,
    pub scale: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            axis: Vec3::Y,
            angle_degrees: 0.0,
            scale: 1.0,
        }
    }
}

impl Placement {
    /// translate, then rotate about `axis`, then uniform scale
    pub fn matrix(&self) -> Mat4 {
        let axis = self.axis.try_normalize().unwrap_or(Vec3::Y);
        Mat4::from_translation(self.location)
            * Mat4::from_axis_angle(axis, self.angle_degrees.to_radians())
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

#[derive(Debug)]
pub struct Asset {
    label: String,
    roots: Vec<usize>,
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    skins: Vec<Skin>,
    animations: Vec<Animation>,
    pub placement: Placement,
    clock: AnimationClock,
    formula: JointMatrixFormula,
    time_scale: f32,
    animating: bool,
}

impl Asset {
    /// Upload the scene's meshes and compute the initial pose.
    pub fn new(
        label: impl Into<String>,
        scene: ImportedScene,
        backend: &mut dyn RenderBackend,
        settings: &AnimationConfig,
        placement: Placement,
    ) -> Self {
        let label = label.into();
        let meshes = scene.meshes.iter().map(|mesh| mesh.upload(backend)).collect();

        if settings.joint_matrix_formula == JointMatrixFormula::World {
            for skin in scene.skins.iter().filter(|skin| skin.has_bind_offsets()) {
                tracing::warn!(
                    "Skin '{}' in '{}' has inverse bind matrices that the 'world' joint formula ignores",
                    skin.display_name(),
                    label
                );
            }
        }

        let mut asset = Self {
            label,
            roots: scene.roots,
            nodes: scene.nodes,
            meshes,
            skins: scene.skins,
            animations: scene.animations,
            placement,
            clock: AnimationClock::default(),
            formula: settings.joint_matrix_formula,
            time_scale: settings.time_scale,
            animating: settings.autoplay,
        };
        asset.calculate_locals();
        asset.update_joint_matrices();
        asset
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn clock(&self) -> AnimationClock {
        self.clock
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn play(&mut self) {
        self.animating = true;
    }

    pub fn pause(&mut self) {
        self.animating = false;
    }

    pub fn joint_matrix_formula(&self) -> JointMatrixFormula {
        self.formula
    }

    pub fn set_joint_matrix_formula(&mut self, formula: JointMatrixFormula) {
        self.formula = formula;
    }

    /// Advance the clock by `delta_ms` and resample every channel.
    ///
    /// The clock wraps at the first animation's first sampler's end time. A
    /// sampling error stops this asset's animation; the pose stays where it
    /// was.
    pub fn animate(&mut self, delta_ms: f32) {
        if !self.animating {
            return;
        }
        let Some(first) = self.animations.first() else {
            return;
        };
        let (_, duration) = first.bounds();
        let t = self
            .clock
            .advance(delta_ms / 1000.0 * self.time_scale, duration);

        if let Err(err) = animation::apply_all(&self.animations, &mut self.nodes, t) {
            tracing::error!("Stopping animation of '{}': {}", self.label, err);
            self.animating = false;
        }
    }

    /// Recompute every node's world transform from the roots down.
    pub fn calculate_locals(&mut self) {
        let base = self.placement.matrix();
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            propagate(&mut self.nodes, root, base);
        }
    }

    /// Refresh every skin's joint matrices. Runs after
    /// [`Asset::calculate_locals`].
    pub fn update_joint_matrices(&mut self) {
        for skin in &mut self.skins {
            skin.update_joint_matrices(&self.nodes, self.formula);
        }
    }

    /// Joint matrices per skin, in skin order.
    pub fn joint_matrices(&self) -> Vec<&[Mat4]> {
        self.skins.iter().map(Skin::joint_matrices).collect()
    }

    /// Submit one draw per primitive, depth first from each root.
    pub fn render(&self, sink: &mut dyn DrawSink) {
        render::render(self, sink);
    }

    /// One frame: animate, propagate, skin, render.
    pub fn tick(&mut self, delta_ms: f32, sink: &mut dyn DrawSink) {
        self.animate(delta_ms);
        self.calculate_locals();
        self.update_joint_matrices();
        self.render(sink);
    }
}

/// Write world transforms for the subtree under `root`. Uses an explicit
/// stack, so chain depth is bounded by memory rather than the call stack.
fn propagate(nodes: &mut [Node], root: usize, base: Mat4) {
    let mut stack = vec![(root, base)];
    while let Some((index, parent)) = stack.pop() {
        let Some(node) = nodes.get_mut(index) else {
            continue;
        };
        let world = parent * node.transform.local_matrix();
        node.world_transform = world;
        stack.extend(node.children.iter().map(|&child| (child, world)));
    }
}
