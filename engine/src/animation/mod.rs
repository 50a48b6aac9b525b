//! Animation sampler
//!
//! Evaluates keyframe channels at a shared clock time and writes the result
//! into the target nodes' TRS components.
//!
//! All animations of an asset share one [`AnimationClock`], bounded by the
//! first animation's first sampler.

use glam::{Quat, Vec3, Vec4};
use serde::Deserialize;

use crate::error::FrameError;
use crate::node::Node;

/// Above this quaternion dot product slerp falls back to normalized lerp.
const SLERP_DOT_THRESHOLD: f32 = 0.9995;

/// Node property an animation channel writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    Translation,
    Rotation,
    Scale,
    /// Morph target weights, parsed but never applied
    Weights,
}

impl Property {
    /// Output components per keyframe, `None` for weights.
    pub fn arity(self) -> Option<usize> {
        match self {
            Property::Translation | Property::Scale => Some(3),
            Property::Rotation => Some(4),
            Property::Weights => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Interpolation {
    #[default]
    #[serde(rename = "LINEAR")]
    Linear,
    #[serde(rename = "STEP")]
    Step,
    #[serde(rename = "CUBICSPLINE")]
    CubicSpline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub target: usize,
    pub property: Property,
    pub sampler: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sampler {
    /// Keyframe times in seconds, ascending
    pub input: Vec<f32>,
    /// Flat keyframe values. Cubic splines store (in-tangent, value,
    /// out-tangent) per keyframe.
    pub output: Vec<f32>,
    pub interpolation: Interpolation,
    pub min_time: f32,
    pub max_time: f32,
}

impl Sampler {
    pub fn new(input: Vec<f32>, output: Vec<f32>, interpolation: Interpolation) -> Self {
        let min_time = input.first().copied().unwrap_or(0.0);
        let max_time = input.last().copied().unwrap_or(0.0);
        Self {
            input,
            output,
            interpolation,
            min_time,
            max_time,
        }
    }
}

/// Value produced by sampling one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampledValue {
    Vec3(Vec3),
    Quat(Quat),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: Option<String>,
    pub channels: Vec<Channel>,
    pub samplers: Vec<Sampler>,
}

impl Animation {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Time bounds of the first sampler, `(0, 0)` without samplers.
    pub fn bounds(&self) -> (f32, f32) {
        self.samplers
            .first()
            .map_or((0.0, 0.0), |s| (s.min_time, s.max_time))
    }

    /// Sample every channel at `t` and write into `nodes`.
    ///
    /// `index` identifies this animation in errors. Weight channels are
    /// skipped.
    pub fn apply(&self, index: usize, nodes: &mut [Node], t: f32) -> Result<(), FrameError> {
        for (channel_index, channel) in self.channels.iter().enumerate() {
            let Some(sampler) = self.samplers.get(channel.sampler) else {
                return Err(FrameError::MissingSampler {
                    animation: index,
                    channel: channel_index,
                    sampler: channel.sampler,
                    available: self.samplers.len(),
                });
            };
            let value = sample(sampler, channel.property, t)
                .map_err(|err| err.at(index, channel.sampler))?;
            let Some(value) = value else {
                continue;
            };
            let Some(node) = nodes.get_mut(channel.target) else {
                continue;
            };
            node.transform.update_trs(|trs| match (channel.property, value) {
                (Property::Translation, SampledValue::Vec3(v)) => trs.translation = Some(v),
                (Property::Scale, SampledValue::Vec3(v)) => trs.scale = Some(v),
                (Property::Rotation, SampledValue::Quat(q)) => trs.rotation = Some(q),
                _ => {}
            });
        }
        Ok(())
    }
}

/// Apply every animation at the shared time `t`.
pub fn apply_all(animations: &[Animation], nodes: &mut [Node], t: f32) -> Result<(), FrameError> {
    for (index, animation) in animations.iter().enumerate() {
        animation.apply(index, nodes, t)?;
    }
    Ok(())
}

/// Running animation time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationClock {
    time: f32,
}

impl AnimationClock {
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance by `delta` seconds, wrapping past `duration`.
    ///
    /// A non-positive duration freezes the clock.
    pub fn advance(&mut self, delta: f32, duration: f32) -> f32 {
        if duration <= 0.0 {
            return self.time;
        }
        self.time += delta;
        if self.time > duration {
            self.time %= duration;
        }
        self.time
    }
}

/// Position of `t` between two keyframes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeSpan {
    pub index: usize,
    pub next: usize,
    /// Normalized position in `[0, 1]`
    pub factor: f32,
    /// `time[next] - time[index]`
    pub delta: f32,
}

/// Locate `t` in ascending keyframe `times`.
///
/// Before the first key clamps to the first, at or after the last key clamps
/// to the last (`index == next`, `factor == 0`).
pub fn find_keyframe(times: &[f32], t: f32) -> Option<KeyframeSpan> {
    let last = times.len().checked_sub(1)?;
    // first keyframe strictly after t
    let upper = times.partition_point(|&time| time <= t);
    if upper == 0 {
        return Some(KeyframeSpan {
            index: 0,
            next: 0,
            factor: 0.0,
            delta: 0.0,
        });
    }
    if upper > last {
        return Some(KeyframeSpan {
            index: last,
            next: last,
            factor: 0.0,
            delta: 0.0,
        });
    }

    let index = upper - 1;
    let delta = times[upper] - times[index];
    let factor = if delta > 0.0 {
        ((t - times[index]) / delta).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(KeyframeSpan {
        index,
        next: upper,
        factor,
        delta,
    })
}

pub fn lerp(a: Vec3, b: Vec3, factor: f32) -> Vec3 {
    a + (b - a) * factor
}

/// Spherical interpolation along the shortest arc.
pub fn slerp(a: Quat, b: Quat, factor: f32) -> Quat {
    let from = Vec4::from(a);
    let mut to = Vec4::from(b);
    let mut dot = from.dot(to);
    if dot < 0.0 {
        to = -to;
        dot = -dot;
    }

    if dot > SLERP_DOT_THRESHOLD {
        return Quat::from_vec4(from + (to - from) * factor).normalize();
    }

    let theta_0 = dot.acos();
    let theta = theta_0 * factor;
    let sin_theta = theta.sin();
    let sin_theta_0 = theta_0.sin();

    let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
    let s1 = sin_theta / sin_theta_0;
    Quat::from_vec4(from * s0 + to * s1)
}

/// Hermite basis of the glTF cubic spline, component-wise.
fn hermite<const N: usize>(
    v0: [f32; N],
    out_tangent: [f32; N],
    v1: [f32; N],
    in_tangent: [f32; N],
    delta: f32,
    s: f32,
) -> [f32; N] {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    std::array::from_fn(|i| {
        h00 * v0[i] + h10 * delta * out_tangent[i] + h01 * v1[i] + h11 * delta * in_tangent[i]
    })
}

/// Sampler-local error, tagged with animation and sampler by the caller.
#[derive(Debug)]
struct OutputTooShort {
    keyframe: usize,
    len: usize,
    needed: usize,
}

impl OutputTooShort {
    fn at(self, animation: usize, sampler: usize) -> FrameError {
        FrameError::OutputTooShort {
            animation,
            sampler,
            keyframe: self.keyframe,
            len: self.len,
            needed: self.needed,
        }
    }
}

fn element<const N: usize>(
    output: &[f32],
    element: usize,
    keyframe: usize,
) -> Result<[f32; N], OutputTooShort> {
    let start = element * N;
    output
        .get(start..start + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(OutputTooShort {
            keyframe,
            len: output.len(),
            needed: start + N,
        })
}

fn sample_components<const N: usize>(
    sampler: &Sampler,
    span: KeyframeSpan,
) -> Result<[f32; N], OutputTooShort> {
    let output = &sampler.output;
    match sampler.interpolation {
        Interpolation::Step | Interpolation::Linear => element(output, span.index, span.index),
        Interpolation::CubicSpline => {
            let v0 = element(output, 3 * span.index + 1, span.index)?;
            if span.index == span.next {
                return Ok(v0);
            }
            let out_tangent = element(output, 3 * span.index + 2, span.index)?;
            let in_tangent = element(output, 3 * span.next, span.next)?;
            let v1 = element(output, 3 * span.next + 1, span.next)?;
            Ok(hermite(v0, out_tangent, v1, in_tangent, span.delta, span.factor))
        }
    }
}

/// Sample `sampler` for `property` at time `t`.
///
/// Returns `None` for weight channels and samplers without keyframes.
fn sample(
    sampler: &Sampler,
    property: Property,
    t: f32,
) -> Result<Option<SampledValue>, OutputTooShort> {
    let Some(span) = find_keyframe(&sampler.input, t) else {
        return Ok(None);
    };
    let linear = sampler.interpolation == Interpolation::Linear && span.index != span.next;

    let value = match property {
        Property::Translation | Property::Scale => {
            let a = Vec3::from_array(sample_components::<3>(sampler, span)?);
            if linear {
                let b = Vec3::from_array(element(&sampler.output, span.next, span.next)?);
                SampledValue::Vec3(lerp(a, b, span.factor))
            } else {
                SampledValue::Vec3(a)
            }
        }
        Property::Rotation => {
            let a = Quat::from_array(sample_components::<4>(sampler, span)?);
            if linear {
                let b = Quat::from_array(element(&sampler.output, span.next, span.next)?);
                SampledValue::Quat(slerp(a, b, span.factor))
            } else if sampler.interpolation == Interpolation::CubicSpline {
                SampledValue::Quat(a.normalize())
            } else {
                SampledValue::Quat(a)
            }
        }
        Property::Weights => return Ok(None),
    };
    Ok(Some(value))
}
