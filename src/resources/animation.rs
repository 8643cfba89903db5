//! Keyframe animation clips and how to sample them.

use cgmath::{InnerSpace, Quaternion, Vector3, VectorSpace};

use crate::data_structures::instance::Instance;

#[derive(Clone, Debug, PartialEq)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
    /// One weight per morph target and keyframe.
    MorphWeights(Vec<Vec<f32>>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    /// Keyframes hold (in-tangent, value, out-tangent) triplets.
    CubicSpline,
}

impl From<gltf::animation::Interpolation> for Interpolation {
    fn from(interpolation: gltf::animation::Interpolation) -> Self {
        match interpolation {
            gltf::animation::Interpolation::Linear => Self::Linear,
            gltf::animation::Interpolation::Step => Self::Step,
            gltf::animation::Interpolation::CubicSpline => Self::CubicSpline,
        }
    }
}

/// The keyframes of a single property of a single node.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub node: usize,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
    pub interpolation: Interpolation,
}

/// The value of a channel at a point in time.
#[derive(Clone, Debug, PartialEq)]
pub enum Sample {
    Translation(Vector3<f32>),
    Rotation(Quaternion<f32>),
    Scale(Vector3<f32>),
    MorphWeights(Vec<f32>),
}

impl Sample {
    /// Writes the sampled property into a node transform. Morph weights are
    /// stored per mesh and are not part of the transform.
    pub fn apply_to(self, instance: &mut Instance) {
        match self {
            Sample::Translation(position) => instance.position = position,
            Sample::Rotation(rotation) => instance.rotation = rotation,
            Sample::Scale(scale) => instance.scale = scale,
            Sample::MorphWeights(_) => (),
        }
    }
}

/// Where `time` falls between two keys: indices of the surrounding keys and
/// the normalized position between them.
fn locate(timestamps: &[f32], time: f32) -> Option<(usize, usize, f32, f32)> {
    let last = timestamps.len().checked_sub(1)?;
    let next = timestamps.partition_point(|&t| t <= time);
    if next == 0 {
        return Some((0, 0, 0.0, 0.0));
    }
    if next > last {
        return Some((last, last, 0.0, 0.0));
    }
    let prev = next - 1;
    let span = timestamps[next] - timestamps[prev];
    let factor = if span > 0.0 {
        (time - timestamps[prev]) / span
    } else {
        0.0
    };
    Some((prev, next, factor, span))
}

/// Hermite spline between `v0` and `v1` with the out/in tangents scaled by the key span.
fn hermite<V>(v0: V, out0: V, in1: V, v1: V, t: f32, span: f32) -> V
where
    V: VectorSpace<Scalar = f32>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    v0 * (2.0 * t3 - 3.0 * t2 + 1.0)
        + out0 * (span * (t3 - 2.0 * t2 + t))
        + v1 * (-2.0 * t3 + 3.0 * t2)
        + in1 * (span * (t3 - t2))
}

fn as_vec4(q: Quaternion<f32>) -> cgmath::Vector4<f32> {
    cgmath::Vector4::new(q.v.x, q.v.y, q.v.z, q.s)
}

fn sample_values<V>(
    values: &[V],
    timestamps: &[f32],
    interpolation: Interpolation,
    time: f32,
    blend: impl Fn(V, V, f32) -> V,
    spline: impl Fn(V, V, V, V, f32, f32) -> V,
) -> Option<V>
where
    V: Copy,
{
    let (prev, next, factor, span) = locate(timestamps, time)?;
    match interpolation {
        Interpolation::Step => values.get(prev).copied(),
        Interpolation::Linear => {
            let a = *values.get(prev)?;
            let b = *values.get(next)?;
            Some(if prev == next { a } else { blend(a, b, factor) })
        }
        Interpolation::CubicSpline => {
            let value = |key: usize| values.get(key * 3 + 1).copied();
            if prev == next {
                return value(prev);
            }
            let out0 = *values.get(prev * 3 + 2)?;
            let in1 = *values.get(next * 3)?;
            Some(spline(value(prev)?, out0, in1, value(next)?, factor, span))
        }
    }
}

impl Channel {
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Samples the channel at `time` seconds. Times outside the keyed range clamp to the ends.
    pub fn sample(&self, time: f32) -> Option<Sample> {
        let ts = &self.timestamps;
        let interp = self.interpolation;
        match &self.keyframes {
            Keyframes::Translation(values) => {
                sample_values(values, ts, interp, time, |a, b, t| a.lerp(b, t), hermite)
                    .map(Sample::Translation)
            }
            Keyframes::Scale(values) => {
                sample_values(values, ts, interp, time, |a, b, t| a.lerp(b, t), hermite)
                    .map(Sample::Scale)
            }
            Keyframes::Rotation(values) => sample_values(
                values,
                ts,
                interp,
                time,
                |a, b, t| a.slerp(b, t),
                |v0, out0, in1, v1, t, span| {
                    let v = hermite(as_vec4(v0), as_vec4(out0), as_vec4(in1), as_vec4(v1), t, span);
                    Quaternion::new(v.w, v.x, v.y, v.z).normalize()
                },
            )
            .map(Sample::Rotation),
            Keyframes::MorphWeights(values) => {
                let (prev, next, factor, span) = locate(ts, time)?;
                let weights = match interp {
                    Interpolation::Step => values.get(prev)?.clone(),
                    Interpolation::Linear => {
                        let a = values.get(prev)?;
                        let b = values.get(next)?;
                        a.iter().zip(b).map(|(a, b)| a + (b - a) * factor).collect()
                    }
                    Interpolation::CubicSpline => {
                        let v0 = values.get(prev * 3 + 1)?;
                        if prev == next {
                            v0.clone()
                        } else {
                            let out0 = values.get(prev * 3 + 2)?;
                            let in1 = values.get(next * 3)?;
                            let v1 = values.get(next * 3 + 1)?;
                            (0..v0.len())
                                .map(|i| {
                                    let at = |w: &Vec<f32>| w.get(i).copied().unwrap_or(0.0);
                                    let (t, t2) = (factor, factor * factor);
                                    let t3 = t2 * t;
                                    at(v0) * (2.0 * t3 - 3.0 * t2 + 1.0)
                                        + at(out0) * span * (t3 - 2.0 * t2 + t)
                                        + at(v1) * (-2.0 * t3 + 3.0 * t2)
                                        + at(in1) * span * (t3 - t2)
                                })
                                .collect()
                        }
                    }
                };
                Some(Sample::MorphWeights(weights))
            }
        }
    }
}

/// A named animation: a set of channels played back together.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }

    /// Length in seconds: the last keyframe of the longest channel.
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .map(Channel::duration)
            .fold(0.0, f32::max)
    }
}
