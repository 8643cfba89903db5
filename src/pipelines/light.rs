use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::Light;

/// Lighting for the model shader: one directional light and one hemisphere light.
///
/// Colours are linear with the intensity already multiplied in.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Direction towards the light; w unused.
    pub direction: [f32; 4],
    pub colour: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
}

impl LightUniform {
    /// Takes the first directional and the first hemisphere light of `lights`.
    /// A missing light contributes nothing.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniform = Self {
            direction: [0.0, 1.0, 0.0, 0.0],
            colour: [0.0; 4],
            sky: [0.0; 4],
            ground: [0.0; 4],
        };
        let scaled = |rgb: &[f32; 3], intensity: f32| {
            [rgb[0] * intensity, rgb[1] * intensity, rgb[2] * intensity, 1.0]
        };
        if let Some((colour, intensity, position)) = lights.iter().find_map(|light| match light {
            Light::Directional {
                colour,
                intensity,
                position,
            } => Some((colour, *intensity, *position)),
            _ => None,
        }) {
            use cgmath::InnerSpace;
            // a directional light shines from its position towards the origin
            let direction = if position.magnitude2() > 0.0 {
                position.normalize()
            } else {
                cgmath::Vector3::unit_y()
            };
            uniform.direction = direction.extend(0.0).into();
            uniform.colour = scaled(colour, intensity);
        }
        if let Some((sky, ground, intensity)) = lights.iter().find_map(|light| match light {
            Light::Hemisphere {
                sky,
                ground,
                intensity,
            } => Some((sky, ground, *intensity)),
            _ => None,
        }) {
            uniform.sky = scaled(sky, intensity);
            uniform.ground = scaled(ground, intensity);
        }
        uniform
    }
}

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Uploads `uniform` if it differs from what the GPU already has.
    pub fn update(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightingConfig;

    #[test]
    fn default_rig_fills_every_slot() {
        let uniform = LightUniform::from_lights(&Light::rig(&LightingConfig::default()));
        let d = 1.0 / 3.0f32.sqrt();
        for (actual, expected) in uniform.direction.iter().zip([d, d, d, 0.0]) {
            assert!((actual - expected).abs() < 1e-6);
        }
        // white at intensity 5
        for (actual, expected) in uniform.colour.iter().zip([5.0, 5.0, 5.0, 1.0]) {
            assert!((actual - expected).abs() < 1e-5);
        }
        assert!(uniform.sky[2] > uniform.sky[0]);
        assert!(uniform.ground[0] < uniform.sky[0]);
    }

    #[test]
    fn no_lights_means_darkness() {
        let uniform = LightUniform::from_lights(&[]);
        assert_eq!(uniform.colour, [0.0; 4]);
        assert_eq!(uniform.sky, [0.0; 4]);
        assert_eq!(uniform.ground, [0.0; 4]);
    }
}
