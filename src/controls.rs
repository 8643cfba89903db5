//! Orbit-style camera navigation.
//!
//! The camera circles around a target point: dragging with the primary button
//! rotates, the wheel dollies in and out and dragging with the secondary
//! button pans the target in the camera plane.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Point3, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::{camera::PerspectiveCamera, viewport::ViewportSize};

/// Smallest angle kept between the camera and either pole.
const POLAR_EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Rotate,
    Pan,
}

#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    viewport: ViewportSize,
    cursor: Option<PhysicalPosition<f64>>,
    drag: Option<Drag>,
}

impl OrbitControls {
    /// Binds the controls to `camera`, orbiting around the camera's current target.
    pub fn new(camera: &mut PerspectiveCamera, viewport: ViewportSize) -> Self {
        let controls = Self {
            target: camera.target,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            viewport,
            cursor: None,
            drag: None,
        };
        camera.target = controls.target;
        controls
    }

    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Handles pointer input. Returns `true` when the camera moved.
    pub fn handle_window_event(
        &mut self,
        event: &WindowEvent,
        camera: &mut PerspectiveCamera,
    ) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) => Some(Drag::Rotate),
                    (ElementState::Pressed, MouseButton::Right | MouseButton::Middle) => {
                        Some(Drag::Pan)
                    }
                    (ElementState::Released, _) => None,
                    _ => self.drag,
                };
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                let (Some(drag), Some(previous)) = (self.drag, previous) else {
                    return false;
                };
                let dx = (position.x - previous.x) as f32;
                let dy = (position.y - previous.y) as f32;
                match drag {
                    Drag::Rotate => self.rotate(camera, dx, dy),
                    Drag::Pan => self.pan(camera, dx, dy),
                }
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / 100.0) as f32,
                };
                if steps == 0.0 {
                    return false;
                }
                self.zoom(camera, steps);
                true
            }
            _ => false,
        }
    }

    /// Rotates by a pointer movement of `dx`/`dy` pixels. A drag across the
    /// full viewport height turns the camera once around the target.
    pub fn rotate(&mut self, camera: &mut PerspectiveCamera, dx: f32, dy: f32) {
        let height = self.viewport.height as f32;
        let offset = camera.position - self.target;
        let radius = offset.magnitude();
        if radius == 0.0 {
            return;
        }
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth -= TAU * dx / height * self.rotate_speed;
        polar -= TAU * dy / height * self.rotate_speed;
        polar = polar.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        let direction = Vector3::new(
            polar.sin() * azimuth.sin(),
            polar.cos(),
            polar.sin() * azimuth.cos(),
        );
        camera.position = self.target + direction * radius;
        camera.target = self.target;
    }

    /// Positive steps move towards the target, negative ones away from it.
    pub fn zoom(&mut self, camera: &mut PerspectiveCamera, steps: f32) {
        let offset = camera.position - self.target;
        if offset.magnitude2() == 0.0 {
            return;
        }
        let scale = 0.95f32.powf(self.zoom_speed * steps);
        let distance = (offset.magnitude() * scale).clamp(self.min_distance, self.max_distance);
        camera.position = self.target + offset.normalize() * distance;
        camera.target = self.target;
    }

    /// Moves target and camera together so the point under the cursor follows it.
    pub fn pan(&mut self, camera: &mut PerspectiveCamera, dx: f32, dy: f32) {
        let offset = camera.position - self.target;
        let distance = offset.magnitude();
        if distance == 0.0 {
            return;
        }
        // height of the view frustum at the target distance, in world units
        let visible = 2.0 * distance * (camera.fovy.0.to_radians() / 2.0).tan();
        let per_pixel = visible / self.viewport.height as f32 * self.pan_speed;

        let forward = -offset.normalize();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward);
        let shift = right * (-dx * per_pixel) + up * (dy * per_pixel);

        self.target += shift;
        camera.position += shift;
        camera.target = self.target;
    }

    pub fn distance(&self, camera: &PerspectiveCamera) -> f32 {
        (camera.position - self.target).magnitude()
    }
}
