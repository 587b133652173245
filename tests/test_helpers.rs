//! Helper functions and utilities for tests

#![allow(dead_code)]

use glasses_tracker::{
    constants::{landmarks, FACE_MESH_LANDMARKS},
    distance::FrameSize,
    geometry::Vec3,
    landmark::{Face, Landmark},
    projection::Projector,
    replay::FrameRecord,
};
use nalgebra::UnitQuaternion;

/// Half the distance between the eyelid anchors, in world units
pub const EYE_HALF_SPAN: f64 = 0.03;

pub const FRAME: FrameSize = FrameSize::new(640, 480);

/// Rigid synthetic head placed in world space
#[derive(Debug, Clone, Copy)]
pub struct SyntheticHead {
    pub center: Vec3,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    /// Uniform size factor; larger means closer to the camera
    pub size: f64,
}

impl Default for SyntheticHead {
    fn default() -> Self {
        Self {
            center: Vec3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            size: 1.0,
        }
    }
}

impl SyntheticHead {
    pub fn frontal() -> Self {
        Self::default()
    }

    pub fn turned(yaw: f64) -> Self {
        Self { yaw, ..Self::default() }
    }

    /// Head rotation, composed yaw then pitch then roll (`Ry * Rx * Rz`)
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vec3::y_axis(), self.yaw)
            * UnitQuaternion::from_axis_angle(&Vec3::x_axis(), self.pitch)
            * UnitQuaternion::from_axis_angle(&Vec3::z_axis(), self.roll)
    }

    /// World position of a point given in head-local coordinates
    pub fn world(&self, local: Vec3) -> Vec3 {
        self.center + self.rotation() * (local * self.size)
    }

    /// Full face mesh with the tracked landmarks placed on the head
    pub fn face(&self, projector: &Projector) -> Face {
        let h = EYE_HALF_SPAN;
        let placed = [
            (landmarks::LEFT_EYELID, Vec3::new(-h, 0.0, 0.0)),
            (landmarks::RIGHT_EYELID, Vec3::new(h, 0.0, 0.0)),
            (landmarks::FOREHEAD_TOP, Vec3::new(0.0, 0.12, 0.0)),
            (landmarks::CHIN, Vec3::new(0.0, -0.1, 0.0)),
            (landmarks::LEFT_EYE_INNER, Vec3::new(-0.5 * h, -0.005, 0.0)),
            (landmarks::RIGHT_EYE_INNER, Vec3::new(0.5 * h, -0.005, 0.0)),
            (landmarks::LEFT_EYE_OUTER, Vec3::new(-1.4 * h, -0.005, -0.01)),
            (landmarks::RIGHT_EYE_OUTER, Vec3::new(1.4 * h, -0.005, -0.01)),
            (landmarks::NOSE_BRIDGE, Vec3::new(0.0, 0.0, 0.01)),
        ];

        let mut points = vec![projector.unproject(&self.center); FACE_MESH_LANDMARKS];
        for (index, local) in placed {
            points[index] = projector.unproject(&self.world(local));
        }
        Face::new(points).unwrap()
    }

    /// Frame record of this head as a detector would report it
    pub fn record(&self, projector: &Projector) -> FrameRecord {
        let landmarks = self
            .face(projector)
            .points()
            .iter()
            .map(|p| vec![p.x, p.y, p.z.unwrap_or(0.0)])
            .collect();
        FrameRecord {
            width: Some(FRAME.width),
            height: Some(FRAME.height),
            landmarks: Some(landmarks),
        }
    }
}

/// Face with every landmark at the image center
pub fn flat_face(len: usize) -> Face {
    Face::new(vec![Landmark::new(0.5, 0.5, 0.0); len]).unwrap()
}

/// Assert that a vector contains finite values
pub fn assert_vec3_finite(vec: &Vec3) {
    for (i, value) in vec.iter().enumerate() {
        assert!(value.is_finite(), "Non-finite value at index {i}: {value}");
    }
}
