//! Camera placement for draw calls

use glam::DVec3;

use crate::geom::Pos;

/// Pitch limit in degrees; keeps the look vector off the vertical axis
pub const MAX_PITCH: f64 = 89.0;

/// Orbiting perspective camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View3D {
    /// Point the camera orbits and looks at
    pub offset: Pos<3>,
    /// Degrees, clamped to `±MAX_PITCH`
    pub pitch: f64,
    /// Degrees, normalised to `[-180, 180]`
    pub angle: f64,
    /// Vertical field of view in degrees
    pub fov: f64,
    /// Distance from the camera to `offset`
    pub dist: f64,
    pub scale: f64,
}

impl Default for View3D {
    fn default() -> Self {
        Self {
            offset: Pos::ZERO,
            pitch: 0.0,
            angle: 0.0,
            fov: 60.0,
            dist: 500.0,
            scale: 1.0,
        }
    }
}

impl View3D {
    /// Vector of `length` along the view direction
    pub fn look(&self, length: f64) -> DVec3 {
        let pitch = self.pitch.to_radians();
        let angle = self.angle.to_radians();
        DVec3::new(
            length * pitch.cos() * angle.cos(),
            length * pitch.sin(),
            length * pitch.cos() * angle.sin(),
        )
    }

    /// Camera position: `dist` back from `offset`
    pub fn eye(&self) -> DVec3 {
        pos3(self.offset) - self.look(self.dist)
    }

    /// Turn by the given degrees, keeping pitch and angle in range
    pub fn rotate(&mut self, pitch: f64, angle: f64) {
        self.pitch = (self.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.angle = normalize_degrees(self.angle + angle);
    }

    pub fn zoom(&mut self, factor: f64) {
        self.dist = (self.dist * factor).max(1.0);
    }

    /// Screen offset of a world point from the screen centre, or `None` behind the camera
    pub fn project(&self, point: DVec3, half_height: f64) -> Option<[f64; 2]> {
        let forward = self.look(1.0);
        let right = forward.cross(DVec3::Y).normalize();
        let down = right.cross(forward);
        let rel = point - self.eye();
        let depth = rel.dot(forward);
        if depth <= f64::EPSILON {
            return None;
        }
        let focal = half_height / (self.fov.to_radians() / 2.0).tan() * self.scale;
        Some([rel.dot(right) * focal / depth, rel.dot(down) * focal / depth])
    }
}

/// Where draw calls are placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewOffset {
    /// Flat view: world `offset` maps to the screen origin
    View2D { offset: Pos<2> },
    View3D(View3D),
}

impl ViewOffset {
    /// Natural default view for a world with `dims` axes
    pub fn for_dims(dims: usize) -> Self {
        if dims >= 3 {
            ViewOffset::View3D(View3D::default())
        } else {
            ViewOffset::View2D { offset: Pos::ZERO }
        }
    }

    /// Move the view by a world-space delta; extra components are ignored
    pub fn pan(&mut self, delta: &[i64]) {
        let offset: &mut [i64] = match self {
            ViewOffset::View2D { offset } => &mut offset.0,
            ViewOffset::View3D(view) => &mut view.offset.0,
        };
        for (o, d) in offset.iter_mut().zip(delta) {
            *o += d;
        }
    }
}

/// Angle in degrees wrapped to `[-180, 180]`
pub fn normalize_degrees(mut angle: f64) -> f64 {
    angle %= 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle < -180.0 {
        angle += 360.0;
    }
    angle
}

fn pos3(p: Pos<3>) -> DVec3 {
    DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_look_vector() {
        let mut view = View3D::default();
        assert!(close(view.look(10.0), DVec3::new(10.0, 0.0, 0.0)));
        view.angle = 90.0;
        assert!(close(view.look(10.0), DVec3::new(0.0, 0.0, 10.0)));
        view.angle = 0.0;
        view.pitch = 30.0;
        let look = view.look(2.0);
        assert!((look.y - 1.0).abs() < 1e-9);
        assert!((look.length() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_clamps_and_wraps() {
        let mut view = View3D::default();
        view.rotate(200.0, 0.0);
        assert_eq!(view.pitch, MAX_PITCH);
        view.rotate(-500.0, 0.0);
        assert_eq!(view.pitch, -MAX_PITCH);
        view.rotate(0.0, 190.0);
        assert!((view.angle + 170.0).abs() < 1e-9);
        view.rotate(0.0, -20.0);
        assert!((view.angle - 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_centre_and_behind() {
        let view = View3D {
            offset: Pos([100, 0, 0]),
            ..Default::default()
        };
        let centre = view.project(DVec3::new(100.0, 0.0, 0.0), 300.0).unwrap();
        assert!(centre[0].abs() < 1e-9 && centre[1].abs() < 1e-9);
        // y grows downward on screen and in the world
        let below = view.project(DVec3::new(100.0, 10.0, 0.0), 300.0).unwrap();
        assert!(below[1] > 0.0);
        assert!(view.project(view.eye() - view.look(5.0), 300.0).is_none());
    }

    #[test]
    fn test_default_view_by_dims() {
        assert!(matches!(ViewOffset::for_dims(2), ViewOffset::View2D { .. }));
        assert!(matches!(ViewOffset::for_dims(3), ViewOffset::View3D(_)));
        let mut view = ViewOffset::for_dims(2);
        view.pan(&[3, -4, 9]);
        assert_eq!(view, ViewOffset::View2D { offset: Pos([3, -4]) });
    }
}
