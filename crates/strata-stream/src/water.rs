//! Reusable water planes for chunks at the nearest LOD.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use tracing::{debug, warn};

/// Handle to a plane owned by a [`WaterPlanePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WaterPlaneId(usize);

impl WaterPlaneId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterPlane {
    pub position: Vec3,
    /// Inactive planes are hidden and waiting for reuse.
    pub active: bool,
}

/// Pool that grows on demand and never fails to hand out a plane.
#[derive(Debug)]
pub struct WaterPlanePool {
    planes: Vec<WaterPlane>,
    free: VecDeque<WaterPlaneId>,
    water_level: f32,
}

impl WaterPlanePool {
    pub fn new(water_level: f32) -> Self {
        Self {
            planes: Vec::new(),
            free: VecDeque::new(),
            water_level,
        }
    }

    /// Activate a plane centred on `center`, reusing the oldest released
    /// plane or creating a new one when none is free.
    pub fn acquire(&mut self, center: Vec2) -> WaterPlaneId {
        let position = Vec3::new(center.x, self.water_level, center.y);
        if let Some(id) = self.free.pop_front() {
            self.planes[id.0] = WaterPlane {
                position,
                active: true,
            };
            return id;
        }

        let id = WaterPlaneId(self.planes.len());
        self.planes.push(WaterPlane {
            position,
            active: true,
        });
        debug!(planes = self.planes.len(), "water pool grew");
        id
    }

    /// Hide a plane and queue it for reuse.
    pub fn release(&mut self, id: WaterPlaneId) {
        match self.planes.get_mut(id.0) {
            Some(plane) if plane.active => {
                plane.active = false;
                self.free.push_back(id);
            }
            _ => warn!(plane = id.0, "release of a plane that is not active"),
        }
    }

    pub fn get(&self, id: WaterPlaneId) -> Option<&WaterPlane> {
        self.planes.get(id.0)
    }

    /// Planes ever created.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.planes.len() - self.free.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn water_level(&self) -> f32 {
        self.water_level
    }
}
