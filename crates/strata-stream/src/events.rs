//! Chunk lifecycle notifications.
//!
//! Listeners are plain closures invoked synchronously, in registration
//! order, on the thread that owns the chunk store.

use crate::coord::ChunkCoord;

/// Something observable happened to a chunk.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkEvent {
    /// The chunk entered or left view distance.
    VisibilityChanged { coord: ChunkCoord, visible: bool },
    /// A mesh became the chunk's active mesh.
    MeshAttached {
        coord: ChunkCoord,
        lod_index: usize,
        lod: u8,
    },
    /// The collider mesh was installed. Fires at most once per chunk.
    ColliderInstalled { coord: ChunkCoord },
    /// Scatter points were handed to the placer. Fires at most once per chunk.
    ObjectsScattered { coord: ChunkCoord, point_count: usize },
}

impl ChunkEvent {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            Self::VisibilityChanged { coord, .. }
            | Self::MeshAttached { coord, .. }
            | Self::ColliderInstalled { coord }
            | Self::ObjectsScattered { coord, .. } => *coord,
        }
    }
}

pub type ChunkListener = Box<dyn FnMut(&ChunkEvent)>;

/// Ordered list of event listeners.
#[derive(Default)]
pub struct ChunkEvents {
    listeners: Vec<ChunkListener>,
}

impl ChunkEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChunkEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: &ChunkEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = ChunkEvents::new();
        for id in 0..3 {
            let log = Rc::clone(&log);
            events.subscribe(move |e| log.borrow_mut().push((id, e.coord())));
        }

        let coord = ChunkCoord::new(4, 5);
        events.emit(&ChunkEvent::ColliderInstalled { coord });
        assert_eq!(*log.borrow(), vec![(0, coord), (1, coord), (2, coord)]);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_emit_without_listeners() {
        let mut events = ChunkEvents::new();
        events.emit(&ChunkEvent::VisibilityChanged {
            coord: ChunkCoord::ORIGIN,
            visible: true,
        });
        assert!(events.is_empty());
    }
}
