use std::collections::HashMap;

use barrage_protocol::{HostCommand, ItemId, LaneOccupant, SurfaceSize};

/// The rendering side of a bullet screen.
///
/// The scheduler never draws anything itself: it measures the surface, asks
/// what is on screen, and hands the host [`HostCommand`]s. The host reports
/// back by calling `notify_visible` / `notify_completed` on the screen, using
/// the [`ItemId`] from the `Render` command as the handle.
pub trait Host {
    /// Opaque bullet payload.
    type Content;

    /// Current surface size, or `None` if there is nothing to mount on.
    fn measure(&self) -> Option<SurfaceSize>;

    /// Every displayed bullet with its lane and rendered width.
    fn occupancy(&self) -> Vec<LaneOccupant>;

    fn apply(&mut self, command: HostCommand<Self::Content>);
}

/// A host that records commands for someone else to carry out.
///
/// Used where the real renderer lives across a boundary (the wasm bridge
/// ships the batch to JavaScript) and in tests. Widths are reported back with
/// [`BufferedHost::set_width`] once the real renderer has laid a bullet out.
#[derive(Debug, Clone)]
pub struct BufferedHost<C> {
    surface: Option<SurfaceSize>,
    lanes: HashMap<ItemId, (usize, f64)>,
    commands: Vec<HostCommand<C>>,
}

impl<C> BufferedHost<C> {
    pub fn new(surface: Option<SurfaceSize>) -> Self {
        Self {
            surface,
            lanes: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Replace the surface size. Takes effect on the next `clear`.
    pub fn resize(&mut self, surface: Option<SurfaceSize>) {
        self.surface = surface;
    }

    /// Record a rendered width. Ignored for bullets that are not displayed.
    pub fn set_width(&mut self, id: ItemId, width: f64) -> bool {
        match self.lanes.get_mut(&id) {
            Some(slot) => {
                slot.1 = width;
                true
            }
            None => false,
        }
    }

    /// Whether the bullet is currently displayed.
    pub fn is_displayed(&self, id: ItemId) -> bool {
        self.lanes.contains_key(&id)
    }

    /// Commands recorded so far, without draining.
    pub fn commands(&self) -> &[HostCommand<C>] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<HostCommand<C>> {
        std::mem::take(&mut self.commands)
    }
}

impl<C> Host for BufferedHost<C> {
    type Content = C;

    fn measure(&self) -> Option<SurfaceSize> {
        self.surface
    }

    fn occupancy(&self) -> Vec<LaneOccupant> {
        self.lanes
            .iter()
            .map(|(&id, &(lane, width))| LaneOccupant::new(id, lane, width))
            .collect()
    }

    fn apply(&mut self, command: HostCommand<C>) {
        match &command {
            HostCommand::Render { id, lane, .. } => {
                self.lanes.insert(*id, (*lane, 0.0));
            }
            HostCommand::Remove { id } => {
                self.lanes.remove(id);
            }
            HostCommand::SetPlayState { .. } | HostCommand::SetHidden { .. } => {}
        }
        self.commands.push(command);
    }
}

#[cfg(test)]
mod tests {
    use barrage_protocol::{ItemOverrides, Options};

    use super::*;

    #[test]
    fn tracks_displayed_bullets() {
        let mut host = BufferedHost::new(Some(SurfaceSize::new(100.0, 100.0)));
        host.apply(HostCommand::Render {
            id: ItemId(1),
            lane: 1,
            top: 50.0,
            config: Options::default().resolve(&ItemOverrides::default()),
            hidden: false,
            content: "a",
        });
        assert!(host.set_width(ItemId(1), 42.0));
        assert!(!host.set_width(ItemId(2), 42.0));
        assert_eq!(
            host.occupancy(),
            vec![LaneOccupant::new(ItemId(1), 1, 42.0)]
        );

        host.apply(HostCommand::Remove { id: ItemId(1) });
        assert!(host.occupancy().is_empty());
        assert_eq!(host.take_commands().len(), 2);
        assert!(host.commands().is_empty());
    }
}
