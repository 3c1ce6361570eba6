use uuid::Uuid;

use crate::raster::RasterSnapshot;

/// Identifies the slot reserved for one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(Uuid);

impl Ticket {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

/// A finished generation: the result and, for image-to-image, the source it was made from
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub id: Uuid,
    pub after: RasterSnapshot,
    pub before: Option<RasterSnapshot>,
}

impl GeneratedImage {
    pub fn new(after: RasterSnapshot, before: Option<RasterSnapshot>) -> Self {
        Self {
            id: Uuid::new_v4(),
            after,
            before,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    /// Placeholder held while the request is in flight
    Pending,
    Ready(GeneratedImage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSlot {
    ticket: Ticket,
    state: SlotState,
}

impl GenerationSlot {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SlotState::Pending)
    }

    /// The finished image, `None` while pending
    pub fn image(&self) -> Option<&GeneratedImage> {
        match &self.state {
            SlotState::Ready(image) => Some(image),
            SlotState::Pending => None,
        }
    }
}

/// What the remote collaborator delivered for a ticket
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Success(GeneratedImage),
    Failure(String),
}

/// Effect of resolving a ticket on the slot list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    /// The placeholder at this index now holds the image
    Replaced(usize),
    /// The placeholder at this index was removed
    Removed(usize),
    /// The ticket no longer has a slot (e.g. the history was reset)
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Ordered results of every generation in this session, plus the one being viewed
#[derive(Debug, Clone, Default)]
pub struct GenerationHistory {
    slots: Vec<GenerationSlot>,
    current: usize,
}

impl GenerationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a history from persisted images
    pub fn restore(images: Vec<GeneratedImage>, current: usize) -> Self {
        let slots: Vec<_> = images
            .into_iter()
            .map(|image| GenerationSlot {
                ticket: Ticket::new(),
                state: SlotState::Ready(image),
            })
            .collect();
        let current = current.min(slots.len().saturating_sub(1));
        Self { slots, current }
    }

    /// Appends a pending placeholder and makes it the viewed slot
    pub fn reserve_pending(&mut self) -> Ticket {
        let ticket = Ticket::new();
        self.slots.push(GenerationSlot {
            ticket,
            state: SlotState::Pending,
        });
        self.current = self.slots.len() - 1;
        ticket
    }

    /// Replaces the ticket's placeholder on success, removes it on failure
    pub fn resolve(&mut self, ticket: Ticket, outcome: GenerationOutcome) -> SlotUpdate {
        let Some(index) = self.slots.iter().position(|slot| slot.ticket == ticket) else {
            return SlotUpdate::Unknown;
        };

        match outcome {
            GenerationOutcome::Success(image) => {
                self.slots[index].state = SlotState::Ready(image);
                SlotUpdate::Replaced(index)
            }
            GenerationOutcome::Failure(reason) => {
                log::error!("Generation for slot {} failed: {}", index, reason);
                self.slots.remove(index);
                self.current = index.saturating_sub(1).min(self.slots.len().saturating_sub(1));
                SlotUpdate::Removed(index)
            }
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.current = match direction {
            Direction::Previous => self.current.saturating_sub(1),
            Direction::Next => (self.current + 1).min(self.slots.len().saturating_sub(1)),
        };
    }

    /// Views the slot at `index` if it exists
    pub fn select(&mut self, index: usize) {
        if index < self.slots.len() {
            self.current = index;
        }
    }

    /// Drops every slot, pending ones included
    pub fn reset(&mut self) {
        self.slots.clear();
        self.current = 0;
    }

    /// The viewed slot
    pub fn current(&self) -> Option<&GenerationSlot> {
        self.slots.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn get(&self, index: usize) -> Option<&GenerationSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[GenerationSlot] {
        &self.slots
    }

    /// Finished images in order, pending slots skipped
    pub fn ready_images(&self) -> impl Iterator<Item = &GeneratedImage> {
        self.slots.iter().filter_map(GenerationSlot::image)
    }

    pub fn has_pending(&self) -> bool {
        self.slots.iter().any(GenerationSlot::is_pending)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
