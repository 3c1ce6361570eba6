mod persistence;
mod session;

pub use persistence::{AutosaveTimer, PersistenceError, PersistenceResult, SavedSession, StateStore};
pub use session::{
    ActiveEdit, ConsumedEdit, EditAction, EditSession, EditState, Transition, select_base_image,
};
