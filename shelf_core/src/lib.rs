//! Navigation and layout core of the cover shelf: a GPU-free model of the
//! boxes, the camera and the selection state machine. A host feeds it the
//! cover sequence, input and time, draws the [`FrameSnapshot`] it returns and
//! forwards the [`ShelfEvent`]s upward.

pub mod animation;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod coords;
pub mod error;
pub mod layout;
pub mod pool;
pub mod shelf;

pub use catalog::{ADD_NEW_SENTINEL, CatalogEntry, cover_sequence, is_add_new};
pub use config::{CoverAtlas, PanPolicy, RowLayout, ShelfConfig, UvRect};
pub use controller::{Direction, Selection, ShelfEvent};
pub use coords::Viewport;
pub use error::{CoverLoadError, Result, ShelfError};
pub use pool::{TextureOutcome, TextureRequest, TextureTicket};
pub use shelf::{FrameSnapshot, ItemSurface, LayoutReport, Shelf};
