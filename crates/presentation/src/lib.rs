//! View models for the two presentation surfaces.
//!
//! Pure functions from the engine's published state to render-ready
//! structures: inline [`Decoration`]s for the editor and the
//! category-tabbed [`PanelView`] for the findings list. Both derive
//! their row identity from the same [`prose_protocol::FindingKey`]
//! assignment, so focus stays consistent across surfaces.

mod decorations;
mod panel;

pub use decorations::{build_decorations, Decoration};
pub use panel::{PanelItem, PanelView};
