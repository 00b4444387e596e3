//! Per-category venue adapters.

pub mod cex;
pub mod dex;
pub mod prediction;

use crate::domain::VenueKind;

use super::adapter::VenueAdapter;

pub use cex::CexAdapter;
pub use dex::DexAdapter;
pub use prediction::PredictionAdapter;

/// Build the adapter for a venue category.
#[must_use]
pub fn adapter_for(kind: VenueKind) -> Box<dyn VenueAdapter> {
    match kind {
        VenueKind::Cex => Box::new(CexAdapter),
        VenueKind::Dex => Box::new(DexAdapter),
        VenueKind::Prediction => Box::new(PredictionAdapter),
    }
}
