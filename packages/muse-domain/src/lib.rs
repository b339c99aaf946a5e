pub mod model;
pub mod normalize;
pub mod query;
pub mod sample;
pub mod units;
pub mod visibility;

pub use model::{CollectionObject, ImageRef, SampleRequest, SearchFilter, SearchPage, Unit};
pub use normalize::{NormalizeError, normalize};
pub use query::{PAGE_ROW_CEILING, build_query};
pub use sample::stratified_fill;
pub use units::resolve;
pub use visibility::is_effectively_on_view;
