pub mod layout;
pub mod line;
pub mod placement;

pub use layout::compute_layout;
pub use line::{ConnectorLine, ConnectorShape, IssueLine, Marker, RenderLine};
pub use placement::place;
