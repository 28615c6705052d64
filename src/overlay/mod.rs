pub mod presenter;
pub mod state;
pub mod surface;
pub mod view;

pub use presenter::{spawn_presenter, PresenterConfig, PresenterHandle};
pub use state::{OverlayPhase, OverlayStateMachine, Transition};
pub use surface::{HeadlessSurface, OverlaySurface, SurfaceEvent};
pub use view::OverlayView;
