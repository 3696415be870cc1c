pub mod event;
pub mod mapper;
pub mod redirect;
pub mod request;
pub mod robot;
pub mod toggle;

pub use event::{EventGuard, GddoEvent, new_gddo_event};
pub use mapper::{MapError, UrlMapper, map_url, map_url_str};
pub use redirect::{CookieAction, Decision, RedirectHandler, RedirectSettings};
pub use request::LegacyRequest;
pub use robot::{RobotClassifier, is_robot};
pub use toggle::{ToggleSource, ToggleState, toggle_state};
