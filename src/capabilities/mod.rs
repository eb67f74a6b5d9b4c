pub mod http;
pub mod kv;
pub mod ui;

// Render is used as-is: it only asks the shell to redraw.
pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

pub use self::kv::{KvKey, KvKeyError};
pub use self::ui::{ConfirmPrompt, Ui, UiOperation, UiOutput};

// The Effect derive refers to the app type by name.
#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub key_value: KeyValue<Event>,
    pub render: Render<Event>,
    pub ui: Ui<Event>,
}
