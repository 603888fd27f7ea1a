#![deny(warnings)]
pub mod belief;
pub mod game;
pub mod model;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "liars-dice"
    }

    pub const fn codename() -> &'static str {
        "Perudo Table"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
