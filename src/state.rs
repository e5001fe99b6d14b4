/// Application state
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Enable debug mode
    pub debug: bool,
    /// Set once the user asks to leave
    pub quit: bool,
    /// Frames rendered so far
    pub frame: u64,
    /// One-line message shown next to the buttons
    pub status: Option<String>,
}

impl AppState {
    pub fn new(debug: bool) -> Self {
        AppState {
            debug,
            ..Self::default()
        }
    }
}
