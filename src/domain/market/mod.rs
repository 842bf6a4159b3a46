// Indicator math and rolling-window state
pub mod indicators;
pub mod rolling_window;
