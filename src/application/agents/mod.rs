pub mod health_monitor;
pub mod macro_pulse;
pub mod news_scanner;
pub mod position_sentinel;
pub mod scanner;

pub use health_monitor::HealthMonitor;
pub use macro_pulse::{MacroPulseMonitor, MacroSources};
pub use news_scanner::NewsScanner;
pub use position_sentinel::PositionSentinel;
pub use scanner::OpportunityScanner;
