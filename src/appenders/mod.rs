//! Appender implementations

pub mod console;
pub mod file;
pub mod forwarding;
pub mod rolling_calendar;
pub mod rolling_file;
pub mod writer;

pub use crate::core::Appender;
pub use console::{ConsoleAppender, ConsoleTarget};
pub use file::{FileAppender, FileOptions};
pub use forwarding::ForwardingAppender;
pub use rolling_calendar::{Periodicity, RollingCalendar};
pub use rolling_file::{Clock, DailyRollingFileAppender, ManualClock, RollingPolicy, SystemClock};
pub use writer::{SharedBuffer, WriterAppender};
