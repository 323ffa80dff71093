//! Basic logger hierarchy example
//!
//! Demonstrates named loggers, level inheritance, additivity and pattern layouts.
//!
//! Run with: cargo run --example basic_usage

use rust_logger_hierarchy::prelude::*;
use rust_logger_hierarchy::{info, warn};

fn main() -> Result<()> {
    println!("=== Rust Logger Hierarchy - Basic Usage Example ===\n");

    let hierarchy = Hierarchy::new();

    // Root logger writes everything to the console
    let console = AppenderHandle::with_layout(
        "console",
        ConsoleAppender::new().with_colors(true),
        PatternLayout::new("%d{ABSOLUTE} [%t] %-5p %c{2} - %m%n"),
    );
    hierarchy.root_logger().add_appender(console);
    hierarchy.root_logger().set_level(Some(LogLevel::Trace));

    println!("1. Logging at different levels:");
    let logger = hierarchy.get_logger("app.service.orders");
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");
    logger.fatal("This is a fatal message");

    println!("\n2. Level inherited from an ancestor:");
    hierarchy.get_logger("app.service").set_level(Some(LogLevel::Info));
    println!("   app.service set to INFO - trace and debug won't show:");
    logger.debug("Debug message (hidden)");
    info!(logger, "Order {} accepted", 1042);
    warn!(logger, "Stock for item {} is low", "A-7");

    println!("\n3. Non-additive logger with its own appender:");
    let audit = hierarchy.get_logger("app.audit");
    audit.add_appender(AppenderHandle::with_layout(
        "audit",
        ConsoleAppender::new().with_target(ConsoleTarget::Stderr),
        PatternLayout::new("AUDIT %X{user} %m%n"),
    ));
    audit.set_additivity(false);
    let _user = Mdc::scoped("user", "alice");
    audit.info("Logged in (stderr only)");

    hierarchy.shutdown();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
