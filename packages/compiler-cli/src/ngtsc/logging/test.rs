// Logging Tests

use super::*;

mod log_level_tests {
    use super::*;

    #[test]
    fn should_have_correct_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn should_default_to_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(ConsoleLogger::default().level(), LogLevel::Info);
    }
}

mod console_logger_tests {
    use super::*;

    #[test]
    fn should_check_level_enabled() {
        let logger = ConsoleLogger::new(LogLevel::Warn);

        assert!(!logger.is_enabled(LogLevel::Debug));
        assert!(!logger.is_enabled(LogLevel::Info));
        assert!(logger.is_enabled(LogLevel::Warn));
        assert!(logger.is_enabled(LogLevel::Error));
    }

    #[test]
    fn should_log_without_a_subscriber() {
        let logger = ConsoleLogger::new(LogLevel::Debug);
        logger.debug("debug message");
        logger.error("error message");
    }
}

mod null_logger_tests {
    use super::*;

    #[test]
    fn should_only_report_errors_as_enabled() {
        let logger = NullLogger::new();
        assert!(!logger.is_enabled(LogLevel::Warn));
        logger.warn("dropped");
    }
}
