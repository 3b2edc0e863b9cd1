pub(super) const LOG_LINE_PATTERN_COLORED: &str = "{d(%Y-%m-%d %H:%M:%S%.3f%:z)} [{h({({l}):5.5})}] {m}{n}";
pub(super) const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f%:z)} [{({l}):5.5}] {m}{n}";
