use serde::Serialize;

/// Severity of an operator-facing script log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// Append-only run log shown to the operator; every line is mirrored to tracing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ScriptLog {
    lines: Vec<LogLine>,
}

impl ScriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.push(LogLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(outcome = "success", "{}", message);
        self.push(LogLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.push(LogLevel::Warning, message);
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.push(LogLevel::Failure, message);
    }

    fn push(&mut self, level: LogLevel, message: String) {
        self.lines.push(LogLine { level, message });
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<LogLine> {
        self.lines
    }
}
