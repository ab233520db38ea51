//! Structured outcomes returned by the exposed operations
//!
//! Every outcome carries `success`, an optional error and a human readable
//! message, and serializes to camelCase JSON for the front end.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::card::CardIdentity;
use crate::engine::{ReadData, WriteAttempt, WriteMethod, WriteReport};
use crate::error::{ErrorInfo, TagError};
use crate::page::PageConfig;
use crate::probe::ProbeResult;
use crate::session::CardPhase;

/// Result of start / stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub message: String,
}

impl ControlOutcome {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            error: None,
            message: message.to_string(),
        }
    }

    pub fn failure(err: &TagError, message: &str) -> Self {
        Self {
            success: false,
            error: Some(ErrorInfo::from(err)),
            message: message.to_string(),
        }
    }
}

/// Snapshot of the service state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutcome {
    pub initialized: bool,
    pub reader_names: Vec<String>,
    pub reader_count: usize,
    pub current_reader: Option<String>,
    pub has_card: bool,
    pub card_phase: Option<CardPhase>,
    pub active_config: PageConfig,
}

/// Result of `read_text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<ReadData>,
    pub config: PageConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub message: String,
}

impl ReadOutcome {
    pub fn from_result(result: Result<ReadData, TagError>, config: PageConfig) -> Self {
        match result {
            Ok(data) => {
                let message = if data.is_empty {
                    format!("No text stored at page {}", config.page_number())
                } else {
                    format!(
                        "Read {} bytes from page {}: '{}'",
                        data.byte_count,
                        config.page_number(),
                        data.text
                    )
                };
                Self {
                    success: true,
                    data: Some(data),
                    config,
                    error: None,
                    message,
                }
            }
            Err(e) => Self {
                success: false,
                data: None,
                config,
                error: Some(ErrorInfo::from(&e)),
                message: format!("Read failed: {}", e),
            },
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.text.as_str())
    }
}

/// Result of `write_text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub success: bool,
    pub text: String,
    pub verified: bool,
    pub method: Option<WriteMethod>,
    pub attempts: Vec<WriteAttempt>,
    pub hex: Option<String>,
    pub bytes_written: usize,
    pub read_back: Option<String>,
    pub config: PageConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub message: String,
}

impl WriteOutcome {
    pub fn from_result(
        text: &str,
        result: Result<WriteReport, TagError>,
        config: PageConfig,
    ) -> Self {
        match result {
            Ok(report) => {
                let message = if report.verified {
                    format!(
                        "Wrote '{}' using {} method, verified",
                        report.text.trim(),
                        report.method.as_str()
                    )
                } else {
                    format!(
                        "Wrote '{}' using {} method, verification failed (read back {:?})",
                        report.text.trim(),
                        report.method.as_str(),
                        report.read_back.as_deref().unwrap_or("nothing")
                    )
                };
                Self {
                    success: true,
                    text: report.text,
                    verified: report.verified,
                    method: Some(report.method),
                    attempts: report.attempts,
                    hex: Some(report.hex),
                    bytes_written: report.bytes_written,
                    read_back: report.read_back,
                    config,
                    error: None,
                    message,
                }
            }
            Err(e) => Self {
                success: false,
                text: text.to_string(),
                verified: false,
                method: None,
                attempts: match &e {
                    TagError::WriteFailed { attempts, .. } => attempts.clone(),
                    _ => Vec::new(),
                },
                hex: None,
                bytes_written: 0,
                read_back: None,
                config,
                error: Some(ErrorInfo::from(&e)),
                message: format!("Write failed: {}", e),
            },
        }
    }
}

/// Result of `get_card_info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfoOutcome {
    pub success: bool,
    pub card: Option<CardIdentity>,
    pub reader: Option<String>,
    pub phase: Option<CardPhase>,
    pub attached_at: Option<DateTime<Utc>>,
    pub probe: Option<ProbeResult>,
    pub test_read: Option<ReadOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub message: String,
}

impl CardInfoOutcome {
    pub fn failure(err: &TagError) -> Self {
        Self {
            success: false,
            card: None,
            reader: None,
            phase: None,
            attached_at: None,
            probe: None,
            test_read: None,
            error: Some(ErrorInfo::from(err)),
            message: err.to_string(),
        }
    }
}

/// Result of `set_config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutcome {
    pub success: bool,
    pub config: Option<PageConfig>,
    /// Set when the payload covers more pages than the name suggests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub message: String,
}

impl ConfigOutcome {
    pub fn from_result(result: Result<PageConfig, TagError>) -> Self {
        match result {
            Ok(config) => {
                let warning = (config.spans_pages() > 1).then(|| {
                    format!(
                        "{} stores up to {} bytes, covering pages {}-{}",
                        config.name(),
                        config.max_data_size(),
                        config.page_number(),
                        config.last_page()
                    )
                });
                Self {
                    success: true,
                    message: format!("Configuration set to {}", config.name()),
                    config: Some(config),
                    warning,
                    available_names: None,
                    error: None,
                }
            }
            Err(e) => {
                let available_names = match &e {
                    TagError::UnknownConfig { available, .. } => Some(available.clone()),
                    _ => None,
                };
                Self {
                    success: false,
                    config: None,
                    warning: None,
                    available_names,
                    error: Some(ErrorInfo::from(&e)),
                    message: e.to_string(),
                }
            }
        }
    }
}
