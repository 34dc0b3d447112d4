use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unsupported input '{path}': {reason}")]
    UnsupportedInputError { path: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::SpreadsheetError(_)
            | EtlError::CsvError(_)
            | EtlError::UnsupportedInputError { .. } => ErrorCategory::Input,
            EtlError::IoError(_) => ErrorCategory::System,
            EtlError::SerializationError(_) => ErrorCategory::Output,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Output => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::SpreadsheetError(_) => {
                "確認輸入檔案是有效的 Excel/ODS 活頁簿，且工作表名稱正確"
            }
            EtlError::CsvError(_) => "確認 CSV 檔案使用 UTF-8 編碼且第一列為欄位名稱",
            EtlError::IoError(_) => "確認輸入檔案存在且可讀，輸出目錄可寫入",
            EtlError::SerializationError(_) => "檢查資料中是否含有無法序列化的數值",
            EtlError::UnsupportedInputError { .. } => {
                "請使用 .xlsx、.xlsm、.xls、.ods 或 .csv 格式的輸入檔案"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => "檢查配置檔或命令列參數的數值",
            EtlError::MissingConfigError { .. } => "在配置檔中補上缺少的欄位",
            EtlError::ProcessingError { .. } => "使用 --verbose 重新執行以查看詳細日誌",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("配置錯誤: {}", self),
            ErrorCategory::Input => format!("無法讀取輸入資料: {}", self),
            ErrorCategory::Processing => format!("資料處理失敗: {}", self),
            ErrorCategory::Output => format!("無法產生地圖文件: {}", self),
            ErrorCategory::System => format!("系統錯誤: {}", self),
        }
    }

    /// 依嚴重程度決定的程序退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_critical() {
        let err = EtlError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_config_error_messages() {
        let err = EtlError::InvalidConfigValueError {
            field: "map.zoom".to_string(),
            value: "42".to_string(),
            reason: "Value must be between 0 and 20".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().contains("map.zoom"));
        assert!(!err.recovery_suggestion().is_empty());
    }

    #[test]
    fn test_processing_error_is_medium() {
        let err = EtlError::ProcessingError {
            message: "boom".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.exit_code(), 2);
    }
}
