//! 存储层错误类型
//!
//! 定义统一的存储错误类型，用于封装底层错误：
//! - SQL 执行错误
//! - 连接错误
//! - 唯一约束冲突（`is_conflict`）

#[derive(Debug)]
pub struct StorageError {
    message: String,
    conflict: bool,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conflict: false,
        }
    }

    /// 唯一约束冲突（重复地址、重复队名等）
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conflict: true,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.conflict
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                return Self::conflict(format!("duplicate value violates {constraint}"));
            }
        }
        Self::new(err.to_string())
    }
}

impl From<domain::ParseEnumError> for StorageError {
    fn from(err: domain::ParseEnumError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<domain::ChangeError> for StorageError {
    fn from(err: domain::ChangeError) -> Self {
        Self::new(err.to_string())
    }
}
