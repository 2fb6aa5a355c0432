//! 响应构造、DTO 转换与输入校验

pub mod response;
pub mod validation;

pub use response::*;
pub use validation::*;
