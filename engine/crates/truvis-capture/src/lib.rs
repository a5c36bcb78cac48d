//! 帧捕获事件日志
//!
//! - `event`：事件与事件日志（JSON 格式）
//! - `enums`：抽象管线状态枚举
//! - `call`：把事件分类为封闭的 `ApiCall` 联合体

pub mod call;
pub mod enums;
pub mod event;
