//! Side channel for failures that cannot be returned to a caller.

use crate::error::Error;

/// 诊断输出接口。
///
/// 流式发送在后台聚合完整响应，此时调用方已拿到流句柄，
/// 聚合阶段的错误只能通过这里上报。
pub trait DiagnosticSink: Send + Sync {
    /// 非致命提示，例如响应被内容策略拦截。
    fn warn(&self, message: &str);

    /// 后台任务失败。
    fn error(&self, error: &Error);
}

/// 默认实现：写入 `tracing`。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "gemini_chat", "{message}");
    }

    fn error(&self, error: &Error) {
        tracing::error!(target: "gemini_chat", error = %error, "background chat task failed");
    }
}
