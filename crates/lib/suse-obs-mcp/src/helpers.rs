use std::borrow::Cow;

use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use suse_obs_core::control::ControlError;
use suse_obs_core::params::ParamError;

pub fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

pub fn map_err(err: ControlError) -> ErrorData {
    match err {
        ControlError::Param(err) => map_param_err(&err),
        err @ ControlError::Backend { .. } => {
            tracing::error!(error = %err, "backend call failed");
            mcp_err(ErrorCode::INTERNAL_ERROR, err.to_string())
        }
    }
}

pub fn map_param_err(err: &ParamError) -> ErrorData {
    mcp_err(ErrorCode::INVALID_PARAMS, err.to_string())
}

pub fn text(body: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(body)])
}
