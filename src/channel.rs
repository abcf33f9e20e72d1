//! Control channel messages exchanged with execution contexts.
//!
//! Outbound: [`ControlRequest`]. Inbound: [`InboundMessage`], which is either a
//! reply to a request or the back-button flag side channel.

use crate::types::{Arguments, CorrelationId, PageId, ReplyShape, ReplyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Route operation relayed to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Push,
    Notify,
    MaybePop,
    Pop,
    PopTo,
    Remove,
    Replace,
    CanPop,
}

impl Operation {
    pub fn method_name(self) -> &'static str {
        match self {
            Operation::Push => "push",
            Operation::Notify => "notify",
            Operation::MaybePop => "maybePop",
            Operation::Pop => "pop",
            Operation::PopTo => "popTo",
            Operation::Remove => "remove",
            Operation::Replace => "replace",
            Operation::CanPop => "canPop",
        }
    }

    pub fn reply_shape(self) -> ReplyShape {
        match self {
            Operation::MaybePop => ReplyShape::Int,
            _ => ReplyShape::Bool,
        }
    }

    /// Operations that name a specific page and cannot fall back to the front.
    pub fn requires_concrete_page(self) -> bool {
        matches!(
            self,
            Operation::Push | Operation::PopTo | Operation::Remove | Operation::Replace
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Command sent to a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequest {
    pub operation: Operation,
    pub page_id: PageId,
    pub arguments: Option<Arguments>,
    pub correlation_id: CorrelationId,
}

/// Reply from a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlReply {
    pub correlation_id: CorrelationId,
    pub result: ReplyValue,
}

/// Back-button handling toggle sent by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackButtonFlag {
    Enable,
    Disable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Reply(ControlReply),
    BackButton { flag: BackButtonFlag },
}

impl InboundMessage {
    pub fn reply(correlation_id: CorrelationId, result: ReplyValue) -> Self {
        InboundMessage::Reply(ControlReply {
            correlation_id,
            result,
        })
    }
}
